//! Integration tests for job file loading and outcome output.

use std::io::Write;
use std::sync::Arc;

use termplan_pipeline::{run, run_async};
use termplan_worker::job::{outcome_json, JobError, JobFile};

const JOB: &str = r#"{
    "config": {
        "rules": {
            "rules": [
                {"search_term": "Sensor X", "use_condition": true, "condition_column": "B",
                 "target_shape_name": "box"},
                {"search_term": "Valve Y", "target_shape_name": "box"}
            ],
            "target_sheets": ["Main"]
        },
        "priority": {},
        "pages": [{"page": "Schematic"}]
    },
    "workbooks": [
        {
            "name": "plant.xlsx",
            "main": {"Main": [["Sensor X", "1"], ["Sensor X", "0"], ["Valve Y", "1"]]},
            "auxiliary": {"Priority": [["Label", "Priority"], ["valve", "1"], ["sensor", "2"]]}
        }
    ],
    "shapes": {"box": {"width": 40.0, "height": 20.0}}
}"#;

fn write_job(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(text.as_bytes()).expect("write job");
    file
}

#[test]
fn job_file_loads_with_defaults() {
    let file = write_job(JOB);
    let job = JobFile::load(file.path()).expect("job should load");

    assert_eq!(job.workbooks.len(), 1);
    assert!(job.workbooks[0].auxiliary.is_some());
    assert_eq!(job.config.rules.rules.len(), 2);
    assert_eq!(job.config.scan.max_scan_columns, 20);
    assert_eq!(job.config.priority.as_ref().map(|p| p.sheet.as_str()), Some("Priority"));
    assert_eq!(job.shapes["box"].width, 40.0);
}

#[test]
fn loaded_job_runs_end_to_end() {
    let file = write_job(JOB);
    let (config, files, catalog) = JobFile::load(file.path()).unwrap().into_parts();
    let outcome = run(&config, &files, catalog.as_ref()).unwrap();

    let names: Vec<(&str, i64)> = outcome
        .prioritized
        .iter()
        .map(|p| (p.item.name.as_str(), p.priority))
        .collect();
    assert_eq!(names, vec![("Valve Y", 1), ("Sensor X", 2)]);
    assert_eq!(outcome.placement_count(), 2);
    assert_eq!(outcome.ordered_rows[0].terminal_label(), "3, 4");
}

#[tokio::test]
async fn outcome_serializes_to_json() {
    let file = write_job(JOB);
    let (config, files, catalog) = JobFile::load(file.path()).unwrap().into_parts();
    let outcome = run_async(Arc::new(config), files, catalog).await.unwrap();

    let compact = outcome_json(&outcome, false).unwrap();
    assert!(!compact.contains('\n'));
    let parsed: serde_json::Value = serde_json::from_str(&compact).unwrap();
    assert_eq!(parsed["line_items"].as_array().map(Vec::len), Some(2));
    assert_eq!(parsed["ordered_rows"][0]["name"], "Valve Y");
    assert_eq!(parsed["pages"][0]["page"], "Schematic");
    assert_eq!(parsed["failures"].as_array().map(Vec::len), Some(0));

    let pretty = outcome_json(&outcome, true).unwrap();
    assert!(pretty.contains('\n'));
}

#[test]
fn missing_job_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = JobFile::load(&dir.path().join("absent.json"));
    assert!(matches!(result, Err(JobError::Io { .. })));
}

#[test]
fn malformed_job_file_is_a_parse_error() {
    let file = write_job("{ not json");
    let err = JobFile::load(file.path()).unwrap_err();
    assert!(matches!(err, JobError::Parse { .. }));
    assert!(err.to_string().contains("Invalid job file"));
}
