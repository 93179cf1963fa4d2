//! `termplan-worker` -- runs one extraction job from a JSON file.
//!
//! Scans the job's workbooks, orders the terminal table, lays out the
//! diagram pages and writes the run outcome as JSON.
//!
//! # Environment variables
//!
//! | Variable          | Required | Default | Description                     |
//! |-------------------|----------|---------|---------------------------------|
//! | `TERMPLAN_JOB`    | yes      | --      | Path of the job JSON file       |
//! | `TERMPLAN_OUTPUT` | no       | stdout  | Path the outcome JSON goes to   |
//! | `TERMPLAN_PRETTY` | no       | `true`  | Pretty-print the outcome JSON   |

use std::sync::Arc;

use anyhow::Context;
use termplan_pipeline::run_async;
use termplan_worker::config::WorkerConfig;
use termplan_worker::job::{outcome_json, JobFile};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "termplan_worker=info,termplan_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = WorkerConfig::from_env()?;
    tracing::info!(job = %config.job_path.display(), "Starting termplan-worker");

    let job = JobFile::load(&config.job_path)?;
    tracing::info!(
        workbooks = job.workbooks.len(),
        rules = job.config.rules.rules.len(),
        shapes = job.shapes.len(),
        "Job loaded",
    );

    let (pipeline_config, files, catalog) = job.into_parts();
    let outcome = run_async(Arc::new(pipeline_config), files, catalog).await?;

    for failure in &outcome.failures {
        tracing::warn!(file = %failure.file, error = %failure.message, "Workbook not processed");
    }

    let json = outcome_json(&outcome, config.pretty).context("Failed to serialize outcome")?;
    match &config.output_path {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!(output = %path.display(), run_id = %outcome.run_id, "Outcome written");
        }
        None => println!("{json}"),
    }
    Ok(())
}
