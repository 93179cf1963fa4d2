use std::path::PathBuf;

/// Environment variable naming the job file.
pub const JOB_VAR: &str = "TERMPLAN_JOB";
/// Environment variable naming the output file.
pub const OUTPUT_VAR: &str = "TERMPLAN_OUTPUT";
/// Environment variable toggling pretty-printed output.
pub const PRETTY_VAR: &str = "TERMPLAN_PRETTY";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} must be true or false, got '{value}'")]
    InvalidFlag { name: &'static str, value: String },
}

/// Worker settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Job file to run.
    pub job_path: PathBuf,
    /// Where the outcome JSON goes; stdout when `None`.
    pub output_path: Option<PathBuf>,
    /// Pretty-print the outcome JSON (default: `true`).
    pub pretty: bool,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var           | Default  |
    /// |-------------------|----------|
    /// | `TERMPLAN_JOB`    | required |
    /// | `TERMPLAN_OUTPUT` | stdout   |
    /// | `TERMPLAN_PRETTY` | `true`   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let job_path = non_empty(JOB_VAR)
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing(JOB_VAR))?;

        let output_path = non_empty(OUTPUT_VAR).map(PathBuf::from);

        let pretty = match non_empty(PRETTY_VAR) {
            None => true,
            Some(value) => parse_flag(&value).ok_or(ConfigError::InvalidFlag {
                name: PRETTY_VAR,
                value,
            })?,
        };

        Ok(Self {
            job_path,
            output_path,
            pretty,
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
