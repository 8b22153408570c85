use std::path::PathBuf;

use crate::error::LogError;

/// Names the run; the log is written to `<TESTNAME>.perf.log`.
pub const TESTNAME_VAR: &str = "TESTNAME";
/// Optional directory for the log file (default: working directory).
pub const OUTPUT_DIR_VAR: &str = "LAZYD_PERF_DIR";
/// Entries buffered before they are written out.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Where and how the run-time logger writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub test_name: String,
    pub output_dir: Option<PathBuf>,
    pub capacity: usize,
}

impl LoggerConfig {
    pub fn new(test_name: impl Into<String>) -> Self {
        Self {
            test_name: test_name.into(),
            output_dir: None,
            capacity: DEFAULT_CAPACITY,
        }
    }

    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, LogError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. `TESTNAME` must be set
    /// and non-empty.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, LogError> {
        let test_name = lookup(TESTNAME_VAR)
            .filter(|s| !s.is_empty())
            .ok_or(LogError::MissingConfig { var: TESTNAME_VAR })?;
        let output_dir = lookup(OUTPUT_DIR_VAR)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        Ok(Self {
            test_name,
            output_dir,
            capacity: DEFAULT_CAPACITY,
        })
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// `<output_dir>/<test_name>.perf.log`
    pub fn output_path(&self) -> PathBuf {
        let file = format!("{}.perf.log", self.test_name);
        match &self.output_dir {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }
}
