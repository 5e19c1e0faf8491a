//! Durable report log on the local filesystem.

use crate::application::ports::{ReportLog, ReportLogError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Default report log file, relative to the working directory.
pub const DEFAULT_REPORT_LOG_PATH: &str = "request_count.log";

/// Appends report lines to a file, creating it if needed.
///
/// The file is opened in append mode for every line, so it can be rotated or
/// removed externally between cycles.
#[derive(Debug, Clone)]
pub struct FileReportLog {
    path: PathBuf,
}

impl FileReportLog {
    /// Append to the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileReportLog {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_LOG_PATH)
    }
}

#[async_trait]
impl ReportLog for FileReportLog {
    async fn append(&self, line: &str) -> Result<(), ReportLogError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        file.write_all(buf.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
