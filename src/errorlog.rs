//! Persistent append-only error log.
//!
//! Line format: `<RFC 3339 timestamp> - <error detail>\n`. Writes are
//! serialized behind a mutex so concurrent appends never interleave.
//! Append failures are reported via tracing and swallowed; they must not
//! take the process down.

use std::path::{Path, PathBuf};

use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::error;

/// Append-only error log file.
#[derive(Debug)]
pub struct ErrorLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ErrorLog {
    /// Open (or create) the log file for appending.
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Append one timestamped record.
    pub async fn append(&self, detail: &str) {
        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_else(|_| OffsetDateTime::now_utc().unix_timestamp().to_string());

        let line = format!("{} - {}\n", timestamp, detail);

        let mut file = self.file.lock().await;
        if let Err(e) = file.write_all(line.as_bytes()).await {
            error!(path = %self.path.display(), error = %e, "failed to append to error log");
            return;
        }
        if let Err(e) = file.flush().await {
            error!(path = %self.path.display(), error = %e, "failed to flush error log");
        }
    }

    /// The log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
