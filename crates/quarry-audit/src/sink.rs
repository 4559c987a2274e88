// SPDX-FileCopyrightText: 2026 Quarry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable destinations for flushed audit entries.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::entry::AuditLogEntry;

/// Failure writing audit entries. Never surfaced to request callers.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("audit entry could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A destination that accepts batches of entries.
#[async_trait]
pub trait AuditSink: Send + Sync {
    fn name(&self) -> &str;

    /// Persists `entries` in order. A failed batch may be retried.
    async fn write_batch(&self, entries: &[AuditLogEntry]) -> Result<(), AuditError>;
}

/// Appends one JSON object per line to a file, creating parent directories
/// on first write.
#[derive(Debug, Clone)]
pub struct JsonlFileSink {
    path: PathBuf,
}

impl JsonlFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> AuditError {
        AuditError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl AuditSink for JsonlFileSink {
    fn name(&self) -> &str {
        "jsonl-file"
    }

    async fn write_batch(&self, entries: &[AuditLogEntry]) -> Result<(), AuditError> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::with_capacity(entries.len() * 256);
        for entry in entries {
            serde_json::to_writer(&mut buf, entry)?;
            buf.push(b'\n');
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(&buf).await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;
        Ok(())
    }
}
