//! Append-only JSONL error journal (spec.md §7: "All errors are journalled
//! with item id, provider, method, kind, and stack trace for offline
//! inspection"). Grounded on `ninelives-jsonl`'s `JsonlSink`: one JSON
//! object per line, opened in append mode, flushed after every write.

use serde_json::json;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use ti_core::ProviderError;

#[derive(Clone, Debug)]
pub struct Journal {
    path: PathBuf,
}

impl Journal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one record. I/O failures are logged, not propagated — a
    /// journal write must never abort the worker that triggered it.
    pub async fn record(&self, item_id: &str, provider: &str, method: &str, error: &ProviderError) {
        let line = json!({
            "item_id": item_id,
            "provider": provider,
            "method": method,
            "kind": error.kind().as_str(),
            "message": error.message(),
            "backtrace": error.backtrace(),
        })
        .to_string()
            + "\n";

        if let Err(e) = self.append(&line).await {
            tracing::error!(path = %self.path.display(), error = %e, "failed to write journal entry");
        }
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::OpenOptions::new().create(true).append(true).open(&self.path).await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
