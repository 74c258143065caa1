use crate::core::{Snapshot, Storage};
use crate::utils::error::{EtlError, Result};
use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct UpdateStatus {
    #[serde(rename = "lastUpdated")]
    last_updated: String,
}

pub struct SnapshotWriter<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> SnapshotWriter<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Replaces whatever is at `path` with the pretty-printed snapshot.
    pub async fn write(&self, path: &str, snapshot: &Snapshot) -> Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        tracing::debug!("Writing snapshot ({} bytes) to {}", json.len(), path);
        self.persist(path, json.as_bytes()).await
    }

    /// `{"lastUpdated": "..."}`, read by the stock page to show freshness.
    pub async fn write_status(&self, path: &str, at: DateTime<Local>) -> Result<()> {
        let status = UpdateStatus {
            last_updated: at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        };
        let json = serde_json::to_string_pretty(&status)?;
        self.persist(path, json.as_bytes()).await
    }

    async fn persist(&self, path: &str, data: &[u8]) -> Result<()> {
        self.storage
            .write_file(path, data)
            .await
            .map_err(|e| EtlError::PersistError {
                path: path.to_string(),
                source: match e {
                    EtlError::IoError(io) => io,
                    other => std::io::Error::other(other.to_string()),
                },
            })
    }
}
