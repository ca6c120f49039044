use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

use crate::crawler::{CrawlError, CrawlOutcome};
use crate::frontier::{Frontier, FrontierSnapshot, QueuedUrl};
use crate::models::{DocPage, FailedPage};

/// On-disk crawl state, enough to pick a crawl back up where it stopped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    pub base_url: String,
    #[serde(flatten)]
    pub frontier: FrontierSnapshot,
    pub pages: Vec<DocPage>,
    #[serde(default)]
    pub failed: Vec<FailedPage>,
    pub total_pages: usize,
    pub failed_pages: usize,
    pub timestamp: String,
}

impl Checkpoint {
    /// `in_flight` are URLs handed to workers whose results are not in `outcome` yet.
    pub fn capture(
        base_url: &str,
        frontier: &Frontier,
        in_flight: &[QueuedUrl],
        outcome: &CrawlOutcome,
    ) -> Self {
        Self {
            base_url: base_url.to_string(),
            frontier: frontier.snapshot_with_in_flight(in_flight),
            pages: outcome.pages.values().cloned().collect(),
            failed: outcome.failed.clone(),
            total_pages: outcome.total_pages(),
            failed_pages: outcome.failed_pages(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Write via a sibling temp file so an interrupted save never leaves a torn checkpoint.
    pub fn save(&self, path: &Path) -> Result<(), CrawlError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, CrawlError> {
        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Err(CrawlError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("checkpoint {} is empty", path.display()),
            )));
        }
        Ok(serde_json::from_str(&data)?)
    }
}
