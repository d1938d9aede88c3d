//! Live Lead II hand-off file
//!
//! The acquisition session periodically writes its Lead II window to
//! `lead_ii_live.json`; the dashboard process polls the same file.
//! There is no locking between the two, so writes are atomic and the
//! reader judges freshness from the embedded timestamp.

use crate::store::atomic_write;
use crate::types::Lead;
use crate::{Error, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LIVE_FILE: &str = "lead_ii_live.json";

/// Default freshness horizon in seconds
pub const DEFAULT_FRESHNESS_SECS: i64 = 5;

/// On-disk snapshot of the live lead window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSnapshot {
    pub lead: Lead,
    /// Unix seconds of the last write
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate_hz: Option<f64>,
    pub samples: Vec<f64>,
}

impl LiveSnapshot {
    pub fn new(lead: Lead, samples: Vec<f64>, sample_rate_hz: Option<f64>) -> Self {
        Self {
            lead,
            updated_at: Utc::now().timestamp(),
            sample_rate_hz,
            samples,
        }
    }

    /// Age of the snapshot in seconds, clamped at zero
    pub fn age_secs(&self) -> i64 {
        (Utc::now().timestamp() - self.updated_at).max(0)
    }

    /// True when the snapshot is older than `freshness_secs`
    pub fn is_stale(&self, freshness_secs: i64) -> bool {
        self.age_secs() > freshness_secs
    }
}

/// Reader/writer for the live hand-off file
#[derive(Debug, Clone)]
pub struct LiveLeadFile {
    path: PathBuf,
}

impl LiveLeadFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist a snapshot atomically
    pub fn write(&self, snapshot: &LiveSnapshot) -> Result<()> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| Error::Store(format!("failed to serialize live snapshot: {}", e)))?;
        atomic_write(&self.path, &json)
    }

    /// Read the current snapshot, `None` when the file does not exist
    pub fn read(&self) -> Result<Option<LiveSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&content).map_err(|e| {
            Error::Store(format!("invalid live file {}: {}", self.path.display(), e))
        })?;
        Ok(Some(snapshot))
    }
}
