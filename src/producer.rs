//! Demo result producer.
//!
//! Stands in for a worker process: every interval it writes one
//! `result_<millis>_<rand>.jsonl` file holding a single JSON line. Files are
//! written atomically so the reporter never merges a half-written result.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::MissedTickBehavior;

use crate::error::Result;
use crate::sync::atomic_write;

/// Default time between demo results (10 seconds).
pub const DEFAULT_WRITE_INTERVAL: Duration = Duration::from_secs(10);

/// One demo result line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: u64,
    pub timestamp: String,
    pub value: f64,
    pub message: String,
}

impl ResultRecord {
    #[must_use]
    pub fn new(id: u64, at: DateTime<Utc>, value: f64) -> Self {
        Self {
            id,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            value,
            message: format!("Result #{id}"),
        }
    }

    /// Serialize as one newline-terminated JSONL line.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// File name for a result written at `at`.
#[must_use]
pub fn result_file_name(at: DateTime<Utc>, random_id: &str) -> String {
    format!("result_{}_{random_id}.jsonl", at.timestamp_millis())
}

/// Random value in `[0, 1000)`.
fn random_value() -> f64 {
    // Top 53 bits of a v4 UUID, scaled into the unit interval.
    #[allow(clippy::cast_precision_loss)]
    let unit = (uuid::Uuid::new_v4().as_u128() >> 75) as f64 / (1u64 << 53) as f64;
    unit * 1000.0
}

fn random_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..7].to_string()
}

/// Write one result file into `dir`.
///
/// # Errors
///
/// Returns an error if the record cannot be serialized or written.
pub async fn write_result(dir: &Path, record: &ResultRecord) -> Result<PathBuf> {
    let now = Utc::now();
    let path = dir.join(result_file_name(now, &random_id()));
    atomic_write(&path, &record.to_line()?).await?;
    tracing::info!(file = %path.display(), "Wrote: {}", path.display());
    Ok(path)
}

/// Periodic demo producer.
pub struct Producer {
    dir: PathBuf,
    every: Duration,
    limit: Option<u64>,
}

impl Producer {
    pub fn new(dir: impl Into<PathBuf>, every: Duration) -> Self {
        Self {
            dir: dir.into(),
            every: every.max(Duration::from_millis(1)),
            limit: None,
        }
    }

    /// Stop after `limit` files.
    #[must_use]
    pub fn with_limit(mut self, limit: Option<u64>) -> Self {
        self.limit = limit;
        self
    }

    /// Write results until the limit is reached or `shutdown` resolves.
    ///
    /// Returns the number of files written.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or a write fails.
    pub async fn run<F>(&self, shutdown: F) -> Result<u64>
    where
        F: Future<Output = ()>,
    {
        tokio::fs::create_dir_all(&self.dir).await?;
        tracing::info!(dir = %self.dir.display(), "Demo producer started");

        let mut ticker = tokio::time::interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        let mut counter = 0u64;
        while self.limit.is_none_or(|limit| counter < limit) {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = ticker.tick() => {
                    counter += 1;
                    let record = ResultRecord::new(counter, Utc::now(), random_value());
                    write_result(&self.dir, &record).await?;
                }
            }
        }

        Ok(counter)
    }
}
