//! Persistent usage counter.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Stored catch statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    /// Number of successful catches.
    #[serde(default)]
    pub usage_count: u64,
    /// When the most recent catch happened.
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_caught_at: Option<OffsetDateTime>,
}

/// Persists [`UsageStats`] as JSON.
#[derive(Debug, Clone)]
pub struct UsageStore {
    path: PathBuf,
}

impl UsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the usage file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored stats, or zeroed stats when nothing has been recorded yet.
    pub fn load(&self) -> Result<UsageStats> {
        if !self.path.exists() {
            return Ok(UsageStats::default());
        }

        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read usage file at {}", self.path.display()))?;
        let stats = serde_json::from_str(&data)
            .with_context(|| format!("invalid usage data in {}", self.path.display()))?;
        Ok(stats)
    }

    /// Record one successful catch and return the new count.
    pub fn increment(&self) -> Result<u64> {
        let mut stats = self.load()?;
        stats.usage_count = stats.usage_count.saturating_add(1);
        stats.last_caught_at = Some(OffsetDateTime::now_utc());
        self.save(&stats)?;
        Ok(stats.usage_count)
    }

    /// Write through a sibling temp file and rename, so readers never see a partial file.
    fn save(&self, stats: &UsageStats) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create usage directory {}", dir.display()))?;

        let data =
            serde_json::to_string_pretty(stats).context("failed to serialize usage stats")?;
        let mut staged = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("failed to stage usage file in {}", dir.display()))?;
        staged
            .write_all(data.as_bytes())
            .context("failed to write staged usage data")?;
        staged
            .persist(&self.path)
            .with_context(|| format!("failed to write usage file to {}", self.path.display()))?;
        Ok(())
    }
}
