//! Configuration loading and defaults for minwon-kiosk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::ActivityKind;

/// Longest accepted timer duration: one day.
const MAX_DURATION_SECS: u64 = 86_400;

/// Format of the presentation stream written to stdout.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable screen dump (default).
    #[default]
    Text,
    /// One JSON snapshot per line.
    Json,
}

/// Main configuration for minwon-kiosk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Inactivity before the idle warning is shown, in milliseconds (default: 120000).
    pub idle_timeout_ms: u64,

    /// Delay between the idle warning and the return to the main screen,
    /// in milliseconds (default: 5000).
    pub idle_return_ms: u64,

    /// Countdown of the guide modal in seconds (default: 60).
    pub modal_auto_close_seconds: u64,

    /// Input kinds that count as user activity.
    pub activity_events: Vec<ActivityKind>,

    /// Directory holding the guide images.
    pub asset_dir: PathBuf,

    /// Presentation output format.
    pub output: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 120_000,
            idle_return_ms: 5_000,
            modal_auto_close_seconds: 60,
            activity_events: ActivityKind::ALL.to_vec(),
            asset_dir: PathBuf::from("assets"),
            output: OutputFormat::default(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Load configuration from the default path, or return defaults if not found.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            return Self::load(p);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let default_path = config_dir.join("minwon-kiosk").join("config.toml");
            if default_path.exists() {
                return Self::load(&default_path);
            }
        }

        Ok(Self::default())
    }

    /// Reject settings the timers cannot run with.
    pub fn validate(&self) -> Result<()> {
        const MAX_MS: u64 = MAX_DURATION_SECS * 1000;

        anyhow::ensure!(
            (1..=MAX_MS).contains(&self.idle_timeout_ms),
            "idle_timeout_ms must be between 1 and {MAX_MS}"
        );
        anyhow::ensure!(
            (1..=MAX_MS).contains(&self.idle_return_ms),
            "idle_return_ms must be between 1 and {MAX_MS}"
        );
        anyhow::ensure!(
            (1..=MAX_DURATION_SECS).contains(&self.modal_auto_close_seconds),
            "modal_auto_close_seconds must be between 1 and {MAX_DURATION_SECS}"
        );
        anyhow::ensure!(
            !self.activity_events.is_empty(),
            "activity_events must list at least one input kind"
        );
        Ok(())
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn idle_return(&self) -> Duration {
        Duration::from_millis(self.idle_return_ms)
    }

    pub fn modal_auto_close(&self) -> Duration {
        Duration::from_secs(self.modal_auto_close_seconds)
    }

    /// Check if an input kind counts as activity.
    pub fn is_activity(&self, kind: ActivityKind) -> bool {
        self.activity_events.contains(&kind)
    }
}
