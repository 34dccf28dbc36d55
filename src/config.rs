//! Configuration loading and management
//!
//! Handles parsing of `studylog.toml` in the data directory.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Immersion goal and streak settings
    #[serde(default)]
    pub immersion: ImmersionConfig,

    /// Checklist reporting settings
    #[serde(default)]
    pub checklist: ChecklistConfig,

    /// Custom task catalog settings
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Immersion-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImmersionConfig {
    /// Total minutes that make up the immersion goal
    #[serde(default = "default_goal_minutes")]
    pub goal_minutes: u64,

    /// Minimum minutes for a day to count toward the streak
    #[serde(default = "default_streak_min_minutes")]
    pub streak_min_minutes: u32,
}

fn default_goal_minutes() -> u64 {
    60_000
}

fn default_streak_min_minutes() -> u32 {
    1
}

impl Default for ImmersionConfig {
    fn default() -> Self {
        Self {
            goal_minutes: default_goal_minutes(),
            streak_min_minutes: default_streak_min_minutes(),
        }
    }
}

/// Checklist-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecklistConfig {
    /// Number of most recent days in the rolling average
    #[serde(default = "default_recent_window")]
    pub recent_window: usize,
}

fn default_recent_window() -> usize {
    7
}

impl Default for ChecklistConfig {
    fn default() -> Self {
        Self {
            recent_window: default_recent_window(),
        }
    }
}

/// Catalog-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Seed the built-in tasks when no catalog exists yet
    #[serde(default = "default_true")]
    pub seed_defaults: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            seed_defaults: true,
        }
    }
}

impl Config {
    /// Load configuration from a `studylog.toml` file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|err| Error::InvalidConfig(format!("{}: {}", path.display(), err.message())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn validate(&self) -> Result<()> {
        if self.immersion.goal_minutes == 0 {
            return Err(Error::InvalidConfig(
                "immersion.goal_minutes must be > 0".to_string(),
            ));
        }
        if self.checklist.recent_window == 0 {
            return Err(Error::InvalidConfig(
                "checklist.recent_window must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
