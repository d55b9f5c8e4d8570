//! `crossing.toml` settings for the headless driver.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when no `--config` is given.
pub(crate) const DEFAULT_CONFIG_FILE: &str = "crossing.toml";

/// Driver settings; every key is optional.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CrossingConfig {
    /// Directory holding `level0.xml`, `level1.xml`, ...
    pub(crate) levels_dir: PathBuf,
    /// Directory level images are resolved against.
    pub(crate) images_dir: PathBuf,
    /// Number of level files to register.
    pub(crate) level_count: usize,
    /// Level loaded at startup.
    pub(crate) start_level: usize,
    /// Longest single world update in milliseconds.
    pub(crate) max_step_ms: u64,
    /// Simulated frame length in milliseconds.
    pub(crate) frame_ms: u64,
    /// Start with cars disarmed.
    pub(crate) road_cheat: bool,
    /// Start with the river disarmed.
    pub(crate) river_cheat: bool,
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self {
            levels_dir: PathBuf::from("levels"),
            images_dir: PathBuf::from("images"),
            level_count: 4,
            start_level: 1,
            max_step_ms: 50,
            frame_ms: 16,
            road_cheat: false,
            river_cheat: false,
        }
    }
}

impl CrossingConfig {
    /// Reads settings from `path`.
    pub(crate) fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self =
            toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Rejects settings the frame loop cannot run with.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.frame_ms == 0 {
            bail!("frame_ms must be at least 1");
        }
        Ok(())
    }

    /// Reads `path` when given, else `crossing.toml` when present, else
    /// falls back to defaults.
    pub(crate) fn discover(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_path(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_path(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    /// Location of the level file with the given index.
    pub(crate) fn level_path(&self, index: usize) -> PathBuf {
        self.levels_dir.join(format!("level{index}.xml"))
    }

    pub(crate) const fn max_step(&self) -> Duration {
        Duration::from_millis(self.max_step_ms)
    }

    pub(crate) const fn frame(&self) -> Duration {
        Duration::from_millis(self.frame_ms)
    }
}
