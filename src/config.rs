use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::summary::{DEFAULT_MAX_UPCOMING, DEFAULT_WINDOW_DAYS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Default user id when neither `--user` nor a token is given.
    pub(crate) user: Option<String>,
    pub(crate) upcoming_window_days: u32,
    pub(crate) max_upcoming: usize,
    /// `tracing` filter directive, e.g. "info" or "subtrack=debug".
    pub(crate) log_level: String,
    /// Overrides the database location under the data directory.
    pub(crate) database: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            upcoming_window_days: DEFAULT_WINDOW_DAYS,
            max_upcoming: DEFAULT_MAX_UPCOMING,
            log_level: "warn".to_string(),
            database: None,
        }
    }
}

pub(crate) struct Paths {
    pub(crate) config_file: PathBuf,
    pub(crate) data_dir: PathBuf,
}

impl Paths {
    pub(crate) fn resolve() -> Result<Self> {
        let proj_dirs = directories::ProjectDirs::from("com", "subtrack", "SubTrack")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let data_dir = proj_dirs.data_dir().to_path_buf();
        fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
        Ok(Self {
            config_file: proj_dirs.config_dir().join("config.toml"),
            data_dir,
        })
    }

    pub(crate) fn database(&self, config: &Config) -> PathBuf {
        config
            .database
            .clone()
            .unwrap_or_else(|| self.data_dir.join("subtrack.db"))
    }

    pub(crate) fn log_file(&self) -> PathBuf {
        self.data_dir.join("subtrack.log")
    }
}

/// Load `config.toml`, falling back to defaults when the file does not exist.
pub(crate) fn load(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    parse(&s).with_context(|| format!("parse {}", path.display()))
}

pub(crate) fn parse(s: &str) -> Result<Config> {
    let config: Config = toml::from_str(s)?;
    if config.max_upcoming == 0 {
        anyhow::bail!("max_upcoming must be at least 1");
    }
    Ok(config)
}
