//! Application configuration, read from an optional JSON file.

use crate::charts::{ChartFormat, DEFAULT_TOP_N};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Looked up in the working directory when no config path is given.
pub const DEFAULT_CONFIG_FILE: &str = "deckstats.json";

pub const DEFAULT_TYPE_LABELS: [&str; 8] = [
    "Land",
    "Creature",
    "Artifact",
    "Enchantment",
    "Planeswalker",
    "Battle",
    "Instant",
    "Sorcery",
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub format: ChartFormat,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 700,
            format: ChartFormat::Png,
        }
    }
}

impl ChartConfig {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deck table to analyze
    pub input: PathBuf,
    /// Field separator of the deck table
    pub separator: char,
    /// Directory receiving charts and summary.json
    pub output_dir: PathBuf,
    /// Card type labels, one chart each, in this order
    pub type_labels: Vec<String>,
    /// Entries shown per ranked chart
    pub top_n: usize,
    pub chart: ChartConfig,
    /// How long a loaded snapshot is served before it is reloaded
    pub cache_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("todos_os_decks.csv"),
            separator: ',',
            output_dir: PathBuf::from("report"),
            type_labels: DEFAULT_TYPE_LABELS.iter().map(|s| s.to_string()).collect(),
            top_n: DEFAULT_TOP_N,
            chart: ChartConfig::default(),
            cache_ttl_secs: 300,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path if given, else `deckstats.json` if present, else defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    log::debug!("Using {}", default_path.display());
                    Self::from_file(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        if !self.separator.is_ascii() {
            return Err(ConfigError::Invalid(format!(
                "separator {:?} is not a single-byte character",
                self.separator
            )));
        }
        if self.chart.width == 0 || self.chart.height == 0 {
            return Err(ConfigError::Invalid("chart dimensions must be non-zero".into()));
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid("cache_ttl_secs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn separator_byte(&self) -> u8 {
        // validate() guarantees ASCII
        self.separator as u8
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
