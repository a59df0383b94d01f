use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Separator placed between joined workflow responses.
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default)]
    pub latency: Latency,
    /// Append workflow events to this file when set.
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            latency: Latency::default(),
            log_file: None,
        }
    }
}

fn default_separator() -> String {
    ", ".to_string()
}

/// Simulated transport delay for each backend.
///
/// The guide workflow carries no delay of its own; it rides the preferred
/// workflow's transport leg.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Latency {
    #[serde(default = "default_preferred_ms")]
    pub preferred_ms: u64,
    #[serde(default = "default_good_rx_ms")]
    pub good_rx_ms: u64,
    #[serde(default = "default_gaps_in_care_ms")]
    pub gaps_in_care_ms: u64,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            preferred_ms: default_preferred_ms(),
            good_rx_ms: default_good_rx_ms(),
            gaps_in_care_ms: default_gaps_in_care_ms(),
        }
    }
}

fn default_preferred_ms() -> u64 {
    300
}

fn default_good_rx_ms() -> u64 {
    200
}

fn default_gaps_in_care_ms() -> u64 {
    400
}

impl Latency {
    pub fn preferred(&self) -> Duration {
        Duration::from_millis(self.preferred_ms)
    }

    pub fn good_rx(&self) -> Duration {
        Duration::from_millis(self.good_rx_ms)
    }

    pub fn gaps_in_care(&self) -> Duration {
        Duration::from_millis(self.gaps_in_care_ms)
    }
}

impl Config {
    pub fn rxfan_dir() -> Result<PathBuf> {
        Ok(dirs::home_dir().ok_or(Error::NoHomeDir)?.join(".rxfan"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::rxfan_dir()?.join("rxfan.toml"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn save(&self) -> Result<()> {
        let dir = Self::rxfan_dir()?;
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        fs::write(Self::config_path()?, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}
