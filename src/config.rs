//! Miner configuration
//!
//! Settings live in a JSON file. Missing fields take their defaults, so a
//! partial file is valid.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::algorithm::{AesPath, RacePolicy, Variant, NONCE_OFFSET};

/// File name under the config directory
pub const CONFIG_FILE: &str = "config.json";

/// Seconds between hashrate reports
pub const DEFAULT_REPORT_INTERVAL: u64 = 5;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write config {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no config directory on this platform")]
    NoConfigDir,
}

/// Which hash the miner runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Cryptonight,
    Cryptolight,
}

impl From<Algorithm> for Variant {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Cryptonight => Variant::Full,
            Algorithm::Cryptolight => Variant::Light,
        }
    }
}

impl From<Variant> for Algorithm {
    fn from(variant: Variant) -> Self {
        match variant {
            Variant::Full => Algorithm::Cryptonight,
            Variant::Light => Algorithm::Cryptolight,
        }
    }
}

/// How concurrent finds are settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Race {
    #[default]
    FirstFound,
    Lowest,
}

impl From<Race> for RacePolicy {
    fn from(race: Race) -> Self {
        match race {
            Race::FirstFound => RacePolicy::FirstFound,
            Race::Lowest => RacePolicy::Lowest,
        }
    }
}

/// Command-line settings layered over the file.
///
/// `None` and `false` leave the file value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Overrides {
    pub threads: Option<usize>,
    pub algorithm: Option<Algorithm>,
    /// Force the software AES round
    pub software_aes: bool,
    pub race: Option<Race>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MinerConfig {
    /// Worker threads; 0 means one per logical CPU
    pub threads: usize,
    pub algorithm: Algorithm,
    /// Use AES instructions when the CPU has them
    pub hardware_aes: bool,
    /// Seconds between hashrate reports
    pub report_interval: u64,
    pub race: Race,
    /// Byte offset of the 32-bit nonce in the hashing blob
    pub nonce_offset: usize,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            algorithm: Algorithm::default(),
            hardware_aes: true,
            report_interval: DEFAULT_REPORT_INTERVAL,
            race: Race::default(),
            nonce_offset: NONCE_OFFSET,
        }
    }
}

impl MinerConfig {
    /// Thread count with 0 resolved to the CPU count
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    pub fn variant(&self) -> Variant {
        self.algorithm.into()
    }

    /// AES path after host detection
    pub fn aes_path(&self) -> AesPath {
        AesPath::select(self.hardware_aes)
    }

    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(threads) = overrides.threads {
            self.threads = threads;
        }
        if let Some(algorithm) = overrides.algorithm {
            self.algorithm = algorithm;
        }
        if overrides.software_aes {
            self.hardware_aes = false;
        }
        if let Some(race) = overrides.race {
            self.race = race;
        }
        self
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, or the default location. A missing default file yields defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Ok(path) if path.exists() => Self::load(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(write_err)
    }
}

/// `<config dir>/cryptonight/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join("cryptonight").join(CONFIG_FILE))
        .ok_or(ConfigError::NoConfigDir)
}
