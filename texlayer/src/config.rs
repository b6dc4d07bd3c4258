//! Engine configuration.
//!
//! Settings live in an INI file, by default
//! `~/.config/texlayer/config.ini` on Linux:
//!
//! ```ini
//! [engine]
//! parallel_threshold = 16384
//! ; 0 shares rayon's global pool
//! worker_threads = 0
//!
//! [logging]
//! level = info
//! directory = /var/log/texlayer
//! ```
//!
//! Missing files, sections and keys fall back to defaults.

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use crate::frame::DEFAULT_PARALLEL_THRESHOLD;

/// Directory name under the platform config directory.
pub const CONFIG_DIR_NAME: &str = "texlayer";

/// Name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Upper bound for `worker_threads`.
pub const MAX_WORKER_THREADS: usize = 256;

const ENGINE_SECTION: &str = "engine";
const LOGGING_SECTION: &str = "logging";

/// Errors raised while loading, validating or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or parsed.
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    /// The file could not be written.
    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A setting has an unusable value.
    #[error("invalid value '{value}' for {section}.{key}: {reason}")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings for frame execution and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Areas with more points than this are transformed in parallel.
    pub parallel_threshold: usize,

    /// Size of a dedicated transform pool; `None` shares rayon's global pool.
    pub worker_threads: Option<usize>,

    /// Log level or `tracing` filter directive.
    pub log_level: String,

    /// Directory for rolling log files; `None` logs to stderr only.
    pub log_directory: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            worker_threads: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_directory: None,
        }
    }
}

impl EngineConfig {
    /// Load from the default path, or defaults when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load and validate the file at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_ini(&ini)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded configuration");
        Ok(config)
    }

    /// Read settings from parsed INI data.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(engine) = ini.section(Some(ENGINE_SECTION)) {
            if let Some(value) = engine.get("parallel_threshold") {
                config.parallel_threshold = parse_value(ENGINE_SECTION, "parallel_threshold", value)?;
            }
            if let Some(value) = engine.get("worker_threads") {
                let threads: usize = parse_value(ENGINE_SECTION, "worker_threads", value)?;
                config.worker_threads = (threads > 0).then_some(threads);
            }
        }

        if let Some(logging) = ini.section(Some(LOGGING_SECTION)) {
            if let Some(value) = logging.get("level") {
                config.log_level = value.trim().to_string();
            }
            if let Some(value) = logging.get("directory") {
                let value = value.trim();
                config.log_directory = (!value.is_empty()).then(|| PathBuf::from(value));
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// The settings as INI data.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some(ENGINE_SECTION))
            .set("parallel_threshold", self.parallel_threshold.to_string())
            .set("worker_threads", self.worker_threads.unwrap_or(0).to_string());

        let directory = self
            .log_directory
            .as_ref()
            .map(|dir| dir.display().to_string())
            .unwrap_or_default();
        ini.with_section(Some(LOGGING_SECTION))
            .set("level", self.log_level.as_str())
            .set("directory", directory);
        ini
    }

    /// Write the settings to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        self.to_ini().write_to_file(path).map_err(write_error)
    }

    /// Check that every setting is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.parallel_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                section: ENGINE_SECTION,
                key: "parallel_threshold",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if let Some(threads) = self.worker_threads {
            if threads > MAX_WORKER_THREADS {
                return Err(ConfigError::InvalidValue {
                    section: ENGINE_SECTION,
                    key: "worker_threads",
                    value: threads.to_string(),
                    reason: format!("must be at most {}", MAX_WORKER_THREADS),
                });
            }
        }

        if self.log_level.is_empty() {
            return Err(ConfigError::InvalidValue {
                section: LOGGING_SECTION,
                key: "level",
                value: String::new(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_value<T>(section: &'static str, key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidValue {
            section,
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

/// The directory holding the configuration file.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Full path of the default configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.parallel_threshold, 128 * 128);
        assert_eq!(config.worker_threads, None);
        assert_eq!(config.log_level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let ini = Ini::load_from_str("[engine]\nworker_threads = 4\n").unwrap();
        let config = EngineConfig::from_ini(&ini).unwrap();
        assert_eq!(config.worker_threads, Some(4));
        assert_eq!(config.parallel_threshold, DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(config.log_directory, None);
    }

    #[test]
    fn test_zero_workers_means_shared_pool() {
        let ini = Ini::load_from_str("[engine]\nworker_threads = 0\n").unwrap();
        assert_eq!(EngineConfig::from_ini(&ini).unwrap().worker_threads, None);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let ini = Ini::load_from_str("[engine]\nparallel_threshold = lots\n").unwrap();
        assert!(matches!(
            EngineConfig::from_ini(&ini),
            Err(ConfigError::InvalidValue { key: "parallel_threshold", .. })
        ));

        let ini = Ini::load_from_str("[engine]\nparallel_threshold = 0\n").unwrap();
        assert!(EngineConfig::from_ini(&ini).is_err());

        let ini = Ini::load_from_str("[engine]\nworker_threads = 1000\n").unwrap();
        assert!(EngineConfig::from_ini(&ini).is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = EngineConfig {
            parallel_threshold: 4096,
            worker_threads: Some(3),
            log_level: "texlayer=debug".to_string(),
            log_directory: Some(dir.path().join("logs")),
        };

        config.save_to(&path).unwrap();
        assert_eq!(EngineConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            EngineConfig::load_from(&dir.path().join("absent.ini")),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_config_file_path_ends_with_app_dir() {
        let path = config_file_path();
        assert!(path.ends_with(Path::new(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)));
    }
}
