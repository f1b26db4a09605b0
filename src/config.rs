use crate::error::{ClassroomError, ClassroomResult};
use crate::logger::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the data root
pub const DATA_ROOT_ENV: &str = "CLASSROOM_DATA_ROOT";

/// Environment variable overriding the log level
pub const LOG_LEVEL_ENV: &str = "CLASSROOM_LOG_LEVEL";

const DEFAULT_DATA_ROOT: &str = "data";

/// Storage configuration for the file-backed repositories
///
/// Each entity collection lives in its own directory under `data_root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    pub data_root: PathBuf,
    #[serde(default)]
    pub log_level: LogLevel,
}

impl StoreConfig {
    /// Create a builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }

    /// Load configuration from `CLASSROOM_DATA_ROOT` / `CLASSROOM_LOG_LEVEL`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> ClassroomResult<Self> {
        let mut builder = StoreConfigBuilder::new();

        if let Ok(root) = std::env::var(DATA_ROOT_ENV) {
            builder = builder.data_root(root);
        }

        if let Ok(level) = std::env::var(LOG_LEVEL_ENV) {
            builder = builder.log_level_str(&level)?;
        }

        builder.build()
    }

    pub fn students_dir(&self) -> PathBuf {
        self.data_root.join("students")
    }

    pub fn assignments_dir(&self) -> PathBuf {
        self.data_root.join("assignments")
    }

    pub fn questions_dir(&self) -> PathBuf {
        self.data_root.join("questions")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            log_level: LogLevel::default(),
        }
    }
}

/// Builder for constructing StoreConfig instances with a fluent API
///
/// # Example
/// ```
/// use classroom_core::config::StoreConfig;
/// use classroom_core::logger::LogLevel;
///
/// let config = StoreConfig::builder()
///     .data_root("/var/lib/classroom")
///     .log_level(LogLevel::Debug)
///     .build()
///     .unwrap();
///
/// assert!(config.students_dir().ends_with("students"));
/// ```
#[derive(Debug)]
pub struct StoreConfigBuilder {
    data_root: Option<PathBuf>,
    log_level: LogLevel,
}

impl StoreConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            data_root: None,
            log_level: LogLevel::default(),
        }
    }

    /// Set the directory that holds one sub-directory per collection
    pub fn data_root(mut self, root: impl AsRef<Path>) -> Self {
        self.data_root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Set the log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set the log level from its textual name
    pub fn log_level_str(mut self, level: &str) -> ClassroomResult<Self> {
        self.log_level = LogLevel::from_str(level)
            .ok_or_else(|| ClassroomError::ConfigError(format!("Unknown log level: {}", level)))?;
        Ok(self)
    }

    /// Build the configuration
    ///
    /// # Errors
    /// Returns `ConfigError` if the data root is empty.
    pub fn build(self) -> ClassroomResult<StoreConfig> {
        let data_root = self
            .data_root
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_ROOT));

        if data_root.as_os_str().is_empty() {
            return Err(ClassroomError::ConfigError(
                "Data root must not be empty".to_string(),
            ));
        }

        Ok(StoreConfig {
            data_root,
            log_level: self.log_level,
        })
    }
}

impl Default for StoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
