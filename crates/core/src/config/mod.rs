//! Dispatcher configuration
//!
//! Settings live in a TOML file that is created with defaults on first load.
//!
//! # Example
//!
//! ```ignore
//! use chatroute_core::{CommandRegistry, Dispatcher, DispatcherConfig};
//!
//! let config = DispatcherConfig::load()?;
//! let dispatcher = Dispatcher::from_config(CommandRegistry::new(), &config)?;
//! ```

mod loader;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::commands::DEFAULT_PREFIX;
use crate::permissions::{self, Permissions};
use crate::tasks::DEFAULT_IDLE_TIMEOUT;

pub use loader::{config_dir, config_path, CONFIG_DIR_ENV, CONFIG_FILE};

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// A permission name in the config is not known
    #[error("Unknown permission '{0}'")]
    UnknownPermission(String),

    /// Could not determine the config directory
    #[error("Config directory not available - set CHATROUTE_CONFIG_DIR")]
    NoConfigDirectory,
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Dispatcher configuration.
///
/// Loaded from `$CHATROUTE_CONFIG_DIR/chatroute.toml`, or
/// `./config/chatroute.toml` when the variable is not set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Enable debug logging
    pub debug: bool,

    /// Default command prefixes
    pub prefixes: Vec<String>,

    /// Reply with usage help when a message almost matched a command
    pub help_enabled: bool,

    /// Users allowed to run developer commands
    pub developers: Vec<u64>,

    /// Permissions every command needs, e.g. `"Send Messages"`
    pub generic_permissions: Vec<String>,

    /// How long an idle worker thread is kept, in milliseconds
    pub pool_idle_timeout_ms: u64,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            prefixes: vec![DEFAULT_PREFIX.to_string()],
            help_enabled: true,
            developers: Vec::new(),
            generic_permissions: Vec::new(),
            pool_idle_timeout_ms: DEFAULT_IDLE_TIMEOUT.as_millis() as u64,
        }
    }
}

impl DispatcherConfig {
    /// Load config from file, creating default if missing.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load config from `path`, creating default if missing.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::debug!("Loaded config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save_to(path)?;
            tracing::info!("Created default config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to file.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&config_path()?)
    }

    /// Save config to `path`.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved config to {:?}", path);
        Ok(())
    }

    /// Reload config from file.
    pub fn reload(&mut self) -> ConfigResult<()> {
        self.reload_from(&config_path()?)
    }

    /// Reload config from `path`.
    pub fn reload_from(&mut self, path: &Path) -> ConfigResult<()> {
        let content = std::fs::read_to_string(path)?;
        *self = toml::from_str(&content)?;
        tracing::debug!("Reloaded config from {:?}", path);
        Ok(())
    }

    /// Resolve `generic_permissions` into a permission set
    pub fn generic_permissions(&self) -> ConfigResult<Permissions> {
        permissions::parse_names(&self.generic_permissions).map_err(ConfigError::UnknownPermission)
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.pool_idle_timeout_ms)
    }
}
