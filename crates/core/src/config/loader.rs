//! Config path resolution
//!
//! The config directory comes from `CHATROUTE_CONFIG_DIR` when set, and is
//! `./config` otherwise.

use std::ffi::OsString;
use std::path::PathBuf;

use super::{ConfigError, ConfigResult};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "CHATROUTE_CONFIG_DIR";

/// File name of the dispatcher config
pub const CONFIG_FILE: &str = "chatroute.toml";

/// Returns the config directory.
pub fn config_dir() -> ConfigResult<PathBuf> {
    resolve_dir(std::env::var_os(CONFIG_DIR_ENV), std::env::current_dir().ok())
}

/// Returns the dispatcher config path.
///
/// Path: `{config_dir}/chatroute.toml`
pub fn config_path() -> ConfigResult<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

fn resolve_dir(env: Option<OsString>, cwd: Option<PathBuf>) -> ConfigResult<PathBuf> {
    match env.filter(|dir| !dir.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => cwd
            .map(|cwd| cwd.join("config"))
            .ok_or(ConfigError::NoConfigDirectory),
    }
}
