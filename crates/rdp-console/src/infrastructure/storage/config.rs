//! TOML-based configuration for the RDP console.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\RdpConsole\config.toml`
//! - Linux:    `~/.config/rdpconsole/config.toml`
//! - macOS:    `~/Library/Application Support/RdpConsole/config.toml`
//!
//! Fields annotated with `#[serde(default = "...")]` fall back to their
//! defaults when absent, so the console works on first run before a config
//! file exists.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::lifecycle::LifecycleConfig;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub defaults: SessionDefaults,
    #[serde(default)]
    pub timing: TimingConfig,
}

/// Connection parameters applied by `new` when the operator omits them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionDefaults {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_username")]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Remote desktop width in pixels.
    #[serde(default = "default_width")]
    pub width: u32,
    /// Remote desktop height in pixels.
    #[serde(default = "default_height")]
    pub height: u32,
    /// Whether new sessions start with their window hidden.
    #[serde(default)]
    pub start_hidden: bool,
}

/// Timing knobs for the connect handshake and input pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    /// Connect readiness timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Settle delay before hiding a start-hidden session, in milliseconds.
    #[serde(default = "default_hide_settle_ms")]
    pub hide_settle_ms: u64,
    /// Delay between key presses in `type`, in milliseconds.
    #[serde(default = "default_type_interval_ms")]
    pub type_interval_ms: u64,
    /// Number of interpolated moves in a drag.
    #[serde(default = "default_drag_steps")]
    pub drag_steps: u32,
    /// Delay after each interpolated drag move, in milliseconds.
    #[serde(default = "default_drag_step_delay_ms")]
    pub drag_step_delay_ms: u64,
    /// Settle delay around the drag's press and release, in milliseconds.
    #[serde(default = "default_drag_settle_ms")]
    pub drag_settle_ms: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_username() -> String {
    "Administrator".to_string()
}
fn default_password() -> String {
    String::new()
}
fn default_port() -> u16 {
    3389
}
fn default_width() -> u32 {
    1024
}
fn default_height() -> u32 {
    768
}
fn default_connect_timeout_secs() -> u64 {
    15
}
fn default_hide_settle_ms() -> u64 {
    1000
}
fn default_type_interval_ms() -> u64 {
    50
}
fn default_drag_steps() -> u32 {
    20
}
fn default_drag_step_delay_ms() -> u64 {
    10
}
fn default_drag_settle_ms() -> u64 {
    100
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            host: default_host(),
            username: default_username(),
            password: default_password(),
            port: default_port(),
            width: default_width(),
            height: default_height(),
            start_hidden: false,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            hide_settle_ms: default_hide_settle_ms(),
            type_interval_ms: default_type_interval_ms(),
            drag_steps: default_drag_steps(),
            drag_step_delay_ms: default_drag_step_delay_ms(),
            drag_settle_ms: default_drag_settle_ms(),
        }
    }
}

impl TimingConfig {
    /// Converts the connect-related knobs into a [`LifecycleConfig`].
    pub fn lifecycle_config(&self) -> LifecycleConfig {
        LifecycleConfig {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            hide_settle: Duration::from_millis(self.hide_settle_ms),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined from the environment.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .ok_or(ConfigError::NoPlatformConfigDir)
        .map(|dir| dir.join("config.toml"))
}

/// Loads `AppConfig` from disk, returning `AppConfig::default()` if the file
/// does not yet exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not
/// found", and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let path = config_file_path()?;

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Resolves the platform config base directory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("RdpConsole"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("rdpconsole"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("RdpConsole")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_the_rdp_conventions() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.defaults.port, 3389);
        assert_eq!(cfg.defaults.width, 1024);
        assert_eq!(cfg.defaults.height, 768);
        assert!(!cfg.defaults.start_hidden);
    }

    #[test]
    fn test_default_timing_matches_documented_values() {
        let cfg = TimingConfig::default();
        assert_eq!(cfg.connect_timeout_secs, 15);
        assert_eq!(cfg.drag_steps, 20);
        assert_eq!(cfg.drag_step_delay_ms, 10);
        assert_eq!(cfg.drag_settle_ms, 100);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        // Arrange
        let mut cfg = AppConfig::default();
        cfg.defaults.host = "192.168.1.10".to_string();
        cfg.timing.drag_steps = 40;

        // Act
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: AppConfig = toml::from_str(&toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg, restored);
    }

    #[test]
    fn test_partial_toml_fills_missing_fields_with_defaults() {
        // Arrange – only one field of one section present.
        let toml_str = "[defaults]\nhost = \"10.0.0.9\"\n";

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg.defaults.host, "10.0.0.9");
        assert_eq!(cfg.defaults.port, 3389);
        assert_eq!(cfg.timing.connect_timeout_secs, 15);
    }

    #[test]
    fn test_lifecycle_config_conversion() {
        let timing = TimingConfig::default();
        let lc = timing.lifecycle_config();
        assert_eq!(lc.connect_timeout, Duration::from_secs(15));
        assert_eq!(lc.hide_settle, Duration::from_millis(1000));
    }
}
