//! repl-breakpoint configuration
//!
//! User-level settings for the REPL and the logger.
//!
//! # Configuration hierarchy
//!
//! ```text
//! Priority (high → low):
//! 1. Options set by the embedding program or CLI arguments
//! 2. User-level (~/.config/repl-breakpoint/config.toml)
//! 3. Default values
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use repl_breakpoint::util::config::{load_user_config, UserConfig};
//!
//! let config = load_user_config().unwrap_or_default();
//! println!("prompt: {:?}", config.repl.prompt);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::repl::line::{EditorConfig, MAX_LINE_LENGTH};
use crate::util::logger::LogLevel;

/// Directory name under the platform config directory
const CONFIG_DIR_NAME: &str = "repl-breakpoint";

/// User-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// REPL settings
    #[serde(default)]
    pub repl: ReplConfig,
    /// Log settings
    #[serde(default)]
    pub log: LogConfig,
}

/// REPL configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Suppress the intro banner
    #[serde(default)]
    pub quiet: bool,
    /// Prompt string
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Spaces per nesting level in the continuation prompt
    #[serde(default = "default_indent_width")]
    pub indent_width: usize,
    /// Longer input lines are truncated
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,
    /// History file path
    #[serde(default)]
    pub history_file: Option<PathBuf>,
    /// History size
    #[serde(default = "default_history_size")]
    pub history_size: usize,
    /// Use the line editor when standard input is interactive
    #[serde(default = "default_line_editor")]
    pub line_editor: bool,
}

fn default_prompt() -> String {
    "> ".to_string()
}

fn default_indent_width() -> usize {
    4
}

fn default_max_line_length() -> usize {
    MAX_LINE_LENGTH
}

fn default_history_size() -> usize {
    1000
}

fn default_line_editor() -> bool {
    true
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            prompt: default_prompt(),
            indent_width: default_indent_width(),
            max_line_length: default_max_line_length(),
            history_file: None,
            history_size: default_history_size(),
            line_editor: default_line_editor(),
        }
    }
}

impl ReplConfig {
    /// Settings for the rustyline-backed input source
    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            history_file: self.history_file.clone(),
            history_size: self.history_size,
            vi_mode: false,
        }
    }
}

/// Log configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Minimum level written to standard error
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    // Try XDG config directory on Unix
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join(CONFIG_DIR_NAME));
    }

    // Fallback to ~/.config/repl-breakpoint
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join(CONFIG_DIR_NAME));
    }

    None
}

/// Get the user config file path (~/.config/repl-breakpoint/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Check if user config exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}

/// Load user-level configuration
/// Returns default config if file doesn't exist
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    match get_config_path() {
        Some(path) => load_config_from(&path),
        None => Ok(UserConfig::default()),
    }
}

/// Load configuration from an explicit path
/// Returns default config if file doesn't exist
pub fn load_config_from(path: &Path) -> Result<UserConfig, ConfigError> {
    if !path.exists() {
        debug!("no config at {}, using defaults", path.display());
        return Ok(UserConfig::default());
    }

    let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;
    debug!("loaded config from {}", path.display());

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Save user-level configuration
pub fn save_user_config(config: &UserConfig) -> Result<(), ConfigError> {
    let path = get_config_path().ok_or(ConfigError::NoConfigDir)?;
    save_config_to(config, &path)
}

/// Save configuration to an explicit path, creating parent directories
pub fn save_config_to(
    config: &UserConfig,
    path: &Path,
) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(ConfigError::IoError)?;
        }
    }

    let content = toml::to_string_pretty(config).map_err(ConfigError::SerializeError)?;
    fs::write(path, content).map_err(ConfigError::IoError)?;

    Ok(())
}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(toml::de::Error),
    SerializeError(toml::ser::Error),
    NoConfigDir,
}

impl std::fmt::Display for ConfigError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Config parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Config serialize error: {}", e),
            ConfigError::NoConfigDir => write!(f, "Cannot determine config directory"),
        }
    }
}

impl std::error::Error for ConfigError {}
