//! Configuration module for Macsweep
//!
//! Configuration hierarchy:
//! 1. CLI flags (highest priority)
//! 2. Environment variables (MACSWEEP_*)
//! 3. User config (~/.config/macsweep/config.toml)
//! 4. Built-in defaults (lowest priority)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SweepResult;

/// Color output mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    #[default]
    Auto,
    Always,
    Never,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Rows of items shown per menu page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    #[serde(default)]
    pub color: ColorMode,

    /// Allow unicode icons when the terminal supports them
    #[serde(default = "default_true")]
    pub unicode: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            color: ColorMode::default(),
            unicode: true,
        }
    }
}

fn default_page_size() -> usize {
    10
}

fn default_true() -> bool {
    true
}

/// Privileged session timing configuration.
///
/// Defaults are tuned to the stock macOS sudo timestamp_timeout of 5
/// minutes; treat them as knobs, not contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds to wait after the initial prompt before the first refresh
    #[serde(default = "default_initial_delay")]
    pub initial_delay_secs: u64,

    /// Seconds between successful refreshes (must undercut the sudo TTL)
    #[serde(default = "default_refresh")]
    pub refresh_secs: u64,

    /// Refresh attempts before the keepalive gives up
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds between failed refresh attempts
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay(),
            refresh_secs: default_refresh(),
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff(),
        }
    }
}

fn default_initial_delay() -> u64 {
    5
}

fn default_refresh() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    2
}

/// Catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Extra catalog file merged over the builtin entries
    #[serde(default)]
    pub extra: Option<PathBuf>,
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> SweepResult<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from the default user location, falling back to defaults
    pub fn load_or_default() -> Self {
        let loaded = Self::user_config_path()
            .filter(|p| p.exists())
            .and_then(|p| Self::load(&p).ok());
        loaded.unwrap_or_else(|| {
            let mut config = Self::default();
            config.apply_env();
            config
        })
    }

    /// Default user config path (~/.config/macsweep/config.toml)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("macsweep").join("config.toml"))
    }

    /// Apply MACSWEEP_* environment overrides on top of file values
    fn apply_env(&mut self) {
        if let Some(v) = env_parse::<usize>("MACSWEEP_PAGE_SIZE") {
            if v > 0 {
                self.ui.page_size = v;
            }
        }
        if let Some(v) = env_parse::<u64>("MACSWEEP_REFRESH_SECS") {
            self.session.refresh_secs = v;
        }
        if let Ok(v) = std::env::var("MACSWEEP_COLOR") {
            self.ui.color = match v.to_lowercase().as_str() {
                "always" => ColorMode::Always,
                "never" => ColorMode::Never,
                _ => ColorMode::Auto,
            };
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Whether an enclosing caller already owns the alternate screen.
///
/// When set, the menu controller must not enter or leave the alternate
/// screen itself (see the shared-resource policy on alt-screen ownership).
pub fn managed_screen() -> bool {
    std::env::var("MACSWEEP_MANAGED_SCREEN").is_ok_and(|v| v == "1" || v == "true")
}

/// Whether side-channel debug diagnostics are enabled.
pub fn debug_enabled() -> bool {
    std::env::var("MACSWEEP_DEBUG").is_ok_and(|v| !v.is_empty() && v != "0")
}
