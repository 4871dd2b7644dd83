//! Configuration loading for wavecalc.
//! Reads wavecalc.toml from the current directory or the path in WAVECALC_CONFIG.
//! A missing file falls back to built-in defaults.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Largest plot side in pixels; rasters hold one counter per pixel.
pub const MAX_PLOT_SIDE: u32 = 4096;

/// First path segments already routed by the server.
const RESERVED_PATHS: [&str; 6] = ["compute", "ws", "health", "test", "panel", "wave-test"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub panel: PanelConfig,
    #[serde(default)]
    pub wave: WaveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    /// Seconds a `/ws` client may stay silent before the server closes it.
    /// Zero disables the timeout.
    #[serde(default = "default_ws_idle_timeout")]
    pub ws_idle_timeout_secs: u64,
}

fn default_bind()            -> SocketAddr  { SocketAddr::from(([127, 0, 0, 1], 8000)) }
fn default_cors_origins()    -> Vec<String> { vec!["http://localhost:3000".to_string()] }
fn default_ws_idle_timeout() -> u64         { 300 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind:                 default_bind(),
            cors_origins:         default_cors_origins(),
            ws_idle_timeout_secs: default_ws_idle_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_sidebar_width")]
    pub sidebar_width: u32,
}

fn default_app_name()      -> String { "panel-test".to_string() }
fn default_title()         -> String { "Test Pipeline".to_string() }
fn default_sidebar_width() -> u32    { 350 }

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            app_name:      default_app_name(),
            title:         default_title(),
            sidebar_width: default_sidebar_width(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaveConfig {
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_x_min")]
    pub x_min: f64,
    #[serde(default = "default_x_max")]
    pub x_max: f64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "bool_true")]
    pub datashade: bool,
}

fn default_samples() -> usize { 1000 }
fn default_x_min()   -> f64   { 0.0 }
fn default_x_max()   -> f64   { 10.0 }
fn default_width()   -> u32   { 800 }
fn default_height()  -> u32   { 400 }
fn bool_true()       -> bool  { true }

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            samples:   default_samples(),
            x_min:     default_x_min(),
            x_max:     default_x_max(),
            width:     default_width(),
            height:    default_height(),
            datashade: bool_true(),
        }
    }
}

#[cfg(test)]
mod tests;

impl Config {
    /// Load configuration from wavecalc.toml.
    /// Checks WAVECALC_CONFIG env var first, then current directory, then
    /// applies WAVECALC_BIND / WAVECALC_CORS_ORIGINS overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("WAVECALC_CONFIG")
            .unwrap_or_else(|_| "wavecalc.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
            Self::from_toml(&content)?
        } else {
            tracing::info!("No config file at {}, using defaults", path);
            Self::default()
        };

        if let Ok(bind) = std::env::var("WAVECALC_BIND") {
            config.server.bind = bind.parse().map_err(|e| ConfigError::Invalid {
                key: "WAVECALC_BIND",
                reason: format!("{bind}: {e}"),
            })?;
        }
        if let Ok(origins) = std::env::var("WAVECALC_CORS_ORIGINS") {
            config.server.cors_origins = split_origins(&origins);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let wave = &self.wave;
        if !(wave.x_min.is_finite() && wave.x_max.is_finite()) || wave.x_max <= wave.x_min {
            return Err(ConfigError::Invalid {
                key: "wave.x_max",
                reason: format!("x range [{}, {}] is empty", wave.x_min, wave.x_max),
            });
        }
        if wave.samples < 2 {
            return Err(ConfigError::Invalid {
                key: "wave.samples",
                reason: format!("need at least 2 samples, got {}", wave.samples),
            });
        }
        if wave.width == 0 || wave.height == 0 {
            return Err(ConfigError::Invalid {
                key: "wave.width",
                reason: format!("plot size {}x{} has no area", wave.width, wave.height),
            });
        }
        if wave.width > MAX_PLOT_SIDE || wave.height > MAX_PLOT_SIDE {
            return Err(ConfigError::Invalid {
                key: "wave.width",
                reason: format!(
                    "plot size {}x{} exceeds {MAX_PLOT_SIDE}px per side",
                    wave.width, wave.height
                ),
            });
        }
        for origin in &self.server.cors_origins {
            check_origin(origin)?;
        }
        if self.panel.app_name.is_empty() || self.panel.app_name.contains('/') {
            return Err(ConfigError::Invalid {
                key: "panel.app_name",
                reason: format!("{:?} is not a single path segment", self.panel.app_name),
            });
        }
        if RESERVED_PATHS.contains(&self.panel.app_name.as_str()) {
            return Err(ConfigError::Invalid {
                key: "panel.app_name",
                reason: format!("{:?} collides with a built-in route", self.panel.app_name),
            });
        }
        Ok(())
    }
}

/// CORS is sent with credentials, so origins must be listed explicitly and
/// be usable as a header value.
fn check_origin(origin: &str) -> Result<(), ConfigError> {
    let reason = if origin == "*" {
        "wildcard origins cannot be combined with credentials"
    } else if origin.is_empty() || !origin.bytes().all(|b| b.is_ascii_graphic()) {
        "not a valid header value"
    } else {
        return Ok(());
    };
    Err(ConfigError::Invalid {
        key: "server.cors_origins",
        reason: format!("{origin:?}: {reason}"),
    })
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
