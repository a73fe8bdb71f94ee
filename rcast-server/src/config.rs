//! Configuration for the rcast server.

use std::path::Path;

use rcast_core::CastError;
use serde::{Deserialize, Serialize};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Screen capture and encoding settings.
    pub capture: CaptureConfig,
    /// Timeouts.
    pub timeouts: TimeoutConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address to bind the TCP listener on.
    pub host: String,
    /// TCP port to listen on.
    pub port: u16,
    /// Maximum concurrent client sessions.
    pub max_sessions: usize,
}

/// Capture and encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Uniform downscale factor applied before compression (0, 1].
    pub scale: f64,
    /// JPEG quality (1..=100).
    pub quality: u8,
    /// Target frames per second.
    pub frame_rate: u32,
    /// DXGI acquire timeout in milliseconds.
    pub capture_timeout_ms: u32,
}

/// Timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// How long a command read may idle before the loop re-checks
    /// the session state, in milliseconds.
    pub command_read_timeout_ms: u64,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            capture: CaptureConfig::default(),
            timeouts: TimeoutConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 9999,
            max_sessions: 5,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            scale: 0.5,
            quality: 50,
            frame_rate: 30,
            capture_timeout_ms: 100,
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            command_read_timeout_ms: 5000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into() }
    }
}

// ── Loading and validation ───────────────────────────────────────

impl ServerConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Reject out-of-range values before the server starts.
    pub fn validate(&self) -> Result<(), CastError> {
        if !(self.capture.scale > 0.0 && self.capture.scale <= 1.0) {
            return Err(CastError::InvalidConfig(format!(
                "capture.scale must be in (0, 1], got {}",
                self.capture.scale
            )));
        }
        if !(1..=100).contains(&self.capture.quality) {
            return Err(CastError::InvalidConfig(format!(
                "capture.quality must be 1..=100, got {}",
                self.capture.quality
            )));
        }
        if self.capture.frame_rate == 0 {
            return Err(CastError::InvalidConfig(
                "capture.frame_rate must be at least 1".into(),
            ));
        }
        if self.network.max_sessions == 0 {
            return Err(CastError::InvalidConfig(
                "network.max_sessions must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
