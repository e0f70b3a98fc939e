//! Configuration management for camtether
//!
//! Every value has a compiled-in default matching the camera's wire contract,
//! so a config file is optional. When one is present it is plain TOML.

use crate::errors::TetherError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetherConfig {
    pub camera: CameraConfig,
    pub transport: TransportConfig,
    pub reconnect: ReconnectConfig,
    pub stream: StreamConfig,
    pub monitor: MonitorConfig,
}

/// Camera addressing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Base URL when the camera is its own Wi-Fi access point
    pub ap_base_url: String,
    /// Wired base URL; `X`, `Y`, `Z` are replaced by the serial's last three characters
    pub wired_base_url_template: String,
    /// Address fragment the host side of the wired link carries, same substitution
    pub wired_address_template: String,
    /// Endpoint handed to the video sink once streaming starts
    pub stream_url: String,
}

/// HTTP timeout profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportConfig {
    pub ap_connect_timeout_ms: u64,
    pub ap_read_timeout_ms: u64,
    /// Applied to connect, read and whole-request on interface-bound transports
    pub wired_timeout_ms: u64,
}

/// Wired reconnection retry budget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

/// Stream session timings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Overall deadline for one request/stop operation
    pub deadline_ms: u64,
    /// Wait after stopping recording before starting the stream
    pub settle_delay_ms: u64,
    /// Wait between attempts in `keep_streaming`
    pub restart_delay_ms: u64,
}

/// USB device polling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub poll_interval_ms: u64,
}

impl Default for TetherConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                ap_base_url: "http://10.5.5.9:8080/".to_string(),
                wired_base_url_template: "http://172.2X.1YZ.51:8080/".to_string(),
                wired_address_template: "172.2X.1YZ.5".to_string(),
                stream_url: "udp://@0.0.0.0:8554".to_string(),
            },
            transport: TransportConfig {
                ap_connect_timeout_ms: 10_000,
                ap_read_timeout_ms: 30_000,
                wired_timeout_ms: 60_000,
            },
            reconnect: ReconnectConfig {
                max_attempts: 5,
                interval_ms: 3_000,
            },
            stream: StreamConfig {
                deadline_ms: 10_000,
                settle_delay_ms: 2_000,
                restart_delay_ms: 1_000,
            },
            monitor: MonitorConfig {
                poll_interval_ms: 2_000,
            },
        }
    }
}

impl TransportConfig {
    pub fn ap_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.ap_connect_timeout_ms)
    }

    pub fn ap_read_timeout(&self) -> Duration {
        Duration::from_millis(self.ap_read_timeout_ms)
    }

    pub fn wired_timeout(&self) -> Duration {
        Duration::from_millis(self.wired_timeout_ms)
    }
}

impl ReconnectConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl StreamConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl TetherConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, TetherError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| TetherError::Config(format!("Failed to read config file: {}", e)))?;

        let config: TetherConfig = toml::from_str(&contents)
            .map_err(|e| TetherError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(TetherError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), TetherError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TetherError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| TetherError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| TetherError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("camtether.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        for (name, template) in [
            ("wired_base_url_template", &self.camera.wired_base_url_template),
            ("wired_address_template", &self.camera.wired_address_template),
        ] {
            for marker in ['X', 'Y', 'Z'] {
                if !template.contains(marker) {
                    return Err(format!("{} is missing the '{}' position", name, marker));
                }
            }
        }
        if !self.camera.ap_base_url.ends_with('/') {
            return Err("ap_base_url must end with '/'".to_string());
        }
        if !self.camera.wired_base_url_template.ends_with('/') {
            return Err("wired_base_url_template must end with '/'".to_string());
        }
        if self.camera.stream_url.is_empty() {
            return Err("stream_url must not be empty".to_string());
        }

        if self.transport.ap_connect_timeout_ms == 0
            || self.transport.ap_read_timeout_ms == 0
            || self.transport.wired_timeout_ms == 0
        {
            return Err("Transport timeouts must be non-zero".to_string());
        }

        if self.reconnect.max_attempts == 0 || self.reconnect.max_attempts > 100 {
            return Err("Reconnect attempts must be between 1 and 100".to_string());
        }

        if self.stream.deadline_ms == 0 {
            return Err("Stream deadline must be non-zero".to_string());
        }
        if self.stream.settle_delay_ms >= self.stream.deadline_ms {
            return Err("Settle delay must be shorter than the stream deadline".to_string());
        }

        if self.monitor.poll_interval_ms == 0 {
            return Err("Monitor poll interval must be non-zero".to_string());
        }

        Ok(())
    }
}
