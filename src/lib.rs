//! camtether: wired and access-point control of action cameras
//!
//! This crate finds the local network interface that reaches a USB-tethered
//! camera, binds an HTTP transport to it, negotiates wired control mode and
//! drives the camera's live stream on behalf of a video consumer.
//!
//! # Features
//! - Interface selection by the camera's serial-derived address
//! - Interface-bound HTTP transports with separate AP and wired timeout profiles
//! - Bounded-retry reconnection on USB attach, with fallback to AP on detach
//! - Deadline-guarded stream start/stop that tolerates overlapping calls
//!
//! # Usage
//! ```rust,no_run
//! use camtether::{CameraSession, LogSink, SystemNetwork, TetherConfig};
//! use std::sync::Arc;
//!
//! # async fn run() -> camtether::Result<()> {
//! let session = CameraSession::new(
//!     TetherConfig::load_or_default(),
//!     Arc::new(SystemNetwork::new()),
//!     Arc::new(LogSink),
//! )?;
//! if session.request_stream().await {
//!     println!("streaming from {}", session.endpoint());
//! }
//! # Ok(())
//! # }
//! ```
pub mod commands;
pub mod config;
pub mod control;
pub mod errors;
pub mod link;
pub mod net;
pub mod platform;
pub mod reconnect;
pub mod session;
pub mod stream;
pub mod types;

// Scripted fakes - available for external tests
pub mod testing;

// Re-exports for convenience
pub use config::TetherConfig;
pub use control::{CameraCommand, CameraControl, CameraControlClient};
pub use errors::{ControlFailure, Result, TetherError};
pub use net::{select, Transport, TransportFactory};
pub use platform::{DeviceEvent, DeviceMonitor, SysfsUsb, SystemNetwork};
pub use reconnect::{ReconnectState, ReconnectSupervisor};
pub use session::{BlockingSession, CameraSession};
pub use stream::{LogSink, StreamSession, VideoSink};
pub use types::{
    CameraEndpoint, CameraIdentity, DeviceDescriptor, LinkStatus, NetworkInterfaceDescriptor,
    RetryBudget, StreamState, TransportProfile,
};

/// Initialize logging for camtether
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "camtether=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}
