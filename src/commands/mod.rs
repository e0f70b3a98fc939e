//! Consumer-facing commands
//!
//! Thin async wrappers over a [`CameraSession`](crate::session::CameraSession)
//! that log, flatten errors to strings and return serializable info structs,
//! ready to be bridged into whatever UI layer hosts the stream.

pub mod device_monitor;
pub mod recording;
pub mod stream;

pub use device_monitor::*;
pub use recording::*;
pub use stream::*;
