//! Live stream lifecycle

pub mod session;
pub mod sink;

pub use session::StreamSession;
pub use sink::{LogSink, VideoSink};
