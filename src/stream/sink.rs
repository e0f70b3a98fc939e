/// Consumer that renders the stream.
///
/// Called from worker tasks; implementations hop to their own UI context if
/// they need one.
pub trait VideoSink: Send + Sync {
    /// Stream is live and can be consumed at `url`
    fn set_stream_endpoint(&self, url: &str);

    fn set_buffering_state(&self, buffering: bool);

    /// Stream was stopped; the last endpoint is no longer valid
    fn clear_stream_endpoint(&self) {}
}

/// Sink that only logs, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl VideoSink for LogSink {
    fn set_stream_endpoint(&self, url: &str) {
        log::info!("Stream available at {}", url);
    }

    fn set_buffering_state(&self, buffering: bool) {
        log::debug!("Buffering: {}", buffering);
    }

    fn clear_stream_endpoint(&self) {
        log::info!("Stream endpoint cleared");
    }
}
