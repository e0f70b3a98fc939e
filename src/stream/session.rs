use crate::config::StreamConfig;
use crate::control::{fire_and_forget, CameraCommand, Params};
use crate::errors::TetherError;
use crate::link::ActiveLink;
use crate::stream::VideoSink;
use crate::types::StreamState;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

struct Transitions {
    generation: u64,
}

/// Gates "request stream" / "stop stream" against the active camera link.
///
/// Overlapping calls are allowed. Every call takes a ticket when it starts;
/// when it finishes it only writes the state if no newer call has started in
/// the meantime, so the most recently issued intent owns the state. The lock
/// guarding tickets is never held across an await.
pub struct StreamSession {
    link: Arc<ActiveLink>,
    sink: Arc<dyn VideoSink>,
    timings: StreamConfig,
    stream_url: String,
    transitions: Mutex<Transitions>,
    state: watch::Sender<StreamState>,
    cancel: CancellationToken,
}

impl StreamSession {
    pub fn new(
        link: Arc<ActiveLink>,
        sink: Arc<dyn VideoSink>,
        timings: StreamConfig,
        stream_url: impl Into<String>,
    ) -> Self {
        let (state, _) = watch::channel(StreamState::Idle);
        Self {
            link,
            sink,
            timings,
            stream_url: stream_url.into(),
            transitions: Mutex::new(Transitions { generation: 0 }),
            state,
            cancel: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<StreamState> {
        self.state.subscribe()
    }

    fn transitions(&self) -> std::sync::MutexGuard<'_, Transitions> {
        match self.transitions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Enter `target`, returning the ticket and the state it replaced
    fn begin(&self, target: StreamState) -> (u64, StreamState) {
        let mut transitions = self.transitions();
        transitions.generation += 1;
        let previous = self.state.send_replace(target);
        log::info!("Stream state {} -> {}", previous, target);
        (transitions.generation, previous)
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.transitions().generation == ticket
    }

    /// Leave the in-flight state for `target` unless a newer call took over
    fn finish(&self, ticket: u64, target: StreamState) -> bool {
        let transitions = self.transitions();
        if transitions.generation != ticket {
            log::debug!("Stream call {} superseded, not entering {}", ticket, target);
            return false;
        }
        let previous = self.state.send_replace(target);
        log::info!("Stream state {} -> {}", previous, target);
        true
    }

    /// Start (or restart) streaming. `true` only if the camera confirmed the
    /// start within the deadline.
    pub async fn request_stream(&self) -> bool {
        self.start_stream_detailed().await.is_ok()
    }

    /// Stop streaming. `true` only if the camera confirmed within the deadline.
    pub async fn stop_stream(&self) -> bool {
        self.stop_stream_detailed().await.is_ok()
    }

    /// [`request_stream`](Self::request_stream) with the failure reason.
    ///
    /// Sequence: stop recording (fire-and-forget), settle, start stream. The
    /// deadline covers all three; on expiry the start call is dropped. If a
    /// newer request or stop arrives during the settle delay, the start
    /// command is never sent and [`TetherError::Superseded`] is returned.
    pub async fn start_stream_detailed(&self) -> Result<(), TetherError> {
        let (ticket, _) = self.begin(StreamState::Starting);
        let control = self.link.current();
        let deadline = self.timings.deadline();
        self.sink.set_buffering_state(true);

        let outcome = tokio::time::timeout(deadline, async {
            // Recording and streaming are exclusive camera modes.
            fire_and_forget(
                control.clone(),
                CameraCommand::StopRecording,
                self.cancel.child_token(),
            );
            tokio::time::sleep(self.timings.settle_delay()).await;
            // The camera must not receive a start issued before a newer intent.
            if !self.is_current(ticket) {
                return Err(TetherError::Superseded);
            }
            control
                .call(CameraCommand::StartStream, &Params::new())
                .await
                .map_err(TetherError::Control)
        })
        .await;

        let result = match outcome {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(TetherError::DeadlineExceeded(deadline)),
        };

        match &result {
            Ok(()) => {
                log::info!("Stream started on {}", control.endpoint());
                if self.finish(ticket, StreamState::Streaming) {
                    self.sink.set_stream_endpoint(&self.stream_url);
                }
            }
            Err(TetherError::Superseded) => {
                log::info!("Stream start {} superseded before reaching the camera", ticket);
            }
            Err(e) => {
                log::error!("Failed to start stream: {}", e);
                if self.finish(ticket, StreamState::Idle) {
                    self.sink.set_buffering_state(false);
                }
            }
        }

        result
    }

    /// [`stop_stream`](Self::stop_stream) with the failure reason.
    ///
    /// The stop command is always sent, even from `Idle`; the camera treats a
    /// redundant stop as a no-op. On failure the previous state is restored.
    pub async fn stop_stream_detailed(&self) -> Result<(), TetherError> {
        let (ticket, previous) = self.begin(StreamState::Stopping);
        let control = self.link.current();
        let deadline = self.timings.deadline();

        let outcome = tokio::time::timeout(
            deadline,
            control.call(CameraCommand::StopStream, &Params::new()),
        )
        .await;

        let result = match outcome {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(failure)) => Err(TetherError::Control(failure)),
            Err(_) => Err(TetherError::DeadlineExceeded(deadline)),
        };

        match &result {
            Ok(()) => {
                log::info!("Stream stopped on {}", control.endpoint());
                if self.finish(ticket, StreamState::Idle) {
                    self.sink.set_buffering_state(false);
                    self.sink.clear_stream_endpoint();
                }
            }
            Err(e) => {
                log::error!("Failed to stop stream: {}", e);
                self.finish(ticket, previous);
            }
        }

        result
    }

    /// Retry [`request_stream`](Self::request_stream) until it succeeds, a
    /// newer request or stop takes over, or `cancel` fires. Returns whether
    /// the stream ended up started.
    pub async fn keep_streaming(&self, cancel: CancellationToken) -> bool {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            tokio::select! {
                _ = cancel.cancelled() => return false,
                outcome = self.start_stream_detailed() => match outcome {
                    Ok(()) => return true,
                    // A newer request or stop owns the stream now.
                    Err(TetherError::Superseded) => return false,
                    Err(_) => {}
                }
            }

            log::warn!(
                "Stream attempt {} failed, retrying in {:?}",
                attempt,
                self.timings.restart_delay()
            );
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep(self.timings.restart_delay()) => {}
            }
        }
    }

    /// The link this session streams over went away.
    ///
    /// Supersedes any in-flight request or stop and returns to `Idle`, so the
    /// consumer drops the stale endpoint and can request a fresh stream.
    pub fn on_link_lost(&self) {
        let (ticket, previous) = self.begin(StreamState::Idle);
        log::info!("Camera link lost during {} (call {})", previous, ticket);
        if previous != StreamState::Idle {
            self.sink.set_buffering_state(false);
            self.sink.clear_stream_endpoint();
        }
    }

    /// Cancel fire-and-forget work spawned by this session
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
