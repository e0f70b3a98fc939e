//! Explicitly owned camera session
//!
//! A [`CameraSession`] ties the active link, the reconnect supervisor and the
//! stream session together. Construct one per camera and pass it to whatever
//! needs it; there is no process-wide state.

use crate::config::TetherConfig;
use crate::control::{fire_and_forget, CameraCommand};
use crate::errors::{Result, TetherError};
use crate::link::{ActiveLink, Connector, HttpConnector};
use crate::net::TransportFactory;
use crate::platform::{DeviceEvent, DeviceMonitor, NetworkFacade};
use crate::reconnect::{ReconnectState, ReconnectSupervisor};
use crate::stream::{StreamSession, VideoSink};
use crate::types::{CameraEndpoint, CameraIdentity, LinkStatus, StreamState};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub struct CameraSession {
    id: Uuid,
    config: Arc<TetherConfig>,
    link: Arc<ActiveLink>,
    stream: StreamSession,
    supervisor: ReconnectSupervisor,
    wired_devices: Mutex<HashSet<String>>,
    cancel: CancellationToken,
}

impl CameraSession {
    /// Session over real HTTP transports, starting on the access-point path
    pub fn new(
        config: TetherConfig,
        network: Arc<dyn NetworkFacade>,
        sink: Arc<dyn VideoSink>,
    ) -> Result<Self> {
        let connector = Arc::new(HttpConnector::new(TransportFactory::new(
            config.transport.clone(),
        )));
        Self::with_connector(config, network, connector, sink)
    }

    pub fn with_connector(
        config: TetherConfig,
        network: Arc<dyn NetworkFacade>,
        connector: Arc<dyn Connector>,
        sink: Arc<dyn VideoSink>,
    ) -> Result<Self> {
        config.validate().map_err(TetherError::Config)?;
        let config = Arc::new(config);

        let initial = connector.connect(CameraEndpoint::access_point(&config), None)?;
        let link = Arc::new(ActiveLink::new(initial));

        let stream = StreamSession::new(
            link.clone(),
            sink,
            config.stream.clone(),
            config.camera.stream_url.clone(),
        );
        let supervisor =
            ReconnectSupervisor::new(config.clone(), network, connector, link.clone());

        let id = Uuid::new_v4();
        log::info!("Camera session {} created on {}", id, link.endpoint());

        Ok(Self {
            id,
            config,
            link,
            stream,
            supervisor,
            wired_devices: Mutex::new(HashSet::new()),
            cancel: CancellationToken::new(),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &TetherConfig {
        &self.config
    }

    pub fn endpoint(&self) -> CameraEndpoint {
        self.link.endpoint()
    }

    pub fn stream(&self) -> &StreamSession {
        &self.stream
    }

    pub fn supervisor(&self) -> &ReconnectSupervisor {
        &self.supervisor
    }

    pub fn stream_state(&self) -> StreamState {
        self.stream.state()
    }

    /// Coarse idle / connecting / streaming view for a consumer
    pub fn status(&self) -> LinkStatus {
        match (self.stream.state(), self.supervisor.state()) {
            (StreamState::Streaming, _) => LinkStatus::Streaming,
            (StreamState::Starting, _) | (_, ReconnectState::Resolving { .. }) => {
                LinkStatus::Connecting
            }
            _ => LinkStatus::Idle,
        }
    }

    pub async fn request_stream(&self) -> bool {
        self.stream.request_stream().await
    }

    pub async fn stop_stream(&self) -> bool {
        self.stream.stop_stream().await
    }

    pub fn start_recording(&self) -> JoinHandle<()> {
        log::info!("Starting recording...");
        fire_and_forget(
            self.link.current(),
            CameraCommand::StartRecording,
            self.cancel.child_token(),
        )
    }

    pub fn stop_recording(&self) -> JoinHandle<()> {
        log::info!("Stopping recording...");
        fire_and_forget(
            self.link.current(),
            CameraCommand::StopRecording,
            self.cancel.child_token(),
        )
    }

    pub async fn on_device_attached(&self, identity: CameraIdentity) -> Result<CameraEndpoint> {
        self.supervisor.on_device_attached(identity).await
    }

    /// Fall back to the access point. A stream on the unplugged path is gone,
    /// so the stream session returns to `Idle` and the sink is cleared.
    pub fn on_device_detached(&self) -> Result<()> {
        self.stream.on_link_lost();
        self.supervisor.on_device_detached()
    }

    /// React to one monitor event. Attach loops run on their own task.
    pub fn handle_event(self: &Arc<Self>, event: DeviceEvent) -> Option<JoinHandle<()>> {
        match event {
            DeviceEvent::Attached(descriptor) => {
                let identity = descriptor.identity()?;
                self.lock_wired_devices().insert(descriptor.id.clone());

                let session = self.clone();
                Some(tokio::spawn(async move {
                    if let Err(e) = session.on_device_attached(identity).await {
                        log::error!("Wired reconnect for {} ended: {}", descriptor.id, e);
                    }
                }))
            }
            DeviceEvent::Detached(id) => {
                if self.lock_wired_devices().remove(&id) {
                    log::info!("Wired camera {} detached", id);
                    if let Err(e) = self.on_device_detached() {
                        log::error!("Failed to fall back to access point: {}", e);
                    }
                }
                None
            }
        }
    }

    /// Feed monitor events into [`handle_event`](Self::handle_event) until shutdown
    pub fn watch_devices(self: &Arc<Self>, monitor: Arc<DeviceMonitor>) -> JoinHandle<()> {
        let session = self.clone();
        let cancel = self.cancel.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    event = monitor.wait_for_event() => match event {
                        Some(event) => {
                            session.handle_event(event);
                        }
                        None => break,
                    }
                }
            }
            log::debug!("Device watch for session {} exited", session.id);
        })
    }

    pub fn shutdown(&self) {
        log::info!("Shutting down camera session {}", self.id);
        self.cancel.cancel();
        self.stream.shutdown();
    }

    fn lock_wired_devices(&self) -> std::sync::MutexGuard<'_, HashSet<String>> {
        match self.wired_devices.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Synchronous front for callers outside any async context.
///
/// Owns a small worker runtime; must not be used from inside another tokio
/// runtime.
pub struct BlockingSession {
    runtime: tokio::runtime::Runtime,
    session: Arc<CameraSession>,
}

impl BlockingSession {
    pub fn new(
        config: TetherConfig,
        network: Arc<dyn NetworkFacade>,
        sink: Arc<dyn VideoSink>,
    ) -> Result<Self> {
        Self::from_session(Arc::new(CameraSession::new(config, network, sink)?))
    }

    pub fn from_session(session: Arc<CameraSession>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("camtether-worker")
            .enable_all()
            .build()
            .map_err(|e| TetherError::Platform(format!("Failed to start runtime: {}", e)))?;
        Ok(Self { runtime, session })
    }

    pub fn session(&self) -> &Arc<CameraSession> {
        &self.session
    }

    pub fn request_stream_blocking(&self) -> bool {
        self.runtime.block_on(self.session.request_stream())
    }

    pub fn stop_stream_blocking(&self) -> bool {
        self.runtime.block_on(self.session.stop_stream())
    }

    pub fn attach_blocking(&self, identity: CameraIdentity) -> Result<CameraEndpoint> {
        self.runtime.block_on(self.session.on_device_attached(identity))
    }
}

impl Drop for BlockingSession {
    fn drop(&mut self) {
        self.session.shutdown();
    }
}
