//! The currently active camera path, shared between reconnection and streaming

use crate::control::{CameraControl, CameraControlClient};
use crate::errors::TetherError;
use crate::net::TransportFactory;
use crate::types::{CameraEndpoint, NetworkInterfaceDescriptor};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Turns an endpoint plus an optional interface into a ready control client
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        endpoint: CameraEndpoint,
        interface: Option<&NetworkInterfaceDescriptor>,
    ) -> Result<Arc<dyn CameraControl>, TetherError>;
}

/// HTTP connector: binds a transport and wraps it in a [`CameraControlClient`]
#[derive(Debug, Clone)]
pub struct HttpConnector {
    factory: TransportFactory,
}

impl HttpConnector {
    pub fn new(factory: TransportFactory) -> Self {
        Self { factory }
    }
}

impl Connector for HttpConnector {
    fn connect(
        &self,
        endpoint: CameraEndpoint,
        interface: Option<&NetworkInterfaceDescriptor>,
    ) -> Result<Arc<dyn CameraControl>, TetherError> {
        let transport = self.factory.bind(interface)?;
        Ok(Arc::new(CameraControlClient::new(endpoint, transport)))
    }
}

/// Holder of the active control client.
///
/// Replacement swaps the whole `Arc`, so readers see either the old link or
/// the new one, never a mix. Each attach event takes a generation; only the
/// newest generation may install a wired link.
pub struct ActiveLink {
    current: RwLock<Arc<dyn CameraControl>>,
    attach_generation: AtomicU64,
}

impl ActiveLink {
    pub fn new(initial: Arc<dyn CameraControl>) -> Self {
        Self {
            current: RwLock::new(initial),
            attach_generation: AtomicU64::new(0),
        }
    }

    pub fn current(&self) -> Arc<dyn CameraControl> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn endpoint(&self) -> CameraEndpoint {
        self.current().endpoint().clone()
    }

    /// Start a new attach generation, superseding every earlier one
    pub fn begin_attach(&self) -> u64 {
        self.attach_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.attach_generation.load(Ordering::SeqCst) == generation
    }

    /// Install `control` if `generation` is still the newest attach.
    ///
    /// The generation check and the swap happen under the same write lock.
    pub fn install(&self, generation: u64, control: Arc<dyn CameraControl>) -> bool {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !self.is_current(generation) {
            return false;
        }
        log::info!("Active camera link is now {}", control.endpoint());
        *guard = control;
        true
    }

    /// Discard the current link unconditionally and supersede in-flight attaches
    pub fn reset(&self, control: Arc<dyn CameraControl>) {
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.attach_generation.fetch_add(1, Ordering::SeqCst);
        log::info!("Active camera link reset to {}", control.endpoint());
        *guard = control;
    }
}
