//! Wired reconnection after a USB attach
//!
//! On attach the camera's wired address is derived from its serial number and
//! the host's interfaces are polled until one of them sits on that network.
//! Interfaces are re-queried on every attempt since the tethered link usually
//! comes up a few seconds after the device appears.

use crate::config::TetherConfig;
use crate::control::negotiate_wired_mode;
use crate::errors::{Result, TetherError};
use crate::link::{ActiveLink, Connector};
use crate::net::require;
use crate::platform::{NetworkFacade, UsbFacade};
use crate::types::{CameraEndpoint, CameraIdentity, DeviceDescriptor, RetryBudget};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconnectState {
    Idle,
    Resolving { attempt: u32 },
    Bound { interface: String },
    Exhausted,
}

pub struct ReconnectSupervisor {
    config: Arc<TetherConfig>,
    budget: RetryBudget,
    network: Arc<dyn NetworkFacade>,
    connector: Arc<dyn Connector>,
    link: Arc<ActiveLink>,
    state: watch::Sender<ReconnectState>,
}

impl ReconnectSupervisor {
    pub fn new(
        config: Arc<TetherConfig>,
        network: Arc<dyn NetworkFacade>,
        connector: Arc<dyn Connector>,
        link: Arc<ActiveLink>,
    ) -> Self {
        let (state, _) = watch::channel(ReconnectState::Idle);
        Self {
            budget: RetryBudget::from(&config.reconnect),
            config,
            network,
            connector,
            link,
            state,
        }
    }

    pub fn budget(&self) -> RetryBudget {
        self.budget
    }

    pub fn state(&self) -> ReconnectState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReconnectState> {
        self.state.subscribe()
    }

    fn set_state(&self, generation: u64, state: ReconnectState) {
        if self.link.is_current(generation) {
            self.state.send_replace(state);
        }
    }

    /// Resolve and bind the wired path for a freshly attached camera.
    ///
    /// Each call runs its own loop. A loop that finds its path after a newer
    /// attach (or a detach) started returns [`TetherError::Superseded`] and
    /// leaves the active link untouched.
    pub async fn on_device_attached(&self, identity: CameraIdentity) -> Result<CameraEndpoint> {
        let generation = self.link.begin_attach();
        let address = identity.wired_address(&self.config);
        let endpoint = identity.wired_endpoint(&self.config);

        log::info!(
            "Camera {} attached, looking for an interface on {}",
            identity.serial_number(),
            address
        );

        for attempt in 1..=self.budget.max_attempts {
            if !self.link.is_current(generation) {
                log::info!("Attach of {} superseded", identity.serial_number());
                return Err(TetherError::Superseded);
            }
            self.set_state(generation, ReconnectState::Resolving { attempt });

            let interfaces = self.network.list_interfaces().unwrap_or_else(|e| {
                log::warn!("Interface query failed: {}", e);
                Vec::new()
            });

            let bound = require(&address, &interfaces).and_then(|iface| {
                let control = self.connector.connect(endpoint.clone(), Some(iface))?;
                Ok((iface, control))
            });

            match bound {
                Ok((iface, control)) => {
                    if !self.link.install(generation, control.clone()) {
                        log::info!("Attach of {} superseded", identity.serial_number());
                        return Err(TetherError::Superseded);
                    }
                    self.set_state(
                        generation,
                        ReconnectState::Bound {
                            interface: iface.id.clone(),
                        },
                    );
                    log::info!(
                        "Camera {} bound on {} after {} attempt(s)",
                        identity.serial_number(),
                        iface.id,
                        attempt
                    );

                    if let Err(e) = negotiate_wired_mode(control.as_ref()).await {
                        log::warn!("Wired mode negotiation incomplete: {}", e);
                    }
                    return Ok(endpoint);
                }
                Err(e) => log::info!(
                    "Attempt {}/{}: {}",
                    attempt,
                    self.budget.max_attempts,
                    e
                ),
            }

            if attempt < self.budget.max_attempts {
                tokio::time::sleep(self.budget.interval).await;
            }
        }

        self.set_state(generation, ReconnectState::Exhausted);
        log::error!(
            "Camera {} unreachable after {} attempts",
            identity.serial_number(),
            self.budget.max_attempts
        );
        Err(TetherError::RetryExhausted {
            attempts: self.budget.max_attempts,
        })
    }

    /// Drop the wired path and fall back to the access-point link
    pub fn on_device_detached(&self) -> Result<()> {
        let control = self
            .connector
            .connect(CameraEndpoint::access_point(&self.config), None)?;
        self.link.reset(control);
        self.state.send_replace(ReconnectState::Idle);
        Ok(())
    }

    /// Scan attached USB devices and bring up every permitted wired camera.
    ///
    /// Devices without wired control or without permission are skipped.
    pub async fn mount_wired(&self, usb: &dyn UsbFacade) -> Result<Vec<Result<CameraEndpoint>>> {
        let mut outcomes = Vec::new();

        for info in usb.list_devices()? {
            let descriptor = DeviceDescriptor::classify(&info);
            if !descriptor.capabilities.wired_control {
                log::debug!("Device {} has no wired control", descriptor.id);
                continue;
            }
            if !usb.has_permission(&info) && !usb.request_permission(&info) {
                log::error!("Insufficient permissions for USB device {}", descriptor.id);
                continue;
            }
            let Some(identity) = descriptor.identity() else {
                continue;
            };
            outcomes.push(self.on_device_attached(identity).await);
        }

        Ok(outcomes)
    }
}
