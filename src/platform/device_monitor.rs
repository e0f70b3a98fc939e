//! Device monitoring and hot-plug detection
//!
//! Polls a [`UsbFacade`] and turns changes in the device list into attach and
//! detach events. Devices are classified once, when they first appear.

use crate::errors::TetherError;
use crate::platform::UsbFacade;
use crate::types::DeviceDescriptor;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

/// Device event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Attached(DeviceDescriptor),
    Detached(String), // Device ID
}

type ActiveDevices = Arc<RwLock<HashMap<String, DeviceDescriptor>>>;

/// Device monitor for detecting camera attach/detach
pub struct DeviceMonitor {
    usb: Arc<dyn UsbFacade>,
    poll_interval: Duration,
    active_devices: ActiveDevices,
    event_sender: mpsc::UnboundedSender<DeviceEvent>,
    event_receiver: Arc<RwLock<mpsc::UnboundedReceiver<DeviceEvent>>>,
    /// Token of the running poll task; `None` while stopped
    run: RwLock<Option<CancellationToken>>,
}

impl DeviceMonitor {
    /// Create a new device monitor
    pub fn new(usb: Arc<dyn UsbFacade>, poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            usb,
            poll_interval,
            active_devices: Arc::new(RwLock::new(HashMap::new())),
            event_sender: tx,
            event_receiver: Arc::new(RwLock::new(rx)),
            run: RwLock::new(None),
        }
    }

    /// Start monitoring for device changes
    pub async fn start_monitoring(&self) -> Result<(), TetherError> {
        let mut run = self.run.write().await;
        if run.is_some() {
            return Ok(());
        }

        log::info!(
            "Starting device monitoring every {:?}",
            self.poll_interval
        );

        // Initial scan surfaces devices that were plugged in before we started.
        let initial = self.usb.list_devices()?;
        apply_scan(&self.active_devices, initial, &self.event_sender).await;

        // Each run gets its own token so a quick stop/start never revives the
        // previous poll task.
        let cancel = CancellationToken::new();
        *run = Some(cancel.clone());
        drop(run);

        let usb = self.usb.clone();
        let active_devices = self.active_devices.clone();
        let event_sender = self.event_sender.clone();
        let poll_interval = self.poll_interval;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(poll_interval) => {}
                }

                match usb.list_devices() {
                    Ok(devices) => apply_scan(&active_devices, devices, &event_sender).await,
                    Err(e) => log::warn!("USB scan failed: {}", e),
                }
            }
            log::debug!("Device polling task exited");
        });

        Ok(())
    }

    /// Stop monitoring for device changes
    pub async fn stop_monitoring(&self) -> Result<(), TetherError> {
        let Some(cancel) = self.run.write().await.take() else {
            return Ok(());
        };

        log::info!("Stopping device monitoring");
        cancel.cancel();
        Ok(())
    }

    pub async fn is_monitoring(&self) -> bool {
        self.run.read().await.is_some()
    }

    /// Get next device event (non-blocking)
    pub async fn poll_event(&self) -> Option<DeviceEvent> {
        let mut rx = self.event_receiver.write().await;
        rx.try_recv().ok()
    }

    /// Wait for next device event
    pub async fn wait_for_event(&self) -> Option<DeviceEvent> {
        let mut rx = self.event_receiver.write().await;
        rx.recv().await
    }

    /// Get list of currently attached devices
    pub async fn get_active_devices(&self) -> Vec<DeviceDescriptor> {
        let devices = self.active_devices.read().await;
        let mut list: Vec<DeviceDescriptor> = devices.values().cloned().collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }
}

impl Drop for DeviceMonitor {
    fn drop(&mut self) {
        if let Some(cancel) = self.run.get_mut().take() {
            cancel.cancel();
        }
    }
}

/// Diff a fresh scan against the active set, emitting one event per change
async fn apply_scan(
    active_devices: &ActiveDevices,
    devices: Vec<crate::types::UsbDeviceInfo>,
    event_sender: &mpsc::UnboundedSender<DeviceEvent>,
) {
    let mut active = active_devices.write().await;
    let new_ids: Vec<&str> = devices.iter().map(|d| d.id.as_str()).collect();

    let removed: Vec<String> = active
        .keys()
        .filter(|id| !new_ids.contains(&id.as_str()))
        .cloned()
        .collect();
    for id in removed {
        log::info!("Device detached: {}", id);
        active.remove(&id);
        let _ = event_sender.send(DeviceEvent::Detached(id));
    }

    for device in &devices {
        if active.contains_key(&device.id) {
            continue;
        }
        let descriptor = DeviceDescriptor::classify(device);
        log::info!("Device attached: {} ({:?})", descriptor.id, descriptor.vendor);
        active.insert(descriptor.id.clone(), descriptor.clone());
        let _ = event_sender.send(DeviceEvent::Attached(descriptor));
    }
}
