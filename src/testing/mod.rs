//! Testing utilities for camtether
//!
//! Scripted stand-ins for the OS facades, the camera and the video sink, so
//! reconnection and streaming can be exercised offline and on a paused clock.

use crate::control::{CallResult, CameraCommand, CameraControl, Params};
use crate::errors::{ControlFailure, TetherError};
use crate::link::Connector;
use crate::platform::{NetworkFacade, UsbFacade};
use crate::stream::VideoSink;
use crate::types::{CameraEndpoint, NetworkInterfaceDescriptor, UsbDeviceInfo};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match m.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Build an interface snapshot from textual addresses
pub fn interface(id: &str, addresses: &[&str]) -> NetworkInterfaceDescriptor {
    NetworkInterfaceDescriptor::new(
        id,
        addresses
            .iter()
            .filter_map(|a| a.parse::<IpAddr>().ok())
            .collect(),
    )
}

/// Interface list that changes from one query to the next.
///
/// Query `n` (1-based) returns snapshot `n`, and the last snapshot repeats.
pub struct ScriptedNetwork {
    snapshots: Vec<Vec<NetworkInterfaceDescriptor>>,
    queries: AtomicUsize,
}

impl ScriptedNetwork {
    pub fn new(snapshots: Vec<Vec<NetworkInterfaceDescriptor>>) -> Self {
        Self {
            snapshots,
            queries: AtomicUsize::new(0),
        }
    }

    /// No matching interface until query `matching_from`
    pub fn appearing_on(matching_from: usize, wired: NetworkInterfaceDescriptor) -> Self {
        let idle = vec![interface("wlan0", &["192.168.1.20"])];
        let mut up = idle.clone();
        up.push(wired);

        let mut snapshots = vec![idle; matching_from.saturating_sub(1)];
        snapshots.push(up);
        Self::new(snapshots)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl NetworkFacade for ScriptedNetwork {
    fn list_interfaces(&self) -> Result<Vec<NetworkInterfaceDescriptor>, TetherError> {
        let n = self.queries.fetch_add(1, Ordering::SeqCst);
        let index = n.min(self.snapshots.len().saturating_sub(1));
        Ok(self.snapshots.get(index).cloned().unwrap_or_default())
    }
}

/// How the stub camera answers one command
#[derive(Debug, Clone)]
pub enum Reply {
    Ok(&'static str),
    Fail(ControlFailure),
    /// Answer `Ok` after a delay
    Delayed(Duration),
    /// Never answer
    Hang,
}

/// Camera stand-in recording every call it receives
pub struct StubControl {
    endpoint: CameraEndpoint,
    replies: Mutex<HashMap<CameraCommand, Reply>>,
    calls: Mutex<Vec<(CameraCommand, Params, tokio::time::Instant)>>,
}

impl StubControl {
    pub fn new(endpoint: CameraEndpoint) -> Self {
        Self {
            endpoint,
            replies: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(&self, command: CameraCommand, reply: Reply) -> &Self {
        lock(&self.replies).insert(command, reply);
        self
    }

    pub fn calls(&self) -> Vec<(CameraCommand, Params)> {
        lock(&self.calls)
            .iter()
            .map(|(c, p, _)| (*c, p.clone()))
            .collect()
    }

    pub fn commands(&self) -> Vec<CameraCommand> {
        lock(&self.calls).iter().map(|(c, _, _)| *c).collect()
    }

    /// When `command` was first received
    pub fn received_at(&self, command: CameraCommand) -> Option<tokio::time::Instant> {
        lock(&self.calls)
            .iter()
            .find(|(c, _, _)| *c == command)
            .map(|(_, _, at)| *at)
    }
}

#[async_trait]
impl CameraControl for StubControl {
    fn endpoint(&self) -> &CameraEndpoint {
        &self.endpoint
    }

    async fn call(&self, command: CameraCommand, params: &Params) -> CallResult {
        lock(&self.calls).push((command, params.clone(), tokio::time::Instant::now()));
        let reply = lock(&self.replies)
            .get(&command)
            .cloned()
            .unwrap_or(Reply::Ok("{}"));

        match reply {
            Reply::Ok(body) => Ok(Bytes::from_static(body.as_bytes())),
            Reply::Fail(failure) => Err(failure),
            Reply::Delayed(delay) => {
                tokio::time::sleep(delay).await;
                Ok(Bytes::from_static(b"{}"))
            }
            Reply::Hang => std::future::pending().await,
        }
    }
}

/// Connector handing out [`StubControl`]s and remembering each one
#[derive(Default)]
pub struct StubConnector {
    connected: Mutex<Vec<(Arc<StubControl>, Option<String>)>>,
}

impl StubConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every control handed out, with the interface it was bound to
    pub fn connected(&self) -> Vec<(Arc<StubControl>, Option<String>)> {
        lock(&self.connected).clone()
    }

    pub fn last(&self) -> Option<Arc<StubControl>> {
        lock(&self.connected).last().map(|(c, _)| c.clone())
    }
}

impl Connector for StubConnector {
    fn connect(
        &self,
        endpoint: CameraEndpoint,
        interface: Option<&NetworkInterfaceDescriptor>,
    ) -> Result<Arc<dyn CameraControl>, TetherError> {
        let control = Arc::new(StubControl::new(endpoint));
        lock(&self.connected).push((control.clone(), interface.map(|i| i.id.clone())));
        Ok(control)
    }
}

/// Sink that keeps everything it was told
#[derive(Default)]
pub struct RecordingSink {
    endpoints: Mutex<Vec<String>>,
    buffering: Mutex<Vec<bool>>,
    cleared: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoints(&self) -> Vec<String> {
        lock(&self.endpoints).clone()
    }

    pub fn buffering(&self) -> Vec<bool> {
        lock(&self.buffering).clone()
    }

    pub fn cleared(&self) -> usize {
        self.cleared.load(Ordering::SeqCst)
    }
}

impl VideoSink for RecordingSink {
    fn set_stream_endpoint(&self, url: &str) {
        lock(&self.endpoints).push(url.to_string());
    }

    fn set_buffering_state(&self, buffering: bool) {
        lock(&self.buffering).push(buffering);
    }

    fn clear_stream_endpoint(&self) {
        self.cleared.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fixed USB device list with per-device permission
pub struct ScriptedUsb {
    devices: Mutex<Vec<UsbDeviceInfo>>,
    denied: Vec<String>,
}

impl ScriptedUsb {
    pub fn new(devices: Vec<UsbDeviceInfo>) -> Self {
        Self {
            devices: Mutex::new(devices),
            denied: Vec::new(),
        }
    }

    pub fn deny(mut self, device_id: &str) -> Self {
        self.denied.push(device_id.to_string());
        self
    }

    pub fn set_devices(&self, devices: Vec<UsbDeviceInfo>) {
        *lock(&self.devices) = devices;
    }
}

impl UsbFacade for ScriptedUsb {
    fn list_devices(&self) -> Result<Vec<UsbDeviceInfo>, TetherError> {
        Ok(lock(&self.devices).clone())
    }

    fn has_permission(&self, device: &UsbDeviceInfo) -> bool {
        !self.denied.contains(&device.id)
    }
}
