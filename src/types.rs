//! Core value types shared across the crate

use crate::config::{ReconnectConfig, TetherConfig};
use crate::errors::TetherError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// USB vendor id assigned to GoPro
pub const GOPRO_USB_VENDOR_ID: u16 = 0x2672;

/// Which path the camera is reached over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportProfile {
    /// Camera is its own Wi-Fi access point
    AccessPoint,
    /// USB-tethered Ethernet, pinned to one local interface
    WiredInterface,
}

/// Where control commands are sent.
///
/// Never mutated; a new endpoint replaces the old one when the path changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraEndpoint {
    base_url: String,
    profile: TransportProfile,
}

impl CameraEndpoint {
    pub fn new(base_url: impl Into<String>, profile: TransportProfile) -> Self {
        Self {
            base_url: base_url.into(),
            profile,
        }
    }

    pub fn access_point(config: &TetherConfig) -> Self {
        Self::new(config.camera.ap_base_url.clone(), TransportProfile::AccessPoint)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn profile(&self) -> TransportProfile {
        self.profile
    }
}

impl fmt::Display for CameraEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?})", self.base_url, self.profile)
    }
}

/// Identity of an attached camera, used only to derive its wired address.
///
/// Serialized as the bare serial string; deserializing goes through
/// [`CameraIdentity::new`] so short serials are rejected there too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CameraIdentity {
    serial_number: String,
}

impl CameraIdentity {
    pub fn new(serial_number: impl Into<String>) -> Result<Self, TetherError> {
        let serial_number = serial_number.into();
        if serial_number.chars().count() < 3 {
            return Err(TetherError::InvalidSerial(format!(
                "'{}' has fewer than 3 characters",
                serial_number
            )));
        }
        Ok(Self { serial_number })
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    /// Fill the `X`, `Y`, `Z` positions of `template` with the serial's last three characters
    pub fn substitute(&self, template: &str) -> String {
        let tail: Vec<char> = self.serial_number.chars().rev().take(3).collect();
        let position =
            |from_end: usize, marker: char| tail.get(from_end).copied().unwrap_or(marker);
        let (x, y, z) = (position(2, 'X'), position(1, 'Y'), position(0, 'Z'));
        template
            .chars()
            .map(|c| match c {
                'X' => x,
                'Y' => y,
                'Z' => z,
                other => other,
            })
            .collect()
    }

    /// Address fragment the host side of the wired link carries
    pub fn wired_address(&self, config: &TetherConfig) -> String {
        self.substitute(&config.camera.wired_address_template)
    }

    pub fn wired_endpoint(&self, config: &TetherConfig) -> CameraEndpoint {
        CameraEndpoint::new(
            self.substitute(&config.camera.wired_base_url_template),
            TransportProfile::WiredInterface,
        )
    }
}

impl TryFrom<String> for CameraIdentity {
    type Error = TetherError;

    fn try_from(serial_number: String) -> Result<Self, Self::Error> {
        Self::new(serial_number)
    }
}

impl From<CameraIdentity> for String {
    fn from(identity: CameraIdentity) -> Self {
        identity.serial_number
    }
}

/// One address bound to a local interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAddress {
    pub ip: IpAddr,
    pub prefix_len: Option<u8>,
}

impl InterfaceAddress {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            prefix_len: None,
        }
    }

    /// Textual host value, without any prefix length
    pub fn host(&self) -> String {
        self.ip.to_string()
    }
}

/// Read-only snapshot of a local network interface
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterfaceDescriptor {
    pub id: String,
    pub addresses: Vec<InterfaceAddress>,
    pub is_up: bool,
}

impl NetworkInterfaceDescriptor {
    pub fn new(id: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        Self {
            id: id.into(),
            addresses: addresses.into_iter().map(InterfaceAddress::new).collect(),
            is_up: true,
        }
    }

    /// First address whose host text contains `fragment`
    pub fn address_matching(&self, fragment: &str) -> Option<&InterfaceAddress> {
        self.addresses.iter().find(|a| a.host().contains(fragment))
    }
}

/// Stream lifecycle of one camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StreamState {
    #[default]
    Idle,
    Stopping,
    Starting,
    Streaming,
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamState::Idle => write!(f, "idle"),
            StreamState::Stopping => write!(f, "stopping"),
            StreamState::Starting => write!(f, "starting"),
            StreamState::Streaming => write!(f, "streaming"),
        }
    }
}

/// Bounded retry with fixed backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(3),
        }
    }
}

impl From<&ReconnectConfig> for RetryBudget {
    fn from(config: &ReconnectConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: config.interval(),
        }
    }
}

/// Raw USB device as reported by the platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbDeviceInfo {
    pub id: String,
    pub vendor_id: Option<u16>,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceVendor {
    GoPro,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Camera accepts HTTP control over USB-tethered Ethernet
    pub wired_control: bool,
}

/// Device classified once at attach time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub vendor: DeviceVendor,
    pub serial_number: Option<String>,
    pub capabilities: DeviceCapabilities,
    pub attached_at: chrono::DateTime<chrono::Utc>,
}

impl DeviceDescriptor {
    pub fn classify(info: &UsbDeviceInfo) -> Self {
        let is_gopro = info.vendor_id == Some(GOPRO_USB_VENDOR_ID)
            || info
                .manufacturer
                .as_deref()
                .is_some_and(|m| m.trim().eq_ignore_ascii_case("gopro"));

        let vendor = if is_gopro {
            DeviceVendor::GoPro
        } else {
            DeviceVendor::Other(info.manufacturer.clone().unwrap_or_default())
        };

        Self {
            id: info.id.clone(),
            vendor,
            serial_number: info.serial_number.clone(),
            capabilities: DeviceCapabilities {
                wired_control: is_gopro,
            },
            attached_at: chrono::Utc::now(),
        }
    }

    /// Identity for wired control, if this device supports it and reports a usable serial
    pub fn identity(&self) -> Option<CameraIdentity> {
        if !self.capabilities.wired_control {
            return None;
        }
        let serial = self.serial_number.as_deref()?;
        match CameraIdentity::new(serial) {
            Ok(identity) => Some(identity),
            Err(e) => {
                log::warn!("Device {} ignored: {}", self.id, e);
                None
            }
        }
    }
}

/// Coarse status for a consumer rendering the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    Idle,
    Connecting,
    Streaming,
}
