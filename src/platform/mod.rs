//! OS facades: network interface enumeration and USB device discovery
//!
//! The core never talks to the OS directly; it goes through [`NetworkFacade`]
//! and [`UsbFacade`], so tests can script interface and device snapshots.

pub mod device_monitor;
pub mod network;
pub mod usb;

pub use device_monitor::{DeviceEvent, DeviceMonitor};
pub use network::SystemNetwork;
pub use usb::SysfsUsb;

use crate::errors::TetherError;
use crate::types::{NetworkInterfaceDescriptor, UsbDeviceInfo};

/// Live view of the host's network interfaces
pub trait NetworkFacade: Send + Sync {
    /// Fresh snapshot; never cached by callers beyond one selection attempt
    fn list_interfaces(&self) -> Result<Vec<NetworkInterfaceDescriptor>, TetherError>;
}

/// Attached USB devices and their access permissions
pub trait UsbFacade: Send + Sync {
    fn list_devices(&self) -> Result<Vec<UsbDeviceInfo>, TetherError>;

    fn has_permission(&self, _device: &UsbDeviceInfo) -> bool {
        true
    }

    fn request_permission(&self, device: &UsbDeviceInfo) -> bool {
        self.has_permission(device)
    }
}
