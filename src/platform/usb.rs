use crate::errors::TetherError;
use crate::platform::UsbFacade;
use crate::types::UsbDeviceInfo;
use std::fs;
use std::path::{Path, PathBuf};

/// USB enumeration from `/sys/bus/usb/devices`.
///
/// Only meaningful on Linux; elsewhere the directory is absent and the list is
/// empty.
#[derive(Debug, Clone)]
pub struct SysfsUsb {
    root: PathBuf,
}

impl SysfsUsb {
    pub fn new() -> Self {
        Self::with_root("/sys/bus/usb/devices")
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_attr(dir: &Path, name: &str) -> Option<String> {
        fs::read_to_string(dir.join(name))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }
}

impl Default for SysfsUsb {
    fn default() -> Self {
        Self::new()
    }
}

impl UsbFacade for SysfsUsb {
    fn list_devices(&self) -> Result<Vec<UsbDeviceInfo>, TetherError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root).map_err(|e| {
            TetherError::Platform(format!("Failed to read {}: {}", self.root.display(), e))
        })?;

        let mut devices = Vec::new();
        for entry in entries.flatten() {
            let dir = entry.path();
            // Interfaces (e.g. "1-1:1.0") have no idVendor and are skipped.
            let Some(vendor) = Self::read_attr(&dir, "idVendor") else {
                continue;
            };

            devices.push(UsbDeviceInfo {
                id: entry.file_name().to_string_lossy().into_owned(),
                vendor_id: u16::from_str_radix(&vendor, 16).ok(),
                manufacturer: Self::read_attr(&dir, "manufacturer"),
                serial_number: Self::read_attr(&dir, "serial"),
            });
        }

        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }

    fn has_permission(&self, device: &UsbDeviceInfo) -> bool {
        // Without a readable serial the wired address cannot be derived.
        device.serial_number.is_some()
    }
}
