use crate::errors::TetherError;
use crate::platform::NetworkFacade;
use crate::types::{InterfaceAddress, NetworkInterfaceDescriptor};

/// Interface enumeration backed by the OS address table
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemNetwork;

impl SystemNetwork {
    pub fn new() -> Self {
        Self
    }
}

impl NetworkFacade for SystemNetwork {
    fn list_interfaces(&self) -> Result<Vec<NetworkInterfaceDescriptor>, TetherError> {
        let entries = local_ip_address::list_afinet_netifas()
            .map_err(|e| TetherError::Platform(format!("Failed to list interfaces: {}", e)))?;

        Ok(group_by_interface(entries))
    }
}

/// Collapse `(name, ip)` pairs into one descriptor per interface, keeping the
/// order in which interfaces were first reported.
pub(crate) fn group_by_interface(
    entries: Vec<(String, std::net::IpAddr)>,
) -> Vec<NetworkInterfaceDescriptor> {
    let mut interfaces: Vec<NetworkInterfaceDescriptor> = Vec::new();

    for (name, ip) in entries {
        match interfaces.iter_mut().find(|i| i.id == name) {
            Some(iface) => iface.addresses.push(InterfaceAddress::new(ip)),
            None => interfaces.push(NetworkInterfaceDescriptor::new(name, vec![ip])),
        }
    }

    log::debug!("Enumerated {} interfaces", interfaces.len());
    interfaces
}
