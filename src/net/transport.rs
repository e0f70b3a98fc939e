use crate::config::TransportConfig;
use crate::errors::TetherError;
use crate::types::{NetworkInterfaceDescriptor, TransportProfile};
use std::net::IpAddr;
use std::time::Duration;

/// Timeouts a transport was built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    pub connect: Duration,
    pub read: Duration,
    /// Whole-request bound; only set on interface-bound transports
    pub request: Option<Duration>,
}

/// HTTP client plus the path it is pinned to
#[derive(Debug, Clone)]
pub struct Transport {
    client: reqwest::Client,
    profile: TransportProfile,
    interface: Option<String>,
    local_address: Option<IpAddr>,
    timeouts: TransportTimeouts,
}

impl Transport {
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn profile(&self) -> TransportProfile {
        self.profile
    }

    pub fn interface(&self) -> Option<&str> {
        self.interface.as_deref()
    }

    pub fn local_address(&self) -> Option<IpAddr> {
        self.local_address
    }

    pub fn timeouts(&self) -> TransportTimeouts {
        self.timeouts
    }
}

/// Builds transports for the access-point and wired paths.
///
/// No network I/O happens here; sockets are opened lazily on the first call.
#[derive(Debug, Clone)]
pub struct TransportFactory {
    config: TransportConfig,
}

impl TransportFactory {
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    pub fn bind(
        &self,
        interface: Option<&NetworkInterfaceDescriptor>,
    ) -> Result<Transport, TetherError> {
        match interface {
            None => self.access_point(),
            Some(iface) => self.wired(iface),
        }
    }

    fn access_point(&self) -> Result<Transport, TetherError> {
        let timeouts = TransportTimeouts {
            connect: self.config.ap_connect_timeout(),
            read: self.config.ap_read_timeout(),
            request: None,
        };

        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .build()
            .map_err(|e| TetherError::Transport(format!("Failed to build AP client: {}", e)))?;

        Ok(Transport {
            client,
            profile: TransportProfile::AccessPoint,
            interface: None,
            local_address: None,
            timeouts,
        })
    }

    fn wired(&self, iface: &NetworkInterfaceDescriptor) -> Result<Transport, TetherError> {
        // Outbound sockets are pinned by source address; prefer IPv4 since the
        // camera's tethered network is IPv4 only.
        let local_address = iface
            .addresses
            .iter()
            .map(|a| a.ip)
            .find(IpAddr::is_ipv4)
            .or_else(|| iface.addresses.first().map(|a| a.ip))
            .ok_or_else(|| {
                TetherError::Transport(format!("Interface {} has no address to bind", iface.id))
            })?;

        let wired = self.config.wired_timeout();
        let timeouts = TransportTimeouts {
            connect: wired,
            read: wired,
            request: Some(wired),
        };

        let client = reqwest::Client::builder()
            .local_address(local_address)
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .timeout(wired)
            .build()
            .map_err(|e| {
                TetherError::Transport(format!(
                    "Failed to build client bound to {}: {}",
                    iface.id, e
                ))
            })?;

        log::info!("Bound transport to {} via {}", iface.id, local_address);

        Ok(Transport {
            client,
            profile: TransportProfile::WiredInterface,
            interface: Some(iface.id.clone()),
            local_address: Some(local_address),
            timeouts,
        })
    }
}
