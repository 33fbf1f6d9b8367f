//! Local network identity advertised in poll replies

use std::net::{IpAddr, Ipv4Addr};

use dmx_protocol::PollReply;
use tracing::debug;

use crate::error::EngineError;

/// IPv4 address and MAC of the interface this node answers for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkIdentity {
    /// Interface name as reported by the OS
    pub interface: String,
    /// IPv4 address of the interface
    pub ip: Ipv4Addr,
    /// Hardware address of the interface
    pub mac: [u8; 6],
}

impl NetworkIdentity {
    /// Create an identity from known values
    pub fn new(interface: impl Into<String>, ip: Ipv4Addr, mac: [u8; 6]) -> Self {
        Self {
            interface: interface.into(),
            ip,
            mac,
        }
    }

    /// Find the first non-loopback IPv4 interface and its MAC
    ///
    /// Interfaces without a hardware address (tunnels) report an all-zero MAC.
    pub fn detect() -> Result<Self, EngineError> {
        let interfaces = local_ip_address::list_afinet_netifas()
            .map_err(|e| EngineError::NetworkIdentity(e.to_string()))?;

        let (interface, ip) = first_ipv4(&interfaces)
            .ok_or_else(|| EngineError::NetworkIdentity("no non-loopback IPv4 interface".into()))?;

        let mac = match mac_address::mac_address_by_name(&interface) {
            Ok(Some(mac)) => mac.bytes(),
            Ok(None) => {
                debug!("Interface {} has no MAC address", interface);
                [0; 6]
            }
            Err(e) => return Err(EngineError::NetworkIdentity(e.to_string())),
        };

        Ok(Self { interface, ip, mac })
    }

    /// ArtPollReply announcing this node under `name`
    pub fn poll_reply(&self, name: &str) -> PollReply {
        PollReply::new(name, self.ip, self.mac)
    }
}

fn first_ipv4(interfaces: &[(String, IpAddr)]) -> Option<(String, Ipv4Addr)> {
    interfaces.iter().find_map(|(name, addr)| match addr {
        IpAddr::V4(v4) if !v4.is_loopback() => Some((name.clone(), *v4)),
        _ => None,
    })
}
