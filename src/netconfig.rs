//! Bind interface configuration.

use std::net::{IpAddr, Ipv4Addr};

use pnet::datalink::{self, NetworkInterface};
use pnet::ipnetwork::IpNetwork;

use crate::error::{ConfigError, ConfigResult};

/// Address and netmask of the interface the server is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceConfig {
    pub name: String,
    pub address: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl InterfaceConfig {
    pub fn new(name: impl Into<String>, address: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Self {
            name: name.into(),
            address,
            netmask,
        }
    }

    /// Look up the named interface and take its first IPv4 network.
    pub fn discover(name: &str) -> ConfigResult<Self> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| ConfigError::InterfaceNotFound(name.to_string()))?;

        Self::from_interface(&interface)
    }

    fn from_interface(interface: &NetworkInterface) -> ConfigResult<Self> {
        interface
            .ips
            .iter()
            .find_map(|network| match network {
                IpNetwork::V4(v4) => Some(Self::new(&interface.name, v4.ip(), v4.mask())),
                IpNetwork::V6(_) => None,
            })
            .ok_or_else(|| ConfigError::NoIpv4Address(interface.name.clone()))
    }

    /// Network address of `ip` under this interface's netmask.
    pub fn network_of(&self, ip: Ipv4Addr) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(ip) & u32::from(self.netmask))
    }

    /// Directed broadcast address of the subnet containing `ip`.
    pub fn broadcast_for(&self, ip: Ipv4Addr) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(ip) | !u32::from(self.netmask))
    }

    /// True if `ip` is on the same subnet as the interface.
    pub fn is_local(&self, ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(v4) => self.network_of(v4) == self.network_of(self.address),
            IpAddr::V6(_) => false,
        }
    }
}

/// `name: a.b.c.d/len` lines for every interface with an IPv4 address.
pub fn list_interfaces() -> Vec<String> {
    datalink::interfaces()
        .iter()
        .filter_map(|iface| InterfaceConfig::from_interface(iface).ok())
        .map(|cfg| {
            let prefix = u32::from(cfg.netmask).count_ones();
            format!("{}: {}/{}", cfg.name, cfg.address, prefix)
        })
        .collect()
}
