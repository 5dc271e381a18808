//! Lease and identity pools.
//!
//! Process-lifetime caches keyed by client: boot phase, leased address and
//! PXE machine UUID per MAC, plus the boot file per leased address. Nothing
//! is ever evicted.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use tracing::info;
use uuid::Uuid;

use crate::domain::ClientState;

/// Mutable per-client state owned by the dispatcher.
///
/// MAC keys are canonical colon-hex strings (see [`crate::domain::format_mac`]).
#[derive(Debug, Default)]
pub struct ClientPools {
    states: HashMap<String, ClientState>,
    leases: HashMap<String, Ipv4Addr>,
    uuids: HashMap<String, Uuid>,
    files: HashMap<Ipv4Addr, String>,
}

impl ClientPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase, creating an `Idle` session on first sighting.
    pub fn session(&mut self, mac: &str) -> ClientState {
        *self.states.entry(mac.to_string()).or_default()
    }

    /// Current phase without creating a session.
    pub fn state_of(&self, mac: &str) -> Option<ClientState> {
        self.states.get(mac).copied()
    }

    pub fn set_state(&mut self, mac: &str, state: ClientState) {
        self.states.insert(mac.to_string(), state);
    }

    pub fn lease(&self, mac: &str) -> Option<Ipv4Addr> {
        self.leases.get(mac).copied()
    }

    /// Return the lease for `mac`, or obtain one from `resolve` and keep it.
    ///
    /// `resolve` only runs when no lease exists yet; on failure nothing is
    /// recorded.
    pub fn allocate_or_reuse<F, E>(&mut self, mac: &str, resolve: F) -> Result<Ipv4Addr, E>
    where
        F: FnOnce() -> Result<Ipv4Addr, E>,
    {
        if let Some(ip) = self.lease(mac) {
            info!("Lease for MAC {} already defined as IP {}", mac, ip);
            return Ok(ip);
        }

        let ip = resolve()?;
        self.leases.insert(mac.to_string(), ip);
        Ok(ip)
    }

    /// The UUID to use for this request: the freshly supplied one, else the
    /// last one cached for the MAC.
    pub fn uuid_for(&self, mac: &str, inbound: Option<Uuid>) -> Option<Uuid> {
        inbound.or_else(|| self.uuids.get(mac).copied())
    }

    pub fn remember_uuid(&mut self, mac: &str, uuid: Uuid) {
        self.uuids.insert(mac.to_string(), uuid);
    }

    /// Boot file registered for `ip`, or an empty string.
    pub fn boot_file_for(&self, ip: Ipv4Addr) -> &str {
        self.files.get(&ip).map(String::as_str).unwrap_or("")
    }

    pub fn register_boot_file(&mut self, ip: Ipv4Addr, path: impl Into<String>) {
        self.files.insert(ip, path.into());
    }

    /// All current leases.
    pub fn leases(&self) -> impl Iterator<Item = (&str, Ipv4Addr)> + '_ {
        self.leases.iter().map(|(mac, ip)| (mac.as_str(), *ip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAC: &str = "AA:BB:CC:DD:EE:FF";

    #[test]
    fn test_session_created_idle() {
        let mut pools = ClientPools::new();
        assert_eq!(pools.state_of(MAC), None);
        assert_eq!(pools.session(MAC), ClientState::Idle);
        assert_eq!(pools.state_of(MAC), Some(ClientState::Idle));

        pools.set_state(MAC, ClientState::Pxe);
        assert_eq!(pools.session(MAC), ClientState::Pxe);
    }

    #[test]
    fn test_allocate_then_reuse() {
        let mut pools = ClientPools::new();
        let ip = Ipv4Addr::new(10, 0, 0, 20);
        let mut calls = 0;

        let first: Result<_, ()> = pools.allocate_or_reuse(MAC, || {
            calls += 1;
            Ok(ip)
        });
        assert_eq!(first, Ok(ip));

        let second: Result<_, ()> = pools.allocate_or_reuse(MAC, || {
            calls += 1;
            Ok(Ipv4Addr::new(10, 0, 0, 99))
        });
        assert_eq!(second, Ok(ip));
        assert_eq!(calls, 1);
        assert_eq!(pools.lease(MAC), Some(ip));
    }

    #[test]
    fn test_failed_allocation_records_nothing() {
        let mut pools = ClientPools::new();
        let result = pools.allocate_or_reuse(MAC, || Err("unresolved"));
        assert_eq!(result, Err("unresolved"));
        assert_eq!(pools.lease(MAC), None);
        assert_eq!(pools.leases().count(), 0);
    }

    #[test]
    fn test_uuid_prefers_inbound() {
        let mut pools = ClientPools::new();
        let cached = Uuid::from_bytes([1; 16]);
        let fresh = Uuid::from_bytes([2; 16]);

        assert_eq!(pools.uuid_for(MAC, None), None);

        pools.remember_uuid(MAC, cached);
        assert_eq!(pools.uuid_for(MAC, None), Some(cached));
        assert_eq!(pools.uuid_for(MAC, Some(fresh)), Some(fresh));
    }

    #[test]
    fn test_boot_file_lookup() {
        let mut pools = ClientPools::new();
        let ip = Ipv4Addr::new(10, 0, 0, 20);
        assert_eq!(pools.boot_file_for(ip), "");

        pools.register_boot_file(ip, "pxelinux.0");
        assert_eq!(pools.boot_file_for(ip), "pxelinux.0");
    }
}
