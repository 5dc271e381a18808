//! Lease events exposed to reporters.

use std::net::Ipv4Addr;
use std::time::Instant;

use macaddr::MacAddr6;

use super::ClientState;

/// What happened to a lease.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseAction {
    /// An OFFER was sent.
    Offered,
    /// An ACK was sent.
    Acknowledged,
    /// The client released its address.
    Released,
}

/// A lease-level event produced by the dispatcher.
#[derive(Debug, Clone)]
pub struct LeaseEvent {
    /// Timestamp when the event was produced
    pub timestamp: Instant,
    pub action: LeaseAction,
    pub client_mac: MacAddr6,
    /// The DHCP transaction ID
    pub transaction_id: u32,
    /// Address offered, acknowledged or released
    pub address: Ipv4Addr,
    /// Boot phase of the client once the exchange completes
    pub state: ClientState,
    /// True when the request carried a PXE machine UUID
    pub pxe: bool,
}

impl LeaseEvent {
    pub fn new(
        action: LeaseAction,
        client_mac: MacAddr6,
        transaction_id: u32,
        address: Ipv4Addr,
        state: ClientState,
        pxe: bool,
    ) -> Self {
        Self {
            timestamp: Instant::now(),
            action,
            client_mac,
            transaction_id,
            address,
            state,
            pxe,
        }
    }

    /// True for events that follow a reply sent by this server.
    pub fn is_server_response(&self) -> bool {
        matches!(self.action, LeaseAction::Offered | LeaseAction::Acknowledged)
    }
}
