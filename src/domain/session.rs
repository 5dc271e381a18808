//! Per-client boot phase tracking.

use std::fmt;

use super::DhcpMessageType;

/// Boot phase of a client, keyed by its MAC address.
///
/// A client seen for the first time is `Idle`. Firmware that discovers with
/// a PXE UUID moves it to `Pxe`; the booted OS requesting a lease without the
/// UUID moves it to `Dhcp`; firmware showing up again means the machine was
/// rebooted and it goes back to `Pxe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClientState {
    #[default]
    Idle,
    Pxe,
    Dhcp,
}

impl ClientState {
    /// Next phase after a request.
    pub fn next(self, pxe_mode: bool, msg_type: DhcpMessageType) -> Self {
        match self {
            Self::Idle if pxe_mode && msg_type == DhcpMessageType::Discover => Self::Pxe,
            Self::Idle => Self::Idle,
            Self::Pxe if !pxe_mode && msg_type == DhcpMessageType::Request => Self::Dhcp,
            Self::Pxe => Self::Pxe,
            Self::Dhcp if pxe_mode => Self::Pxe,
            Self::Dhcp => Self::Dhcp,
        }
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Pxe => write!(f, "pxe"),
            Self::Dhcp => write!(f, "dhcp"),
        }
    }
}
