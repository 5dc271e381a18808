//! Domain models for BOOTP/DHCP/PXE request handling.
//!
//! These types are independent of sockets and configuration.

mod dhcp;
mod events;
mod pxe;
mod session;

pub use dhcp::{
    format_mac, BootpHeader, DhcpMessageType, DhcpOptionSet, OptionTag, BOOTP_FLAGS_BROADCAST,
    BOOTREPLY, BOOTREQUEST, CHADDR_LEN, FILE_LEN, SNAME_LEN,
};
pub use events::{LeaseAction, LeaseEvent};
pub use pxe::{
    format_uuid, truncate_class_id, uuid_from_option, PxeClientArch, CLIENT_UUID_OPTION_LEN,
};
pub use session::ClientState;
