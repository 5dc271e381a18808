//! Wire codec for BOOTP/DHCP datagrams.
//!
//! Turns raw bytes into domain types and back. No state is kept between calls.

mod dhcp_codec;

pub use dhcp_codec::{DhcpCodec, BOOTP_RECORD_SIZE, DHCP_MAGIC_COOKIE, MIN_PACKET_SIZE};
