//! netbootd - BOOTP/DHCP server with PXE boot negotiation.
//!
//! Tracks every client through its boot phases (firmware PXE discovery,
//! then the operating system's own DHCP requests) and shapes each reply
//! accordingly.
//!
//! # Architecture
//!
//! - `domain`: wire-independent types (header, options, client state, events)
//! - `codec`: datagram decoding and encoding
//! - `options`: reply option blocks
//! - `pool`: per-client leases, UUIDs, boot phases and boot files
//! - `directory`: host records, name resolution and access control
//! - `server`: request dispatcher and UDP loop

pub mod codec;
pub mod config;
pub mod directory;
pub mod domain;
pub mod error;
pub mod netconfig;
pub mod options;
pub mod pool;
pub mod reporter;
pub mod server;

pub use config::Config;
pub use error::{ConfigError, ParseError, RequestError};
pub use netconfig::InterfaceConfig;
pub use server::{BootpServer, HandlerSettings, RequestHandler};
