//! Inbound collaborators consulted by the dispatcher.
//!
//! Each concern is a small trait so the dispatcher can be driven by stubs in
//! tests; the implementations here read plain files or use the system name
//! service.

mod acl;
mod hosts;
mod resolver;

pub use acl::{AccessList, AllowAll};
pub use hosts::{HostEntry, LeaseTable};
pub use resolver::{ResolvConf, SystemResolver};

use std::net::Ipv4Addr;

use uuid::Uuid;

/// Per-MAC host records: hostname and optional boot file.
pub trait HostDirectory: Send {
    /// Look up the record for a canonical MAC string.
    fn lookup(&self, mac: &str) -> Option<HostEntry>;
}

/// Hostname to IPv4 address resolution.
pub trait HostResolver: Send {
    fn resolve(&self, hostname: &str) -> Option<Ipv4Addr>;
}

/// Discovery of the host's primary nameserver.
pub trait NameserverLookup: Send {
    fn primary_nameserver(&self) -> Option<Ipv4Addr>;
}

/// Gate on which clients may be served.
pub trait AccessControl: Send {
    /// `uuid` is the machine UUID for this request, if any is known.
    fn allows(&self, mac: &str, uuid: Option<&Uuid>) -> bool;
}
