//! Name service collaborators.

use std::net::{Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use super::{HostResolver, NameserverLookup};

/// Resolves hostnames through the system name service.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn resolve(&self, hostname: &str) -> Option<Ipv4Addr> {
        let addrs = match (hostname, 0).to_socket_addrs() {
            Ok(addrs) => addrs,
            Err(e) => {
                debug!("Cannot resolve {}: {}", hostname, e);
                return None;
            }
        };

        addrs.into_iter().find_map(|addr| match addr {
            SocketAddr::V4(v4) => Some(*v4.ip()),
            SocketAddr::V6(_) => None,
        })
    }
}

/// Reads the first `nameserver` entry of a resolv.conf file.
///
/// The file is read on every lookup so edits are picked up without restart.
#[derive(Debug, Clone)]
pub struct ResolvConf {
    path: PathBuf,
    pattern: Regex,
}

impl ResolvConf {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let pattern = Regex::new(r"(?m)^\s*nameserver\s+(\d{1,3}(?:\.\d{1,3}){3})\s*$")
            .context("Failed to compile regex")?;

        Ok(Self {
            path: path.into(),
            pattern,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First IPv4 nameserver in `content`.
    pub fn first_nameserver(&self, content: &str) -> Option<Ipv4Addr> {
        self.pattern
            .captures_iter(content)
            .filter_map(|caps| caps.get(1))
            .find_map(|m| m.as_str().parse().ok())
    }
}

impl NameserverLookup for ResolvConf {
    fn primary_nameserver(&self) -> Option<Ipv4Addr> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Cannot read {}: {}", self.path.display(), e);
                return None;
            }
        };
        self.first_nameserver(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod resolv_conf_tests {
        use super::*;

        #[test]
        fn test_first_nameserver() {
            let resolv = ResolvConf::new("/etc/resolv.conf").unwrap();
            let content = "\
# generated
search lab.local
nameserver fe80::1
nameserver 10.0.0.53
nameserver 10.0.0.54
";
            assert_eq!(
                resolv.first_nameserver(content),
                Some(Ipv4Addr::new(10, 0, 0, 53))
            );
        }

        #[test]
        fn test_commented_and_invalid_entries_skipped() {
            let resolv = ResolvConf::new("/etc/resolv.conf").unwrap();
            let content = "#nameserver 10.0.0.1\nnameserver 999.0.0.1\nnameserver 10.0.0.2\n";
            assert_eq!(
                resolv.first_nameserver(content),
                Some(Ipv4Addr::new(10, 0, 0, 2))
            );
            assert_eq!(resolv.first_nameserver("search lab.local\n"), None);
        }

        #[test]
        fn test_reads_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("resolv.conf");
            std::fs::write(&path, "nameserver 192.168.1.1\n").unwrap();

            let resolv = ResolvConf::new(&path).unwrap();
            assert_eq!(resolv.path(), path.as_path());
            assert_eq!(
                resolv.primary_nameserver(),
                Some(Ipv4Addr::new(192, 168, 1, 1))
            );
        }

        #[test]
        fn test_missing_file() {
            let dir = tempfile::tempdir().unwrap();
            let resolv = ResolvConf::new(dir.path().join("missing")).unwrap();
            assert_eq!(resolv.primary_nameserver(), None);
        }
    }

    mod system_resolver_tests {
        use super::*;

        #[test]
        fn test_literal_address() {
            assert_eq!(
                SystemResolver.resolve("127.0.0.1"),
                Some(Ipv4Addr::LOCALHOST)
            );
        }
    }
}
