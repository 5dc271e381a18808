//! Host directory backed by a leases file.
//!
//! One line per client:
//!
//! ```text
//! # MAC = hostname[, boot file]
//! AA:BB:CC:DD:EE:FF = node01.lab.local, pxelinux.0
//! aa-bb-cc-dd-ee-01 = node02
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use macaddr::MacAddr6;

use super::HostDirectory;
use crate::config::parse_config_line;
use crate::domain::format_mac;
use crate::error::{ConfigError, ConfigResult};

/// Host record for one MAC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    /// Name as configured, possibly fully qualified
    pub hostname: String,
    pub boot_file: Option<String>,
}

impl HostEntry {
    pub fn new(hostname: impl Into<String>, boot_file: Option<String>) -> Self {
        Self {
            hostname: hostname.into(),
            boot_file,
        }
    }

    /// Host part before the first dot.
    pub fn short_name(&self) -> &str {
        self.hostname
            .split_once('.')
            .map(|(short, _)| short)
            .unwrap_or(&self.hostname)
    }

    /// Domain part after the first dot, if any.
    pub fn domain(&self) -> Option<&str> {
        self.hostname
            .split_once('.')
            .map(|(_, domain)| domain)
            .filter(|d| !d.is_empty())
    }

    /// `<short>.<domain>`, or the short name alone.
    pub fn fqdn(&self) -> String {
        match self.domain() {
            Some(domain) => format!("{}.{}", self.short_name(), domain),
            None => self.short_name().to_string(),
        }
    }
}

/// MAC-keyed host records.
#[derive(Debug, Default)]
pub struct LeaseTable {
    entries: HashMap<String, HostEntry>,
}

impl LeaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    /// Parse leases file content. `path` is only used in error messages.
    pub fn parse(content: &str, path: &Path) -> ConfigResult<Self> {
        let mut table = Self::new();

        for (index, line) in content.lines().enumerate() {
            let Some((mac, rest)) = parse_config_line(line) else {
                continue;
            };
            let invalid = |message: String| ConfigError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message,
            };

            let mac = MacAddr6::from_str(mac)
                .map_err(|_| invalid(format!("Invalid MAC address: {}", mac)))?;

            let mut parts = rest.split(',').map(str::trim);
            let hostname = parts.next().unwrap_or_default();
            if hostname.is_empty() {
                return Err(invalid(format!("Missing hostname for {}", mac)));
            }
            let boot_file = parts.next().filter(|f| !f.is_empty()).map(String::from);

            table.insert(&format_mac(mac), HostEntry::new(hostname, boot_file));
        }

        Ok(table)
    }

    pub fn insert(&mut self, mac: &str, entry: HostEntry) {
        self.entries.insert(mac.to_uppercase(), entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl HostDirectory for LeaseTable {
    fn lookup(&self, mac: &str) -> Option<HostEntry> {
        self.entries.get(mac).cloned()
    }
}
