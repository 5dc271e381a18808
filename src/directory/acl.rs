//! Access control lists.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use macaddr::MacAddr6;
use uuid::Uuid;

use super::AccessControl;
use crate::config::{parse_bool, parse_config_line, AclMode};
use crate::domain::{format_mac, format_uuid};
use crate::error::{ConfigError, ConfigResult};

/// Serves every client.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AccessControl for AllowAll {
    fn allows(&self, _mac: &str, _uuid: Option<&Uuid>) -> bool {
        true
    }
}

/// Explicit allow/deny list keyed by MAC or by machine UUID.
///
/// Entries are `KEY = bool`. Clients missing from the list are denied, and in
/// UUID mode so are requests without a known UUID.
#[derive(Debug)]
pub struct AccessList {
    mode: AclMode,
    entries: HashMap<String, bool>,
}

impl AccessList {
    pub fn new(mode: AclMode) -> Self {
        Self {
            mode,
            entries: HashMap::new(),
        }
    }

    pub fn load(mode: AclMode, path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(mode, &content, path)
    }

    pub fn parse(mode: AclMode, content: &str, path: &Path) -> ConfigResult<Self> {
        let mut list = Self::new(mode);

        for (index, line) in content.lines().enumerate() {
            let Some((key, value)) = parse_config_line(line) else {
                continue;
            };

            let key = match mode {
                AclMode::Mac => MacAddr6::from_str(key).ok().map(format_mac),
                AclMode::Uuid => Uuid::parse_str(key).ok().map(|u| format_uuid(&u)),
            }
            .ok_or_else(|| ConfigError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message: format!("Invalid {:?} key: {}", mode, key),
            })?;

            list.entries.insert(key, parse_bool(value));
        }

        Ok(list)
    }

    pub fn mode(&self) -> AclMode {
        self.mode
    }

    pub fn set(&mut self, key: &str, allowed: bool) {
        self.entries.insert(key.to_uppercase(), allowed);
    }
}

impl AccessControl for AccessList {
    fn allows(&self, mac: &str, uuid: Option<&Uuid>) -> bool {
        let key = match self.mode {
            AclMode::Mac => mac.to_uppercase(),
            AclMode::Uuid => match uuid {
                Some(uuid) => format_uuid(uuid),
                None => return false,
            },
        };
        self.entries.get(&key).copied().unwrap_or(false)
    }
}
