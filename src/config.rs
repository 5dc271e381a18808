use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/netbootd.conf";
const DEFAULT_PORT: u16 = 67;
const DEFAULT_LEASE_TIME: u32 = 7200;
const DEFAULT_RESOLV_CONF: &str = "/etc/resolv.conf";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Words accepted as a true boolean.
const TRUE_BOOLEANS: &[&str] = &["on", "true", "enable", "enabled", "yes", "high", "ok", "1"];

/// Source of the DNS option value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsSetting {
    /// Do not send a DNS option.
    Disabled,
    /// Primary nameserver of the host, looked up per reply.
    Auto,
    Static(Ipv4Addr),
}

/// Which client identity an access list is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AclMode {
    Mac,
    Uuid,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_interface: String,
    pub port: u16,
    /// Optional second listening port, e.g. 4011 for PXE boot server discovery
    pub pxe_port: Option<u16>,
    pub default_boot_file: Option<String>,
    pub default_lease_time: u32,
    pub default_dns: DnsSetting,
    /// Answer clients that never went through PXE discovery
    pub allow_simple_dhcp: bool,
    pub leases_file: Option<PathBuf>,
    pub acl: Option<AclMode>,
    pub acl_file: Option<PathBuf>,
    pub resolv_conf: PathBuf,
    pub log_level: String,
}

impl Config {
    /// Load from `path`, then apply `NETBOOTD_*` environment overrides.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut config = Self::parse(&content, path)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse `key = value` lines. `path` is only used in error messages.
    pub fn parse(content: &str, path: &Path) -> ConfigResult<Self> {
        let mut bind_interface = String::new();
        let mut port = DEFAULT_PORT;
        let mut pxe_port = None;
        let mut default_boot_file = None;
        let mut default_lease_time = DEFAULT_LEASE_TIME;
        let mut default_dns = DnsSetting::Auto;
        let mut allow_simple_dhcp = false;
        let mut leases_file = None;
        let mut acl = None;
        let mut acl_file = None;
        let mut resolv_conf = PathBuf::from(DEFAULT_RESOLV_CONF);
        let mut log_level = DEFAULT_LOG_LEVEL.to_string();

        for (index, line) in content.lines().enumerate() {
            let Some((key, value)) = parse_config_line(line) else {
                continue;
            };
            let invalid = |message: String| ConfigError::Parse {
                path: path.to_path_buf(),
                line: index + 1,
                message,
            };

            match key {
                "bind_interface" => bind_interface = value.to_string(),
                "port" => {
                    port = value
                        .parse()
                        .map_err(|_| invalid(format!("Invalid port: {}", value)))?;
                }
                "pxe_port" => {
                    pxe_port = Some(
                        value
                            .parse()
                            .map_err(|_| invalid(format!("Invalid pxe_port: {}", value)))?,
                    );
                }
                "default_boot_file" => {
                    default_boot_file = Some(value.to_string()).filter(|v| !v.is_empty());
                }
                "default_lease_time" => {
                    default_lease_time = value
                        .parse()
                        .map_err(|_| invalid(format!("Invalid lease time: {}", value)))?;
                }
                "default_dns" => {
                    default_dns = parse_dns(value)
                        .ok_or_else(|| invalid(format!("Invalid DNS setting: {}", value)))?;
                }
                "allow_simple_dhcp" => allow_simple_dhcp = parse_bool(value),
                "leases_file" => leases_file = Some(PathBuf::from(value)),
                "acl" => {
                    acl = match value.to_lowercase().as_str() {
                        "" | "none" => None,
                        "mac" => Some(AclMode::Mac),
                        "uuid" => Some(AclMode::Uuid),
                        _ => return Err(invalid(format!("Invalid access mode: {}", value))),
                    };
                }
                "acl_file" => acl_file = Some(PathBuf::from(value)),
                "resolv_conf" => resolv_conf = PathBuf::from(value),
                "log_level" => log_level = value.to_string(),
                _ => {}
            }
        }

        Ok(Config {
            bind_interface,
            port,
            pxe_port,
            default_boot_file,
            default_lease_time,
            default_dns,
            allow_simple_dhcp,
            leases_file,
            acl,
            acl_file,
            resolv_conf,
            log_level,
        })
    }

    fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        if let Ok(val) = std::env::var("NETBOOTD_INTERFACE") {
            self.bind_interface = val;
        }
        if let Ok(val) = std::env::var("NETBOOTD_PORT") {
            self.port = val
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("Invalid NETBOOTD_PORT: {}", val)))?;
        }
        if let Ok(val) = std::env::var("NETBOOTD_LOG_LEVEL") {
            self.log_level = val;
        }
        Ok(())
    }

    /// Checks that need the whole file: required keys and key combinations.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.bind_interface.is_empty() {
            return Err(ConfigError::Invalid(
                "'bind_interface' is not defined".to_string(),
            ));
        }
        if self.acl.is_some() && self.acl_file.is_none() {
            return Err(ConfigError::Invalid(
                "'acl' is set but 'acl_file' is missing".to_string(),
            ));
        }
        Ok(())
    }

    /// Listening ports, main port first.
    pub fn ports(&self) -> Vec<u16> {
        let mut ports = vec![self.port];
        if let Some(pxe_port) = self.pxe_port.filter(|p| *p != self.port) {
            ports.push(pxe_port);
        }
        ports
    }

    /// Default tracing filter for the configured level.
    pub fn tracing_filter(&self) -> String {
        format!("netbootd={}", self.log_level)
    }
}

/// Parse a key=value line, skipping comments and empty lines.
pub(crate) fn parse_config_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();

    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (key, value) = line.split_once('=')?;
    Some((key.trim(), value.trim()))
}

/// Lenient boolean: anything outside [`TRUE_BOOLEANS`] is false.
pub fn parse_bool(value: &str) -> bool {
    TRUE_BOOLEANS.contains(&value.trim().to_lowercase().as_str())
}

fn parse_dns(value: &str) -> Option<DnsSetting> {
    match value.to_lowercase().as_str() {
        "auto" => Some(DnsSetting::Auto),
        "" | "none" => Some(DnsSetting::Disabled),
        other => other.parse().ok().map(DnsSetting::Static),
    }
}
