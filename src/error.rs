//! Error types for the BOOTP/DHCP/PXE engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::OptionTag;

/// Errors raised while decoding a datagram.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("packet too short: expected at least {expected} bytes, got {actual}")]
    PacketTooShort { expected: usize, actual: usize },

    #[error("unknown option {0}")]
    UnknownOption(u8),

    #[error("option {tag} truncated at offset {offset}")]
    TruncatedOption { tag: u8, offset: usize },

    #[error("option stream has no end marker")]
    MissingEnd,
}

/// Reasons a request is dropped without a reply.
///
/// None of these is fatal; the dispatcher logs them and waits for the next
/// datagram.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("malformed packet: {0}")]
    Malformed(#[from] ParseError),

    #[error("not a BOOTREQUEST (op {0})")]
    NotBootRequest(u8),

    #[error("missing required option {0}")]
    MissingRequiredOption(OptionTag),

    #[error("unmanaged DHCP message type {0}")]
    UnsupportedMessageType(u8),

    #[error("no lease available for {0}")]
    NoLeaseAvailable(String),

    #[error("cannot resolve host '{0}'")]
    UnresolvedHost(String),

    #[error("access denied for {0}")]
    AccessDenied(String),
}

/// Setup-time errors: configuration files and interface discovery.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("interface '{0}' not found")]
    InterfaceNotFound(String),

    #[error("interface '{0}' has no IPv4 address")]
    NoIpv4Address(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
