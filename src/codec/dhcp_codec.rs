//! BOOTP/DHCP wire codec.
//!
//! Packs and unpacks the fixed 240-byte record (RFC 951/2131 layout with the
//! DHCP magic cookie as its last field) and the TLV option stream behind it.

use std::net::Ipv4Addr;

use tracing::debug;

use crate::domain::{BootpHeader, DhcpOptionSet, OptionTag, CHADDR_LEN, FILE_LEN, SNAME_LEN};
use crate::error::ParseError;

/// DHCP magic cookie: 0x63825363
pub const DHCP_MAGIC_COOKIE: [u8; 4] = [0x63, 0x82, 0x53, 0x63];

/// Size of the fixed record, magic cookie included.
pub const BOOTP_RECORD_SIZE: usize = 240;

/// Replies shorter than this are zero padded (RFC 951 minimum).
pub const MIN_PACKET_SIZE: usize = 300;

const OFFSET_CHADDR: usize = 28;
const OFFSET_SNAME: usize = OFFSET_CHADDR + CHADDR_LEN;
const OFFSET_FILE: usize = OFFSET_SNAME + SNAME_LEN;
const OFFSET_COOKIE: usize = OFFSET_FILE + FILE_LEN;

/// Stateless encoder/decoder for BOOTP/DHCP datagrams.
#[derive(Debug, Clone, Copy, Default)]
pub struct DhcpCodec;

impl DhcpCodec {
    pub fn new() -> Self {
        Self
    }

    /// Split a datagram into its fixed header and the option tail.
    ///
    /// Option tags are not looked at here.
    pub fn decode<'a>(&self, data: &'a [u8]) -> Result<(BootpHeader, &'a [u8]), ParseError> {
        if data.len() < BOOTP_RECORD_SIZE {
            return Err(ParseError::PacketTooShort {
                expected: BOOTP_RECORD_SIZE,
                actual: data.len(),
            });
        }

        let mut chaddr = [0u8; CHADDR_LEN];
        chaddr.copy_from_slice(&data[OFFSET_CHADDR..OFFSET_SNAME]);
        let mut sname = [0u8; SNAME_LEN];
        sname.copy_from_slice(&data[OFFSET_SNAME..OFFSET_FILE]);
        let mut file = [0u8; FILE_LEN];
        file.copy_from_slice(&data[OFFSET_FILE..OFFSET_COOKIE]);
        let mut cookie = [0u8; 4];
        cookie.copy_from_slice(&data[OFFSET_COOKIE..BOOTP_RECORD_SIZE]);

        let header = BootpHeader {
            op: data[0],
            htype: data[1],
            hlen: data[2],
            hops: data[3],
            xid: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            secs: u16::from_be_bytes([data[8], data[9]]),
            flags: u16::from_be_bytes([data[10], data[11]]),
            ciaddr: ipv4_at(data, 12),
            yiaddr: ipv4_at(data, 16),
            siaddr: ipv4_at(data, 20),
            giaddr: ipv4_at(data, 24),
            chaddr,
            sname,
            file,
            cookie,
        };

        Ok((header, &data[BOOTP_RECORD_SIZE..]))
    }

    /// Parse the TLV option stream.
    ///
    /// Succeeds only when the stream reaches the end tag; bytes after it are
    /// ignored. A tag outside the known table rejects the whole stream.
    pub fn decode_options(&self, tail: &[u8]) -> Result<DhcpOptionSet, ParseError> {
        let mut options = DhcpOptionSet::new();
        let mut offset = 0;

        while offset < tail.len() {
            let code = tail[offset];

            let tag = match OptionTag::from_u8(code) {
                Some(OptionTag::Pad) => {
                    offset += 1;
                    continue;
                }
                Some(OptionTag::End) => return Ok(options),
                Some(tag) => tag,
                None => {
                    debug!("unknown option {} at offset {}", code, offset);
                    return Err(ParseError::UnknownOption(code));
                }
            };

            let len = match tail.get(offset + 1) {
                Some(&len) => len as usize,
                None => return Err(ParseError::TruncatedOption { tag: code, offset }),
            };
            let start = offset + 2;
            let value = tail
                .get(start..start + len)
                .ok_or(ParseError::TruncatedOption { tag: code, offset })?;

            debug!(
                " option {}: '{}', size: {}, value: {}",
                code,
                tag.name(),
                len,
                hex_line(value)
            );
            options.insert(tag, value);

            offset = start + len;
        }

        Err(ParseError::MissingEnd)
    }

    /// Pack a header and pre-built option bytes into a datagram.
    ///
    /// The result is zero padded to [`MIN_PACKET_SIZE`].
    pub fn encode(&self, header: &BootpHeader, options: &[u8]) -> Vec<u8> {
        let mut packet = Vec::with_capacity((BOOTP_RECORD_SIZE + options.len()).max(MIN_PACKET_SIZE));

        packet.extend_from_slice(&[header.op, header.htype, header.hlen, header.hops]);
        packet.extend_from_slice(&header.xid.to_be_bytes());
        packet.extend_from_slice(&header.secs.to_be_bytes());
        packet.extend_from_slice(&header.flags.to_be_bytes());
        packet.extend_from_slice(&header.ciaddr.octets());
        packet.extend_from_slice(&header.yiaddr.octets());
        packet.extend_from_slice(&header.siaddr.octets());
        packet.extend_from_slice(&header.giaddr.octets());
        packet.extend_from_slice(&header.chaddr);
        packet.extend_from_slice(&header.sname);
        packet.extend_from_slice(&header.file);
        packet.extend_from_slice(&header.cookie);
        packet.extend_from_slice(options);

        if packet.len() < MIN_PACKET_SIZE {
            packet.resize(MIN_PACKET_SIZE, 0);
        }

        packet
    }
}

fn ipv4_at(data: &[u8], offset: usize) -> Ipv4Addr {
    Ipv4Addr::new(
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    )
}

/// Space separated hex bytes, for option dumps in debug logs.
pub(crate) fn hex_line(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
