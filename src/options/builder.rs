//! Reply option blocks.
//!
//! Two independent blocks are produced per reply: the standard DHCP options
//! and, for PXE firmware, the vendor block carrying the boot server and menu.
//! Blocks are raw TLV bytes without the final end tag; the dispatcher closes
//! the combined stream once.

use std::net::Ipv4Addr;

use crate::domain::{truncate_class_id, DhcpMessageType, DhcpOptionSet, OptionTag};
use crate::error::RequestError;

/// PXE vendor sub-option: discovery control.
pub const PXE_DISCOVERY_CONTROL: u8 = 6;
/// PXE vendor sub-option: boot servers.
pub const PXE_BOOT_SERVERS: u8 = 8;
/// PXE vendor sub-option: boot menu.
pub const PXE_BOOT_MENU: u8 = 9;
/// PXE vendor sub-option: menu prompt.
pub const PXE_MENU_PROMPT: u8 = 10;

/// Disable multicast discovery, only use servers from the boot server list.
pub const DISCOVERY_CONTROL_BOOT_SERVER_LIST: u8 = 0x0A;
/// Boot server / menu item type for the generic PXE bootstrap server.
pub const PXE_SERVER_TYPE_BOOTSTRAP: u16 = 0;
/// Menu prompt timeout in seconds.
pub const MENU_PROMPT_TIMEOUT: u8 = 10;
/// Menu prompt text.
pub const MENU_PROMPT: &str = "netbootd PXE";

/// TLV writer for an option stream.
#[derive(Debug, Default)]
pub struct OptionWriter {
    buf: Vec<u8>,
}

impl OptionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one option. Values longer than 255 bytes are truncated.
    pub fn push_raw(&mut self, code: u8, value: &[u8]) -> &mut Self {
        let len = value.len().min(u8::MAX as usize);
        self.buf.push(code);
        self.buf.push(len as u8);
        self.buf.extend_from_slice(&value[..len]);
        self
    }

    pub fn push(&mut self, tag: OptionTag, value: &[u8]) -> &mut Self {
        self.push_raw(tag.code(), value)
    }

    pub fn push_u8(&mut self, tag: OptionTag, value: u8) -> &mut Self {
        self.push(tag, &[value])
    }

    pub fn push_u32(&mut self, tag: OptionTag, value: u32) -> &mut Self {
        self.push(tag, &value.to_be_bytes())
    }

    pub fn push_ipv4(&mut self, tag: OptionTag, addr: Ipv4Addr) -> &mut Self {
        self.push(tag, &addr.octets())
    }

    /// Append a bare end marker (no length byte).
    pub fn end(&mut self) -> &mut Self {
        self.buf.push(OptionTag::End.code());
        self
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Inputs of the standard option block.
#[derive(Debug, Clone)]
pub struct StandardOptions {
    pub reply_type: DhcpMessageType,
    /// Bound interface address, used as server identifier and gateway
    pub server: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub dns: Option<Ipv4Addr>,
    pub lease_time: u32,
}

impl StandardOptions {
    /// Message type, server id, mask, router, DNS (when known), lease time.
    pub fn build(&self) -> Vec<u8> {
        let mut writer = OptionWriter::new();
        writer
            .push_u8(OptionTag::MessageType, self.reply_type.as_u8())
            .push_ipv4(OptionTag::ServerIdentifier, self.server)
            .push_ipv4(OptionTag::SubnetMask, self.netmask)
            .push_ipv4(OptionTag::Routers, self.server);
        if let Some(dns) = self.dns {
            writer.push_ipv4(OptionTag::DomainNameServers, dns);
        }
        writer.push_u32(OptionTag::LeaseTime, self.lease_time);
        writer.into_bytes()
    }
}

/// Build the PXE block from the inbound options.
///
/// Echoes option 97 and the truncated option 60, then emits the vendor
/// envelope (tag 43). Either inbound option missing fails the whole block.
pub fn pxe_options(
    inbound: &DhcpOptionSet,
    server: Ipv4Addr,
    product: &str,
) -> Result<Vec<u8>, RequestError> {
    let uuid = inbound
        .client_uuid()
        .ok_or(RequestError::MissingRequiredOption(OptionTag::ClientUuid))?;
    let class_id = inbound
        .class_id()
        .ok_or(RequestError::MissingRequiredOption(OptionTag::ClassId))?;

    let mut writer = OptionWriter::new();
    writer
        .push(OptionTag::ClientUuid, uuid)
        .push(OptionTag::ClassId, truncate_class_id(class_id))
        .push(OptionTag::VendorSpecific, &vendor_block(server, product));
    Ok(writer.into_bytes())
}

/// Encapsulated PXE sub-options carried in tag 43.
fn vendor_block(server: Ipv4Addr, product: &str) -> Vec<u8> {
    let mut vendor = OptionWriter::new();
    vendor.push_raw(PXE_DISCOVERY_CONTROL, &[DISCOVERY_CONTROL_BOOT_SERVER_LIST]);

    let mut servers = PXE_SERVER_TYPE_BOOTSTRAP.to_be_bytes().to_vec();
    servers.push(1);
    servers.extend_from_slice(&server.octets());
    vendor.push_raw(PXE_BOOT_SERVERS, &servers);

    // Leaves room for the type and length bytes inside a 255-byte value.
    let product = &product.as_bytes()[..product.len().min(252)];
    let mut menu = PXE_SERVER_TYPE_BOOTSTRAP.to_be_bytes().to_vec();
    menu.push(product.len() as u8);
    menu.extend_from_slice(product);
    vendor.push_raw(PXE_BOOT_MENU, &menu);

    let mut prompt = vec![MENU_PROMPT_TIMEOUT];
    prompt.extend_from_slice(MENU_PROMPT.as_bytes());
    vendor.push_raw(PXE_MENU_PROMPT, &prompt);

    vendor.end();
    vendor.into_bytes()
}

/// Host name option for plain DHCP replies; empty when no name is known.
pub fn hostname_option(hostname: Option<&str>) -> Vec<u8> {
    let mut writer = OptionWriter::new();
    if let Some(name) = hostname.filter(|n| !n.is_empty()) {
        writer.push(OptionTag::HostName, name.as_bytes());
    }
    writer.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> Ipv4Addr {
        Ipv4Addr::new(10, 0, 0, 1)
    }

    fn pxe_inbound() -> DhcpOptionSet {
        let mut uuid = vec![0u8];
        uuid.extend(1..=16u8);
        let mut set = DhcpOptionSet::new();
        set.insert(OptionTag::MessageType, vec![1]);
        set.insert(OptionTag::ClientUuid, uuid);
        set.insert(OptionTag::ClassId, b"PXEClient:Arch:00000:UNDI:002001".to_vec());
        set
    }

    mod writer_tests {
        use super::*;

        #[test]
        fn test_push_layout() {
            let mut writer = OptionWriter::new();
            writer
                .push_u8(OptionTag::MessageType, 2)
                .push_u32(OptionTag::LeaseTime, 7200)
                .end();
            assert_eq!(
                writer.into_bytes(),
                vec![53, 1, 2, 51, 4, 0x00, 0x00, 0x1c, 0x20, 255]
            );
        }

        #[test]
        fn test_long_value_truncated() {
            let mut writer = OptionWriter::new();
            writer.push(OptionTag::HostName, &[b'a'; 300]);
            let bytes = writer.into_bytes();
            assert_eq!(bytes[1], 255);
            assert_eq!(bytes.len(), 257);
        }
    }

    mod standard_tests {
        use super::*;

        fn options(dns: Option<Ipv4Addr>) -> StandardOptions {
            StandardOptions {
                reply_type: DhcpMessageType::Offer,
                server: server(),
                netmask: Ipv4Addr::new(255, 255, 255, 0),
                dns,
                lease_time: 7200,
            }
        }

        #[test]
        fn test_with_dns() {
            let bytes = options(Some(Ipv4Addr::new(10, 0, 0, 53))).build();
            assert_eq!(
                bytes,
                vec![
                    53, 1, 2, //
                    54, 4, 10, 0, 0, 1, //
                    1, 4, 255, 255, 255, 0, //
                    3, 4, 10, 0, 0, 1, //
                    6, 4, 10, 0, 0, 53, //
                    51, 4, 0, 0, 0x1c, 0x20,
                ]
            );
        }

        #[test]
        fn test_without_dns() {
            let bytes = options(None).build();
            assert!(!bytes.windows(2).any(|w| w == [6, 4]));
            assert_eq!(bytes.len(), 3 + 6 + 6 + 6 + 6);
        }
    }

    mod pxe_tests {
        use super::*;

        #[test]
        fn test_pxe_block_layout() {
            let bytes = pxe_options(&pxe_inbound(), server(), "netbootd").unwrap();

            // Option 97 echoed verbatim.
            assert_eq!(bytes[0], 97);
            assert_eq!(bytes[1], 17);
            assert_eq!(&bytes[3..19], &(1..=16u8).collect::<Vec<_>>()[..]);

            // Option 60 truncated at the first colon.
            assert_eq!(&bytes[19..21], &[60, 9]);
            assert_eq!(&bytes[21..30], b"PXEClient");

            // Vendor envelope.
            assert_eq!(bytes[30], 43);
            let vendor = &bytes[32..];
            assert_eq!(bytes[31] as usize, vendor.len());
            assert_eq!(&vendor[..3], &[6, 1, 0x0A]);
            assert_eq!(&vendor[3..12], &[8, 7, 0, 0, 1, 10, 0, 0, 1]);
            assert_eq!(&vendor[12..17], &[9, 11, 0, 0, 8]);
            assert_eq!(&vendor[17..25], b"netbootd");
            assert_eq!(vendor[25], 10);
            assert_eq!(vendor[26] as usize, 1 + MENU_PROMPT.len());
            assert_eq!(vendor[27], MENU_PROMPT_TIMEOUT);
            assert_eq!(*vendor.last().unwrap(), 255);
        }

        #[test]
        fn test_missing_uuid_fails() {
            let mut inbound = DhcpOptionSet::new();
            inbound.insert(OptionTag::ClassId, b"PXEClient".to_vec());

            let result = pxe_options(&inbound, server(), "netbootd");
            assert!(matches!(
                result,
                Err(RequestError::MissingRequiredOption(OptionTag::ClientUuid))
            ));
        }

        #[test]
        fn test_missing_class_id_fails() {
            let mut inbound = pxe_inbound();
            let uuid = inbound.client_uuid().unwrap().to_vec();
            inbound = DhcpOptionSet::new();
            inbound.insert(OptionTag::ClientUuid, uuid);

            let result = pxe_options(&inbound, server(), "netbootd");
            assert!(matches!(
                result,
                Err(RequestError::MissingRequiredOption(OptionTag::ClassId))
            ));
        }

        #[test]
        fn test_class_id_without_colon() {
            let mut inbound = pxe_inbound();
            inbound.insert(OptionTag::ClassId, b"PXEClient".to_vec());

            let bytes = pxe_options(&inbound, server(), "netbootd").unwrap();
            assert_eq!(&bytes[19..30], b"\x3c\x09PXEClient");
        }
    }

    mod hostname_tests {
        use super::*;

        #[test]
        fn test_hostname_present() {
            assert_eq!(
                hostname_option(Some("node01")),
                vec![12, 6, b'n', b'o', b'd', b'e', b'0', b'1']
            );
        }

        #[test]
        fn test_hostname_absent() {
            assert!(hostname_option(None).is_empty());
            assert!(hostname_option(Some("")).is_empty());
        }
    }
}
