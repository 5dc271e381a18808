//! BOOTP/DHCP packet domain models.
//!
//! These types represent the logical structure of BOOTP/DHCP packets,
//! independent of wire format encoding.

use std::fmt;
use std::net::Ipv4Addr;

use macaddr::MacAddr6;

/// BOOTP operation: client to server.
pub const BOOTREQUEST: u8 = 1;
/// BOOTP operation: server to client.
pub const BOOTREPLY: u8 = 2;

/// Broadcast bit of the BOOTP flags field.
pub const BOOTP_FLAGS_BROADCAST: u16 = 1 << 15;

/// DHCP message types as defined in RFC 2131.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DhcpMessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl DhcpMessageType {
    /// Parse from the DHCP option 53 value.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Discover),
            2 => Some(Self::Offer),
            3 => Some(Self::Request),
            4 => Some(Self::Decline),
            5 => Some(Self::Ack),
            6 => Some(Self::Nak),
            7 => Some(Self::Release),
            8 => Some(Self::Inform),
            _ => None,
        }
    }

    /// Wire value for option 53.
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for DhcpMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discover => write!(f, "DISCOVER"),
            Self::Offer => write!(f, "OFFER"),
            Self::Request => write!(f, "REQUEST"),
            Self::Decline => write!(f, "DECLINE"),
            Self::Ack => write!(f, "ACK"),
            Self::Nak => write!(f, "NAK"),
            Self::Release => write!(f, "RELEASE"),
            Self::Inform => write!(f, "INFORM"),
        }
    }
}

macro_rules! option_tags {
    ($($variant:ident = $code:literal => $name:literal,)*) => {
        /// Option tags this server understands.
        ///
        /// Any other tag value makes an inbound option stream unparsable.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum OptionTag {
            $($variant,)*
        }

        impl OptionTag {
            /// Look up a tag from its wire value.
            pub fn from_u8(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Wire value of the tag.
            pub fn code(self) -> u8 {
                match self {
                    $(Self::$variant => $code,)*
                }
            }

            /// Human readable name, used in logs.
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }
    };
}

option_tags! {
    Pad = 0 => "Byte padding",
    SubnetMask = 1 => "Subnet mask",
    TimeOffset = 2 => "Time offset",
    Routers = 3 => "Routers",
    TimeServers = 4 => "Time servers",
    NameServers = 5 => "Name servers",
    DomainNameServers = 6 => "Domain name servers",
    LogServers = 7 => "Log servers",
    CookieServers = 8 => "Cookie servers",
    LprServers = 9 => "Line printer servers",
    ImpressServers = 10 => "Impress servers",
    ResourceLocationServers = 11 => "Resource location servers",
    HostName = 12 => "Host name",
    BootFileSize = 13 => "Boot file size",
    MeritDumpFile = 14 => "Dump file",
    DomainName = 15 => "Domain name",
    SwapServer = 16 => "Swap server",
    RootPath = 17 => "Root path",
    ExtensionsPath = 18 => "Extensions path",
    IpForwarding = 19 => "IP forwarding",
    SourceRouting = 20 => "Source routing",
    PolicyFilter = 21 => "Policy filter",
    MaxDatagramReassembly = 22 => "Maximum datagram reassembly size",
    DefaultIpTtl = 23 => "Default IP TTL",
    PathMtuAgingTimeout = 24 => "Path MTU aging timeout",
    PathMtuPlateauTable = 25 => "Path MTU plateau table",
    InterfaceMtu = 26 => "Interface MTU",
    AllSubnetsLocal = 27 => "All subnets local",
    BroadcastAddress = 28 => "Broadcast address",
    PerformMaskDiscovery = 29 => "Perform mask discovery",
    MaskSupplier = 30 => "Mask supplier",
    PerformRouterDiscovery = 31 => "Perform router discovery",
    RouterSolicitationAddress = 32 => "Router solicitation address",
    StaticRoute = 33 => "Static route",
    TrailerEncapsulation = 34 => "Trailer encapsulation",
    ArpCacheTimeout = 35 => "ARP cache timeout",
    EthernetEncapsulation = 36 => "Ethernet encapsulation",
    TcpDefaultTtl = 37 => "TCP default TTL",
    TcpKeepaliveInterval = 38 => "TCP keepalive interval",
    TcpKeepaliveGarbage = 39 => "TCP keepalive garbage",
    NisDomain = 40 => "Network Information Service domain",
    NisServers = 41 => "Network Information servers",
    NtpServers = 42 => "Network Time Protocol servers",
    VendorSpecific = 43 => "Vendor specific",
    NetbiosNameServers = 44 => "NetBIOS over TCP/IP name server",
    NetbiosDatagramServers = 45 => "NetBIOS over TCP/IP datagram server",
    NetbiosNodeType = 46 => "NetBIOS over TCP/IP node type",
    NetbiosScope = 47 => "NetBIOS over TCP/IP scope",
    XFontServers = 48 => "X Window system font server",
    XDisplayManagers = 49 => "X Window system display manager",
    RequestedIp = 50 => "Requested IP address",
    LeaseTime = 51 => "IP address lease time",
    OptionOverload = 52 => "Option overload",
    MessageType = 53 => "DHCP message",
    ServerIdentifier = 54 => "Server ID",
    ParameterRequestList = 55 => "Param request list",
    Message = 56 => "Error message",
    MaxMessageSize = 57 => "Message length",
    RenewalTime = 58 => "Renewal time",
    RebindingTime = 59 => "Rebinding time",
    ClassId = 60 => "Class ID",
    ClientId = 61 => "GUID",
    NisPlusDomain = 64 => "Network Information Service+ domain",
    NisPlusServers = 65 => "Network Information Service+ servers",
    TftpServerName = 66 => "TFTP server name",
    BootFileName = 67 => "Bootfile name",
    MobileIpHomeAgent = 68 => "Mobile IP home agent",
    SmtpServers = 69 => "Simple Mail Transport Protocol servers",
    Pop3Servers = 70 => "Post Office Protocol servers",
    NntpServers = 71 => "Network News Transport Protocol servers",
    WwwServers = 72 => "World Wide Web servers",
    FingerServers = 73 => "Finger servers",
    IrcServers = 74 => "Internet Relay Chat server",
    UserClass = 77 => "User class",
    ClientArch = 93 => "System architecture",
    ClientNdi = 94 => "Network type",
    ClientUuid = 97 => "UUID",
    IpxeEncapsulated = 175 => "iPXE encap opts",
    End = 255 => "End of DHCP options",
}

impl fmt::Display for OptionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code(), self.name())
    }
}

/// Size of the `chaddr` field.
pub const CHADDR_LEN: usize = 16;
/// Size of the `sname` field.
pub const SNAME_LEN: usize = 64;
/// Size of the `file` field.
pub const FILE_LEN: usize = 128;

/// Fixed-layout part of a BOOTP/DHCP record.
///
/// Byte fields are kept verbatim so that a decoded header re-encodes to the
/// same bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootpHeader {
    /// Operation: 1 = BOOTREQUEST, 2 = BOOTREPLY
    pub op: u8,
    /// Hardware type (1 = Ethernet)
    pub htype: u8,
    /// Hardware address length
    pub hlen: u8,
    /// Relay hop count
    pub hops: u8,
    /// Transaction ID
    pub xid: u32,
    /// Seconds elapsed
    pub secs: u16,
    /// Flags
    pub flags: u16,
    /// Client IP address (if already known)
    pub ciaddr: Ipv4Addr,
    /// 'Your' IP address (assigned by server)
    pub yiaddr: Ipv4Addr,
    /// Server IP address
    pub siaddr: Ipv4Addr,
    /// Relay agent IP address
    pub giaddr: Ipv4Addr,
    /// Client hardware address
    pub chaddr: [u8; CHADDR_LEN],
    /// Server host name, NUL padded
    pub sname: [u8; SNAME_LEN],
    /// Boot file name, NUL padded
    pub file: [u8; FILE_LEN],
    /// DHCP magic cookie
    pub cookie: [u8; 4],
}

impl BootpHeader {
    /// An all-zero request header for the given hardware address.
    pub fn request(mac: MacAddr6, xid: u32) -> Self {
        let mut chaddr = [0u8; CHADDR_LEN];
        chaddr[..6].copy_from_slice(mac.as_bytes());
        Self {
            op: BOOTREQUEST,
            htype: 1,
            hlen: 6,
            hops: 0,
            xid,
            secs: 0,
            flags: 0,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr,
            sname: [0u8; SNAME_LEN],
            file: [0u8; FILE_LEN],
            cookie: crate::codec::DHCP_MAGIC_COOKIE,
        }
    }

    /// Returns true if this is a client request (BOOTREQUEST).
    pub fn is_request(&self) -> bool {
        self.op == BOOTREQUEST
    }

    /// Client MAC address (first six bytes of `chaddr`).
    pub fn client_mac(&self) -> MacAddr6 {
        let c = &self.chaddr;
        MacAddr6::new(c[0], c[1], c[2], c[3], c[4], c[5])
    }

    /// True when a relay agent forwarded this request.
    pub fn is_relayed(&self) -> bool {
        !self.giaddr.is_unspecified()
    }

    /// Server host name as text, up to the first NUL.
    pub fn server_name(&self) -> String {
        nul_terminated(&self.sname)
    }

    /// Boot file name as text, up to the first NUL.
    pub fn boot_file(&self) -> String {
        nul_terminated(&self.file)
    }

    /// Store `name` into `sname`, truncated and NUL padded.
    pub fn set_server_name(&mut self, name: &str) {
        fill_padded(&mut self.sname, name.as_bytes());
    }

    /// Store `path` into `file`, truncated and NUL padded.
    pub fn set_boot_file(&mut self, path: &str) {
        fill_padded(&mut self.file, path.as_bytes());
    }
}

fn nul_terminated(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).into_owned()
}

fn fill_padded(field: &mut [u8], value: &[u8]) {
    field.fill(0);
    let len = value.len().min(field.len());
    field[..len].copy_from_slice(&value[..len]);
}

/// Canonical colon-hex string for a MAC address (`AA:BB:CC:DD:EE:FF`).
pub fn format_mac(mac: MacAddr6) -> String {
    format!("{}", mac).to_uppercase()
}

/// Ordered mapping from option tag to raw value.
///
/// Keeps the order in which tags were first seen; inserting an existing tag
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DhcpOptionSet {
    entries: Vec<(OptionTag, Vec<u8>)>,
}

impl DhcpOptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tag: OptionTag, value: impl Into<Vec<u8>>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(t, _)| *t == tag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((tag, value)),
        }
    }

    pub fn get(&self, tag: OptionTag) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.as_slice())
    }

    pub fn contains(&self, tag: OptionTag) -> bool {
        self.get(tag).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tags in first-seen order.
    pub fn tags(&self) -> impl Iterator<Item = OptionTag> + '_ {
        self.entries.iter().map(|(t, _)| *t)
    }

    /// Raw option 53 value, if present and non-empty.
    pub fn message_type_code(&self) -> Option<u8> {
        self.get(OptionTag::MessageType)
            .and_then(|v| v.first().copied())
    }

    /// Option 60 value.
    pub fn class_id(&self) -> Option<&[u8]> {
        self.get(OptionTag::ClassId)
    }

    /// Option 97 value, type byte included.
    pub fn client_uuid(&self) -> Option<&[u8]> {
        self.get(OptionTag::ClientUuid)
    }

    /// Option 93 value.
    pub fn client_arch(&self) -> Option<u16> {
        match self.get(OptionTag::ClientArch)? {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod dhcp_message_type_tests {
        use super::*;

        #[test]
        fn test_from_u8_valid_values() {
            assert_eq!(DhcpMessageType::from_u8(1), Some(DhcpMessageType::Discover));
            assert_eq!(DhcpMessageType::from_u8(2), Some(DhcpMessageType::Offer));
            assert_eq!(DhcpMessageType::from_u8(3), Some(DhcpMessageType::Request));
            assert_eq!(DhcpMessageType::from_u8(4), Some(DhcpMessageType::Decline));
            assert_eq!(DhcpMessageType::from_u8(5), Some(DhcpMessageType::Ack));
            assert_eq!(DhcpMessageType::from_u8(6), Some(DhcpMessageType::Nak));
            assert_eq!(DhcpMessageType::from_u8(7), Some(DhcpMessageType::Release));
            assert_eq!(DhcpMessageType::from_u8(8), Some(DhcpMessageType::Inform));
        }

        #[test]
        fn test_from_u8_invalid_values() {
            assert_eq!(DhcpMessageType::from_u8(0), None);
            assert_eq!(DhcpMessageType::from_u8(9), None);
            assert_eq!(DhcpMessageType::from_u8(255), None);
        }

        #[test]
        fn test_as_u8_matches_wire_value() {
            for value in 1..=8 {
                let msg = DhcpMessageType::from_u8(value).unwrap();
                assert_eq!(msg.as_u8(), value);
            }
        }

        #[test]
        fn test_display() {
            assert_eq!(format!("{}", DhcpMessageType::Discover), "DISCOVER");
            assert_eq!(format!("{}", DhcpMessageType::Ack), "ACK");
            assert_eq!(format!("{}", DhcpMessageType::Release), "RELEASE");
        }
    }

    mod option_tag_tests {
        use super::*;

        #[test]
        fn test_known_tags() {
            assert_eq!(OptionTag::from_u8(0), Some(OptionTag::Pad));
            assert_eq!(OptionTag::from_u8(53), Some(OptionTag::MessageType));
            assert_eq!(OptionTag::from_u8(60), Some(OptionTag::ClassId));
            assert_eq!(OptionTag::from_u8(97), Some(OptionTag::ClientUuid));
            assert_eq!(OptionTag::from_u8(175), Some(OptionTag::IpxeEncapsulated));
            assert_eq!(OptionTag::from_u8(255), Some(OptionTag::End));
        }

        #[test]
        fn test_unknown_tags() {
            for code in [62u8, 63, 75, 76, 78, 92, 95, 96, 98, 150, 174, 176, 254] {
                assert_eq!(OptionTag::from_u8(code), None, "tag {code}");
            }
        }

        #[test]
        fn test_code_round_trips() {
            for code in 0..=255u8 {
                if let Some(tag) = OptionTag::from_u8(code) {
                    assert_eq!(tag.code(), code);
                }
            }
        }

        #[test]
        fn test_display() {
            assert_eq!(OptionTag::ClassId.to_string(), "60 (Class ID)");
        }
    }

    mod bootp_header_tests {
        use super::*;

        fn mac() -> MacAddr6 {
            MacAddr6::new(0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff)
        }

        #[test]
        fn test_request_header() {
            let header = BootpHeader::request(mac(), 0x12345678);
            assert!(header.is_request());
            assert_eq!(header.client_mac(), mac());
            assert!(!header.is_relayed());
            assert_eq!(header.server_name(), "");
        }

        #[test]
        fn test_relayed() {
            let mut header = BootpHeader::request(mac(), 1);
            header.giaddr = Ipv4Addr::new(10, 0, 0, 5);
            assert!(header.is_relayed());
        }

        #[test]
        fn test_set_server_name_pads_with_nul() {
            let mut header = BootpHeader::request(mac(), 1);
            header.set_server_name("a-much-longer-name.example.com");
            header.set_server_name("node01.lab");
            assert_eq!(header.server_name(), "node01.lab");
            assert!(header.sname[10..].iter().all(|&b| b == 0));
        }

        #[test]
        fn test_set_boot_file_truncates() {
            let mut header = BootpHeader::request(mac(), 1);
            let long = "x".repeat(200);
            header.set_boot_file(&long);
            assert_eq!(header.boot_file().len(), FILE_LEN);
        }

        #[test]
        fn test_format_mac() {
            assert_eq!(format_mac(mac()), "AA:BB:CC:DD:EE:FF");
        }
    }

    mod option_set_tests {
        use super::*;

        #[test]
        fn test_insert_and_get() {
            let mut set = DhcpOptionSet::new();
            set.insert(OptionTag::MessageType, vec![1]);
            set.insert(OptionTag::ClassId, b"PXEClient".to_vec());

            assert_eq!(set.len(), 2);
            assert_eq!(set.message_type_code(), Some(1));
            assert_eq!(set.class_id(), Some(&b"PXEClient"[..]));
            assert!(set.client_uuid().is_none());
        }

        #[test]
        fn test_insert_replaces_in_place() {
            let mut set = DhcpOptionSet::new();
            set.insert(OptionTag::MessageType, vec![1]);
            set.insert(OptionTag::ClassId, b"A".to_vec());
            set.insert(OptionTag::MessageType, vec![3]);

            assert_eq!(set.len(), 2);
            assert_eq!(set.message_type_code(), Some(3));
            let tags: Vec<_> = set.tags().collect();
            assert_eq!(tags, vec![OptionTag::MessageType, OptionTag::ClassId]);
        }

        #[test]
        fn test_empty_message_type() {
            let mut set = DhcpOptionSet::new();
            set.insert(OptionTag::MessageType, Vec::new());
            assert_eq!(set.message_type_code(), None);
        }

        #[test]
        fn test_client_arch() {
            let mut set = DhcpOptionSet::new();
            set.insert(OptionTag::ClientArch, vec![0x00, 0x07]);
            assert_eq!(set.client_arch(), Some(7));

            set.insert(OptionTag::ClientArch, vec![0x00]);
            assert_eq!(set.client_arch(), None);
        }
    }
}
