//! Request dispatcher.
//!
//! Turns one inbound datagram into at most one reply. Socket I/O stays in
//! the server loop: `handle` returns the encoded reply and its destination,
//! and the loop calls `commit` once the datagram has actually been sent.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};

use macaddr::MacAddr6;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::codec::DhcpCodec;
use crate::config::{Config, DnsSetting};
use crate::directory::{
    AccessControl, AllowAll, HostDirectory, HostEntry, HostResolver, LeaseTable,
    NameserverLookup, SystemResolver,
};
use crate::domain::{
    format_mac, format_uuid, uuid_from_option, BootpHeader, ClientState, DhcpMessageType,
    DhcpOptionSet, LeaseAction, LeaseEvent, OptionTag, PxeClientArch, BOOTREPLY,
    CLIENT_UUID_OPTION_LEN,
};
use crate::error::RequestError;
use crate::netconfig::InterfaceConfig;
use crate::options::{hostname_option, pxe_options, StandardOptions};
use crate::pool::ClientPools;
use crate::reporter::{EventReporter, LogReporter};

/// Product name announced in the PXE boot menu.
pub const PRODUCT_NAME: &str = "netbootd";

/// Port clients listen on.
pub const BOOTP_CLIENT_PORT: u16 = 68;
/// Port servers and relay agents listen on.
pub const BOOTP_SERVER_PORT: u16 = 67;

/// Reply policy knobs taken from the configuration.
#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub default_boot_file: Option<String>,
    pub lease_time: u32,
    pub dns: DnsSetting,
    pub allow_simple_dhcp: bool,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            default_boot_file: None,
            lease_time: 7200,
            dns: DnsSetting::Auto,
            allow_simple_dhcp: false,
        }
    }
}

impl From<&Config> for HandlerSettings {
    fn from(config: &Config) -> Self {
        Self {
            default_boot_file: config.default_boot_file.clone(),
            lease_time: config.default_lease_time,
            dns: config.default_dns,
            allow_simple_dhcp: config.allow_simple_dhcp,
        }
    }
}

/// An encoded reply waiting to be sent.
///
/// Carries what `commit` needs to record once the send succeeded.
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub payload: Vec<u8>,
    pub destination: SocketAddrV4,
    pub reply_type: DhcpMessageType,
    pub address: Ipv4Addr,
    client_mac: MacAddr6,
    xid: u32,
    next_state: ClientState,
    uuid: Option<Uuid>,
    pxe: bool,
}

impl PendingReply {
    pub fn client_mac(&self) -> MacAddr6 {
        self.client_mac
    }

    pub fn next_state(&self) -> ClientState {
        self.next_state
    }
}

/// What the request asks of the server once classified.
enum ReplyKind {
    Answer(DhcpMessageType),
    Release,
    Ignore,
}

/// Owns the per-client pools and the collaborators used to answer requests.
pub struct RequestHandler {
    codec: DhcpCodec,
    settings: HandlerSettings,
    netconfig: InterfaceConfig,
    pools: ClientPools,
    directory: Box<dyn HostDirectory>,
    resolver: Box<dyn HostResolver>,
    nameservers: Option<Box<dyn NameserverLookup>>,
    acl: Box<dyn AccessControl>,
    reporter: Box<dyn EventReporter>,
}

impl RequestHandler {
    pub fn new(settings: HandlerSettings, netconfig: InterfaceConfig) -> Self {
        Self {
            codec: DhcpCodec::new(),
            settings,
            netconfig,
            pools: ClientPools::new(),
            directory: Box::new(LeaseTable::new()),
            resolver: Box::new(SystemResolver),
            nameservers: None,
            acl: Box::new(AllowAll),
            reporter: Box::new(LogReporter::new()),
        }
    }

    pub fn with_directory(mut self, directory: impl HostDirectory + 'static) -> Self {
        self.directory = Box::new(directory);
        self
    }

    pub fn with_resolver(mut self, resolver: impl HostResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn with_nameservers(mut self, nameservers: impl NameserverLookup + 'static) -> Self {
        self.nameservers = Some(Box::new(nameservers));
        self
    }

    pub fn with_access_control(mut self, acl: impl AccessControl + 'static) -> Self {
        self.acl = Box::new(acl);
        self
    }

    pub fn with_reporter(mut self, reporter: impl EventReporter + 'static) -> Self {
        self.reporter = Box::new(reporter);
        self
    }

    pub fn pools(&self) -> &ClientPools {
        &self.pools
    }

    /// Mutable pools, used to register boot files by address.
    pub fn pools_mut(&mut self) -> &mut ClientPools {
        &mut self.pools
    }

    pub fn reporter(&self) -> &dyn EventReporter {
        self.reporter.as_ref()
    }

    pub fn interface(&self) -> &InterfaceConfig {
        &self.netconfig
    }

    /// Process one datagram.
    ///
    /// `Ok(None)` means the request is valid but gets no reply. Errors mean
    /// the request was dropped. Client state is left untouched either way;
    /// it only changes through [`RequestHandler::commit`].
    pub fn handle(
        &mut self,
        data: &[u8],
        from: SocketAddr,
    ) -> Result<Option<PendingReply>, RequestError> {
        debug!("Received {} bytes from {}", data.len(), from);

        let (request, tail) = self.codec.decode(data)?;
        if !request.is_request() {
            return Err(RequestError::NotBootRequest(request.op));
        }
        let options = self.codec.decode_options(tail)?;

        let client_mac = request.client_mac();
        let mac = format_mac(client_mac);

        let inbound_uuid = options.client_uuid().and_then(uuid_from_option);
        let pxe_mode = options
            .client_uuid()
            .is_some_and(|v| v.len() == CLIENT_UUID_OPTION_LEN);
        let uuid = self.pools.uuid_for(&mac, inbound_uuid);

        let code = options
            .message_type_code()
            .ok_or(RequestError::MissingRequiredOption(OptionTag::MessageType))?;
        let msg_type =
            DhcpMessageType::from_u8(code).ok_or(RequestError::UnsupportedMessageType(code))?;

        log_request(&request, &options, &mac, msg_type, uuid.as_ref());

        if !self.acl.allows(&mac, uuid.as_ref()) {
            return Err(RequestError::AccessDenied(match uuid {
                Some(uuid) => format!("{} ({})", mac, format_uuid(&uuid)),
                None => mac,
            }));
        }

        let state = self.pools.session(&mac);
        let next_state = state.next(pxe_mode, msg_type);
        debug!("Client {} state {} -> {}", mac, state, next_state);

        if next_state == ClientState::Idle && !self.settings.allow_simple_dhcp {
            info!("Ignoring non-PXE request from {}", mac);
            return Ok(None);
        }

        let reply_type = match classify(msg_type, code)? {
            ReplyKind::Answer(reply_type) => reply_type,
            ReplyKind::Release => {
                self.report_release(&request, &mac, state, pxe_mode);
                return Ok(None);
            }
            ReplyKind::Ignore => {
                debug!("No reply to {} from {}", msg_type, mac);
                return Ok(None);
            }
        };

        let host = self.directory.lookup(&mac);

        let mut reply = request.clone();
        reply.op = BOOTREPLY;
        reply.siaddr = self.netconfig.address;

        let (address, mut destination) = if request.ciaddr.is_unspecified() {
            let address = self.allocate(&mac, host.as_ref())?;
            reply.secs = 0;
            reply.flags = 0;
            let broadcast = self.netconfig.broadcast_for(address);
            (address, SocketAddrV4::new(broadcast, BOOTP_CLIENT_PORT))
        } else {
            if !request.is_relayed() && !self.netconfig.is_local(IpAddr::V4(request.ciaddr)) {
                warn!(
                    "Client {} uses address {} outside {}/{}",
                    mac,
                    request.ciaddr,
                    self.netconfig.network_of(self.netconfig.address),
                    self.netconfig.netmask
                );
            }
            (request.ciaddr, SocketAddrV4::new(request.ciaddr, BOOTP_CLIENT_PORT))
        };

        if request.is_relayed() {
            destination = SocketAddrV4::new(request.giaddr, BOOTP_SERVER_PORT);
        }

        reply.yiaddr = address;
        reply.set_server_name(&host.as_ref().map(HostEntry::fqdn).unwrap_or_default());
        reply.set_boot_file(&self.boot_file(host.as_ref(), address));

        let option_bytes = self.reply_options(reply_type, &options, pxe_mode, host.as_ref())?;
        let payload = self.codec.encode(&reply, &option_bytes);

        info!(
            "{} {} to {} via {} (file: '{}')",
            reply_type,
            address,
            mac,
            destination,
            reply.boot_file()
        );

        Ok(Some(PendingReply {
            payload,
            destination,
            reply_type,
            address,
            client_mac,
            xid: request.xid,
            next_state,
            uuid: inbound_uuid,
            pxe: pxe_mode,
        }))
    }

    /// Record the effects of a reply that was sent.
    pub fn commit(&mut self, reply: &PendingReply) {
        let mac = format_mac(reply.client_mac);
        self.pools.set_state(&mac, reply.next_state);
        if let Some(uuid) = reply.uuid {
            self.pools.remember_uuid(&mac, uuid);
        }

        let action = match reply.reply_type {
            DhcpMessageType::Ack => LeaseAction::Acknowledged,
            _ => LeaseAction::Offered,
        };
        self.reporter.report(&LeaseEvent::new(
            action,
            reply.client_mac,
            reply.xid,
            reply.address,
            reply.next_state,
            reply.pxe,
        ));
    }

    fn allocate(&mut self, mac: &str, host: Option<&HostEntry>) -> Result<Ipv4Addr, RequestError> {
        let resolver = &self.resolver;
        self.pools.allocate_or_reuse(mac, || {
            let host = host.ok_or_else(|| RequestError::NoLeaseAvailable(mac.to_string()))?;
            let ip = resolver
                .resolve(&host.hostname)
                .ok_or_else(|| RequestError::UnresolvedHost(host.hostname.clone()))?;
            info!("Lease for MAC {} set to IP {}", mac, ip);
            Ok(ip)
        })
    }

    /// Host record file, then the file registered for the address, then the
    /// configured default.
    fn boot_file(&self, host: Option<&HostEntry>, address: Ipv4Addr) -> String {
        if let Some(file) = host.and_then(|h| h.boot_file.as_deref()) {
            return file.to_string();
        }
        match self.pools.boot_file_for(address) {
            "" => self.settings.default_boot_file.clone().unwrap_or_default(),
            file => file.to_string(),
        }
    }

    fn dns(&self) -> Option<Ipv4Addr> {
        match self.settings.dns {
            DnsSetting::Disabled => None,
            DnsSetting::Static(ip) => Some(ip),
            DnsSetting::Auto => self
                .nameservers
                .as_ref()
                .and_then(|lookup| lookup.primary_nameserver()),
        }
    }

    fn reply_options(
        &self,
        reply_type: DhcpMessageType,
        inbound: &DhcpOptionSet,
        pxe_mode: bool,
        host: Option<&HostEntry>,
    ) -> Result<Vec<u8>, RequestError> {
        let standard = StandardOptions {
            reply_type,
            server: self.netconfig.address,
            netmask: self.netconfig.netmask,
            dns: self.dns(),
            lease_time: self.settings.lease_time,
        };

        let mut stream = standard.build();
        if pxe_mode {
            stream.extend(pxe_options(inbound, self.netconfig.address, PRODUCT_NAME)?);
        } else {
            stream.extend(hostname_option(host.map(HostEntry::short_name)));
        }
        stream.push(OptionTag::End.code());
        Ok(stream)
    }

    fn report_release(
        &self,
        request: &BootpHeader,
        mac: &str,
        state: ClientState,
        pxe_mode: bool,
    ) {
        let address = if request.ciaddr.is_unspecified() {
            self.pools.lease(mac).unwrap_or(Ipv4Addr::UNSPECIFIED)
        } else {
            request.ciaddr
        };
        info!("Release of {} by {}", address, mac);
        self.reporter.report(&LeaseEvent::new(
            LeaseAction::Released,
            request.client_mac(),
            request.xid,
            address,
            state,
            pxe_mode,
        ));
    }
}

/// Server-to-client message types are not accepted as requests.
fn classify(msg_type: DhcpMessageType, code: u8) -> Result<ReplyKind, RequestError> {
    match msg_type {
        DhcpMessageType::Discover => Ok(ReplyKind::Answer(DhcpMessageType::Offer)),
        DhcpMessageType::Request => Ok(ReplyKind::Answer(DhcpMessageType::Ack)),
        DhcpMessageType::Release => Ok(ReplyKind::Release),
        DhcpMessageType::Inform | DhcpMessageType::Decline => Ok(ReplyKind::Ignore),
        DhcpMessageType::Offer | DhcpMessageType::Ack | DhcpMessageType::Nak => {
            Err(RequestError::UnsupportedMessageType(code))
        }
    }
}

fn log_request(
    request: &BootpHeader,
    options: &DhcpOptionSet,
    mac: &str,
    msg_type: DhcpMessageType,
    uuid: Option<&Uuid>,
) {
    let arch = options
        .client_arch()
        .map(|code| PxeClientArch::from_u16(code).to_string())
        .unwrap_or_else(|| "-".to_string());
    let uuid = uuid.map(format_uuid).unwrap_or_else(|| "-".to_string());
    info!(
        "{} from {} (XID: 0x{:08X}, UUID: {}, Arch: {})",
        msg_type, mac, request.xid, uuid, arch
    );
}
