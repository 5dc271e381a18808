//! UDP listener driving the request handler.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};

use super::handler::RequestHandler;
use crate::domain::format_mac;
use crate::error::RequestError;

/// Datagrams are read into a buffer of one Ethernet MTU.
const RECV_BUFFER_SIZE: usize = 1500;
/// Read timeout so the loop can poll several sockets and see shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Pause after an unexpected failure before serving again.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Serves BOOTP/DHCP requests on one or more UDP ports.
pub struct BootpServer {
    handler: RequestHandler,
    ports: Vec<u16>,
    running: Arc<AtomicBool>,
}

impl BootpServer {
    pub fn new(handler: RequestHandler, ports: Vec<u16>) -> Self {
        Self {
            handler,
            ports,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get a handle to stop the server.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    /// Bind every port and serve until the running flag is cleared.
    pub fn run(&mut self) -> Result<()> {
        let interface = self.handler.interface().name.clone();
        let sockets = self
            .ports
            .iter()
            .map(|&port| create_socket(port, &interface))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Listening on {} ({}) ports {:?}",
            interface,
            self.handler.interface().address,
            self.ports
        );
        self.handler.reporter().on_start(&interface);
        self.running.store(true, Ordering::SeqCst);

        let mut buf = [0u8; RECV_BUFFER_SIZE];

        while self.running.load(Ordering::SeqCst) {
            for socket in &sockets {
                match socket.recv_from(&mut buf) {
                    Ok((len, from)) => self.serve(socket, &buf[..len], from),
                    Err(e) if is_timeout(&e) => {}
                    Err(e) => {
                        error!("Receive failed: {}", e);
                        thread::sleep(ERROR_BACKOFF);
                    }
                }
            }
        }

        self.handler.reporter().on_stop();
        info!("Server stopped");
        Ok(())
    }

    /// Handle one datagram, surviving a panic in the handler.
    fn serve(&mut self, socket: &UdpSocket, data: &[u8], from: SocketAddr) {
        let handler = &mut self.handler;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            process(handler, socket, data, from)
        }));

        if outcome.is_err() {
            error!("Unexpected failure while handling request from {}", from);
            thread::sleep(ERROR_BACKOFF);
        }
    }
}

fn process(handler: &mut RequestHandler, socket: &UdpSocket, data: &[u8], from: SocketAddr) {
    let reply = match handler.handle(data, from) {
        Ok(Some(reply)) => reply,
        Ok(None) => return,
        Err(e) => {
            log_drop(&e, from);
            return;
        }
    };

    match socket.send_to(&reply.payload, reply.destination) {
        Ok(_) => handler.commit(&reply),
        Err(e) => error!(
            "Failed to send {} for {} to {}: {}",
            reply.reply_type,
            format_mac(reply.client_mac()),
            reply.destination,
            e
        ),
    }
}

fn log_drop(e: &RequestError, from: SocketAddr) {
    match e {
        RequestError::NotBootRequest(_) => debug!("Ignoring datagram from {}: {}", from, e),
        _ => warn!("Dropping request from {}: {}", from, e),
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

/// Create a UDP socket with broadcast enabled, bound to `interface`.
fn create_socket(port: u16, interface: &str) -> Result<UdpSocket> {
    use socket2::{Domain, Protocol, Socket, Type};

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .context("Failed to create socket")?;

    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;

    #[cfg(target_os = "linux")]
    socket
        .bind_device(Some(interface.as_bytes()))
        .with_context(|| format!("Failed to bind socket to device {}", interface))?;
    #[cfg(not(target_os = "linux"))]
    let _ = interface;

    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket
        .bind(&addr.into())
        .with_context(|| format!("Failed to bind to port {}", port))?;

    socket.set_read_timeout(Some(POLL_INTERVAL))?;

    Ok(socket.into())
}
