//! Tracing-based event reporter.

use tracing::info;

use crate::domain::{format_mac, LeaseAction, LeaseEvent};
use crate::reporter::EventReporter;

/// Reports lease events as tracing records.
#[derive(Debug, Default)]
pub struct LogReporter {
    /// Include transaction id and boot phase
    verbose: bool,
}

impl LogReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn format_event(&self, event: &LeaseEvent) -> String {
        let label = match event.action {
            LeaseAction::Offered => "[OFFER]   ",
            LeaseAction::Acknowledged => "[ACK]     ",
            LeaseAction::Released => "[RELEASE] ",
        };
        let kind = if event.pxe { "PXE" } else { "DHCP" };

        let mut output = format!(
            "{} MAC: {} | IP: {} | {}",
            label,
            format_mac(event.client_mac),
            event.address,
            kind
        );

        if self.verbose {
            // Replies carry the phase entered, releases the phase left.
            let phase = if event.is_server_response() {
                "State"
            } else {
                "Released in"
            };
            output.push_str(&format!(
                " | XID: {:#010x} | {}: {}",
                event.transaction_id, phase, event.state
            ));
        }

        output
    }
}

impl EventReporter for LogReporter {
    fn report(&self, event: &LeaseEvent) {
        info!("{}", self.format_event(event));
    }

    fn on_start(&self, interface: &str) {
        info!("Listening for boot requests on interface: {}", interface);
    }

    fn on_stop(&self) {
        info!("Stopping boot request listener");
    }
}
