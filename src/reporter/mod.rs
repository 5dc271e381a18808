//! Reporting of lease events.
//!
//! The dispatcher hands every offer, acknowledgement and release to an
//! `EventReporter`. Implementations decide where the events go.

mod log_reporter;

pub use log_reporter::LogReporter;

use crate::domain::LeaseEvent;

/// Receiver of lease events and listener lifecycle notifications.
pub trait EventReporter: Send {
    /// Report a lease event.
    fn report(&self, event: &LeaseEvent);

    /// Called when the listener starts.
    fn on_start(&self, interface: &str);

    /// Called when the listener stops.
    fn on_stop(&self);
}
