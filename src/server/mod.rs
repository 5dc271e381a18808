//! Request dispatcher and the UDP loop around it.

mod bootp;
mod handler;

pub use bootp::BootpServer;
pub use handler::{
    HandlerSettings, PendingReply, RequestHandler, BOOTP_CLIENT_PORT, BOOTP_SERVER_PORT,
    PRODUCT_NAME,
};
