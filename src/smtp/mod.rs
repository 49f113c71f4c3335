//! SMTP transport: dialing (optionally via SOCKS5), MX host selection and
//! the RCPT probe dialog.

mod dialer;
mod error;
mod probe;
mod proxy;
mod session;
mod strategy;
mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use dialer::{Dial, NetDialer, Timeouts};
pub use error::{ProxyUriError, SmtpError};
pub use probe::{ProbeRequest, probe};
pub use proxy::ProxyConfig;
pub use session::{SmtpClient, Transport};
pub use strategy::{Connected, MxStrategy, connect_first, connect_priority, connect_with_strategy};
pub use types::{ProbeResult, SmtpReply};
