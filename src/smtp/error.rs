use std::io;

use thiserror::Error;

use super::types::SmtpReply;

/// Failures while dialing a mail exchanger or driving the SMTP dialog.
#[derive(Debug, Error)]
pub enum SmtpError {
    #[error("address {addr}: missing port in address")]
    MissingPort { addr: String },
    #[error("address {addr}: invalid port")]
    InvalidPort { addr: String },
    #[error("lookup {host}: no such host")]
    NoSuchHost { host: String },
    #[error("dial tcp {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    #[error("{context}: i/o timeout")]
    Timeout { context: String },
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("socks5 proxy {proxy}: {reason}")]
    Proxy { proxy: String, reason: String },
    /// A non-2xx reply; displays as `"<code> <text>"`.
    #[error("{0}")]
    Reply(SmtpReply),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("No MX records found")]
    NoMxRecords,
}

impl SmtpError {
    /// Wraps an I/O error, turning expired socket deadlines into
    /// [`SmtpError::Timeout`].
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        let context = context.into();
        if is_timeout(&source) {
            Self::Timeout { context }
        } else {
            Self::Io { context, source }
        }
    }

    pub(crate) fn connect(addr: impl Into<String>, source: io::Error) -> Self {
        let addr = addr.into();
        if is_timeout(&source) {
            Self::Timeout {
                context: format!("dial tcp {addr}"),
            }
        } else {
            Self::Connect { addr, source }
        }
    }

    pub(crate) fn proxy(proxy: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Proxy {
            proxy: proxy.into(),
            reason: reason.into(),
        }
    }

    /// The SMTP reply carried by a rejection, if any.
    pub fn reply(&self) -> Option<&SmtpReply> {
        match self {
            Self::Reply(reply) => Some(reply),
            _ => None,
        }
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

/// Malformed proxy URI.
#[derive(Debug, Error)]
pub enum ProxyUriError {
    #[error("invalid proxy URI: {source}")]
    Parse {
        #[source]
        source: url::ParseError,
    },
    #[error("unsupported proxy scheme '{scheme}' (only socks5 is supported)")]
    UnsupportedScheme { scheme: String },
    #[error("proxy URI is missing a host")]
    MissingHost,
    #[error("proxy URI is missing a port")]
    MissingPort,
    #[error("proxy credentials are not valid UTF-8 once decoded")]
    InvalidCredentials,
    #[error("invalid proxy timeout '{value}'")]
    InvalidTimeout { value: String },
}
