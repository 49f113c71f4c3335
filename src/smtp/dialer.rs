use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::error::SmtpError;
use super::proxy::ProxyConfig;
use super::session::SmtpClient;

/// Deadlines for one dial. A zero duration disables the deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// TCP connect and proxy negotiation.
    pub connect: Duration,
    /// Each read or write once connected, greeting included.
    pub operation: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            operation: Duration::from_secs(10),
        }
    }
}

/// Opens a connection to one mail exchanger and returns a client whose
/// greeting has been read (no `HELO` yet).
///
/// `addr` is `host:port`. Implementations are shared between dialing threads.
pub trait Dial: Send + Sync {
    fn dial(&self, addr: &str, timeouts: &Timeouts) -> Result<SmtpClient, SmtpError>;
}

impl<F> Dial for F
where
    F: Fn(&str, &Timeouts) -> Result<SmtpClient, SmtpError> + Send + Sync,
{
    fn dial(&self, addr: &str, timeouts: &Timeouts) -> Result<SmtpClient, SmtpError> {
        self(addr, timeouts)
    }
}

/// TCP dialer, optionally tunnelling through a SOCKS5 proxy.
#[derive(Debug, Clone, Default)]
pub struct NetDialer {
    proxy: Option<ProxyConfig>,
}

impl NetDialer {
    pub fn new(proxy: Option<ProxyConfig>) -> Self {
        Self { proxy }
    }

    pub fn direct() -> Self {
        Self::default()
    }

    pub fn proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }
}

impl Dial for NetDialer {
    fn dial(&self, addr: &str, timeouts: &Timeouts) -> Result<SmtpClient, SmtpError> {
        let (host, port) = split_host_port(addr)?;
        let stream = match &self.proxy {
            Some(proxy) => {
                debug!(addr, proxy = %proxy.address(), "dialing through proxy");
                proxy.connect(host, port, timeouts.connect)?
            }
            None => {
                debug!(addr, "dialing");
                connect_tcp(host, port, timeouts.connect)?
            }
        };
        let mut client = SmtpClient::from_tcp(host, stream, timeouts.operation)?;
        client.read_banner()?;
        Ok(client)
    }
}

/// Splits `host:port`, accepting `[v6]:port`.
pub(crate) fn split_host_port(addr: &str) -> Result<(&str, u16), SmtpError> {
    let missing = || SmtpError::MissingPort {
        addr: addr.to_string(),
    };
    let (host, port) = if let Some(rest) = addr.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(missing)?;
        (host, tail.strip_prefix(':').ok_or_else(missing)?)
    } else {
        let (host, port) = addr.rsplit_once(':').ok_or_else(missing)?;
        if host.contains(':') {
            return Err(missing());
        }
        (host, port)
    };
    if port.is_empty() {
        return Err(missing());
    }
    let port = port.parse::<u16>().map_err(|_| SmtpError::InvalidPort {
        addr: addr.to_string(),
    })?;
    Ok((host, port))
}

/// Resolves `host` and connects to the first reachable address.
pub(crate) fn connect_tcp(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, SmtpError> {
    let no_such_host = || SmtpError::NoSuchHost {
        host: host.to_string(),
    };
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|_| no_such_host())?
        .collect();
    if addrs.is_empty() {
        return Err(no_such_host());
    }

    let mut last_err = None;
    for addr in &addrs {
        let attempt = match non_zero(timeout) {
            Some(timeout) => TcpStream::connect_timeout(addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(err) => last_err = Some(SmtpError::connect(addr.to_string(), err)),
        }
    }
    Err(last_err.unwrap_or_else(no_such_host))
}

pub(crate) fn non_zero(timeout: Duration) -> Option<Duration> {
    if timeout.is_zero() { None } else { Some(timeout) }
}
