use std::fmt;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use tracing::debug;

use super::dialer::non_zero;
use super::error::SmtpError;
use super::types::SmtpReply;

/// Longest reply line accepted, terminator included.
const MAX_LINE: usize = 4096;

/// Byte stream an [`SmtpClient`] talks over. Anything readable, writable
/// and sendable to another thread qualifies.
pub trait Transport: Read + Write + Send {}

impl<T: Read + Write + Send> Transport for T {}

/// Minimal SMTP client: just enough of RFC 5321 to run a probe dialog.
pub struct SmtpClient {
    host: String,
    /// Used in error text instead of the host name, which is remote input.
    peer: String,
    stream: Box<dyn Transport>,
    socket: Option<TcpStream>,
    operation: Option<Duration>,
    buffer: Vec<u8>,
}

impl fmt::Debug for SmtpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpClient")
            .field("host", &self.host)
            .field("peer", &self.peer)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

impl SmtpClient {
    /// Wraps an already connected transport. The greeting has not been read
    /// and replies have no deadline.
    pub fn new(host: impl Into<String>, stream: impl Transport + 'static) -> Self {
        Self {
            host: host.into(),
            peer: "smtp".to_string(),
            stream: Box::new(stream),
            socket: None,
            operation: None,
            buffer: Vec::new(),
        }
    }

    /// Wraps a TCP connection. Every reply, multi-line ones included, must
    /// arrive within `operation` of the read starting.
    pub fn from_tcp(
        host: impl Into<String>,
        stream: TcpStream,
        operation: Duration,
    ) -> Result<Self, SmtpError> {
        let peer = stream
            .peer_addr()
            .map(|addr| format!("tcp {addr}"))
            .unwrap_or_else(|_| "tcp".to_string());
        let socket = stream
            .try_clone()
            .map_err(|err| SmtpError::io(format!("clone {peer}"), err))?;
        socket
            .set_write_timeout(non_zero(operation))
            .map_err(|err| SmtpError::io(format!("configure {peer}"), err))?;
        Ok(Self {
            host: host.into(),
            peer,
            stream: Box::new(stream),
            socket: Some(socket),
            operation: non_zero(operation),
            buffer: Vec::new(),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Reads the server greeting, which must be a 2xx reply.
    pub fn read_banner(&mut self) -> Result<SmtpReply, SmtpError> {
        let reply = self.read_reply()?;
        debug!(mx = %self.host, code = reply.code, "banner received");
        positive(reply)
    }

    /// `EHLO`, falling back to `HELO` for servers that reject the extended
    /// greeting.
    pub fn hello(&mut self, name: &str) -> Result<SmtpReply, SmtpError> {
        let reply = self.command(&format!("EHLO {name}"))?;
        if reply.is_permanent_failure() {
            return positive(self.command(&format!("HELO {name}"))?);
        }
        positive(reply)
    }

    pub fn mail(&mut self, from: &str) -> Result<SmtpReply, SmtpError> {
        positive(self.command(&format!("MAIL FROM:<{from}>"))?)
    }

    pub fn rcpt(&mut self, to: &str) -> Result<SmtpReply, SmtpError> {
        positive(self.command(&format!("RCPT TO:<{to}>"))?)
    }

    pub fn reset(&mut self) -> Result<SmtpReply, SmtpError> {
        positive(self.command("RSET")?)
    }

    /// Sends `QUIT` and closes the connection. Errors are ignored: the
    /// socket is released either way.
    pub fn quit(mut self) {
        if let Err(err) = self.command("QUIT") {
            debug!(mx = %self.host, error = %err, "QUIT failed");
        }
    }

    fn command(&mut self, line: &str) -> Result<SmtpReply, SmtpError> {
        debug!(mx = %self.host, command = line, "smtp >");
        let mut data = line.as_bytes().to_vec();
        data.extend_from_slice(b"\r\n");
        self.stream
            .write_all(&data)
            .and_then(|()| self.stream.flush())
            .map_err(|err| SmtpError::io(format!("write {}", self.peer), err))?;
        let reply = self.read_reply()?;
        debug!(mx = %self.host, code = reply.code, "smtp <");
        Ok(reply)
    }

    fn read_reply(&mut self) -> Result<SmtpReply, SmtpError> {
        let deadline = self.operation.map(|operation| Instant::now() + operation);
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = self.read_line(deadline)?;
            let parsed_code = line
                .get(..3)
                .filter(|prefix| prefix.bytes().all(|b| b.is_ascii_digit()))
                .and_then(|prefix| prefix.parse::<u16>().ok())
                .ok_or_else(|| SmtpError::Protocol(format!("invalid reply: {line}")))?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(SmtpError::Protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            let is_last = line.as_bytes().get(3) != Some(&b'-');
            lines.push(line.get(4..).unwrap_or_default().to_string());
            if is_last {
                break;
            }
        }
        Ok(SmtpReply {
            code: code.unwrap_or_default(),
            message: lines.join("\n"),
        })
    }

    /// One line without its terminator. Bytes that are not UTF-8 (Latin-1
    /// rejections from older MTAs) are replaced, not refused.
    fn read_line(&mut self, deadline: Option<Instant>) -> Result<String, SmtpError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let mut line = self.buffer.drain(..=pos).collect::<Vec<_>>();
                if line.ends_with(b"\r\n") {
                    line.truncate(line.len() - 2);
                } else {
                    line.truncate(line.len() - 1);
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            if self.buffer.len() >= MAX_LINE {
                return Err(SmtpError::Protocol(format!(
                    "reply line longer than {MAX_LINE} bytes"
                )));
            }

            if let Some(deadline) = deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Err(SmtpError::Timeout {
                        context: format!("read {}", self.peer),
                    });
                }
                if let Some(socket) = &self.socket {
                    socket
                        .set_read_timeout(Some(remaining))
                        .map_err(|err| SmtpError::io(format!("configure {}", self.peer), err))?;
                }
            }

            let mut buf = [0u8; 512];
            let want = buf.len().min(MAX_LINE - self.buffer.len());
            let read = self
                .stream
                .read(&mut buf[..want])
                .map_err(|err| SmtpError::io(format!("read {}", self.peer), err))?;
            if read == 0 {
                return Err(SmtpError::io(
                    format!("read {}", self.peer),
                    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"),
                ));
            }
            self.buffer.extend_from_slice(&buf[..read]);
        }
    }
}

fn positive(reply: SmtpReply) -> Result<SmtpReply, SmtpError> {
    if reply.is_positive_completion() {
        Ok(reply)
    } else {
        Err(SmtpError::Reply(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smtp::testing::ScriptedTransport;

    #[test]
    fn reads_multiline_replies() {
        let transport = ScriptedTransport::new("220 mx ready\r\n250-mx.example\r\n250-PIPELINING\r\n250 SIZE 1000\r\n");
        let mut client = SmtpClient::new("mx.example", transport);
        client.read_banner().expect("banner");
        let reply = client.hello("localhost").expect("ehlo");
        assert_eq!(reply.code, 250);
        assert_eq!(reply.message, "mx.example\nPIPELINING\nSIZE 1000");
    }

    #[test]
    fn falls_back_to_helo() {
        let transport = ScriptedTransport::new("502 5.5.1 EHLO not supported\r\n250 hi\r\n");
        let written = transport.written();
        let mut client = SmtpClient::new("mx.example", transport);
        client.hello("probe.example").expect("helo");
        assert_eq!(
            written.lines(),
            vec!["EHLO probe.example", "HELO probe.example"]
        );
    }

    #[test]
    fn rejection_surfaces_reply_text() {
        let transport = ScriptedTransport::new("550 5.1.1 user unknown\r\n");
        let mut client = SmtpClient::new("mx.example", transport);
        let err = client.rcpt("nobody@example.com").expect_err("rejected");
        assert_eq!(err.to_string(), "550 5.1.1 user unknown");
        assert_eq!(err.reply().map(|r| r.code), Some(550));
    }

    #[test]
    fn closed_stream_is_end_of_stream() {
        let transport = ScriptedTransport::new("");
        let mut client = SmtpClient::new("mx.example", transport);
        let err = client.read_banner().expect_err("eof");
        match err {
            SmtpError::Io { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::UnexpectedEof);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn garbage_reply_is_protocol_error() {
        let transport = ScriptedTransport::new("hello there\r\n");
        let mut client = SmtpClient::new("mx.example", transport);
        let err = client.read_banner().expect_err("garbage");
        assert!(matches!(err, SmtpError::Protocol(_)));
    }

    #[test]
    fn latin1_reply_text_is_kept() {
        let transport = ScriptedTransport::new(b"550 5.1.1 Empf\xE4nger unbekannt\r\n");
        let mut client = SmtpClient::new("mx.example", transport);
        let err = client.rcpt("nobody@example.com").expect_err("rejected");
        let reply = err.reply().expect("reply, not a protocol error");
        assert_eq!(reply.code, 550);
        assert_eq!(reply.message, "5.1.1 Empf\u{FFFD}nger unbekannt");
    }

    #[test]
    fn signed_reply_code_is_rejected() {
        let transport = ScriptedTransport::new("+25 ok\r\n");
        let mut client = SmtpClient::new("mx.example", transport);
        let err = client.read_banner().expect_err("not a code");
        assert!(matches!(err, SmtpError::Protocol(_)), "{err:?}");
    }

    #[test]
    fn endless_line_is_cut_off() {
        let transport = ScriptedTransport::new(vec![b'2'; MAX_LINE * 2]);
        let mut client = SmtpClient::new("mx.example", transport);
        let err = client.read_banner().expect_err("too long");
        assert!(err.to_string().contains("longer than 4096 bytes"), "{err}");
    }

    #[test]
    fn error_text_leaves_out_host_name() {
        let transport = ScriptedTransport::new("");
        let mut client = SmtpClient::new("mx.blocked-relay.example", transport);
        let err = client.read_banner().expect_err("eof");
        assert!(!err.to_string().contains("blocked-relay"), "{err}");
    }

    #[test]
    fn inconsistent_codes_are_rejected() {
        let transport = ScriptedTransport::new("250-first\r\n251 second\r\n");
        let mut client = SmtpClient::new("mx.example", transport);
        let err = client.mail("a@b.c").expect_err("inconsistent");
        assert!(err.to_string().contains("inconsistent reply codes"));
    }
}
