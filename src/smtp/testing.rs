//! In-memory transports for exercising the SMTP client without a network.

use std::io::{self, Cursor, Read, Write};
use std::sync::{Arc, Mutex};

use super::session::SmtpClient;

/// Replays canned server output and records everything the client writes.
pub(crate) struct ScriptedTransport {
    input: Cursor<Vec<u8>>,
    written: Written,
}

#[derive(Clone, Default)]
pub(crate) struct Written(Arc<Mutex<Vec<u8>>>);

impl Written {
    pub(crate) fn bytes(&self) -> Vec<u8> {
        self.0.lock().map(|buf| buf.clone()).unwrap_or_default()
    }

    pub(crate) fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.bytes())
            .split("\r\n")
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl ScriptedTransport {
    pub(crate) fn new(server_output: impl AsRef<[u8]>) -> Self {
        Self {
            input: Cursor::new(server_output.as_ref().to_vec()),
            written: Written::default(),
        }
    }

    pub(crate) fn written(&self) -> Written {
        self.written.clone()
    }
}

impl Read for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.input.read(buf)
    }
}

impl Write for ScriptedTransport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = self
            .written
            .0
            .lock()
            .map_err(|_| io::Error::other("poisoned"))?;
        written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A connected client with nothing left to say; enough for strategy tests.
pub(crate) fn idle_client(host: &str) -> SmtpClient {
    SmtpClient::new(host, ScriptedTransport::new(""))
}
