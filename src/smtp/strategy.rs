//! MX host selection: which exchangers get dialed, and in what order.

use std::sync::Arc;
use std::sync::mpsc::{self, SendError};
use std::thread;

use tracing::{debug, info, warn};

use super::dialer::{Dial, Timeouts};
use super::error::SmtpError;
use super::session::SmtpClient;
use crate::mx::MxRecord;

/// How candidates from an MX answer are dialed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "kebab-case"))]
pub enum MxStrategy {
    /// Dial every exchanger at once and keep whichever connects first.
    #[default]
    FirstConnected,
    /// Dial one preference group at a time, lowest first. A group is only
    /// abandoned once every host in it has failed.
    Priority,
}

impl MxStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstConnected => "first-connected",
            Self::Priority => "priority",
        }
    }
}

/// The winning connection and the record it was dialed from.
#[derive(Debug)]
pub struct Connected {
    pub client: SmtpClient,
    pub mx: MxRecord,
}

type Outcome = (MxRecord, Result<SmtpClient, SmtpError>);

/// Connects to one of `records` according to `strategy`.
///
/// `records` must already be sorted by preference. An empty slice is
/// [`SmtpError::NoMxRecords`].
pub fn connect_with_strategy(
    records: &[MxRecord],
    strategy: MxStrategy,
    dialer: Arc<dyn Dial>,
    port: u16,
    timeouts: Timeouts,
) -> Result<Connected, SmtpError> {
    if records.is_empty() {
        return Err(SmtpError::NoMxRecords);
    }
    debug!(strategy = strategy.as_str(), candidates = records.len(), "selecting mx");
    let connected = match strategy {
        MxStrategy::FirstConnected => connect_first(records, dialer, port, timeouts),
        MxStrategy::Priority => connect_priority(records, dialer, port, timeouts),
    }?;
    info!(mx = %connected.mx.exchange, preference = connected.mx.preference, "connected");
    Ok(connected)
}

/// Race-all: every candidate is dialed concurrently.
pub fn connect_first(
    records: &[MxRecord],
    dialer: Arc<dyn Dial>,
    port: u16,
    timeouts: Timeouts,
) -> Result<Connected, SmtpError> {
    race(records, &dialer, port, timeouts)
}

/// Preference groups are raced one after the other, lowest first.
pub fn connect_priority(
    records: &[MxRecord],
    dialer: Arc<dyn Dial>,
    port: u16,
    timeouts: Timeouts,
) -> Result<Connected, SmtpError> {
    let mut last_err = SmtpError::NoMxRecords;
    for group in records.chunk_by(|a, b| a.preference == b.preference) {
        debug!(preference = group[0].preference, hosts = group.len(), "dialing group");
        match race(group, &dialer, port, timeouts) {
            Ok(connected) => return Ok(connected),
            Err(err) => {
                debug!(preference = group[0].preference, error = %err, "group exhausted");
                last_err = err;
            }
        }
    }
    Err(last_err)
}

/// Dials all of `records` on their own threads and returns the first
/// success, or the last failure once every attempt has failed.
///
/// Returns as soon as a winner is known. Attempts still in flight keep
/// running detached; their send fails once the receiver is gone and the
/// client they hold is closed there.
fn race(
    records: &[MxRecord],
    dialer: &Arc<dyn Dial>,
    port: u16,
    timeouts: Timeouts,
) -> Result<Connected, SmtpError> {
    let (tx, rx) = mpsc::channel::<Outcome>();
    let mut spawned = 0usize;
    let mut last_err = SmtpError::NoMxRecords;

    for record in records {
        let tx = tx.clone();
        let dialer = Arc::clone(dialer);
        let mx = record.clone();
        let addr = record.socket_addr(port);
        let spawn = thread::Builder::new()
            .name(format!("dial-{}", record.exchange))
            .spawn(move || {
                debug!(mx = %mx.exchange, preference = mx.preference, "dialing");
                let result = dialer.dial(&addr, &timeouts);
                if let Err(SendError((mx, Ok(client)))) = tx.send((mx, result)) {
                    debug!(mx = %mx.exchange, "closing late connection");
                    client.quit();
                }
            });
        match spawn {
            Ok(_) => spawned += 1,
            Err(err) => last_err = SmtpError::io(format!("spawn dialer for {}", record.exchange), err),
        }
    }
    drop(tx);

    for _ in 0..spawned {
        let Ok((mx, result)) = rx.recv() else {
            break;
        };
        match result {
            Ok(client) => return Ok(Connected { client, mx }),
            Err(err) => {
                warn!(mx = %mx.exchange, preference = mx.preference, error = %err, "dial failed");
                last_err = err;
            }
        }
    }
    Err(last_err)
}
