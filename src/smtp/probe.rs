//! The RCPT dialog that settles deliverability and catch-all status.

use rand::{Rng, distributions::Alphanumeric};
use tracing::{debug, info};

use super::error::SmtpError;
use super::session::SmtpClient;
use super::types::ProbeResult;
use crate::classify::{ErrorCategory, LookupError, parse_smtp_error};

const SYNTHETIC_LOCAL_LEN: usize = 32;

/// What to ask the connected exchanger.
#[derive(Debug, Clone, Copy)]
pub struct ProbeRequest<'a> {
    pub domain: &'a str,
    /// May be empty, in which case only the synthetic address is tried.
    pub local_part: &'a str,
    pub from_email: &'a str,
    pub hello_name: &'a str,
    pub catch_all_check: bool,
}

enum Recipient {
    Accepted,
    Rejected(Option<LookupError>),
}

impl Recipient {
    fn accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Runs HELO, MAIL FROM and up to two RCPT TO commands on `client`, then
/// closes the session.
///
/// HELO/MAIL rejections and transport failures are returned as errors. RCPT
/// rejections are folded into the result.
pub fn probe(mut client: SmtpClient, request: &ProbeRequest<'_>) -> Result<ProbeResult, SmtpError> {
    let outcome = dialog(&mut client, request);
    if outcome.is_ok() {
        if let Err(err) = client.reset() {
            debug!(mx = %client.host(), error = %err, "RSET failed");
        }
    }
    client.quit();
    outcome
}

fn dialog(client: &mut SmtpClient, request: &ProbeRequest<'_>) -> Result<ProbeResult, SmtpError> {
    client.hello(request.hello_name)?;
    client.mail(request.from_email)?;

    let mut result = ProbeResult {
        host_exists: true,
        ..ProbeResult::default()
    };

    let target = if request.local_part.is_empty() {
        None
    } else {
        let address = format!("{}@{}", request.local_part, request.domain);
        let target = rcpt(client, &address)?;
        if let Recipient::Rejected(Some(reason)) = &target {
            apply_rejection(&mut result, reason);
        }
        Some(target)
    };

    if !request.catch_all_check {
        result.catch_all = true;
        return Ok(result);
    }
    if matches!(target, Some(Recipient::Rejected(_))) {
        return Ok(result);
    }

    let synthetic = format!("{}@{}", random_local_part(), request.domain);
    match rcpt(client, &synthetic)? {
        Recipient::Accepted => {
            info!(mx = %client.host(), domain = request.domain, "catch-all domain");
            result.catch_all = true;
        }
        Recipient::Rejected(reason) => {
            result.deliverable = target.as_ref().is_some_and(Recipient::accepted);
            if target.is_none() {
                if let Some(reason) = &reason {
                    apply_rejection(&mut result, reason);
                }
            }
        }
    }
    Ok(result)
}

fn rcpt(client: &mut SmtpClient, address: &str) -> Result<Recipient, SmtpError> {
    match client.rcpt(address) {
        Ok(_) => Ok(Recipient::Accepted),
        Err(SmtpError::Reply(reply)) => {
            debug!(mx = %client.host(), code = reply.code, "recipient rejected");
            Ok(Recipient::Rejected(parse_smtp_error(&reply.to_string())))
        }
        Err(err) => Err(err),
    }
}

fn apply_rejection(result: &mut ProbeResult, reason: &LookupError) {
    match reason.category() {
        ErrorCategory::FullInbox => result.full_inbox = true,
        ErrorCategory::NotAllowed => result.disabled = true,
        _ => {}
    }
}

/// 32 random lowercase alphanumerics; not a mailbox anyone has.
pub(crate) fn random_local_part() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SYNTHETIC_LOCAL_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smtp::testing::ScriptedTransport;

    const GREETING: &str = "250-mx.example.com\r\n250 PIPELINING\r\n";

    fn request(local_part: &str) -> ProbeRequest<'_> {
        ProbeRequest {
            domain: "example.com",
            local_part,
            from_email: "user@example.org",
            hello_name: "localhost",
            catch_all_check: true,
        }
    }

    fn run(
        replies: &str,
        request: &ProbeRequest<'_>,
    ) -> (Result<ProbeResult, SmtpError>, Vec<String>) {
        let transport = ScriptedTransport::new(replies);
        let written = transport.written();
        let client = SmtpClient::new("mx.example.com", transport);
        (probe(client, request), written.lines())
    }

    #[test]
    fn catch_all_host_is_not_deliverable() {
        let script = format!("{GREETING}250 ok\r\n250 ok\r\n250 ok\r\n250 ok\r\n221 bye\r\n");
        let (result, lines) = run(&script, &request("alice"));
        let result = result.expect("probe");
        assert!(result.host_exists);
        assert!(result.catch_all);
        assert!(!result.deliverable);
        assert_eq!(lines[0], "EHLO localhost");
        assert_eq!(lines[1], "MAIL FROM:<user@example.org>");
        assert_eq!(lines[2], "RCPT TO:<alice@example.com>");
        assert!(lines[3].starts_with("RCPT TO:<") && lines[3].ends_with("@example.com>"));
        assert_eq!(&lines[4..], ["RSET", "QUIT"]);
    }

    #[test]
    fn accepted_target_with_rejected_synthetic_is_deliverable() {
        let script = format!(
            "{GREETING}250 ok\r\n250 ok\r\n550 5.1.1 user unknown\r\n250 ok\r\n221 bye\r\n"
        );
        let (result, _) = run(&script, &request("alice"));
        assert_eq!(
            result.expect("probe"),
            ProbeResult {
                host_exists: true,
                deliverable: true,
                ..ProbeResult::default()
            }
        );
    }

    #[test]
    fn rejected_target_skips_synthetic_rcpt() {
        let script = format!(
            "{GREETING}250 ok\r\n550 5.1.1 This mailbox does not exist\r\n250 ok\r\n221 bye\r\n"
        );
        let (result, lines) = run(&script, &request("ghost"));
        let result = result.expect("probe");
        assert!(result.host_exists);
        assert!(!result.catch_all);
        assert!(!result.deliverable);
        assert_eq!(lines.iter().filter(|line| line.starts_with("RCPT")).count(), 1);
    }

    #[test]
    fn full_inbox_is_flagged() {
        let script = format!("{GREETING}250 ok\r\n452 4.2.2 Mailbox full\r\n250 ok\r\n221 bye\r\n");
        let (result, _) = run(&script, &request("hoarder"));
        let result = result.expect("probe");
        assert!(result.full_inbox);
        assert!(!result.deliverable);
    }

    #[test]
    fn disabled_mailbox_is_flagged() {
        let script = format!(
            "{GREETING}250 ok\r\n554 5.7.1 Mailbox disabled for this recipient\r\n250 ok\r\n221 bye\r\n"
        );
        let (result, _) = run(&script, &request("former"));
        assert!(result.expect("probe").disabled);
    }

    #[test]
    fn catch_all_check_disabled_assumes_catch_all() {
        let script = format!("{GREETING}250 ok\r\n250 ok\r\n250 ok\r\n221 bye\r\n");
        let mut req = request("alice");
        req.catch_all_check = false;
        let (result, lines) = run(&script, &req);
        let result = result.expect("probe");
        assert!(result.catch_all);
        assert!(!result.deliverable);
        assert_eq!(lines.iter().filter(|line| line.starts_with("RCPT")).count(), 1);
    }

    #[test]
    fn empty_local_part_uses_synthetic_rejection() {
        let script = format!("{GREETING}250 ok\r\n452 4.2.2 over quota\r\n250 ok\r\n221 bye\r\n");
        let (result, lines) = run(&script, &request(""));
        let result = result.expect("probe");
        assert!(result.host_exists);
        assert!(!result.catch_all);
        assert!(!result.deliverable);
        assert!(result.full_inbox);
        assert_eq!(lines.iter().filter(|line| line.starts_with("RCPT")).count(), 1);
    }

    #[test]
    fn mail_from_rejection_is_an_error() {
        let script = format!("{GREETING}550 5.7.1 Client host blocked using Spamhaus\r\n221 bye\r\n");
        let (result, lines) = run(&script, &request("alice"));
        let err = result.expect_err("mail rejected");
        let reply = err.reply().expect("reply");
        assert_eq!(reply.code, 550);
        assert_eq!(lines.last().map(String::as_str), Some("QUIT"));
        assert!(!lines.iter().any(|line| line == "RSET"));
    }

    #[test]
    fn latin1_rejection_is_folded_into_result() {
        let mut script = GREETING.as_bytes().to_vec();
        script.extend_from_slice(b"250 ok\r\n550 5.1.1 Empf\xE4nger unbekannt\r\n250 ok\r\n221 bye\r\n");
        let transport = ScriptedTransport::new(script);
        let client = SmtpClient::new("mx.example.com", transport);
        let result = probe(client, &request("gibtsnicht")).expect("rejection is not an error");
        assert!(result.host_exists);
        assert!(!result.deliverable);
        assert!(!result.catch_all);
    }

    #[test]
    fn dropped_connection_is_an_error() {
        let script = format!("{GREETING}250 ok\r\n");
        let (result, _) = run(&script, &request("alice"));
        assert!(result.is_err());
    }

    #[test]
    fn synthetic_local_part_shape() {
        let local = random_local_part();
        assert_eq!(local.len(), 32);
        assert!(local.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert_ne!(local, random_local_part());
    }
}
