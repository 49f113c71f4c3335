//! Classification of raw SMTP reply / transport error text.
//!
//! [`parse_smtp_error`] maps free-form text such as `"550 5.1.1 user unknown"`
//! onto an [`ErrorCategory`]. Keyword rules always win over the numeric
//! mapping of their band, and the hard-bounce phrases beat every default
//! 5xx mapping.

mod types;

pub use types::{ErrorCategory, LookupError};

use std::error::Error as StdError;
use std::io;

const GREYLIST: &[&str] = &["greylist", "greylisted"];

const QUOTA: &[&str] = &["full", "space", "over quota", "insufficient"];

const HARD_BOUNCE: &[&str] = &[
    "undeliverable",
    "does not exist",
    "may not exist",
    "user unknown",
    "user not found",
    "invalid address",
    "recipient invalid",
    "recipient rejected",
    "address rejected",
    "no mailbox",
    "no mail-enabled",
];

const BLOCKLIST_550: &[&str] = &[
    "spamhaus",
    "proofpoint",
    "cloudmark",
    "banned",
    "blacklisted",
    "blocked",
    "block list",
    "denied",
];

const BLOCKLIST: &[&str] = &[
    "spamhaus",
    "proofpoint",
    "cloudmark",
    "banned",
    "blocked",
    "denied",
];

/// Classify raw SMTP text. `None` means the text is a success or
/// informational reply (status below 400).
pub fn parse_smtp_error(raw: &str) -> Option<LookupError> {
    classify(raw, false)
}

/// Classify an error value. Besides its text, an end-of-stream I/O error
/// anywhere in the source chain maps to [`ErrorCategory::ServerUnavailable`].
pub fn classify_error(err: &(dyn StdError + 'static)) -> Option<LookupError> {
    classify(&err.to_string(), is_end_of_stream(err))
}

fn classify(raw: &str, end_of_stream: bool) -> Option<LookupError> {
    let Some(status) = status_code(raw) else {
        return Some(classify_keywords(raw, end_of_stream));
    };

    if status < 400 {
        return None;
    }

    let category = if status < 500 {
        transient_category(status, raw)
    } else if contains_any(raw, HARD_BOUNCE) {
        Some(ErrorCategory::MailboxNotFound)
    } else {
        permanent_category(status, raw)
    };

    Some(match category {
        Some(category) => LookupError::new(category, raw),
        None => classify_keywords(raw, end_of_stream),
    })
}

fn transient_category(status: u16, raw: &str) -> Option<ErrorCategory> {
    if contains_any(raw, GREYLIST) {
        return Some(ErrorCategory::TryAgainLater);
    }
    match status {
        421 => Some(ErrorCategory::TryAgainLater),
        450 => Some(ErrorCategory::MailboxBusy),
        451 => Some(ErrorCategory::ExceededMessagingLimits),
        452 if contains_any(raw, QUOTA) => Some(ErrorCategory::FullInbox),
        452 => Some(ErrorCategory::TooManyRecipients),
        _ => None,
    }
}

fn permanent_category(status: u16, raw: &str) -> Option<ErrorCategory> {
    match status {
        503 => Some(ErrorCategory::NeedMailBeforeRcpt),
        550 if contains_any(raw, BLOCKLIST_550) => Some(ErrorCategory::Blocked),
        550 => Some(ErrorCategory::MailboxNotFound),
        551 => Some(ErrorCategory::RcptHasMoved),
        552 => Some(ErrorCategory::FullInbox),
        553 => Some(ErrorCategory::NoRelay),
        554 if contains_any(raw, &["relay access denied"]) => Some(ErrorCategory::NoRelay),
        554 => Some(ErrorCategory::NotAllowed),
        _ => None,
    }
}

fn classify_keywords(raw: &str, end_of_stream: bool) -> LookupError {
    let category = if end_of_stream {
        ErrorCategory::ServerUnavailable
    } else if contains_any(raw, BLOCKLIST) {
        ErrorCategory::Blocked
    } else if contains_any(raw, &["timeout"]) {
        ErrorCategory::Timeout
    } else if contains_any(raw, &["no such host"]) {
        ErrorCategory::NoSuchHost
    } else if contains_any(raw, &["unavailable", "connection reset"]) {
        ErrorCategory::ServerUnavailable
    } else {
        ErrorCategory::Unclassified
    };
    LookupError::new(category, raw)
}

/// Three leading ASCII digits, or `None`.
fn status_code(raw: &str) -> Option<u16> {
    let prefix = raw.get(..3)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    prefix.parse().ok()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lower = haystack.to_lowercase();
    needles.iter().any(|needle| lower.contains(needle))
}

fn is_end_of_stream(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            if io_err.kind() == io::ErrorKind::UnexpectedEof {
                return true;
            }
        }
        current = err.source();
    }
    false
}
