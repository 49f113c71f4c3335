use std::fmt;

/// Closed outcome taxonomy for remote SMTP / transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Timeout,
    NoSuchHost,
    ServerUnavailable,
    Blocked,
    TryAgainLater,
    FullInbox,
    TooManyRecipients,
    NoRelay,
    MailboxBusy,
    ExceededMessagingLimits,
    NotAllowed,
    NeedMailBeforeRcpt,
    RcptHasMoved,
    MailboxNotFound,
    /// No rule matched; the raw text is used as the message.
    Unclassified,
}

impl ErrorCategory {
    const ALL: [Self; 14] = [
        Self::Timeout,
        Self::NoSuchHost,
        Self::ServerUnavailable,
        Self::Blocked,
        Self::TryAgainLater,
        Self::FullInbox,
        Self::TooManyRecipients,
        Self::NoRelay,
        Self::MailboxBusy,
        Self::ExceededMessagingLimits,
        Self::NotAllowed,
        Self::NeedMailBeforeRcpt,
        Self::RcptHasMoved,
        Self::MailboxNotFound,
    ];

    /// Stable human message, `None` for [`ErrorCategory::Unclassified`].
    pub fn message(self) -> Option<&'static str> {
        let msg = match self {
            Self::Timeout => "The connection to the mail server has timed out",
            Self::NoSuchHost => "Mail server does not exist",
            Self::ServerUnavailable => "Mail server is unavailable",
            Self::Blocked => "Blocked by mail server",
            Self::TryAgainLater => "Try again later",
            Self::FullInbox => "Recipient out of disk space",
            Self::TooManyRecipients => "Too many recipients",
            Self::NoRelay => "Not an open relay",
            Self::MailboxBusy => "Mailbox busy",
            Self::ExceededMessagingLimits => "Messaging limits have been exceeded",
            Self::NotAllowed => "Not Allowed",
            Self::NeedMailBeforeRcpt => "Need MAIL before RCPT",
            Self::RcptHasMoved => "Recipient has moved",
            Self::MailboxNotFound => "Mailbox not found",
            Self::Unclassified => return None,
        };
        Some(msg)
    }

    /// Inverse of [`ErrorCategory::message`]; unknown text is unclassified.
    pub fn from_message(message: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|category| category.message() == Some(message))
            .unwrap_or(Self::Unclassified)
    }
}

/// A classified SMTP/transport failure.
///
/// `details` always holds the raw text verbatim. `message` is the category's
/// message, or the raw text again when the failure could not be classified.
#[cfg_attr(
    feature = "with-serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(into = "LookupErrorRepr", from = "LookupErrorRepr")
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupError {
    category: ErrorCategory,
    details: String,
}

impl LookupError {
    pub fn new(category: ErrorCategory, details: impl Into<String>) -> Self {
        Self {
            category,
            details: details.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        self.category.message().unwrap_or(&self.details)
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn is(&self, category: ErrorCategory) -> bool {
        self.category == category
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.message(), self.details)
    }
}

impl std::error::Error for LookupError {}

#[cfg(feature = "with-serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct LookupErrorRepr {
    message: String,
    details: String,
}

#[cfg(feature = "with-serde")]
impl From<LookupError> for LookupErrorRepr {
    fn from(err: LookupError) -> Self {
        Self {
            message: err.message().to_string(),
            details: err.details,
        }
    }
}

#[cfg(feature = "with-serde")]
impl From<LookupErrorRepr> for LookupError {
    fn from(repr: LookupErrorRepr) -> Self {
        Self {
            category: ErrorCategory::from_message(&repr.message),
            details: repr.details,
        }
    }
}
