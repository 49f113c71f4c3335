use thiserror::Error;

use crate::classify::LookupError;
use crate::smtp::{ProbeResult, ProxyUriError, SmtpError};

/// Why an SMTP check produced no result.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Resolution, dialing or dialog failure, classified.
    #[error("{0}")]
    Lookup(LookupError),
    /// An enabled vendor override failed.
    #[error("vendor '{vendor}': {source}")]
    Vendor {
        vendor: String,
        #[source]
        source: VendorError,
    },
}

impl VerifyError {
    /// The result that accompanies a failed check: nothing was learned.
    pub fn partial(&self) -> ProbeResult {
        ProbeResult::default()
    }

    pub fn lookup(&self) -> Option<&LookupError> {
        match self {
            Self::Lookup(err) => Some(err),
            Self::Vendor { .. } => None,
        }
    }

    pub(crate) fn vendor(vendor: &str, source: VendorError) -> Self {
        Self::Vendor {
            vendor: vendor.to_string(),
            source,
        }
    }
}

impl From<LookupError> for VerifyError {
    fn from(err: LookupError) -> Self {
        Self::Lookup(err)
    }
}

/// Rejected builder input.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unsupported vendor verifier '{name}'")]
    UnknownVendor { name: String },
    #[error(transparent)]
    Proxy(#[from] ProxyUriError),
}

/// Failure reported by a [`VendorVerifier`](super::VendorVerifier).
#[derive(Debug, Error)]
pub enum VendorError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Smtp(#[from] SmtpError),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl VendorError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
