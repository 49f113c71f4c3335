//! Per-provider overrides for exchangers that do not answer RCPT honestly.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::error::{ConfigError, VendorError};
use crate::smtp::ProbeResult;

/// Replaces the SMTP dialog for the exchangers it [`supports`](Self::supports).
pub trait VendorVerifier: Send + Sync {
    /// Whether this verifier handles mail for `mx_host`.
    fn supports(&self, mx_host: &str) -> bool;

    fn check(&self, domain: &str, local_part: &str) -> Result<ProbeResult, VendorError>;
}

type CheckFn = dyn Fn(&str, &str) -> Result<ProbeResult, VendorError> + Send + Sync;

/// A [`VendorVerifier`] that claims exchangers by host-name suffix and
/// delegates to a closure.
pub struct FnVendor {
    suffixes: Vec<String>,
    check: Box<CheckFn>,
}

impl FnVendor {
    pub fn new<I, S, F>(suffixes: I, check: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(&str, &str) -> Result<ProbeResult, VendorError> + Send + Sync + 'static,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|suffix| suffix.into().trim_end_matches('.').to_ascii_lowercase())
                .collect(),
            check: Box::new(check),
        }
    }
}

impl fmt::Debug for FnVendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnVendor")
            .field("suffixes", &self.suffixes)
            .finish_non_exhaustive()
    }
}

impl VendorVerifier for FnVendor {
    fn supports(&self, mx_host: &str) -> bool {
        let host = mx_host.trim_end_matches('.').to_ascii_lowercase();
        self.suffixes.iter().any(|suffix| {
            host == *suffix
                || host
                    .strip_suffix(suffix.as_str())
                    .is_some_and(|rest| rest.ends_with('.'))
        })
    }

    fn check(&self, domain: &str, local_part: &str) -> Result<ProbeResult, VendorError> {
        (self.check)(domain, local_part)
    }
}

#[derive(Clone)]
struct Entry {
    verifier: Arc<dyn VendorVerifier>,
    enabled: bool,
}

/// Registered vendor verifiers, keyed by name. Registration does not
/// enable a vendor.
#[derive(Default, Clone)]
pub struct VendorRegistry {
    entries: BTreeMap<String, Entry>,
}

impl fmt::Debug for VendorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(name, entry)| (name, entry.enabled)))
            .finish()
    }
}

impl VendorRegistry {
    pub fn register(&mut self, name: impl Into<String>, verifier: impl VendorVerifier + 'static) {
        self.entries.insert(
            name.into(),
            Entry {
                verifier: Arc::new(verifier),
                enabled: false,
            },
        );
    }

    pub fn enable(&mut self, name: &str) -> Result<(), ConfigError> {
        self.set_enabled(name, true)
    }

    pub fn disable(&mut self, name: &str) -> Result<(), ConfigError> {
        self.set_enabled(name, false)
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.entries.get(name).is_some_and(|entry| entry.enabled)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// First enabled verifier (by name) that supports `mx_host`.
    pub fn find(&self, mx_host: &str) -> Option<(&str, &dyn VendorVerifier)> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.enabled && entry.verifier.supports(mx_host))
            .map(|(name, entry)| (name.as_str(), entry.verifier.as_ref()))
            .next()
    }

    fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), ConfigError> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| ConfigError::UnknownVendor {
                name: name.to_string(),
            })?;
        entry.enabled = enabled;
        Ok(())
    }
}
