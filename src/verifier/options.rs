use std::time::Duration;

use crate::smtp::{MxStrategy, ProxyConfig, Timeouts};

/// Settings for [`Verifier::check_smtp`](super::Verifier::check_smtp).
///
/// Usually built through the chained setters on [`Verifier`](super::Verifier);
/// frozen once checks start.
#[derive(Debug, Clone)]
pub struct VerifierOptions {
    pub smtp_check_enabled: bool,
    /// Probe a synthetic recipient to detect catch-all domains.
    pub catch_all_check_enabled: bool,
    pub proxy: Option<ProxyConfig>,
    pub connect_timeout: Duration,
    pub operation_timeout: Duration,
    pub from_email: String,
    pub hello_name: String,
    pub mx_strategy: MxStrategy,
    pub port: u16,
}

impl Default for VerifierOptions {
    fn default() -> Self {
        Self {
            smtp_check_enabled: true,
            catch_all_check_enabled: true,
            proxy: None,
            connect_timeout: Duration::from_secs(10),
            operation_timeout: Duration::from_secs(10),
            from_email: "user@example.org".to_string(),
            hello_name: "localhost".to_string(),
            mx_strategy: MxStrategy::FirstConnected,
            port: 25,
        }
    }
}

impl VerifierOptions {
    pub fn timeouts(&self) -> Timeouts {
        Timeouts {
            connect: self.connect_timeout,
            operation: self.operation_timeout,
        }
    }

    /// Sender used in `MAIL FROM`; falls back to the default when blank.
    pub fn from_email(&self) -> &str {
        non_blank(&self.from_email).unwrap_or("user@example.org")
    }

    pub fn hello_name(&self) -> &str {
        non_blank(&self.hello_name).unwrap_or("localhost")
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}
