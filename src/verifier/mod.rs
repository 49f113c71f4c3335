//! SMTP deliverability checks: resolve MX, pick a host, probe it.
//!
//! ```no_run
//! use mailprobe_lib::{MxStrategy, Verifier};
//!
//! let verifier = Verifier::new()
//!     .mx_strategy(MxStrategy::Priority)
//!     .hello_name("probe.example.net");
//! match verifier.check_smtp("example.com", "alice") {
//!     Ok(Some(result)) => println!("deliverable: {}", result.deliverable),
//!     Ok(None) => println!("smtp check disabled"),
//!     Err(err) => eprintln!("{err}"),
//! }
//! ```

mod error;
mod options;
mod vendor;


use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::classify::{ErrorCategory, LookupError, classify_error};
use crate::mx::{
    Error as MxError, LookupMx, MxStatus, SystemResolver, normalize_domain, resolve_with,
};
use crate::smtp::{
    Connected, Dial, MxStrategy, NetDialer, ProbeRequest, ProbeResult, ProxyConfig,
    SmtpError, connect_with_strategy, probe,
};

pub use error::{ConfigError, VendorError, VerifyError};
pub use options::VerifierOptions;
pub use vendor::{FnVendor, VendorRegistry, VendorVerifier};

type SharedResolver = Arc<dyn LookupMx + Send + Sync>;

/// Immutable once built; share it across threads and call
/// [`check_smtp`](Self::check_smtp) concurrently.
#[derive(Clone)]
pub struct Verifier {
    options: VerifierOptions,
    resolver: SharedResolver,
    dialer: Option<Arc<dyn Dial>>,
    vendors: VendorRegistry,
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("options", &self.options)
            .field("custom_dialer", &self.dialer.is_some())
            .field("vendors", &self.vendors)
            .finish_non_exhaustive()
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier {
    pub fn new() -> Self {
        Self::with_options(VerifierOptions::default())
    }

    pub fn with_options(options: VerifierOptions) -> Self {
        Self {
            options,
            resolver: Arc::new(SystemResolver),
            dialer: None,
            vendors: VendorRegistry::default(),
        }
    }

    pub fn options(&self) -> &VerifierOptions {
        &self.options
    }

    pub fn vendors(&self) -> &VendorRegistry {
        &self.vendors
    }

    pub fn enable_smtp_check(mut self) -> Self {
        self.options.smtp_check_enabled = true;
        self
    }

    pub fn disable_smtp_check(mut self) -> Self {
        self.options.smtp_check_enabled = false;
        self
    }

    pub fn enable_catch_all_check(mut self) -> Self {
        self.options.catch_all_check_enabled = true;
        self
    }

    /// Skips the synthetic recipient. Every domain is then reported as
    /// catch-all and nothing as deliverable.
    pub fn disable_catch_all_check(mut self) -> Self {
        self.options.catch_all_check_enabled = false;
        self
    }

    /// Routes every dial through a SOCKS5 proxy, given as
    /// `socks5://[user:pass@]host:port[?timeout=5s]`. An empty URI clears it.
    pub fn proxy(mut self, uri: &str) -> Result<Self, ConfigError> {
        self.options.proxy = if uri.trim().is_empty() {
            None
        } else {
            Some(ProxyConfig::parse(uri)?)
        };
        Ok(self)
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = timeout;
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.options.operation_timeout = timeout;
        self
    }

    pub fn from_email(mut self, from: impl Into<String>) -> Self {
        self.options.from_email = from.into();
        self
    }

    pub fn hello_name(mut self, name: impl Into<String>) -> Self {
        self.options.hello_name = name.into();
        self
    }

    pub fn mx_strategy(mut self, strategy: MxStrategy) -> Self {
        self.options.mx_strategy = strategy;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    pub fn with_resolver(mut self, resolver: impl LookupMx + Send + Sync + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Replaces the network dialer. The configured proxy is then ignored.
    pub fn with_dialer(mut self, dialer: impl Dial + 'static) -> Self {
        self.dialer = Some(Arc::new(dialer));
        self
    }

    /// Registers a vendor override under `name`, disabled.
    pub fn register_vendor(
        mut self,
        name: impl Into<String>,
        verifier: impl VendorVerifier + 'static,
    ) -> Self {
        self.vendors.register(name, verifier);
        self
    }

    pub fn enable_vendor(mut self, name: &str) -> Result<Self, ConfigError> {
        self.vendors.enable(name)?;
        Ok(self)
    }

    /// Disabling a vendor that was never registered is a no-op.
    pub fn disable_vendor(mut self, name: &str) -> Self {
        if self.vendors.disable(name).is_err() {
            debug!(vendor = name, "disable requested for unknown vendor");
        }
        self
    }

    /// Probes `local_part@domain` over SMTP.
    ///
    /// `Ok(None)` when SMTP checking is disabled. A domain without MX
    /// records yields a result with `host_exists == false`; an unresolvable
    /// domain is an error.
    pub fn check_smtp(
        &self,
        domain: &str,
        local_part: &str,
    ) -> Result<Option<ProbeResult>, VerifyError> {
        if !self.options.smtp_check_enabled {
            return Ok(None);
        }
        let ascii = normalize_domain(domain).map_err(|err| lookup_error(&err))?;

        let Some(Connected { client, mx }) = self.connect_ascii(&ascii)? else {
            info!(domain = %ascii, "no mx records");
            return Ok(Some(ProbeResult::default()));
        };

        if let Some((name, vendor)) = self.vendors.find(&mx.exchange) {
            info!(mx = %mx.exchange, vendor = name, "using vendor verifier");
            client.quit();
            return vendor
                .check(&ascii, local_part)
                .map(Some)
                .map_err(|err| VerifyError::vendor(name, err));
        }

        let request = ProbeRequest {
            domain: &ascii,
            local_part,
            from_email: self.options.from_email(),
            hello_name: self.options.hello_name(),
            catch_all_check: self.options.catch_all_check_enabled,
        };
        let result = probe(client, &request).map_err(|err| lookup_error(&err))?;
        info!(
            mx = %mx.exchange,
            deliverable = result.deliverable,
            catch_all = result.catch_all,
            "probe finished"
        );
        Ok(Some(result))
    }

    /// Resolves `domain` and connects to one of its exchangers with the
    /// configured strategy. `Ok(None)` when the domain has no MX records.
    pub fn connect(&self, domain: &str) -> Result<Option<Connected>, VerifyError> {
        let ascii = normalize_domain(domain).map_err(|err| lookup_error(&err))?;
        self.connect_ascii(&ascii)
    }

    fn connect_ascii(&self, ascii: &str) -> Result<Option<Connected>, VerifyError> {
        let status = resolve_with(self.resolver.as_ref(), ascii).map_err(|err| lookup_error(&err))?;
        let records = match status {
            MxStatus::Records(records) => records,
            MxStatus::NoRecords => return Ok(None),
        };
        debug!(domain = ascii, candidates = records.len(), "mx resolved");

        let dialer = self.dialer.clone().unwrap_or_else(|| {
            Arc::new(NetDialer::new(self.options.proxy.clone())) as Arc<dyn Dial>
        });
        connect_with_strategy(
            &records,
            self.options.mx_strategy,
            dialer,
            self.options.port,
            self.options.timeouts(),
        )
        .map(Some)
        .map_err(|err| lookup_error(&err))
    }
}

/// Classifies `err`, keeping its text verbatim when no rule matches.
///
/// Timeouts and unknown hosts are recognised by variant first: their text
/// embeds remote names, which must not trip the keyword rules.
fn lookup_error(err: &(dyn StdError + 'static)) -> VerifyError {
    let classified = match known_category(err) {
        Some(category) => LookupError::new(category, err.to_string()),
        None => classify_error(err)
            .unwrap_or_else(|| LookupError::new(ErrorCategory::Unclassified, err.to_string())),
    };
    VerifyError::Lookup(classified)
}

fn known_category(err: &(dyn StdError + 'static)) -> Option<ErrorCategory> {
    if let Some(err) = err.downcast_ref::<SmtpError>() {
        return match err {
            SmtpError::Timeout { .. } => Some(ErrorCategory::Timeout),
            SmtpError::NoSuchHost { .. } => Some(ErrorCategory::NoSuchHost),
            _ => None,
        };
    }
    match err.downcast_ref::<MxError>()? {
        MxError::Timeout { .. } => Some(ErrorCategory::Timeout),
        MxError::NoSuchHost { .. } => Some(ErrorCategory::NoSuchHost),
        _ => None,
    }
}
