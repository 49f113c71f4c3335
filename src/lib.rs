#![forbid(unsafe_code)]
//! mailprobe_lib: SMTP deliverability probing (MX selection, SOCKS5
//! dialing, RCPT probes, SMTP reply classification).

pub mod classify;
pub mod mx;
pub mod smtp;
pub mod verifier;

pub use classify::{ErrorCategory, LookupError, classify_error, parse_smtp_error};
pub use mx::{Error as MxError, LookupMx, MxRecord, MxStatus, SystemResolver, check_mx};
pub use smtp::{
    Connected, Dial, MxStrategy, NetDialer, ProbeResult, ProxyConfig, SmtpClient, SmtpError,
    Timeouts,
};
pub use verifier::{
    ConfigError, FnVendor, VendorError, VendorRegistry, VendorVerifier, Verifier, VerifierOptions,
    VerifyError,
};
