//! DNS MX resolution.
//!
//! [`check_mx`] performs a synchronous lookup using the system resolver and
//! returns a [`MxStatus`] describing the outcome. The SMTP probe goes through
//! the [`LookupMx`] trait so that callers can substitute their own resolver.

mod error;
mod resolver;
mod types;

pub use error::MxError as Error;
pub use resolver::{LookupMx, SystemResolver, check_mx};
pub use types::{MxRecord, MxStatus};

pub(crate) use resolver::{normalize_domain, resolve_with};

#[cfg(test)]
pub(crate) mod tests;
