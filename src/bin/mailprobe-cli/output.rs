use anyhow::Result;
#[cfg(not(feature = "with-serde"))]
use anyhow::bail;
use mailprobe_lib::{MxError, MxStatus, ProbeResult, VerifyError};

use crate::args::Format;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct ReportError {
    pub message: String,
    pub details: String,
}

impl From<&VerifyError> for ReportError {
    fn from(err: &VerifyError) -> Self {
        match err.lookup() {
            Some(lookup) => Self {
                message: lookup.message().to_string(),
                details: lookup.details().to_string(),
            },
            None => Self {
                message: "Vendor verification failed".to_string(),
                details: err.to_string(),
            },
        }
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub email: String,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub smtp: Option<ProbeResult>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<ReportError>,
}

impl CheckReport {
    pub fn from_outcome(email: &str, outcome: &Result<Option<ProbeResult>, VerifyError>) -> Self {
        match outcome {
            Ok(smtp) => Self {
                email: email.to_string(),
                smtp: *smtp,
                error: None,
            },
            Err(err) => Self {
                email: email.to_string(),
                smtp: Some(err.partial()),
                error: Some(ReportError::from(err)),
            },
        }
    }

    pub fn deliverable(&self) -> bool {
        self.smtp.is_some_and(|smtp| smtp.deliverable)
    }

    pub fn human_summary(&self) -> String {
        let mut line = match &self.smtp {
            Some(smtp) if self.error.is_none() && !smtp.host_exists => {
                format!("[NO-HOST] {}", self.email)
            }
            Some(smtp) => format!(
                "[{}] {} :: host_exists={} deliverable={} catch_all={} full_inbox={} disabled={}",
                if smtp.deliverable { "OK" } else { "NO" },
                self.email,
                smtp.host_exists,
                smtp.deliverable,
                smtp.catch_all,
                smtp.full_inbox,
                smtp.disabled,
            ),
            None => format!("[SKIPPED] {} :: smtp check disabled", self.email),
        };
        if let Some(error) = &self.error {
            line.push_str(&format!("\n        error: {} : {}", error.message, error.details));
        }
        line
    }
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct MxReport {
    pub domain: String,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub status: Option<MxStatus>,
    #[cfg_attr(feature = "with-serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl MxReport {
    pub fn from_result(domain: &str, result: Result<MxStatus, MxError>) -> Self {
        match result {
            Ok(status) => Self {
                domain: domain.to_string(),
                status: Some(status),
                error: None,
            },
            Err(err) => Self {
                domain: domain.to_string(),
                status: None,
                error: Some(err.to_string()),
            },
        }
    }

    pub fn human_summary(&self) -> String {
        match (&self.status, &self.error) {
            (Some(MxStatus::Records(records)), _) => {
                let summary = records
                    .iter()
                    .map(|r| format!("{}:{}", r.preference, r.exchange))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("{} :: records: {summary}", self.domain)
            }
            (Some(MxStatus::NoRecords), _) => format!("{} :: no MX records", self.domain),
            (None, Some(error)) => format!("{} :: error: {error}", self.domain),
            (None, None) => format!("{} :: unknown", self.domain),
        }
    }
}

#[cfg(feature = "with-serde")]
pub fn emit<T: serde::Serialize>(
    format: Format,
    value: &T,
    human: impl FnOnce(&T) -> String,
) -> Result<()> {
    match format {
        Format::Human => println!("{}", human(value)),
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

#[cfg(not(feature = "with-serde"))]
pub fn emit<T>(format: Format, value: &T, human: impl FnOnce(&T) -> String) -> Result<()> {
    match format {
        Format::Human => println!("{}", human(value)),
        Format::Json => bail!("--format json requires the 'with-serde' feature"),
    }
    Ok(())
}
