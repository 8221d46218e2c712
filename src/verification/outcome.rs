//! Per-address validation outcomes and their reason codes.

/// Why an address ended up deliverable, undeliverable, or skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationReason {
    /// Address was already finalized in a prior run or earlier this run.
    AlreadyProcessed,
    InvalidFormat,
    /// Transient: the per-domain probe ceiling was hit. Progress is not
    /// marked so a later run can retry.
    RateLimitExceeded,
    NoMailExchanger,
    /// SMTP probing disabled; the address passed every offline check.
    SmtpSkipped,
    /// The mail exchanger accepted the recipient (reply code 250).
    SmtpVerified,
    /// The mail exchanger refused the recipient.
    SmtpRejected,
    /// Connect failure, disconnect or timeout before a verdict.
    SmtpConnectionFailure,
    /// Any other SMTP library-level failure.
    SmtpProtocolError,
}

impl ValidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyProcessed => "AlreadyProcessed",
            Self::InvalidFormat => "InvalidFormat",
            Self::RateLimitExceeded => "RateLimitExceeded",
            Self::NoMailExchanger => "NoMailExchanger",
            Self::SmtpSkipped => "SmtpSkipped",
            Self::SmtpVerified => "SmtpVerified",
            Self::SmtpRejected => "SmtpRejected",
            Self::SmtpConnectionFailure => "SmtpConnectionFailure",
            Self::SmtpProtocolError => "SmtpProtocolError",
        }
    }
}

impl std::fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record produced exactly once per address per run.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Normalized (lowercased, trimmed) address.
    pub address: String,
    pub is_deliverable: bool,
    pub reason: ValidationReason,
    /// Server message or error text accompanying the reason, if any.
    pub detail: Option<String>,
    pub format_valid: bool,
    pub domain_has_mail_exchanger: bool,
    pub smtp_accepted: bool,
}

impl ValidationOutcome {
    pub(crate) fn undeliverable(address: &str, reason: ValidationReason) -> Self {
        Self {
            address: address.to_string(),
            is_deliverable: false,
            reason,
            detail: None,
            format_valid: false,
            domain_has_mail_exchanger: false,
            smtp_accepted: false,
        }
    }

    /// Human-readable reason string written into the `validation_reason`
    /// output column.
    pub fn reason_text(&self) -> String {
        let base = match self.reason {
            ValidationReason::AlreadyProcessed => "Already processed (skipped)",
            ValidationReason::InvalidFormat => "Invalid email format",
            ValidationReason::RateLimitExceeded => "Rate limit exceeded for domain",
            ValidationReason::NoMailExchanger => "No MX record found",
            ValidationReason::SmtpSkipped => "SMTP check skipped",
            ValidationReason::SmtpVerified => "Email verified successfully",
            ValidationReason::SmtpRejected => "SMTP rejected",
            ValidationReason::SmtpConnectionFailure => "SMTP connection failed",
            ValidationReason::SmtpProtocolError => "SMTP error",
        };
        match &self.detail {
            Some(detail) if !detail.is_empty() => format!("{base}: {detail}"),
            _ => base.to_string(),
        }
    }
}

/// Normalizes an input address for use as the dedup/cache key.
pub fn normalize_address(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Extracts the domain part of an already-normalized address.
pub fn domain_of(address: &str) -> Option<&str> {
    match address.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Some(domain),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_lowercases_and_trims() {
        assert_eq!(normalize_address("  User@Example.COM "), "user@example.com");
    }

    #[test]
    fn domain_extraction() {
        assert_eq!(domain_of("user@example.com"), Some("example.com"));
        assert_eq!(domain_of("no-at-sign"), None);
        assert_eq!(domain_of("@example.com"), None);
        assert_eq!(domain_of("user@"), None);
    }

    #[test]
    fn reason_text_includes_detail() {
        let mut outcome =
            ValidationOutcome::undeliverable("a@b.com", ValidationReason::SmtpRejected);
        outcome.detail = Some("550 User unknown".to_string());
        assert_eq!(outcome.reason_text(), "SMTP rejected: 550 User unknown");
    }
}
