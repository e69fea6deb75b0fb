//! Verification pipeline: composes the cheap checks (format, disposable
//! list, DNS existence, MX presence, webmail classification, well-known
//! shortcut) in short-circuit order ahead of the expensive SMTP probe,
//! and assembles the final [`VerificationResult`].
//!
//! Every stage that terminates the walk leaves the result with the
//! defaults of the stages it skipped; nothing below this module ever
//! surfaces an error to the caller of [`Verifier::verify`].

mod types;
mod wellknown;

pub use types::{
    EmailStatus, MailboxType, ServerStatus, SyntaxFormat, TechnicalDetails, VerificationResult,
};

use std::sync::Arc;

use thiserror::Error;

use crate::dns::{DnsError, DnsOptions, DnsProbe};
use crate::smtp::{ProbeOutcome, SmtpProbeError, SmtpProbeOptions, SmtpProber};
use crate::{lists, validator, webmail};

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("DNS probe setup failed: {0}")]
    Dns(#[from] DnsError),
    #[error("SMTP prober setup failed: {0}")]
    Smtp(#[from] SmtpProbeError),
}

/// Seam over the DNS stages so the decision tree can be exercised with
/// scripted verdicts.
pub(crate) trait DomainProbe {
    fn domain_exists(&self, domain: &str) -> bool;
    fn has_mx_record(&self, domain: &str) -> bool;
}

impl DomainProbe for DnsProbe {
    fn domain_exists(&self, domain: &str) -> bool {
        DnsProbe::domain_exists(self, domain)
    }

    fn has_mx_record(&self, domain: &str) -> bool {
        DnsProbe::has_mx_record(self, domain)
    }
}

/// Seam over the SMTP stage.
pub(crate) trait MailboxProbe {
    fn probe(&self, domain: &str, local: &str) -> ProbeOutcome;
}

impl MailboxProbe for SmtpProber {
    fn probe(&self, domain: &str, local: &str) -> ProbeOutcome {
        SmtpProber::probe(self, domain, local)
    }
}

pub struct Verifier {
    dns: Arc<DnsProbe>,
    prober: SmtpProber,
}

impl Verifier {
    /// Build a verifier with environment-seeded defaults.
    pub fn new() -> Result<Self, SetupError> {
        Self::with_options(DnsOptions::from_config(), SmtpProbeOptions::from_config())
    }

    pub fn with_options(
        dns_options: DnsOptions,
        smtp_options: SmtpProbeOptions,
    ) -> Result<Self, SetupError> {
        let dns = Arc::new(DnsProbe::new(dns_options)?);
        let prober = SmtpProber::new(Arc::clone(&dns), smtp_options)?;
        Ok(Self { dns, prober })
    }

    /// Walk the decision tree for one address. Infallible: the result
    /// reports how far the walk got.
    pub fn verify(&self, email: &str) -> VerificationResult {
        verify_with(email, self.dns.as_ref(), &self.prober)
    }
}

pub(crate) fn verify_with<D, P>(email: &str, dns: &D, prober: &P) -> VerificationResult
where
    D: DomainProbe,
    P: MailboxProbe,
{
    let mut result = VerificationResult::new(email);

    let parsed = validator::parse_address(email);
    result.domain = parsed.domain.clone();
    if !parsed.valid {
        tracing::debug!(%email, reasons = ?parsed.reasons, "rejected by format check");
        return result;
    }
    result.email_syntax_format = SyntaxFormat::Valid;
    let ascii_domain = parsed.ascii_domain;

    if lists::is_disposable_domain(&ascii_domain) {
        tracing::debug!(%email, "disposable domain, stopping");
        result.technical_details.disposable = true;
        result.mailbox_type = MailboxType::Webmail;
        return result;
    }

    if !dns.domain_exists(&ascii_domain) {
        tracing::debug!(domain = %ascii_domain, "domain does not resolve, stopping");
        return result;
    }
    result.technical_details.domain_exists = true;

    if !dns.has_mx_record(&ascii_domain) {
        tracing::debug!(domain = %ascii_domain, "no mail-reachable record, stopping");
        return result;
    }
    result.technical_details.has_mx_record = true;

    result.mailbox_type = if webmail::is_webmail_domain(&ascii_domain) {
        MailboxType::Webmail
    } else {
        MailboxType::Professional
    };

    if wellknown::is_well_known_provider(&ascii_domain) {
        tracing::debug!(domain = %ascii_domain, "well-known provider, skipping SMTP probe");
        result.technical_details.smtp_valid = true;
        result.mailbox_server_status = ServerStatus::Valid;
        result.email_status = EmailStatus::Valid;
        return result;
    }

    let outcome = prober.probe(&ascii_domain, &parsed.local);
    result.technical_details.smtp_valid = outcome.smtp_valid;
    result.technical_details.catch_all = outcome.catch_all;
    result.mailbox_server_status = if outcome.smtp_valid {
        ServerStatus::Valid
    } else {
        ServerStatus::Invalid
    };
    result.email_status = if outcome.catch_all {
        EmailStatus::CatchAll
    } else if outcome.smtp_valid {
        EmailStatus::Valid
    } else {
        EmailStatus::Invalid
    };
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubDns {
        exists: bool,
        has_mx: bool,
        touched: Cell<bool>,
    }

    impl StubDns {
        fn new(exists: bool, has_mx: bool) -> Self {
            Self {
                exists,
                has_mx,
                touched: Cell::new(false),
            }
        }

        fn reachable() -> Self {
            Self::new(true, true)
        }
    }

    impl DomainProbe for StubDns {
        fn domain_exists(&self, _domain: &str) -> bool {
            self.touched.set(true);
            self.exists
        }

        fn has_mx_record(&self, _domain: &str) -> bool {
            self.touched.set(true);
            self.has_mx
        }
    }

    struct StubProber {
        outcome: ProbeOutcome,
        called: Cell<bool>,
    }

    impl StubProber {
        fn new(smtp_valid: bool, catch_all: bool) -> Self {
            Self {
                outcome: ProbeOutcome {
                    smtp_valid,
                    catch_all,
                },
                called: Cell::new(false),
            }
        }
    }

    impl MailboxProbe for StubProber {
        fn probe(&self, _domain: &str, _local: &str) -> ProbeOutcome {
            self.called.set(true);
            self.outcome
        }
    }

    #[test]
    fn invalid_format_stops_before_any_lookup() {
        let dns = StubDns::reachable();
        let prober = StubProber::new(true, false);
        let result = verify_with("not-an-email", &dns, &prober);
        assert_eq!(result.email_status, EmailStatus::Invalid);
        assert_eq!(result.email_syntax_format, SyntaxFormat::Invalid);
        assert!(!dns.touched.get(), "format rejection must not reach DNS");
        assert!(!prober.called.get());
    }

    #[test]
    fn disposable_domain_stops_before_any_lookup() {
        let dns = StubDns::reachable();
        let prober = StubProber::new(true, false);
        let result = verify_with("user@tempmail.com", &dns, &prober);
        assert_eq!(result.email_status, EmailStatus::Invalid);
        assert!(result.technical_details.disposable);
        assert_eq!(result.mailbox_type, MailboxType::Webmail);
        assert!(!dns.touched.get(), "disposable rejection must not reach DNS");
        assert!(!prober.called.get());
    }

    #[test]
    fn unresolvable_domain_stops_before_mx() {
        let dns = StubDns::new(false, true);
        let prober = StubProber::new(true, false);
        let result = verify_with("user@ghost.example", &dns, &prober);
        assert_eq!(result.email_status, EmailStatus::Invalid);
        assert!(!result.technical_details.domain_exists);
        assert!(!result.technical_details.has_mx_record);
        assert!(!prober.called.get());
    }

    #[test]
    fn missing_mx_stops_before_smtp() {
        let dns = StubDns::new(true, false);
        let prober = StubProber::new(true, false);
        let result = verify_with("user@nomail.example", &dns, &prober);
        assert_eq!(result.email_status, EmailStatus::Invalid);
        assert!(result.technical_details.domain_exists);
        assert!(!result.technical_details.has_mx_record);
        assert!(!prober.called.get());
    }

    #[test]
    fn well_known_provider_skips_the_probe() {
        let dns = StubDns::reachable();
        let prober = StubProber::new(false, false);
        let result = verify_with("someone@gmail.com", &dns, &prober);
        assert_eq!(result.email_status, EmailStatus::Valid);
        assert!(result.technical_details.smtp_valid);
        assert_eq!(result.mailbox_server_status, ServerStatus::Valid);
        assert!(!prober.called.get(), "no SMTP socket for well-known hosts");
    }

    #[test]
    fn accepted_rcpt_yields_valid() {
        let dns = StubDns::reachable();
        let prober = StubProber::new(true, false);
        let result = verify_with("alice@corp.example", &dns, &prober);
        assert_eq!(result.email_status, EmailStatus::Valid);
        assert_eq!(result.mailbox_server_status, ServerStatus::Valid);
        assert!(result.technical_details.smtp_valid);
        assert!(!result.technical_details.catch_all);
        assert!(prober.called.get());
    }

    #[test]
    fn catch_all_outranks_valid() {
        let dns = StubDns::reachable();
        let prober = StubProber::new(true, true);
        let result = verify_with("alice@blanket.example", &dns, &prober);
        assert_eq!(result.email_status, EmailStatus::CatchAll);
        assert_eq!(result.mailbox_server_status, ServerStatus::Valid);
        assert!(result.technical_details.catch_all);
    }

    #[test]
    fn rejected_rcpt_yields_invalid() {
        let dns = StubDns::reachable();
        let prober = StubProber::new(false, false);
        let result = verify_with("ghost@corp.example", &dns, &prober);
        assert_eq!(result.email_status, EmailStatus::Invalid);
        assert_eq!(result.mailbox_server_status, ServerStatus::Invalid);
    }

    #[test]
    fn domain_field_keeps_the_pre_punycode_form() {
        let dns = StubDns::reachable();
        let prober = StubProber::new(true, false);
        let result = verify_with("user@bücher.example", &dns, &prober);
        assert_eq!(result.domain, "bücher.example");
        assert_eq!(result.email_address, "user@bücher.example");
        assert_eq!(result.email_syntax_format, SyntaxFormat::Valid);
    }
}
