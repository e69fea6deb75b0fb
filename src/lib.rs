#![forbid(unsafe_code)]
//! mailverify — is there a deliverable mailbox behind an address?
//!
//! [`Verifier::verify`] walks a fixed decision tree: syntactic check,
//! disposable-domain list, A/AAAA existence, MX presence, webmail
//! classification, well-known-provider shortcut, and finally a live
//! SMTP probe with catch-all detection. Each stage either short-circuits
//! with a reason or advances; the result reports the verdict and the
//! technical facts that produced it.

pub mod config;
pub mod dns;
pub mod lists;
pub mod pipeline;
pub mod smtp;
pub mod validator;
pub mod webmail;

pub use dns::{DnsError, DnsOptions, DnsProbe, MxHost};
pub use pipeline::{
    EmailStatus, MailboxType, ServerStatus, SetupError, SyntaxFormat, TechnicalDetails,
    VerificationResult, Verifier,
};
pub use smtp::{ProbeOutcome, SmtpProbeError, SmtpProbeOptions, SmtpProber, SmtpReply};
pub use validator::{ParsedAddress, parse_address};
