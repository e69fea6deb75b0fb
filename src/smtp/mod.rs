//! SMTP probing engine: drives a live conversation with a remote mail
//! server to learn whether it would accept a RCPT for an address,
//! without transmitting a message.
//!
//! The public entry point is [`SmtpProber::probe`]. MX hosts are tried
//! in priority order, ports in the fixed order 25, 587, 465; catch-all
//! verdicts are cached per `(domain, mx host)` for an hour.

mod cache;
mod error;
mod options;
mod probe;
mod session;

pub use error::SmtpProbeError;
pub use options::SmtpProbeOptions;
pub use probe::{ProbeOutcome, SmtpProber};
pub use session::SmtpReply;
