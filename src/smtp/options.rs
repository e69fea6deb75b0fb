use std::time::Duration;

use crate::config::CONFIG;

/// Configuration knobs for [`SmtpProber`](crate::SmtpProber).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProbeOptions {
    /// Hostname announced in EHLO/HELO.
    pub helo_host: String,
    /// Envelope sender for MAIL FROM.
    pub mail_from: String,
    /// Local part used for the nonexistent-address probe.
    pub catchall_local_part: String,
    /// Submission ports, attempted in order. 465 is implicit TLS.
    pub ports: Vec<u16>,
    /// Deadline applied to each connect attempt.
    pub connect_timeout: Duration,
    /// Deadline applied to each command/reply exchange.
    pub command_timeout: Duration,
    /// Enforce certificate validation on TLS upgrades. MX hosts routinely
    /// present self-signed or expired certificates, so this is off by
    /// default.
    pub verify_certificates: bool,
}

impl Default for SmtpProbeOptions {
    fn default() -> Self {
        Self {
            helo_host: "getastromail.com".to_string(),
            mail_from: "relja@getastromail.com".to_string(),
            catchall_local_part: "gibberishasdfasdf".to_string(),
            ports: vec![25, 587, 465],
            connect_timeout: Duration::from_millis(10_000),
            command_timeout: Duration::from_millis(10_000),
            verify_certificates: false,
        }
    }
}

impl SmtpProbeOptions {
    /// Defaults seeded from the process environment.
    pub fn from_config() -> Self {
        Self {
            helo_host: CONFIG.helo_host.clone(),
            mail_from: CONFIG.mail_from.clone(),
            catchall_local_part: CONFIG.catchall_local_part.clone(),
            connect_timeout: CONFIG.smtp_command_timeout,
            command_timeout: CONFIG.smtp_command_timeout,
            verify_certificates: CONFIG.verify_certificates,
            ..Self::default()
        }
    }
}
