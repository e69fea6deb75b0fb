//! Process-wide defaults, read once from the environment.
//!
//! Every knob here is also a plain field on [`DnsOptions`](crate::DnsOptions)
//! or [`SmtpProbeOptions`](crate::SmtpProbeOptions); the environment only
//! seeds defaults and is never consulted again after first access.

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::Duration;

pub static CONFIG: LazyLock<Config> = LazyLock::new(Config::from_env);

#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream resolvers queried for MX/A/AAAA records.
    pub dns_servers: Vec<IpAddr>,
    /// Per-query transport timeout.
    pub dns_query_timeout: Duration,
    /// Application-level retries on transient DNS failures.
    pub dns_retries: u32,
    /// Exponential backoff factor for existence queries.
    pub dns_retry_factor: u32,
    /// Initial backoff delay.
    pub dns_retry_min_timeout: Duration,
    /// Backoff delay cap.
    pub dns_retry_max_timeout: Duration,
    /// Per-command SMTP deadline (also used for connects).
    pub smtp_command_timeout: Duration,
    /// Hostname announced in EHLO/HELO.
    pub helo_host: String,
    /// Envelope sender for MAIL FROM.
    pub mail_from: String,
    /// Local part of the nonexistent-address probe.
    pub catchall_local_part: String,
    /// Enforce certificate validation on STARTTLS upgrades.
    pub verify_certificates: bool,
    /// Location of the webmail domain artifact.
    pub webmail_domains_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dns_servers: vec![
                IpAddr::from([1, 1, 1, 1]),
                IpAddr::from([1, 0, 0, 1]),
            ],
            dns_query_timeout: Duration::from_millis(5_000),
            dns_retries: 2,
            dns_retry_factor: 2,
            dns_retry_min_timeout: Duration::from_millis(1_000),
            dns_retry_max_timeout: Duration::from_millis(5_000),
            smtp_command_timeout: Duration::from_millis(10_000),
            helo_host: "getastromail.com".to_string(),
            mail_from: "relja@getastromail.com".to_string(),
            catchall_local_part: "gibberishasdfasdf".to_string(),
            verify_certificates: false,
            webmail_domains_path: PathBuf::from("webmail_domains.json"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            dns_servers: env_ip_list("DNS_SERVERS").unwrap_or(defaults.dns_servers),
            dns_query_timeout: env_millis("DNS_TIMEOUT").unwrap_or(defaults.dns_query_timeout),
            dns_retries: env_parse("DNS_RETRIES").unwrap_or(defaults.dns_retries),
            dns_retry_factor: env_parse("DNS_RETRY_FACTOR").unwrap_or(defaults.dns_retry_factor),
            dns_retry_min_timeout: env_millis("DNS_RETRY_MIN_TIMEOUT")
                .unwrap_or(defaults.dns_retry_min_timeout),
            dns_retry_max_timeout: env_millis("DNS_RETRY_MAX_TIMEOUT")
                .unwrap_or(defaults.dns_retry_max_timeout),
            smtp_command_timeout: env_millis("SMTP_COMMAND_TIMEOUT")
                .unwrap_or(defaults.smtp_command_timeout),
            helo_host: env::var("HELO_HOST").unwrap_or(defaults.helo_host),
            mail_from: env::var("MAIL_FROM").unwrap_or(defaults.mail_from),
            catchall_local_part: env::var("CATCHALL_LOCAL_PART")
                .unwrap_or(defaults.catchall_local_part),
            verify_certificates: env_parse("SMTP_VERIFY_CERTIFICATES")
                .unwrap_or(defaults.verify_certificates),
            webmail_domains_path: env::var_os("WEBMAIL_DOMAINS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.webmail_domains_path),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(%name, %raw, "ignoring unparseable environment value");
            None
        }
    }
}

fn env_millis(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_millis)
}

fn env_ip_list(name: &str) -> Option<Vec<IpAddr>> {
    let raw = env::var(name).ok()?;
    let servers: Vec<IpAddr> = raw
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            match part.parse() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    tracing::warn!(%name, server = %part, "ignoring invalid DNS server address");
                    None
                }
            }
        })
        .collect();
    if servers.is_empty() { None } else { Some(servers) }
}
