//! DNS probing: A/AAAA existence checks and MX enumeration with
//! retry/backoff, per-query timeouts, and a TTL-keyed verdict cache.
//!
//! The public entry point is [`DnsProbe`]; negative answers (`NXDOMAIN`,
//! empty data) are verdicts, not errors, and transport failures degrade
//! to a conservative `false` after retries.

mod cache;
mod error;
mod resolver;

pub use error::DnsError;

pub(crate) use resolver::DnsLookup;

use std::net::IpAddr;
use std::thread;
use std::time::Duration;

use trust_dns_resolver::Resolver;

use crate::config::CONFIG;
use cache::DnsCache;

/// A mail exchanger as returned by `resolve_mx`, ordered by ascending
/// priority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MxHost {
    pub exchange: String,
    pub priority: u16,
}

/// Retry and upstream knobs for [`DnsProbe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsOptions {
    pub servers: Vec<IpAddr>,
    pub query_timeout: Duration,
    pub retries: u32,
    pub retry_factor: u32,
    pub retry_min_timeout: Duration,
    pub retry_max_timeout: Duration,
}

impl Default for DnsOptions {
    fn default() -> Self {
        Self {
            servers: vec![IpAddr::from([1, 1, 1, 1]), IpAddr::from([1, 0, 0, 1])],
            query_timeout: Duration::from_millis(5_000),
            retries: 2,
            retry_factor: 2,
            retry_min_timeout: Duration::from_millis(1_000),
            retry_max_timeout: Duration::from_millis(5_000),
        }
    }
}

impl DnsOptions {
    /// Defaults seeded from the process environment.
    pub fn from_config() -> Self {
        Self {
            servers: CONFIG.dns_servers.clone(),
            query_timeout: CONFIG.dns_query_timeout,
            retries: CONFIG.dns_retries,
            retry_factor: CONFIG.dns_retry_factor,
            retry_min_timeout: CONFIG.dns_retry_min_timeout,
            retry_max_timeout: CONFIG.dns_retry_max_timeout,
        }
    }
}

pub struct DnsProbe {
    resolver: Resolver,
    options: DnsOptions,
    cache: &'static DnsCache,
}

impl DnsProbe {
    pub fn new(options: DnsOptions) -> Result<Self, DnsError> {
        let resolver = resolver::build_resolver(&options)?;
        Ok(Self {
            resolver,
            options,
            cache: cache::shared(),
        })
    }

    /// A then AAAA; true on the first non-empty answer.
    pub fn domain_exists(&self, domain: &str) -> bool {
        domain_exists_with(&self.resolver, &self.options, domain)
    }

    /// TTL-cached. MX first, with A then AAAA as the implicit-MX fallback.
    pub fn has_mx_record(&self, domain: &str) -> bool {
        has_mx_with(&self.resolver, self.cache, &self.options, domain)
    }

    /// MX hosts sorted by ascending priority; ties keep resolver order.
    pub fn resolve_mx(&self, domain: &str) -> Vec<MxHost> {
        resolve_mx_with(&self.resolver, &self.options, domain)
    }
}

pub(crate) fn domain_exists_with<R: DnsLookup>(
    resolver: &R,
    options: &DnsOptions,
    domain: &str,
) -> bool {
    address_present(options, domain, "A", || resolver.ipv4(domain))
        || address_present(options, domain, "AAAA", || resolver.ipv6(domain))
}

fn address_present(
    options: &DnsOptions,
    domain: &str,
    record: &str,
    query: impl Fn() -> Result<bool, DnsError>,
) -> bool {
    match with_exponential_backoff(options, query) {
        Ok(found) => found,
        Err(err) if err.is_negative() => false,
        Err(err) => {
            tracing::debug!(%domain, record, %err, "existence query failed");
            false
        }
    }
}

pub(crate) fn has_mx_with<R: DnsLookup>(
    resolver: &R,
    cache: &DnsCache,
    options: &DnsOptions,
    domain: &str,
) -> bool {
    if let Some(cached) = cache.get(domain) {
        tracing::debug!(%domain, cached, "mx cache hit");
        return cached;
    }
    let value = mail_reachable(resolver, options, domain);
    cache.insert(domain, value);
    value
}

fn mail_reachable<R: DnsLookup>(resolver: &R, options: &DnsOptions, domain: &str) -> bool {
    match with_linear_backoff(options, || resolver.mx(domain)) {
        Ok(hosts) if !hosts.is_empty() => return true,
        Ok(_) => tracing::debug!(%domain, "MX answer empty, falling back to A/AAAA"),
        Err(err) if err.is_negative() => {
            tracing::debug!(%domain, "no MX records, falling back to A/AAAA");
        }
        Err(err) => {
            tracing::debug!(%domain, %err, "MX lookup failed");
            return false;
        }
    }
    matches!(
        with_linear_backoff(options, || resolver.ipv4(domain)),
        Ok(true)
    ) || matches!(
        with_linear_backoff(options, || resolver.ipv6(domain)),
        Ok(true)
    )
}

pub(crate) fn resolve_mx_with<R: DnsLookup>(
    resolver: &R,
    options: &DnsOptions,
    domain: &str,
) -> Vec<MxHost> {
    match with_linear_backoff(options, || resolver.mx(domain)) {
        Ok(mut hosts) => {
            // stable: equal priorities keep the resolver's enumeration order
            hosts.sort_by_key(|host| host.priority);
            hosts
        }
        Err(err) => {
            tracing::debug!(%domain, %err, "MX enumeration failed");
            Vec::new()
        }
    }
}

fn with_exponential_backoff<T>(
    options: &DnsOptions,
    query: impl Fn() -> Result<T, DnsError>,
) -> Result<T, DnsError> {
    let mut delay = options.retry_min_timeout;
    let mut attempt = 0;
    loop {
        match query() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_negative() || attempt >= options.retries => return Err(err),
            Err(err) => {
                attempt += 1;
                tracing::debug!(%err, attempt, "transient DNS failure, backing off");
                thread::sleep(delay);
                delay = (delay * options.retry_factor).min(options.retry_max_timeout);
            }
        }
    }
}

const MX_RETRIES: u32 = 2;

fn with_linear_backoff<T>(
    options: &DnsOptions,
    query: impl Fn() -> Result<T, DnsError>,
) -> Result<T, DnsError> {
    let mut attempt = 0;
    loop {
        match query() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_negative() || attempt >= MX_RETRIES => return Err(err),
            Err(err) => {
                attempt += 1;
                tracing::debug!(%err, attempt, "transient DNS failure, retrying");
                thread::sleep(options.retry_min_timeout * attempt);
            }
        }
    }
}
