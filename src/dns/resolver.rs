use std::net::{IpAddr, SocketAddr};

use trust_dns_resolver::Resolver;
use trust_dns_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};

use super::{DnsError, DnsOptions, MxHost};

/// Seam between the probing logic and the wire resolver, so tests can
/// substitute scripted lookups.
pub(crate) trait DnsLookup {
    fn mx(&self, domain: &str) -> Result<Vec<MxHost>, DnsError>;
    fn ipv4(&self, domain: &str) -> Result<bool, DnsError>;
    fn ipv6(&self, domain: &str) -> Result<bool, DnsError>;
}

/// Build a resolver pinned to the configured upstream servers. Transport
/// retries stay at 1; application-level retries are handled above.
pub(crate) fn build_resolver(options: &DnsOptions) -> Result<Resolver, DnsError> {
    let mut config = ResolverConfig::new();
    for server in &options.servers {
        config.add_name_server(name_server(*server, Protocol::Udp));
        config.add_name_server(name_server(*server, Protocol::Tcp));
    }
    let mut opts = ResolverOpts::default();
    opts.timeout = options.query_timeout;
    opts.attempts = 1;
    Resolver::new(config, opts).map_err(|source| DnsError::ResolverInit { source })
}

fn name_server(ip: IpAddr, protocol: Protocol) -> NameServerConfig {
    NameServerConfig {
        socket_addr: SocketAddr::new(ip, 53),
        protocol,
        tls_dns_name: None,
        trust_negative_responses: true,
        bind_addr: None,
    }
}

impl DnsLookup for Resolver {
    fn mx(&self, domain: &str) -> Result<Vec<MxHost>, DnsError> {
        let lookup = self
            .mx_lookup(domain)
            .map_err(|err| DnsError::from_resolve(domain, err))?;
        let mut hosts = Vec::new();
        for record in lookup.iter() {
            let exchange = normalize_exchange(record.exchange().to_utf8());
            if exchange.is_empty() {
                continue;
            }
            hosts.push(MxHost {
                exchange,
                priority: record.preference(),
            });
        }
        Ok(hosts)
    }

    fn ipv4(&self, domain: &str) -> Result<bool, DnsError> {
        self.ipv4_lookup(domain)
            .map(|answer| answer.iter().next().is_some())
            .map_err(|err| DnsError::from_resolve(domain, err))
    }

    fn ipv6(&self, domain: &str) -> Result<bool, DnsError> {
        self.ipv6_lookup(domain)
            .map(|answer| answer.iter().next().is_some())
            .map_err(|err| DnsError::from_resolve(domain, err))
    }
}

pub(crate) fn normalize_exchange(exchange: String) -> String {
    exchange.trim_end_matches('.').to_ascii_lowercase()
}
