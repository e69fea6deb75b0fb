use thiserror::Error;
use trust_dns_resolver::error::{ResolveError, ResolveErrorKind};

#[derive(Debug, Error)]
pub enum DnsError {
    #[error("resolver initialization failed: {source}")]
    ResolverInit {
        #[source]
        source: std::io::Error,
    },
    #[error("no records found for {domain}")]
    NoRecords { domain: String },
    #[error("DNS query for {domain} timed out")]
    Timeout { domain: String },
    #[error("DNS lookup for {domain} failed: {source}")]
    Lookup {
        domain: String,
        #[source]
        source: ResolveError,
    },
}

impl DnsError {
    pub(crate) fn from_resolve(domain: &str, source: ResolveError) -> Self {
        match source.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => Self::NoRecords {
                domain: domain.to_string(),
            },
            ResolveErrorKind::Timeout => Self::Timeout {
                domain: domain.to_string(),
            },
            _ => Self::Lookup {
                domain: domain.to_string(),
                source,
            },
        }
    }

    /// NXDOMAIN / ENODATA: a decisive negative answer, never retried.
    pub(crate) fn is_negative(&self) -> bool {
        matches!(self, Self::NoRecords { .. })
    }
}
