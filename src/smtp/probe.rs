//! The SMTP conversation engine: MX iteration, the EHLO/MAIL FROM/RCPT
//! sequence, catch-all detection, and the per-server verdict cache.

use std::borrow::Cow;
use std::sync::Arc;

use native_tls::TlsConnector;
use rand::{Rng, distributions::Alphanumeric};

use crate::dns::{DnsProbe, MxHost};
use crate::smtp::cache::{self, CachedProbe, CatchAllCache};
use crate::smtp::error::SmtpProbeError;
use crate::smtp::options::SmtpProbeOptions;
use crate::smtp::session::SmtpSession;

/// What a probe observed: would the server accept a RCPT for this
/// address, and does it accept one for any address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub smtp_valid: bool,
    pub catch_all: bool,
}

pub struct SmtpProber {
    dns: Arc<DnsProbe>,
    options: SmtpProbeOptions,
    connector: TlsConnector,
    cache: &'static CatchAllCache,
}

impl SmtpProber {
    pub fn new(dns: Arc<DnsProbe>, options: SmtpProbeOptions) -> Result<Self, SmtpProbeError> {
        let connector = build_connector(&options)?;
        Ok(Self {
            dns,
            options,
            connector,
            cache: cache::shared(),
        })
    }

    /// Probe the domain's MX hosts for `local@domain`. Never fails:
    /// exhaustion of every host yields a negative outcome.
    pub fn probe(&self, domain: &str, local: &str) -> ProbeOutcome {
        let hosts = self.dns.resolve_mx(domain);
        probe_hosts(
            &hosts,
            domain,
            local,
            &self.options,
            &self.connector,
            self.cache,
        )
    }
}

pub(crate) fn build_connector(
    options: &SmtpProbeOptions,
) -> Result<TlsConnector, SmtpProbeError> {
    TlsConnector::builder()
        .danger_accept_invalid_certs(!options.verify_certificates)
        .danger_accept_invalid_hostnames(!options.verify_certificates)
        .build()
        .map_err(|source| SmtpProbeError::TlsInit { source })
}

pub(crate) fn probe_hosts(
    hosts: &[MxHost],
    domain: &str,
    local: &str,
    options: &SmtpProbeOptions,
    connector: &TlsConnector,
    cache: &CatchAllCache,
) -> ProbeOutcome {
    if hosts.is_empty() {
        tracing::debug!(%domain, "no MX hosts to probe");
        return ProbeOutcome::default();
    }
    for host in hosts {
        match probe_exchange(&host.exchange, domain, local, options, connector, cache) {
            Ok(HostVerdict::Decided(outcome)) => {
                tracing::debug!(
                    exchange = %host.exchange,
                    smtp_valid = outcome.smtp_valid,
                    catch_all = outcome.catch_all,
                    "decisive verdict"
                );
                return outcome;
            }
            Ok(HostVerdict::Inconclusive(reason)) => {
                tracing::debug!(exchange = %host.exchange, reason, "host inconclusive, trying next");
            }
            Err(err) => {
                tracing::debug!(exchange = %host.exchange, %err, "host failed, trying next");
            }
        }
    }
    ProbeOutcome::default()
}

enum HostVerdict {
    Decided(ProbeOutcome),
    Inconclusive(&'static str),
}

fn probe_exchange(
    exchange: &str,
    domain: &str,
    local: &str,
    options: &SmtpProbeOptions,
    connector: &TlsConnector,
    cache: &CatchAllCache,
) -> Result<HostVerdict, SmtpProbeError> {
    let mut session = SmtpSession::connect(exchange, options, connector)?;
    let verdict = converse(&mut session, exchange, domain, local, options, connector, cache);
    // QUIT and teardown on every path, decisive or not
    session.quit();
    verdict
}

fn converse(
    session: &mut SmtpSession,
    exchange: &str,
    domain: &str,
    local: &str,
    options: &SmtpProbeOptions,
    connector: &TlsConnector,
    cache: &CatchAllCache,
) -> Result<HostVerdict, SmtpProbeError> {
    let greeting = session.read_banner()?;
    if greeting.code != 220 {
        return Ok(HostVerdict::Inconclusive("unexpected greeting"));
    }

    let ehlo_cmd = format!("EHLO {}", options.helo_host);
    let ehlo = session.send_command(&ehlo_cmd)?;
    if ehlo.is_positive_completion() {
        if ehlo.has_capability("STARTTLS") && !session.is_secure() && session.starttls(connector)? {
            let repeated = session.send_command(&ehlo_cmd)?;
            if !repeated.is_positive_completion() {
                return Ok(HostVerdict::Inconclusive("EHLO rejected after STARTTLS"));
            }
        }
    } else {
        let helo = session.send_command(&format!("HELO {}", options.helo_host))?;
        if !helo.is_positive_completion() {
            return Ok(HostVerdict::Inconclusive("HELO rejected"));
        }
    }

    let mail = session.send_command(&format!("MAIL FROM:<{}>", options.mail_from))?;
    if !mail.is_positive_completion() {
        return Ok(HostVerdict::Inconclusive("MAIL FROM rejected"));
    }

    match cache.get(domain, exchange) {
        Some(CachedProbe::CatchAll) => {
            tracing::debug!(%domain, %exchange, "cached catch-all verdict, skipping RCPT");
            Ok(HostVerdict::Decided(ProbeOutcome {
                smtp_valid: true,
                catch_all: true,
            }))
        }
        Some(CachedProbe::Rejection(cached_text)) => {
            let reply = session.send_command(&rcpt_command(local, domain))?;
            if reply.is_positive_completion() {
                Ok(HostVerdict::Decided(ProbeOutcome {
                    smtp_valid: true,
                    catch_all: false,
                }))
            } else if reply.text() == cached_text {
                // the address draws the same blanket reply as a random one
                Ok(HostVerdict::Decided(ProbeOutcome {
                    smtp_valid: false,
                    catch_all: false,
                }))
            } else {
                Ok(HostVerdict::Decided(ProbeOutcome {
                    smtp_valid: true,
                    catch_all: false,
                }))
            }
        }
        None => {
            let alias = dummy_local(options, local);
            let dummy = session.send_command(&rcpt_command(&alias, domain))?;
            if dummy.is_positive_completion() {
                cache.insert(domain, exchange, CachedProbe::CatchAll);
                return Ok(HostVerdict::Decided(ProbeOutcome {
                    smtp_valid: true,
                    catch_all: true,
                }));
            }
            cache.insert(domain, exchange, CachedProbe::Rejection(dummy.text()));

            let reply = session.send_command(&rcpt_command(local, domain))?;
            if reply.is_positive_completion() {
                Ok(HostVerdict::Decided(ProbeOutcome {
                    smtp_valid: true,
                    catch_all: false,
                }))
            } else if reply.is_permanent_failure() {
                Ok(HostVerdict::Decided(ProbeOutcome {
                    smtp_valid: false,
                    catch_all: false,
                }))
            } else {
                Ok(HostVerdict::Inconclusive("transient reply to RCPT"))
            }
        }
    }
}

fn rcpt_command(local: &str, domain: &str) -> String {
    format!("RCPT TO:<{local}@{domain}>")
}

/// The configured dummy local part, or a random one when the address
/// under test collides with it.
fn dummy_local<'a>(options: &'a SmtpProbeOptions, local: &str) -> Cow<'a, str> {
    if options.catchall_local_part.eq_ignore_ascii_case(local) {
        Cow::Owned(random_local_part(options.catchall_local_part.len()))
    } else {
        Cow::Borrowed(options.catchall_local_part.as_str())
    }
}

fn random_local_part(len: usize) -> String {
    let length = len.clamp(8, 32);
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}
