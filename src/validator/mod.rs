//! Validator module: syntactic check + address decomposition.

mod domain;
mod types;

pub use types::ParsedAddress;

use domain::check_domain;

/// Valide le **format** d'une adresse e-mail (pas de MX/SMTP) et la
/// décompose en partie locale + domaine.
///
/// Pure function: aucune I/O, aucune erreur — seulement `valid` et les
/// raisons d'invalidation. Le domaine est normalisé en punycode ici, une
/// seule fois; tout l'aval travaille sur `ascii_domain`.
///
/// # Exemples
/// ```
/// use mailverify::parse_address;
/// let parsed = parse_address("alice@example.com");
/// assert!(parsed.valid);
/// assert_eq!(parsed.local, "alice");
/// assert_eq!(parsed.ascii_domain, "example.com");
/// ```
pub fn parse_address(email: &str) -> ParsedAddress {
    let mut reasons = Vec::new();

    if email.chars().any(char::is_whitespace) {
        reasons.push("address contains whitespace".to_string());
        return ParsedAddress::invalid(email, reasons);
    }

    // RFC 5321: 254 max avec le '@'
    if email.len() > 254 {
        reasons.push(format!("total length {} > 254", email.len()));
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        reasons.push("must contain exactly one '@'".to_string());
        return ParsedAddress::invalid(email, reasons);
    }
    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() || local.len() > 64 {
        reasons.push(format!("local part length {} invalid (1..=64)", local.len()));
    }

    let ascii_domain = check_domain(domain, &mut reasons);

    let valid = reasons.is_empty();
    ParsedAddress {
        original: email.to_string(),
        local: local.to_string(),
        domain: domain.to_string(),
        ascii_domain: if valid {
            ascii_domain.unwrap_or_default()
        } else {
            String::new()
        },
        valid,
        reasons,
    }
}
