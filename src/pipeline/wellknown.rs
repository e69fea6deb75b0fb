//! Large consumer providers whose deliverability is taken on faith; a
//! match short-circuits the SMTP probe.

use phf::phf_set;

static WELL_KNOWN_PROVIDERS: phf::Set<&'static str> = phf_set! {
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "aol.com",
    "icloud.com",
    "protonmail.com",
    "proton.me",
    "zoho.com",
    "mail.com",
    "gmx.com",
    "yandex.com",
    "microsoft.com",
    "googlemail.com",
    "live.com",
};

/// True when `ascii_domain` equals or is a subdomain of a well-known
/// provider.
pub(crate) fn is_well_known_provider(ascii_domain: &str) -> bool {
    let domain = ascii_domain.trim().to_ascii_lowercase();
    if WELL_KNOWN_PROVIDERS.contains(domain.as_str()) {
        return true;
    }
    WELL_KNOWN_PROVIDERS.iter().any(|provider| {
        domain
            .strip_suffix(provider)
            .is_some_and(|prefix| prefix.ends_with('.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match() {
        assert!(is_well_known_provider("gmail.com"));
        assert!(is_well_known_provider("proton.me"));
    }

    #[test]
    fn subdomain_match() {
        assert!(is_well_known_provider("smtp.gmail.com"));
        assert!(is_well_known_provider("eu.mail.com"));
    }

    #[test]
    fn lookalike_suffix_is_not_a_match() {
        assert!(!is_well_known_provider("notgmail.com"));
        assert!(!is_well_known_provider("gmail.com.evil.example"));
    }

    #[test]
    fn unrelated_domain_is_not_a_match() {
        assert!(!is_well_known_provider("example.com"));
    }
}
