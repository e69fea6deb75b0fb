//! Webmail classifier: a read-only `domain -> bool` mapping loaded once
//! from `webmail_domains.json` and cached for the process lifetime. A
//! missing or malformed artifact degrades to an empty mapping; the lookup
//! itself never fails.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::LazyLock;

use crate::config::CONFIG;

static WEBMAIL_DOMAINS: LazyLock<HashMap<String, bool>> =
    LazyLock::new(|| load_from_path(&CONFIG.webmail_domains_path));

/// Whether `domain` belongs to a shared consumer mail service.
pub fn is_webmail_domain(domain: &str) -> bool {
    lookup(&WEBMAIL_DOMAINS, domain)
}

fn lookup(map: &HashMap<String, bool>, domain: &str) -> bool {
    map.get(domain.trim().to_ascii_lowercase().as_str())
        .copied()
        .unwrap_or(false)
}

fn load_from_path(path: &Path) -> HashMap<String, bool> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "webmail artifact unavailable, classifier is empty");
            return HashMap::new();
        }
    };
    match parse_artifact(BufReader::new(file)) {
        Ok(map) => {
            tracing::debug!(path = %path.display(), entries = map.len(), "webmail artifact loaded");
            map
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "webmail artifact malformed, classifier is empty");
            HashMap::new()
        }
    }
}

fn parse_artifact<R: Read>(reader: R) -> serde_json::Result<HashMap<String, bool>> {
    let map: HashMap<String, bool> = serde_json::from_reader(reader)?;
    Ok(map
        .into_iter()
        .map(|(domain, flag)| (domain.to_ascii_lowercase(), flag))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_artifact_and_lowercases_keys() {
        let map = parse_artifact(&b"{\"Gmail.com\": true, \"corp.example\": false}"[..])
            .expect("valid artifact");
        assert!(lookup(&map, "gmail.com"));
        assert!(lookup(&map, " GMAIL.COM "));
        assert!(!lookup(&map, "corp.example"));
        assert!(!lookup(&map, "unknown.example"));
    }

    #[test]
    fn malformed_artifact_is_an_error() {
        assert!(parse_artifact(&b"[\"gmail.com\"]"[..]).is_err());
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let map = load_from_path(Path::new("definitely/not/here.json"));
        assert!(map.is_empty());
    }
}
