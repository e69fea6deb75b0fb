/// Decomposition of an address string after the syntactic check.
///
/// `domain` keeps the form the caller typed; `ascii_domain` carries the
/// IDNA (punycode) form that every DNS and SMTP operation must use. When
/// the check fails, `valid` is false and `reasons` lists what was wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub original: String,
    pub local: String,
    pub domain: String,
    pub ascii_domain: String,
    pub valid: bool,
    pub reasons: Vec<String>,
}

impl ParsedAddress {
    pub(crate) fn invalid(original: &str, reasons: Vec<String>) -> Self {
        Self {
            original: original.to_string(),
            local: String::new(),
            domain: String::new(),
            ascii_domain: String::new(),
            valid: false,
            reasons,
        }
    }
}
