use serde::{Deserialize, Serialize};

/// Final verdict for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailStatus {
    Valid,
    Invalid,
    #[serde(rename = "Catch-All")]
    CatchAll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyntaxFormat {
    Valid,
    Invalid,
}

/// Coarse mailbox classification: an individual on a shared consumer
/// service, or an organization's own mail system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MailboxType {
    Professional,
    Webmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    Valid,
    Invalid,
}

/// The observable technical facts behind a verdict, in pipeline order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalDetails {
    pub disposable: bool,
    pub domain_exists: bool,
    pub has_mx_record: bool,
    pub smtp_valid: bool,
    pub catch_all: bool,
}

/// The verification verdict together with how far the pipeline got.
///
/// `domain` carries the form the caller typed, pre-punycode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub email_address: String,
    pub email_status: EmailStatus,
    pub domain: String,
    pub email_syntax_format: SyntaxFormat,
    pub mailbox_type: MailboxType,
    pub mailbox_server_status: ServerStatus,
    pub technical_details: TechnicalDetails,
}

impl VerificationResult {
    /// Conservative starting point: everything unverified, nothing
    /// reached yet.
    pub(crate) fn new(email: &str) -> Self {
        Self {
            email_address: email.to_string(),
            email_status: EmailStatus::Invalid,
            domain: String::new(),
            email_syntax_format: SyntaxFormat::Invalid,
            mailbox_type: MailboxType::Professional,
            mailbox_server_status: ServerStatus::Invalid,
            technical_details: TechnicalDetails::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_wire_field_names() {
        let mut result = VerificationResult::new("alice@example.com");
        result.email_status = EmailStatus::CatchAll;
        result.domain = "example.com".to_string();
        result.email_syntax_format = SyntaxFormat::Valid;
        result.technical_details.smtp_valid = true;
        result.technical_details.catch_all = true;

        let json = serde_json::to_value(&result).expect("serializable");
        assert_eq!(json["emailAddress"], "alice@example.com");
        assert_eq!(json["emailStatus"], "Catch-All");
        assert_eq!(json["emailSyntaxFormat"], "Valid");
        assert_eq!(json["mailboxType"], "Professional");
        assert_eq!(json["mailboxServerStatus"], "Invalid");
        assert_eq!(json["technicalDetails"]["hasMxRecord"], false);
        assert_eq!(json["technicalDetails"]["smtpValid"], true);
        assert_eq!(json["technicalDetails"]["catchAll"], true);
    }

    #[test]
    fn round_trips_through_json() {
        let mut result = VerificationResult::new("bob@corp.example");
        result.email_syntax_format = SyntaxFormat::Valid;
        result.mailbox_type = MailboxType::Webmail;
        let json = serde_json::to_string(&result).expect("serialize");
        let back: VerificationResult = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, result);
    }
}
