use clap::Parser;
use mailverify::{DnsOptions, SmtpProbeOptions};

#[derive(Parser)]
#[command(name = "mailverify-cli")]
pub struct Cli {
    /// adresses à vérifier
    pub emails: Vec<String>,

    /// lit des adresses depuis stdin (une par ligne)
    #[arg(long)]
    pub stdin: bool,

    /// format: human|json
    #[arg(long, default_value = "human")]
    pub format: String,

    /// nom utilisé pour EHLO/HELO
    #[arg(long)]
    pub helo: Option<String>,

    /// enveloppe MAIL FROM
    #[arg(long = "from")]
    pub mail_from: Option<String>,

    /// timeout par commande SMTP (ms)
    #[arg(long = "timeout")]
    pub timeout_ms: Option<u64>,

    /// valide les certificats lors du STARTTLS
    #[arg(long = "verify-certs")]
    pub verify_certs: bool,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn clap_command() -> clap::Command {
        <Self as clap::CommandFactory>::command()
    }

    pub fn dns_options(&self) -> DnsOptions {
        DnsOptions::from_config()
    }

    pub fn smtp_options(&self) -> SmtpProbeOptions {
        let mut options = SmtpProbeOptions::from_config();
        if let Some(helo) = &self.helo {
            options.helo_host = helo.clone();
        }
        if let Some(mail_from) = &self.mail_from {
            options.mail_from = mail_from.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            let timeout = std::time::Duration::from_millis(timeout_ms);
            options.connect_timeout = timeout;
            options.command_timeout = timeout;
        }
        if self.verify_certs {
            options.verify_certificates = true;
        }
        options
    }
}
