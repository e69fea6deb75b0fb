#[path = "mailverify-cli/args.rs"]
mod args;
#[path = "mailverify-cli/output.rs"]
mod output;

use anyhow::{Context, Result};
use args::Cli;
use mailverify::Verifier;
use output::{any_not_valid, write_results};

use std::io::{self, BufRead};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let verifier = Verifier::with_options(cli.dns_options(), cli.smtp_options())
        .context("initialize verifier")?;

    let mut results = Vec::new();
    if cli.stdin {
        for line in io::stdin().lock().lines() {
            let email = line.context("read stdin")?;
            let email = email.trim();
            if email.is_empty() {
                continue;
            }
            results.push(verifier.verify(email));
        }
    } else if cli.emails.is_empty() {
        Cli::clap_command().print_help()?;
        println!();
        return Ok(());
    } else {
        for email in &cli.emails {
            results.push(verifier.verify(email.trim()));
        }
    }

    write_results(&results, &cli.format)?;

    if any_not_valid(&results) {
        std::process::exit(2);
    }

    Ok(())
}
