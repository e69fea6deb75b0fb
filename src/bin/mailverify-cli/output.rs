use anyhow::{Context, Result};
use mailverify::{EmailStatus, VerificationResult};

pub fn write_results(results: &[VerificationResult], format: &str) -> Result<()> {
    match format {
        "json" => {
            let json = serde_json::to_string_pretty(results).context("serialize results")?;
            println!("{json}");
        }
        _ => {
            for result in results {
                println!("{}", human_line(result));
            }
        }
    }
    Ok(())
}

pub fn any_not_valid(results: &[VerificationResult]) -> bool {
    results
        .iter()
        .any(|result| result.email_status != EmailStatus::Valid)
}

fn human_line(result: &VerificationResult) -> String {
    let status = match result.email_status {
        EmailStatus::Valid => "valid",
        EmailStatus::Invalid => "invalid",
        EmailStatus::CatchAll => "catch-all",
    };
    let details = &result.technical_details;
    format!(
        "{}\t{status}\t(disposable={} domainExists={} mx={} smtp={} catchAll={})",
        result.email_address,
        details.disposable,
        details.domain_exists,
        details.has_mx_record,
        details.smtp_valid,
        details.catch_all,
    )
}
