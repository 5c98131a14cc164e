//! Single-cycle command implementation.
//!
//! Runs exactly one scan/merge/upload cycle against the configured gist
//! and prints what happened. Useful from cron or to flush by hand.

use colored::Colorize;

use crate::cli::ReporterArgs;
use crate::config::ReporterConfig;
use crate::error::Result;
use crate::remote::GistClient;
use crate::sync::{CycleReport, RemoteStatus, SyncPipeline};

/// Execute the once command.
///
/// # Errors
///
/// Returns an error if configuration is missing or the cycle aborts.
pub fn execute(args: &ReporterArgs, json: bool, quiet: bool) -> Result<()> {
    let config = ReporterConfig::resolve(args.into())?;
    let rt = super::runtime()?;

    let report = rt.block_on(async move {
        let pipeline = SyncPipeline::new(
            GistClient::with_api_url(&config.api_url).with_timeout(config.request_timeout),
            config.credentials,
            config.paths,
        );
        pipeline.process_results().await
    })?;

    print_report(&report, json, quiet)
}

/// Print a cycle report as JSON or a short human summary.
pub(crate) fn print_report(report: &CycleReport, json: bool, quiet: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }
    if quiet {
        return Ok(());
    }

    match report {
        CycleReport::Idle { listing_error: None } => {
            println!("{}", "No new results found.".dimmed());
        }
        CycleReport::Idle {
            listing_error: Some(detail),
        } => {
            println!("{} {detail}", "Results directory unreadable:".yellow());
        }
        CycleReport::Uploaded {
            remote,
            files,
            bytes,
            ..
        } => {
            println!(
                "{} {} files ({bytes} bytes, {})",
                "Uploaded".green().bold(),
                files.len(),
                describe_remote(remote)
            );
            for failed in report.failed_deletions() {
                println!(
                    "  {} {} ({})",
                    "not deleted:".yellow(),
                    failed.path.display(),
                    failed.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
        CycleReport::UploadFailed { files, .. } => {
            println!(
                "{} {} files kept for the next cycle",
                "Upload failed:".red().bold(),
                files.len()
            );
        }
    }

    Ok(())
}

fn describe_remote(remote: &RemoteStatus) -> String {
    match remote {
        RemoteStatus::Found => "appended to existing gist".to_string(),
        RemoteStatus::Absent => "new gist entry".to_string(),
        RemoteStatus::Unreachable(detail) => {
            format!("remote unreadable, history replaced: {detail}")
        }
    }
}
