//! Daemon command implementation.
//!
//! Runs one cycle at startup and one per interval until Ctrl-C or SIGTERM,
//! then runs a final cycle so pending results reach the gist before exit.

use crate::cli::ReporterArgs;
use crate::config::ReporterConfig;
use crate::error::Result;
use crate::remote::GistClient;
use crate::scheduler::{shutdown_signal, Scheduler};
use crate::sync::SyncPipeline;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if configuration is missing or the final cycle aborts.
pub fn execute(args: &ReporterArgs, json: bool, quiet: bool) -> Result<()> {
    let config = ReporterConfig::resolve(args.into())?;
    let rt = super::runtime()?;

    let report = rt.block_on(async move {
        tracing::info!(
            gist = %config.credentials.document_id,
            results_dir = %config.paths.results_dir.display(),
            "Reporter started"
        );

        let pipeline = SyncPipeline::new(
            GistClient::with_api_url(&config.api_url).with_timeout(config.request_timeout),
            config.credentials,
            config.paths,
        );
        // Listen before spawning so an early SIGTERM still gets its final flush.
        let shutdown = shutdown_signal();
        let handle = Scheduler::new(pipeline, config.interval).spawn();

        shutdown.await;
        handle.shutdown().await
    })?;

    super::once::print_report(&report, json, quiet)
}
