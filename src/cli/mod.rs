//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::ReporterSettings;
use crate::producer::DEFAULT_WRITE_INTERVAL;

pub mod commands;

/// Gist reporter - merge local JSONL results into a GitHub gist
#[derive(Parser, Debug)]
#[command(name = "reporter", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the reporter: one cycle now, one per interval, and a final
    /// cycle on Ctrl-C / SIGTERM
    Run(ReporterArgs),

    /// Run a single cycle and exit
    Once(ReporterArgs),

    /// Write demo result files, like a worker process would
    Produce {
        /// Directory to write result files into
        #[arg(long, env = "REPORTER_RESULTS_DIR", default_value = "./results")]
        dir: PathBuf,

        /// Seconds between result files
        #[arg(long, default_value_t = DEFAULT_WRITE_INTERVAL.as_secs())]
        every: u64,

        /// Stop after this many files (default: run until interrupted)
        #[arg(long)]
        count: Option<u64>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

/// Remote document and local path settings shared by `run` and `once`.
#[derive(Args, Debug, Clone)]
pub struct ReporterArgs {
    /// Gist holding `results.jsonl`
    #[arg(long, env = "GIST_ID")]
    pub gist_id: Option<String>,

    /// GitHub token with the `gist` scope
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Directory scanned for `*.jsonl` result files (default: ./results)
    #[arg(long, env = "REPORTER_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,

    /// Staging file (default: <results-dir>/.gist_backup)
    #[arg(long, env = "REPORTER_STAGING_FILE")]
    pub staging_file: Option<PathBuf>,

    /// Seconds between cycles (default: 180)
    #[arg(long = "interval", env = "REPORTER_INTERVAL_SECS")]
    pub interval_secs: Option<u64>,

    /// GitHub API base URL (default: https://api.github.com)
    #[arg(long, env = "GITHUB_API_URL")]
    pub api_url: Option<String>,

    /// Seconds before a gist request is abandoned (default: 30)
    #[arg(long = "http-timeout", env = "REPORTER_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,
}

impl From<&ReporterArgs> for ReporterSettings {
    fn from(args: &ReporterArgs) -> Self {
        Self {
            gist_id: args.gist_id.clone(),
            token: args.token.clone(),
            results_dir: args.results_dir.clone(),
            staging_file: args.staging_file.clone(),
            interval_secs: args.interval_secs,
            api_url: args.api_url.clone(),
            http_timeout_secs: args.http_timeout_secs,
        }
    }
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}
