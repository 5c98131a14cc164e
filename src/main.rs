//! Gist reporter entry point.

use clap::Parser;
use reporter::cli::commands;
use reporter::cli::{Cli, Commands};
use reporter::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    init_tracing(cli.verbose, cli.quiet);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                eprintln!("{}", e.to_structured_json());
            } else if let Some(hint) = e.hint() {
                eprintln!("Error: {e}\n  Hint: {hint}");
            } else {
                eprintln!("Error: {e}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    use tracing_subscriber::EnvFilter;

    if quiet {
        return;
    }

    // Honor RUST_LOG if set, otherwise use verbosity flag.
    // Cycle progress is logged at info, so that is the floor for a daemon.
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match verbose {
            0 => EnvFilter::new("info,reqwest=warn,hyper=warn"),
            1 => EnvFilter::new("debug,reqwest=info,hyper=info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.command {
        Commands::Run(args) => commands::run::execute(args, cli.json, cli.quiet),
        Commands::Once(args) => commands::once::execute(args, cli.json, cli.quiet),
        Commands::Produce { dir, every, count } => {
            commands::produce::execute(dir, *every, *count, cli.json)
        }
        Commands::Completions { shell } => commands::completions::execute(shell),
        Commands::Version => commands::version::execute(cli.json),
    }
}
