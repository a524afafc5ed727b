//! pinbump - bump pinned Terraform/Terragrunt module refs
//!
//! Scans `.tf` and `.hcl` files for `source = "git::...?ref=..."` pins,
//! resolves the latest tag of each repository and reports or applies the
//! bumps.

use clap::{CommandFactory, Parser};
use pinbump::cli::{CliArgs, Mode, RunArgs};
use pinbump::orchestrator::Orchestrator;
use pinbump::output::{TextFormatter, Verbosity};
use std::io::{self, Write};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version also arrive here
            let code = if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
            let _ = e.print();
            return code;
        }
    };

    let Some(command) = args.command else {
        if CliArgs::command().print_help().is_err() {
            return ExitCode::FAILURE;
        }
        println!();
        return ExitCode::SUCCESS;
    };

    let run_args = command.args();
    init_logging(run_args.verbose, run_args.quiet);

    match run(command.mode(), run_args.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by RUST_LOG or the verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Main application logic
async fn run(mode: Mode, args: RunArgs) -> anyhow::Result<()> {
    if args.verbose {
        eprintln!("pinbump v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Root: {}", args.root.display());
        eprintln!("Resolver: {}", args.resolver);
    }

    let verbosity = Verbosity::from_flags(args.verbose, args.quiet);
    let orchestrator = Orchestrator::new(mode, args)?;
    let result = orchestrator.run().await?;

    let formatter = TextFormatter::new(verbosity);
    let mut stdout = io::stdout().lock();
    formatter.format(&result, &mut stdout)?;
    stdout.flush()?;

    Ok(())
}
