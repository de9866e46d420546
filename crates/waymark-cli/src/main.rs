//! Waymark CLI: validate and replay navigation chains
//!
//! ## Usage
//!
//! ```bash
//! waymark check chains.yaml
//! waymark replay chains.yaml --app app.yaml
//! waymark replay chains.yaml --app app.yaml --chain login --json
//! ```

use clap::Parser;
use std::process::ExitCode;
use waymark::logging::init_tracing_with;
use waymark::LogFormat;
use waymark_cli::{
    handlers::{load_config, run_check, run_replay},
    Cli, CliError, CliResult, Commands, ProgressReporter,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let mut reporter = ProgressReporter::new(cli.color.use_color());

    match &cli.command {
        Commands::Check(args) => {
            init_logging(&cli, LogFormat::default());
            run_check(args, &reporter)
        }
        Commands::Replay(args) => {
            let config = load_config(args)?;
            init_logging(&cli, config.log_format);
            let results = run_replay(args, &config, &mut reporter)?;
            let failed = results.iter().filter(|r| !r.passed()).count();

            if args.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else {
                reporter.summary(results.len() - failed, failed);
            }

            if failed > 0 {
                Err(CliError::ChainsFailed {
                    failed,
                    total: results.len(),
                })
            } else {
                Ok(())
            }
        }
    }
}

fn init_logging(cli: &Cli, configured: LogFormat) {
    let format = cli.log_format.map_or(configured, LogFormat::from);
    if let Err(e) = init_tracing_with(format, cli.log_directive()) {
        eprintln!("Warning: {e}");
    }
}

