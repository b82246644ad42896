//! Voicecheck CLI
//!
//! Classifies one audio file and prints a single JSON line on stdout.
//! Diagnostics go to stderr.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use clap::error::ErrorKind;
use clap::Parser;
use env_logger::{Env, Target};
use log::info;

use voicecheck::cli::{self, Cli};
use voicecheck::report::{ErrorPayload, ErrorReporter, Outcome};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .target(Target::Stderr)
        .init();
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.print().context("failed to print help")?;
            return Ok(ExitCode::SUCCESS);
        }
        Err(e) => {
            init_logging(false);
            let rendered = e.to_string();
            let message = rendered.lines().next().unwrap_or("invalid arguments");
            let outcome = Outcome::Failure(ErrorPayload::new(message));
            let mut stdout = io::stdout().lock();
            return ErrorReporter::default()
                .emit(&mut stdout, &outcome)
                .context("failed to write result to stdout");
        }
    };

    init_logging(cli.verbose);
    info!("voicecheck v{}", env!("CARGO_PKG_VERSION"));

    let mut stdout = io::stdout().lock();
    let code = cli::catch_panics(&mut stdout, cli.fallback_encoding(), |out| cli::run(&cli, out))
        .context("failed to write result to stdout")?;
    stdout.flush().context("failed to flush stdout")?;
    Ok(code)
}
