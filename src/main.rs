use clap::Parser;
use interlace::cli::{self, Cli};
use interlace::output::print_error;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match cli::execute(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so they never mix with command output. `RUST_LOG`
/// overrides the level picked from `--verbose` / `--silent`.
fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "interlace=debug"
    } else if cli.silent {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
