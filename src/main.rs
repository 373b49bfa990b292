//! `mediaunlock` - replay media unlock scenarios

use clap::Parser;

use mediaunlock::cli::args::Cli;
use mediaunlock::cli::commands;
use mediaunlock::error::ExitCode;
use mediaunlock::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    let result = tokio::select! {
        result = commands::dispatch(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\ninterrupted");
            std::process::exit(ExitCode::INTERRUPTED);
        }
    };

    match result {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(e.exit_code());
        }
    }
}
