use std::io;
use std::process::ExitCode;

use applejwt::cli::Menu;
use applejwt::config::Config;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut menu = Menu::new(config, io::stdin().lock(), io::stdout().lock());
    if let Err(e) = menu.run() {
        tracing::error!(error = %e, "Terminal I/O failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
