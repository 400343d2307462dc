//! tutils entry point
//!
//! Parses arguments, sets up logging and runs the selected helper. Errors are
//! rendered with suggestions by [`user_friendly_error`] and exit with status 1.

use anyhow::Result;
use clap::Parser;
use terminal_utils::cli;
use terminal_utils::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    cli.init_logging();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
