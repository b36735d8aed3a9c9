use clap::Parser;
use eyre::Result;
use std::io;
use todostore::cli::{Cli, Command, Config, run};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the report
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level())
        .with_writer(io::stderr)
        .init();

    let config = Config::from_cli(&cli);
    let command = Command::resolve(&cli);
    tracing::debug!(?config, ?command, "Resolved command");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&config, &command, &mut out)
}
