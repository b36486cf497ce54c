mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use redact_config::{Config, LoggingConfig};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("warning: using default config ({})", e);
            Config::default()
        }),
    };

    init_tracing(&config.logging);

    match cli.command {
        cli::Commands::Redact(args) => commands::redact::handle(args, &config),
        cli::Commands::Engine(cmd) => commands::engine::handle(cmd, &config),
        cli::Commands::Policy(cmd) => commands::policy::handle(cmd, &config),
        cli::Commands::Version => commands::version(&config),
    }
}

/// RUST_LOG wins over the configured level. Logs go to stderr so stdout stays pipeable.
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}
