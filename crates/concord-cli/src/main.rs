//! Concord CLI - compare conditional access policies across formats.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

use commands::{Cli, Commands};

fn main() -> Result<()> {
    // Diagnostics go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "concord=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare(args) => commands::compare::run(&args),
        Commands::Parse(args) => commands::parse::run(&args),
        Commands::Version => {
            println!("concord {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
