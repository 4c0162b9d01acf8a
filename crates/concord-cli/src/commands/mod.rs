//! CLI commands and argument parsing.

pub mod compare;
pub mod parse;

use clap::{Parser, Subcommand};

/// Concord - keep conditional access policies in sync with their configuration
#[derive(Parser)]
#[command(name = "concord")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Compare source policies against reference policies
    Compare(compare::CompareArgs),

    /// Parse a configuration file and print the resolved document
    Parse(parse::ParseArgs),

    /// Print version information
    Version,
}
