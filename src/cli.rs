//! Command-line interface, parsed with clap.

use clap::{Parser, Subcommand};

/// Cinedeck - Movie Catalog Dashboard
/// A server-rendered admin console for a movie catalog API
#[derive(Parser)]
#[command(name = "cinedeck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the dashboard web server
    #[command(alias = "-s", alias = "--serve")]
    Serve,

    /// Verify configuration and connectivity to the catalog API
    #[command(alias = "-c", alias = "--check")]
    Check,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}
