//! CLI module for Hent.

mod output;
pub mod preflight;

pub use output::Output;

use clap::Parser;

/// Hent - Media Downloads and Voice Chat
///
/// A small personal web utility served over HTTP. The name "Hent" comes
/// from the Norwegian/Scandinavian word for "fetch."
#[derive(Parser, Debug)]
#[command(name = "hent")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "8081")]
    pub port: u16,
}
