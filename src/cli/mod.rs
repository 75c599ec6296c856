//! CLI module for the document cache gateway

pub mod serve;

use clap::{Parser, Subcommand};

/// Cache-aside REST gateway over a schema-less document store
#[derive(Parser)]
#[command(name = "doc-cache-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the gateway server
    Serve,
}
