use clap::Parser;
use doc_cache_gateway::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
    }
}
