mod api;
mod cli;
mod router;
mod startup;
mod state;

use clap::Parser;

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    atlas_core::config::load_dotenv();
    let mut config = atlas_core::Config::from_env();
    args.apply(&mut config);

    match args.command() {
        Command::Serve => startup::serve(&config).await,
        Command::Digest { post } => startup::digest_once(&config, post).await,
    }
}
