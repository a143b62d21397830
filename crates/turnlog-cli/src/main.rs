mod chat;
mod cli;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::CliConfig;
use tracing_subscriber::EnvFilter;
use turnlog_core::ConversationMemoryWriter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut config = match &cli.config {
        Some(path) => CliConfig::load_from_path(Some(PathBuf::from(path))),
        None => CliConfig::load(),
    };
    config.apply_env_overrides();

    let session = config.session_key(cli.actor.clone(), cli.session.clone());
    let store = config.build_store();

    match cli.command {
        Commands::Chat => {
            let writer = ConversationMemoryWriter::new(store.clone(), config.writer_config());
            chat::run(store, writer, Arc::new(chat::EchoResponder), session).await
        }
        Commands::History { max_results } => chat::show_history(store, session, max_results).await,
    }
}
