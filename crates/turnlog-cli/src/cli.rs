use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "turnlog")]
#[command(version, about = "Turnlog - background conversational-memory demo")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path (defaults to ~/.config/turnlog/config.toml)
    #[arg(long, global = true, env = "TURNLOG_CONFIG")]
    pub config: Option<String>,

    /// Actor the conversation belongs to
    #[arg(long, global = true, env = "TURNLOG_ACTOR_ID")]
    pub actor: Option<String>,

    /// Conversation session id (generated when omitted)
    #[arg(long, global = true, env = "TURNLOG_SESSION_ID")]
    pub session: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat with background turn persistence
    Chat,

    /// Print recent conversation history for the session
    History {
        /// Maximum number of events to fetch
        #[arg(long, default_value_t = 10)]
        max_results: usize,
    },
}
