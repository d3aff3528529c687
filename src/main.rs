mod chat;
mod cli;
mod config;
mod error;
mod groq_client;
mod server;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use eyre::Result;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::chat::sessions::SessionStore;
use crate::chat::ConversationChain;
use crate::cli::chat::ChatContext;
use crate::config::{GroqConfig, LlmArgs, ServeArgs};
use crate::groq_client::GroqClient;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    llm: LlmArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the chat endpoint over HTTP (default)
    Serve(ServeArgs),
    /// Chat from the terminal
    Chat {
        /// Send a single message and exit
        #[arg(short, long)]
        input: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = GroqConfig::try_from(&cli.llm)?;
    info!("Using model {} at {}", config.model, config.base_url);

    let client = GroqClient::new(config)?;
    let chain = ConversationChain::new(
        Arc::new(client),
        SessionStore::new(cli.llm.history_window()?),
    );

    match cli.command {
        Some(Commands::Chat { input }) => {
            let mut chat_context = ChatContext::new(Box::new(io::stdout()), input, chain);
            chat_context.run().await
        }
        Some(Commands::Serve(args)) => {
            server::serve(args.addr(), Arc::new(chain)).await?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            // Default to serving if no subcommand is provided
            let args = ServeArgs::from_env()?;
            server::serve(args.addr(), Arc::new(chain)).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
