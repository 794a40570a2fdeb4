//! docqa CLI
//!
//! Main entry point for the docqa command-line tool.
//! Uploads one document and answers questions grounded in it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{
    AskCommand, CleanCommand, ConfigCommand, PromptsCommand, SessionCommand, StatsCommand,
    UploadCommand,
};
use docqa_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// docqa - question answering over an uploaded document
#[derive(Parser, Debug)]
#[command(name = "docqa")]
#[command(about = "Question answering over an uploaded document", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "DOCQA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "DOCQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, openai, groq)
    #[arg(short, long, global = true, env = "DOCQA_PROVIDER")]
    provider: Option<String>,

    /// Answer model identifier
    #[arg(short, long, global = true, env = "DOCQA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract, chunk and index a document (replaces the previous one)
    Upload(UploadCommand),

    /// Ask a question about the uploaded document
    Ask(AskCommand),

    /// Ask several questions in one process, keeping the answer history
    Session(SessionCommand),

    /// Show statistics about the persisted index
    Stats(StatsCommand),

    /// Remove the persisted index
    Clean(CleanCommand),

    /// List available prompt definitions
    Prompts(PromptsCommand),

    /// Show or write the retrieval configuration (.docqa/rag.yaml)
    Config(ConfigCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Upload(_) => "upload",
            Self::Ask(_) => "ask",
            Self::Session(_) => "session",
            Self::Stats(_) => "stats",
            Self::Clean(_) => "clean",
            Self::Prompts(_) => "prompts",
            Self::Config(_) => "config",
        }
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    let config = AppConfig::load()?.with_overrides(
        cli.workspace,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("docqa starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_docqa_dir()?;

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Upload(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Session(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config).await,
        Commands::Clean(cmd) => cmd.execute(&config).await,
        Commands::Prompts(cmd) => cmd.execute(&config),
        Commands::Config(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
