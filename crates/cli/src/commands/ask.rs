//! Ask command handler.

use super::{open_service, print_json};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};
use docqa_rag::{AnswerStrategy, AskResponse};

/// Ask a question about the uploaded document
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Answer strategy (single-hop, multi-hop); defaults to rag.yaml
    #[arg(short, long)]
    pub strategy: Option<AnswerStrategy>,

    /// Output the full response as JSON
    #[arg(long)]
    pub json: bool,
}

/// Answer on stdout, failures on stderr.
pub(crate) fn render(response: &AskResponse, json: bool) -> AppResult<()> {
    if json {
        return print_json(response);
    }

    println!("{}", response.answer);
    if let Some(error) = &response.error {
        eprintln!("[{}] {}", error.kind, error.message);
    }
    Ok(())
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let service = open_service(config)?;
        let response = service.ask(&self.query, self.strategy).await;

        render(&response, self.json)
    }
}
