//! Prompts command handler.

use super::print_json;
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};

/// List available prompt definitions
#[derive(Args, Debug)]
pub struct PromptsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl PromptsCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing prompts command");

        let prompts = docqa_prompt::list_prompts(&config.workspace)?;

        if self.json {
            print_json(&prompts)?;
        } else {
            for prompt in &prompts {
                println!("{:<20} {:<10} {}", prompt.id, prompt.source.as_str(), prompt.title);
            }
        }

        Ok(())
    }
}
