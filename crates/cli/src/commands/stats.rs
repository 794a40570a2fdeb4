//! Stats command handler.

use super::{open_store, print_json};
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};

/// Show statistics about the persisted index
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let store = open_store(config)?;
        let stats = store.stats()?;

        if self.json {
            print_json(&stats)?;
        } else {
            println!("Index:      {}", store.storage().dir.display());
            println!("Build:      {}", stats.build_id);
            println!("Built at:   {}", stats.built_at.to_rfc3339());
            println!("Chunks:     {}", stats.chunks);
            println!("Dimension:  {}", stats.dimension);
            println!(
                "Embedder:   {}/{}",
                store.embedder().provider_name(),
                store.embedder().model_name()
            );
            println!(
                "Size:       {} bytes (vectors), {} bytes (chunks)",
                stats.index_bytes, stats.chunks_bytes
            );
        }

        Ok(())
    }
}
