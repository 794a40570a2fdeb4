//! Clean command handler.

use super::open_store;
use clap::Args;
use docqa_core::{config::AppConfig, AppResult};

/// Remove the persisted index
#[derive(Args, Debug)]
pub struct CleanCommand {}

impl CleanCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing clean command");

        if open_store(config)?.clear()? {
            println!("Index removed");
        } else {
            println!("No index to remove");
        }

        Ok(())
    }
}
