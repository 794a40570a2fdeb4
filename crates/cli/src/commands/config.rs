//! Config command handler.

use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use docqa_rag::RagConfig;

/// Show the effective retrieval configuration
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Write the effective configuration to .docqa/rag.yaml
    #[arg(long)]
    pub write: bool,

    /// Overwrite an existing rag.yaml
    #[arg(long, requires = "write")]
    pub force: bool,
}

impl ConfigCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing config command");

        let rag = RagConfig::load(&config.workspace)?;

        if self.write {
            let path = RagConfig::config_path(&config.workspace);
            if path.exists() && !self.force {
                return Err(AppError::InvalidInput(format!(
                    "{:?} already exists (use --force to overwrite)",
                    path
                )));
            }
            rag.save(&config.workspace)?;
            println!("Wrote {}", path.display());
        } else {
            print!("{}", serde_yaml::to_string(&rag)?);
        }

        Ok(())
    }
}
