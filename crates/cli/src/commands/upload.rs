//! Upload command handler.

use super::{open_service, print_json};
use clap::Args;
use docqa_core::{config::AppConfig, AppError, AppResult};
use std::path::{Path, PathBuf};

/// Extract, chunk and index a document
#[derive(Args, Debug)]
pub struct UploadCommand {
    /// PDF file to index (any other extension is read as UTF-8 text)
    pub path: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

impl UploadCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing upload command for {:?}", self.path);

        let bytes = std::fs::read(&self.path).map_err(|e| {
            AppError::InvalidInput(format!("Failed to read {:?}: {}", self.path, e))
        })?;

        let service = open_service(config)?;
        let report = if is_pdf(&self.path) {
            service.upload_pdf(&bytes).await?
        } else {
            let text = String::from_utf8(bytes).map_err(|_| {
                AppError::InvalidInput(format!("{:?} is neither a PDF nor UTF-8 text", self.path))
            })?;
            service.ingest_text(&text).await?
        };

        if self.json {
            print_json(&report)?;
        } else {
            println!("{}", report.message);
            println!("{}", report.details);
            println!(
                "Indexed {} chunks (dimension {}) from {} pages in {:.2}s",
                report.chunks, report.dimension, report.pages, report.duration_secs
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_detection_ignores_case() {
        assert!(is_pdf(Path::new("paper.PDF")));
        assert!(is_pdf(Path::new("dir/paper.pdf")));
        assert!(!is_pdf(Path::new("notes.txt")));
        assert!(!is_pdf(Path::new("README")));
    }
}
