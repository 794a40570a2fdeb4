//! PDF text extraction.

use docqa_core::{AppError, AppResult};

/// Separator placed between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n\n";

/// Message reported when no page carries any text.
pub const EMPTY_DOCUMENT_MESSAGE: &str = "No text extracted! The PDF may be image-based.";

/// Extract the text of every page, in page order.
///
/// A page whose content stream cannot be decoded contributes an empty
/// string rather than failing the whole document.
pub fn extract_pages(bytes: &[u8]) -> AppResult<Vec<String>> {
    let document = lopdf::Document::load_mem(bytes)
        .map_err(|e| AppError::InvalidInput(format!("Error opening PDF: {}", e)))?;

    let pages = document.get_pages();
    let mut texts = Vec::with_capacity(pages.len());

    for page_number in pages.keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => texts.push(text),
            Err(e) => {
                tracing::warn!("Failed to extract text from page {}: {}", page_number, e);
                texts.push(String::new());
            }
        }
    }

    tracing::debug!("Extracted text from {} pages", texts.len());
    Ok(texts)
}

/// Join page texts into one document, failing when every page is blank.
pub fn join_pages(pages: &[String]) -> AppResult<String> {
    if pages.iter().all(|page| page.trim().is_empty()) {
        return Err(AppError::EmptyDocument(EMPTY_DOCUMENT_MESSAGE.to_string()));
    }

    Ok(pages.join(PAGE_SEPARATOR))
}

/// Extract and join the text of a PDF.
pub fn extract_document_text(bytes: &[u8]) -> AppResult<String> {
    join_pages(&extract_pages(bytes)?)
}
