//! PDF text layer extraction.

use lopdf::Document;
use tracing::debug;

use super::ExtractionError;

/// Extract the text layer page by page, joined with newlines in page order.
///
/// Returns the text and the page count. Pages that fail to extract
/// contribute an empty string.
pub(crate) fn extract_pdf_text(content: &[u8]) -> Result<(String, u32), ExtractionError> {
    let mut doc = Document::load_mem(content)
        .map_err(|e| ExtractionError::Malformed(format!("unreadable PDF: {}", e)))?;

    if doc.is_encrypted() {
        doc.decrypt("")
            .map_err(|_| ExtractionError::Malformed("PDF is password protected".to_string()))?;
        debug!("Decrypted PDF with empty password");
    }

    let pages = doc.get_pages();
    let mut page_texts = Vec::with_capacity(pages.len());
    for &page_num in pages.keys() {
        let text = match doc.extract_text(&[page_num]) {
            Ok(text) => text.trim_end().to_string(),
            Err(e) => {
                debug!("No text on page {}: {}", page_num, e);
                String::new()
            }
        };
        page_texts.push(text);
    }

    Ok((page_texts.join("\n"), pages.len() as u32))
}
