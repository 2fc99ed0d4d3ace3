//! Extension-dispatched text extraction.

use std::time::Instant;

use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::docx::extract_docx_text;
use super::pdf::extract_pdf_text;
use super::tesseract::{OcrBackend, TesseractBackend};
use super::{extension_of, DocumentKind};
use crate::config::OcrConfig;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The upload claims a supported type but its bytes can't be read as one.
    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("External tool not found: {0}")]
    ToolNotFound(String),

    #[error("Extraction failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExtractionError {
    /// Whether the caller sent bad input, as opposed to the server failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

/// Method used to extract text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Embedded PDF text layer.
    PdfTextLayer,
    /// OCR over a decoded raster image.
    Ocr,
    /// Paragraphs of a DOCX body.
    DocxParagraphs,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfTextLayer => "pdf-text",
            Self::Ocr => "ocr",
            Self::DocxParagraphs => "docx",
        }
    }
}

/// Result of text extraction.
#[derive(Debug)]
pub struct ExtractionResult {
    /// Extracted text content. May be empty or whitespace.
    pub text: String,
    pub method: ExtractionMethod,
    /// Number of pages processed (PDF only).
    pub page_count: Option<u32>,
}

impl ExtractionResult {
    /// True when there is nothing worth sending to the model.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// What an extraction attempt produced.
#[derive(Debug)]
pub enum ExtractionOutcome {
    Extracted(ExtractionResult),
    /// The extension isn't one we read. Carries the lowercased extension,
    /// or an empty string when the filename has none.
    Unsupported { extension: String },
}

/// Text extractor for uploaded documents.
pub struct TextExtractor {
    ocr: Box<dyn OcrBackend>,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::from_config(&OcrConfig::default())
    }
}

impl TextExtractor {
    /// Create an extractor using Tesseract as configured.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::with_ocr_backend(Box::new(TesseractBackend::with_config(config)))
    }

    /// Create an extractor with a specific OCR backend.
    pub fn with_ocr_backend(ocr: Box<dyn OcrBackend>) -> Self {
        Self { ocr }
    }

    /// Report which external tools are available.
    pub fn check_tools(&self) -> Vec<(String, bool)> {
        vec![(self.ocr.name().to_string(), self.ocr.is_available())]
    }

    /// Hint describing the OCR backend's state.
    pub fn ocr_hint(&self) -> String {
        self.ocr.availability_hint()
    }

    /// Extract text from uploaded bytes, choosing the method from the filename's extension.
    ///
    /// Blocking: shells out for OCR and parses whole documents in memory.
    pub fn extract(
        &self,
        filename: &str,
        content: &[u8],
    ) -> Result<ExtractionOutcome, ExtractionError> {
        let kind = DocumentKind::from_filename(filename);
        warn_on_content_mismatch(filename, kind, content);

        let start = Instant::now();
        let result = match kind {
            DocumentKind::Unsupported => {
                let extension = extension_of(filename).unwrap_or_default();
                debug!("No extractor for {:?} (extension {:?})", filename, extension);
                return Ok(ExtractionOutcome::Unsupported { extension });
            }
            DocumentKind::PdfDocument => {
                let (text, pages) = extract_pdf_text(content)?;
                ExtractionResult {
                    text,
                    method: ExtractionMethod::PdfTextLayer,
                    page_count: Some(pages),
                }
            }
            DocumentKind::RasterImage => ExtractionResult {
                text: self.extract_image(content)?,
                method: ExtractionMethod::Ocr,
                page_count: None,
            },
            DocumentKind::WordDocument => ExtractionResult {
                text: extract_docx_text(content)?,
                method: ExtractionMethod::DocxParagraphs,
                page_count: None,
            },
        };

        info!(
            "Extracted {} chars from {} via {} in {}ms",
            result.text.len(),
            filename,
            result.method.as_str(),
            start.elapsed().as_millis()
        );
        Ok(ExtractionOutcome::Extracted(result))
    }

    /// Decode the image, normalize it to PNG on disk, and OCR it.
    fn extract_image(&self, content: &[u8]) -> Result<String, ExtractionError> {
        let image = image::load_from_memory(content)
            .map_err(|e| ExtractionError::Malformed(format!("undecodable image: {}", e)))?;

        let temp_dir = TempDir::new()?;
        let staged = temp_dir.path().join("upload.png");
        image
            .save_with_format(&staged, image::ImageFormat::Png)
            .map_err(|e| ExtractionError::Failed(format!("could not stage image: {}", e)))?;

        debug!(
            "Running {} OCR on {}x{} image",
            self.ocr.name(),
            image.width(),
            image.height()
        );
        self.ocr.ocr_image(&staged)
    }
}

/// Log when the bytes look like a different format than the extension says.
/// Dispatch still follows the extension.
fn warn_on_content_mismatch(filename: &str, kind: DocumentKind, content: &[u8]) {
    if kind == DocumentKind::Unsupported {
        return;
    }
    if let Some(sniffed) = infer::get(content) {
        if !kind.sniffed_extensions().contains(&sniffed.extension()) {
            warn!(
                "{} looks like {} ({}) but is named as {}",
                filename,
                sniffed.extension(),
                sniffed.mime_type(),
                kind
            );
        }
    }
}
