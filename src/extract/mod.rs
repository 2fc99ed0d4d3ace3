//! Text extraction from uploaded documents.
//!
//! Dispatch is by file extension only:
//! - `.pdf`: page-by-page text layer via lopdf
//! - `.png`, `.jpg`, `.jpeg`: decoded with the image crate, then OCR (Tesseract)
//! - `.docx`: paragraph text from `word/document.xml`
//!
//! Anything else yields [`ExtractionOutcome::Unsupported`], which is a normal
//! result rather than an error.

mod docx;
mod extractor;
mod pdf;
mod tesseract;
mod tools;

pub use extractor::{
    ExtractionError, ExtractionMethod, ExtractionOutcome, ExtractionResult, TextExtractor,
};
pub use tesseract::{OcrBackend, TesseractBackend};
pub use tools::check_binary;

/// Document families the extractor knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    /// PDF with a text layer.
    PdfDocument,
    /// PNG or JPEG raster image.
    RasterImage,
    /// Office Open XML word-processing document.
    WordDocument,
    /// Anything else.
    Unsupported,
}

impl DocumentKind {
    /// Classify a filename by its extension (case-insensitive).
    pub fn from_filename(filename: &str) -> Self {
        extension_of(filename)
            .map(|ext| Self::from_extension(&ext))
            .unwrap_or(Self::Unsupported)
    }

    /// Classify a bare extension (no leading dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Self::PdfDocument,
            "png" | "jpg" | "jpeg" => Self::RasterImage,
            "docx" => Self::WordDocument,
            _ => Self::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfDocument => "pdf",
            Self::RasterImage => "image",
            Self::WordDocument => "docx",
            Self::Unsupported => "unsupported",
        }
    }

    /// Extensions `infer` may report for content of this kind.
    fn sniffed_extensions(&self) -> &'static [&'static str] {
        match self {
            Self::PdfDocument => &["pdf"],
            Self::RasterImage => &["png", "jpg"],
            Self::WordDocument => &["docx", "zip"],
            Self::Unsupported => &[],
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercased text after the last dot of a filename's final component.
/// A bare dotfile such as `.pdf` counts as having extension `pdf`.
pub fn extension_of(filename: &str) -> Option<String> {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    name.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_filename() {
        assert_eq!(
            DocumentKind::from_filename("invoice.pdf"),
            DocumentKind::PdfDocument
        );
        assert_eq!(
            DocumentKind::from_filename("scan.JPEG"),
            DocumentKind::RasterImage
        );
        assert_eq!(
            DocumentKind::from_filename("scan.Png"),
            DocumentKind::RasterImage
        );
        assert_eq!(
            DocumentKind::from_filename("photo.jpg"),
            DocumentKind::RasterImage
        );
        assert_eq!(
            DocumentKind::from_filename("bill.docx"),
            DocumentKind::WordDocument
        );
        assert_eq!(
            DocumentKind::from_filename("archive.tar.pdf"),
            DocumentKind::PdfDocument
        );
    }

    #[test]
    fn test_kind_unsupported() {
        for name in ["contract.txt", "legacy.doc", "pdf", "noext", "", "trailing.", "pdf.zip"] {
            assert_eq!(
                DocumentKind::from_filename(name),
                DocumentKind::Unsupported,
                "{name}"
            );
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("a.PDF").as_deref(), Some("pdf"));
        assert_eq!(extension_of("C:/uploads/b.Docx").as_deref(), Some("docx"));
        assert_eq!(extension_of("README"), None);
        assert_eq!(extension_of(".pdf").as_deref(), Some("pdf"));
        assert_eq!(extension_of("scans\\.PNG").as_deref(), Some("png"));
        assert_eq!(extension_of("dir.v2/readme"), None);
        assert_eq!(extension_of("trailing."), None);
        assert_eq!(
            DocumentKind::from_filename(".pdf"),
            DocumentKind::PdfDocument
        );
    }
}
