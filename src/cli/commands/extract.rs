//! Text extraction command.

use std::path::Path;

use console::style;

use crate::config::Settings;
use crate::extract::{ExtractionOutcome, ExtractionResult, TextExtractor};

/// Print the text extracted from a file.
pub async fn cmd_extract(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let result = extract_file(settings, file).await?;

    eprintln!(
        "{} {} chars via {}{}",
        style("✓").green(),
        result.text.len(),
        result.method.as_str(),
        result
            .page_count
            .map(|n| format!(" ({} pages)", n))
            .unwrap_or_default()
    );
    if result.is_blank() {
        eprintln!("{} No text found", style("!").yellow());
    } else {
        println!("{}", result.text);
    }
    Ok(())
}

/// Read a file and run it through the extractor, off the async runtime.
pub(super) async fn extract_file(
    settings: &Settings,
    file: &Path,
) -> anyhow::Result<ExtractionResult> {
    let content = tokio::fs::read(file)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", file.display(), e))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if content.len() > settings.max_upload_bytes {
        eprintln!(
            "{} {} is larger than the server's upload limit ({} bytes)",
            style("!").yellow(),
            filename,
            settings.max_upload_bytes
        );
    }

    let extractor = TextExtractor::from_config(&settings.ocr);
    let outcome = tokio::task::spawn_blocking(move || extractor.extract(&filename, &content))
        .await??;

    match outcome {
        ExtractionOutcome::Extracted(result) => Ok(result),
        ExtractionOutcome::Unsupported { extension } if extension.is_empty() => {
            anyhow::bail!("Unsupported file type: {} has no extension", file.display())
        }
        ExtractionOutcome::Unsupported { extension } => {
            anyhow::bail!("Unsupported file type: .{}", extension)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{docx_with_paragraphs, sample_invoice_pdf};

    #[tokio::test]
    async fn test_extract_file_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.pdf");
        std::fs::write(&path, sample_invoice_pdf()).unwrap();

        let result = extract_file(&Settings::default(), &path).await.unwrap();
        assert!(result.text.contains("Total: $1,350.00"));
    }

    #[tokio::test]
    async fn test_extract_file_docx() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invoice.docx");
        std::fs::write(&path, docx_with_paragraphs(&["Invoice #: D-1"])).unwrap();

        let result = extract_file(&Settings::default(), &path).await.unwrap();
        assert_eq!(result.text, "Invoice #: D-1");
    }

    #[tokio::test]
    async fn test_extract_file_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.txt");
        std::fs::write(&path, "hello").unwrap();

        let err = extract_file(&Settings::default(), &path).await.unwrap_err();
        assert!(err.to_string().contains(".txt"));
    }

    #[tokio::test]
    async fn test_extract_file_missing() {
        let err = extract_file(&Settings::default(), Path::new("/nonexistent/invoice.pdf"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
