//! Tesseract OCR backend implementation.
//!
//! Uses Tesseract OCR via command-line for text extraction.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Output, Stdio};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::tools::{check_binary, handle_cmd_output};
use super::ExtractionError;
use crate::config::OcrConfig;

/// How often a running tesseract is checked for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Trait for OCR backends.
pub trait OcrBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Check if this backend is available (dependencies installed).
    fn is_available(&self) -> bool;

    /// Get a description of what's needed to make this backend available.
    fn availability_hint(&self) -> String;

    /// Run OCR on an image file.
    fn ocr_image(&self, image_path: &Path) -> Result<String, ExtractionError>;
}

/// Tesseract OCR backend.
pub struct TesseractBackend {
    language: String,
    binary: String,
    timeout: Duration,
}

impl TesseractBackend {
    /// Create a new Tesseract backend with custom configuration.
    pub fn with_config(config: &OcrConfig) -> Self {
        Self {
            language: config.language.clone(),
            binary: config.tesseract_path.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Run Tesseract on an image file, killing it if it outlives the timeout.
    ///
    /// Text goes to `<image stem>.txt` next to the image rather than a pipe,
    /// so a large page can't stall the child on a full stdout buffer.
    fn run_tesseract(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let output_base = image_path.with_extension("");
        let tool_name = format!("{} (install tesseract-ocr)", self.binary);

        let spawned = Command::new(&self.binary)
            .arg(image_path)
            .arg(&output_base)
            .args(["-l", &self.language])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => return handle_cmd_output(Err(e), &tool_name, "tesseract failed"),
        };

        let Some(status) = wait_with_deadline(&mut child, self.timeout)? else {
            warn!(
                "Killing {} after {}s",
                self.binary,
                self.timeout.as_secs_f32()
            );
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExtractionError::Failed(format!(
                "tesseract timed out after {:.1}s",
                self.timeout.as_secs_f32()
            )));
        };

        let mut stderr = Vec::new();
        if let Some(mut pipe) = child.stderr.take() {
            pipe.read_to_end(&mut stderr)?;
        }
        let stdout = if status.success() {
            std::fs::read(output_base.with_extension("txt"))?
        } else {
            Vec::new()
        };

        handle_cmd_output(
            Ok(Output {
                status,
                stdout,
                stderr,
            }),
            &tool_name,
            "tesseract failed",
        )
    }
}

/// Wait for the child to exit. `None` means the deadline passed first.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<ExitStatus>, ExtractionError> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

impl Default for TesseractBackend {
    fn default() -> Self {
        Self::with_config(&OcrConfig::default())
    }
}

impl OcrBackend for TesseractBackend {
    fn name(&self) -> &'static str {
        "tesseract"
    }

    fn is_available(&self) -> bool {
        check_binary(&self.binary)
    }

    fn availability_hint(&self) -> String {
        if self.is_available() {
            format!("Tesseract is available (language: {})", self.language)
        } else {
            format!(
                "{} not found. Install with: apt install tesseract-ocr",
                self.binary
            )
        }
    }

    fn ocr_image(&self, image_path: &Path) -> Result<String, ExtractionError> {
        let start = Instant::now();
        let text = self.run_tesseract(image_path)?;
        debug!(
            "tesseract produced {} chars in {}ms",
            text.len(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
