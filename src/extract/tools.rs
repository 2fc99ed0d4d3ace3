//! External tool helpers.

use std::process::Output;

use super::ExtractionError;

/// Check if a binary is available (PATH lookup, or an explicit path).
pub fn check_binary(name: &str) -> bool {
    which::which(name).is_ok()
}

/// Handle command output, extracting stdout on success or returning appropriate error.
pub(crate) fn handle_cmd_output(
    result: std::io::Result<Output>,
    tool_name: &str,
    error_prefix: &str,
) -> Result<String, ExtractionError> {
    match result {
        Ok(output) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).to_string())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(ExtractionError::Failed(format!(
                    "{}: {}",
                    error_prefix,
                    stderr.trim()
                )))
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ExtractionError::ToolNotFound(tool_name.to_string()))
        }
        Err(e) => Err(ExtractionError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    #[test]
    fn test_missing_binary() {
        assert!(!check_binary("definitely-not-a-real-binary-4f1c"));
    }

    #[test]
    fn test_handle_not_found() {
        let result = Command::new("definitely-not-a-real-binary-4f1c").output();
        assert!(matches!(
            handle_cmd_output(result, "fake-tool", "fake-tool failed"),
            Err(ExtractionError::ToolNotFound(name)) if name == "fake-tool"
        ));
    }
}
