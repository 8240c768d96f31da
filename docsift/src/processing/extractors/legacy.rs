use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::config::LegacyConverterConfig;
use crate::error::{DocsiftError, Result};

/// Converts legacy `.doc` files by running an external converter that
/// prints plain text to stdout (`antiword <file>` by default).
#[derive(Debug, Clone)]
pub struct LegacyDocExtractor {
    command: String,
    timeout: Duration,
}

impl LegacyDocExtractor {
    pub fn new(config: &LegacyConverterConfig) -> Self {
        Self {
            command: config.command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Empty converter output is a valid, empty document.
    pub async fn extract(&self, path: &Path) -> Result<String> {
        debug!(
            command = %self.command,
            path = %path.display(),
            "Running legacy document converter"
        );

        let child = Command::new(&self.command)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DocsiftError::decode(
                    "DOC",
                    format!("failed to start converter '{}': {e}", self.command),
                )
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                DocsiftError::decode(
                    "DOC",
                    format!("converter timed out after {} seconds", self.timeout.as_secs()),
                )
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocsiftError::decode(
                "DOC",
                format!("converter exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
