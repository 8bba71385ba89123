//! Barcode recognition for part photos, via the external `zbarimg` tool.

use std::future::Future;
use std::path::PathBuf;

use thiserror::Error;
use tokio::process::Command;
use uuid::Uuid;

/// `zbarimg` exit status when the image was read but held no symbol.
const NO_SYMBOL_EXIT_CODE: i32 = 4;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("barcode decoder I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("barcode decoder exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },
}

/// Turns an image into the code printed on its barcode.
pub trait BarcodeDecoder: Send + Sync {
    /// `Ok(None)` when the image contains no readable barcode.
    fn decode(
        &self,
        image: &[u8],
    ) -> impl Future<Output = Result<Option<String>, DecodeError>> + Send;
}

/// Runs `zbarimg --quiet <file>` on a temporary copy of the image.
#[derive(Debug, Clone)]
pub struct ZbarDecoder {
    program: PathBuf,
}

impl ZbarDecoder {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl BarcodeDecoder for ZbarDecoder {
    async fn decode(&self, image: &[u8]) -> Result<Option<String>, DecodeError> {
        let path = std::env::temp_dir().join(format!("garage-bot-{}.jpg", Uuid::new_v4()));
        tokio::fs::write(&path, image).await?;

        let output = Command::new(&self.program)
            .arg("--quiet")
            .arg(&path)
            .output()
            .await;

        if let Err(error) = tokio::fs::remove_file(&path).await {
            tracing::debug!(path = %path.display(), %error, "could not remove photo copy");
        }
        let output = output?;

        match output.status.code() {
            Some(0) => Ok(parse_zbar_output(&String::from_utf8_lossy(&output.stdout))),
            Some(NO_SYMBOL_EXIT_CODE) => Ok(None),
            _ => Err(DecodeError::ToolFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            }),
        }
    }
}

/// Reads the payload of the first `SYMBOLOGY:payload` line.
fn parse_zbar_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(_, payload)| payload.trim())
        .find(|payload| !payload.is_empty())
        .map(str::to_owned)
}
