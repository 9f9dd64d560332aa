//! Boundary to the text-recognition engine.
//!
//! The engine is a black box that turns an image into text. The shipped
//! adapter shells out to the `tesseract` CLI with a numeric character
//! allowlist so recognition is biased toward coordinate digits; tests swap in
//! an in-process fake.

use std::io::Write;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Characters the engine is allowed to emit. `%` and `£` are kept because the
/// engine habitually misreads the digit 8 as them; the parser maps them back.
pub const NUMERIC_ALLOWLIST: &str = "0123456789,.%£-";

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("failed to start recognition engine: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("recognition engine i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("recognition engine exited with status {0}")]
    Failed(std::process::ExitStatus),
    #[error("recognition engine produced non-UTF-8 output")]
    BadOutput,
}

pub trait RecognitionEngine: Send {
    fn recognize(&self, png: &[u8]) -> Result<String, RecognitionError>;
}

/// Runs the `tesseract` binary with stdin/stdout piping, one process per
/// sample. Page segmentation mode 6 (a uniform block of text) matches the
/// two-line coordinate readout being captured.
pub struct TesseractCli {
    pub allowlist: String,
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self {
            allowlist: NUMERIC_ALLOWLIST.to_string(),
        }
    }
}

impl RecognitionEngine for TesseractCli {
    fn recognize(&self, png: &[u8]) -> Result<String, RecognitionError> {
        let mut child = Command::new("tesseract")
            .args(["stdin", "stdout", "--psm", "6", "-c"])
            .arg(format!("tessedit_char_whitelist={}", self.allowlist))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(RecognitionError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(png)?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(RecognitionError::Failed(output.status));
        }
        String::from_utf8(output.stdout).map_err(|_| RecognitionError::BadOutput)
    }
}
