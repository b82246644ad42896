//! Result serialization and error reporting
//!
//! Every run ends with exactly one JSON line on stdout: the prediction on
//! success, `{"error": "..."}` on failure. The reporter owns that contract
//! and the matching exit code.

use std::io::Write;
use std::process::ExitCode;

use log::error;
use serde::{Deserialize, Serialize};

use crate::decision::Prediction;
use crate::error::{DetectError, Result};

/// How non-ASCII text is written to the output channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputEncoding {
    /// Raw UTF-8
    #[default]
    Utf8,
    /// ASCII only, non-ASCII as `\uXXXX` escapes
    AsciiEscaped,
}

/// Uniform failure payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl ErrorPayload {
    pub fn new(message: impl AsRef<[u8]>) -> Self {
        Self {
            error: sanitize(message.as_ref()),
        }
    }
}

/// Outcome of one invocation
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Prediction),
    Failure(ErrorPayload),
}

impl Outcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Outcome::Success(_) => 0,
            Outcome::Failure(_) => 1,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl From<Result<Prediction>> for Outcome {
    fn from(result: Result<Prediction>) -> Self {
        match result {
            Ok(prediction) => Outcome::Success(prediction),
            Err(e) => {
                error!("{} ({})", e, e.error_code());
                Outcome::Failure(ErrorPayload::new(e.to_string()))
            }
        }
    }
}

/// Decode lossily and strip control characters other than tab
pub fn sanitize(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|c| *c == '\t' || !c.is_control())
        .collect()
}

fn escape_non_ascii(json: &str) -> String {
    let mut out = String::with_capacity(json.len());
    for c in json.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

/// Serializes outcomes and writes them to an output channel
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReporter {
    encoding: OutputEncoding,
}

impl ErrorReporter {
    pub fn new(encoding: OutputEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    /// Render an outcome as a single JSON line (no trailing newline)
    pub fn render(&self, outcome: &Outcome) -> String {
        let json = match outcome {
            Outcome::Success(prediction) => serde_json::to_string(prediction),
            Outcome::Failure(payload) => serde_json::to_string(payload),
        };
        let json = json.unwrap_or_else(|e| {
            let message = sanitize(DetectError::from(e).to_string().as_bytes());
            serde_json::json!({ "error": message }).to_string()
        });

        match self.encoding {
            OutputEncoding::Utf8 => json,
            OutputEncoding::AsciiEscaped => escape_non_ascii(&json),
        }
    }

    /// Write the outcome line and return the process exit code
    pub fn emit<W: Write>(&self, out: &mut W, outcome: &Outcome) -> std::io::Result<ExitCode> {
        writeln!(out, "{}", self.render(outcome))?;
        out.flush()?;
        Ok(ExitCode::from(outcome.exit_code()))
    }

    /// Collapse a pipeline result into an outcome and write it
    pub fn report<W: Write>(&self, out: &mut W, result: Result<Prediction>) -> std::io::Result<ExitCode> {
        self.emit(out, &Outcome::from(result))
    }
}
