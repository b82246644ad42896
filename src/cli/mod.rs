//! CLI Module
//!
//! Command-line interface for voicecheck. One positional audio path, a few
//! flags, and exactly one JSON line on the output channel.

use std::any::Any;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{debug, error};

use crate::config::DetectorConfig;
use crate::error::{DetectError, Result};
use crate::pipeline::Detector;
use crate::report::{ErrorPayload, ErrorReporter, OutputEncoding, Outcome};

/// Voicecheck - classify a speech recording as genuine or synthetic
#[derive(Parser, Debug, Default)]
#[command(name = "voicecheck-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Audio file to classify (wav, mp3, flac, ogg, m4a, ...)
    pub path: Option<PathBuf>,

    /// Model variant to use
    #[arg(long, env = "VOICECHECK_VARIANT")]
    pub variant: Option<String>,

    /// Directory holding model artifacts
    #[arg(long, env = "VOICECHECK_MODEL_DIR")]
    pub model_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, env = "VOICECHECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Escape non-ASCII characters in the output
    #[arg(long)]
    pub ascii: bool,

    /// Print the known model variants as JSON and exit
    #[arg(long)]
    pub list_variants: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Defaults, then the config file, then flags and environment
    pub fn load_config(&self) -> Result<DetectorConfig> {
        let mut config = match &self.config {
            Some(path) => DetectorConfig::load(path)?,
            None => DetectorConfig::default(),
        };
        if let Some(variant) = &self.variant {
            config.variant = variant.clone();
        }
        if let Some(dir) = &self.model_dir {
            config.model_dir = dir.clone();
        }
        if self.ascii {
            config.encoding = OutputEncoding::AsciiEscaped;
        }
        config.validate()?;
        debug!("Effective config: {:?}", config);
        Ok(config)
    }

    /// Encoding used before a config file has been read
    pub fn fallback_encoding(&self) -> OutputEncoding {
        if self.ascii {
            OutputEncoding::AsciiEscaped
        } else {
            OutputEncoding::Utf8
        }
    }
}

/// Run one invocation, writing the result line to `out`
pub fn run<W: Write>(cli: &Cli, out: &mut W) -> std::io::Result<ExitCode> {
    if cli.list_variants {
        return list_variants(cli, out);
    }

    // No file-system access before the argument check
    let Some(path) = cli.path.as_deref() else {
        return ErrorReporter::new(cli.fallback_encoding())
            .report(out, Err(DetectError::MissingArgument));
    };

    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => return ErrorReporter::new(cli.fallback_encoding()).report(out, Err(e)),
    };

    let reporter = ErrorReporter::new(config.encoding);
    let result = Detector::new(&config).and_then(|detector| detector.analyze(path));
    reporter.report(out, result)
}

/// Run `body`, turning a panic into an error line on `out` with exit code 1
pub fn catch_panics<W, F>(
    out: &mut W,
    encoding: OutputEncoding,
    body: F,
) -> std::io::Result<ExitCode>
where
    W: Write,
    F: FnOnce(&mut W) -> std::io::Result<ExitCode>,
{
    match panic::catch_unwind(AssertUnwindSafe(|| body(&mut *out))) {
        Ok(result) => result,
        Err(payload) => {
            let message = format!("Internal error: {}", panic_message(payload.as_ref()));
            error!("{}", message);
            ErrorReporter::new(encoding).emit(out, &Outcome::Failure(ErrorPayload::new(message)))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unexpected panic")
}

fn list_variants<W: Write>(cli: &Cli, out: &mut W) -> std::io::Result<ExitCode> {
    let listing = cli
        .load_config()
        .and_then(|config| config.registry())
        .and_then(|registry| Ok(serde_json::to_string(registry.variants())?));

    match listing {
        Ok(json) => {
            writeln!(out, "{}", json)?;
            out.flush()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => ErrorReporter::new(cli.fallback_encoding()).report(out, Err(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn run_to_string(cli: &Cli) -> String {
        let mut out = Vec::new();
        run(cli, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_parse_positional_and_flags() {
        let cli = Cli::try_parse_from([
            "voicecheck-cli",
            "clip.wav",
            "--variant",
            "tempered-voice",
            "--ascii",
        ])
        .unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("clip.wav")));
        assert_eq!(cli.variant.as_deref(), Some("tempered-voice"));
        assert!(cli.ascii);
    }

    #[test]
    fn test_missing_path_ignores_broken_config() {
        // The config path does not exist; the argument check must come first
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/config.json")),
            ..Cli::default()
        };
        assert_eq!(run_to_string(&cli), "{\"error\":\"No file path provided\"}\n");
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"variant": "tempered-voice", "model_dir": "/a"}"#).unwrap();

        let cli = Cli {
            config: Some(path),
            model_dir: Some(PathBuf::from("/b")),
            ..Cli::default()
        };
        let config = cli.load_config().unwrap();
        assert_eq!(config.variant, "tempered-voice");
        assert_eq!(config.model_dir, PathBuf::from("/b"));
    }

    #[test]
    fn test_unknown_variant_reported() {
        let dir = tempdir().unwrap();
        let clip = dir.path().join("clip.wav");
        std::fs::write(&clip, b"").unwrap();

        let cli = Cli {
            path: Some(clip),
            variant: Some("bogus".to_string()),
            ..Cli::default()
        };
        assert_eq!(
            run_to_string(&cli),
            "{\"error\":\"Unknown model variant: bogus\"}\n"
        );
    }

    #[test]
    fn test_list_variants() {
        let cli = Cli {
            list_variants: true,
            ..Cli::default()
        };
        let output = run_to_string(&cli);
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        let ids: Vec<&str> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["id"].as_str().unwrap())
            .collect();
        assert_eq!(
            ids,
            vec!["deepfake-voice", "tempered-voice", "deepfake-voice-multiclass"]
        );
    }

    #[test]
    fn test_panic_becomes_error_line() {
        let mut out = Vec::new();
        catch_panics(&mut out, OutputEncoding::Utf8, |_| -> std::io::Result<ExitCode> {
            panic!("decoder blew up at frame {}", 12)
        })
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"error\":\"Internal error: decoder blew up at frame 12\"}\n"
        );
    }

    #[test]
    fn test_static_panic_message() {
        let mut out = Vec::new();
        catch_panics(&mut out, OutputEncoding::Utf8, |_| -> std::io::Result<ExitCode> {
            panic!("boom")
        })
        .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"error\":\"Internal error: boom\"}\n"
        );
    }

    #[test]
    fn test_catch_panics_passes_result_through() {
        let cli = Cli::default();
        let mut out = Vec::new();
        catch_panics(&mut out, OutputEncoding::Utf8, |out| run(&cli, out)).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"error\":\"No file path provided\"}\n"
        );
    }
}
