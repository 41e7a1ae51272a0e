//! Transcript and diagnostics logging.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::config::ChatMode;
use crate::core::message::Turn;

/// Environment variable holding the `tracing` filter directive.
pub const LOG_FILTER_ENV: &str = "THINKCHAT_LOG";

/// Appends every displayed message to a plain-text file.
pub struct TranscriptLog {
    file_path: Option<PathBuf>,
}

impl TranscriptLog {
    /// A transcript writing to `log_file`; the file is created if missing.
    pub fn new(log_file: Option<PathBuf>) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(path) = &log_file {
            // Fail early if the path is not writable
            OpenOptions::new().create(true).append(true).open(path)?;
        }
        Ok(Self {
            file_path: log_file,
        })
    }

    pub fn disabled() -> Self {
        Self { file_path: None }
    }

    pub fn is_active(&self) -> bool {
        self.file_path.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn log_turn(&self, turn: &Turn) -> Result<(), Box<dyn std::error::Error>> {
        self.log_message(&turn.render())
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let Some(file_path) = &self.file_path else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);

        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        // Blank line between messages, matching the on-screen spacing
        writeln!(writer)?;

        writer.flush()?;
        Ok(())
    }
}

/// Install the global `tracing` subscriber.
///
/// Console mode logs to stderr. The full-screen interface owns the terminal, so
/// diagnostics go to `diagnostics_file` there, or nowhere when it is unset.
pub fn init_tracing(mode: ChatMode, diagnostics_file: Option<&Path>) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match (mode, diagnostics_file) {
        (ChatMode::Cli, _) => builder.with_writer(std::io::stderr).try_init(),
        (ChatMode::Ui, Some(path)) => match open_diagnostics(path) {
            Ok(file) => builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init(),
            Err(err) => {
                eprintln!("⚠️  Could not open diagnostics file {}: {err}", path.display());
                builder.with_writer(std::io::sink).try_init()
            }
        },
        (ChatMode::Ui, None) => builder.with_writer(std::io::sink).try_init(),
    };

    if let Err(err) = result {
        eprintln!("⚠️  Could not initialise diagnostics: {err}");
    }
}

fn open_diagnostics(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn transcript_appends_messages_with_blank_separator() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("chat.log");
        let transcript = TranscriptLog::new(Some(path.clone())).expect("open transcript");
        assert!(transcript.is_active());

        transcript.log_turn(&Turn::user("Hello")).expect("log user");
        transcript
            .log_turn(&Turn::assistant("Line one\nLine two"))
            .expect("log assistant");

        let contents = std::fs::read_to_string(&path).expect("read transcript");
        assert_eq!(
            contents,
            "User: Hello\n\nAssistant: Line one\nLine two\n\n"
        );
    }

    #[test]
    fn disabled_transcript_writes_nothing() {
        let transcript = TranscriptLog::disabled();
        assert!(!transcript.is_active());
        assert!(transcript.path().is_none());
        transcript.log_message("ignored").expect("no-op");
    }

    #[test]
    fn transcript_rejects_unwritable_path() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("missing-dir").join("chat.log");
        assert!(TranscriptLog::new(Some(path)).is_err());
    }
}
