use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;

/// Which interface runs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Line-by-line console chat
    Cli,
    /// Full-screen terminal window
    Ui,
}

impl ChatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatMode::Cli => "cli",
            ChatMode::Ui => "ui",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cli" => Ok(ChatMode::Cli),
            "ui" => Ok(ChatMode::Ui),
            other => Err(format!("unknown mode '{other}' (expected 'cli' or 'ui')")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root URL of the Ollama server (e.g., "http://localhost:11434")
    pub base_url: Option<String>,
    /// Model used without asking; skips the interactive model menu
    pub default_model: Option<String>,
    /// Interface used without asking; skips the interactive mode menu
    pub default_mode: Option<ChatMode>,
    /// Replay exchanges that ended in an error to the model on later turns
    pub include_failed_turns: Option<bool>,
    /// File that receives diagnostics while the full-screen interface runs
    pub diagnostics_file: Option<PathBuf>,
}

/// Keys accepted by `thinkchat set` / `thinkchat unset`.
pub const CONFIG_KEYS: [&str; 5] = [
    "base-url",
    "default-model",
    "default-mode",
    "include-failed-turns",
    "diagnostics-file",
];

impl Config {
    /// Server URL from, in order: command line, config, `OLLAMA_HOST`, built-in default.
    pub fn resolve_base_url(&self, cli: Option<&str>, env_host: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.base_url.clone())
            .or_else(|| env_host.filter(|h| !h.trim().is_empty()).map(normalize_host))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn include_failed_turns(&self) -> bool {
        self.include_failed_turns.unwrap_or(true)
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for '{key}'"));
        }
        match key {
            "base-url" => self.base_url = Some(value.to_string()),
            "default-model" => self.default_model = Some(value.to_string()),
            "default-mode" => self.default_mode = Some(value.parse()?),
            "include-failed-turns" => self.include_failed_turns = Some(parse_bool(value)?),
            "diagnostics-file" => self.diagnostics_file = Some(PathBuf::from(value)),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), String> {
        match key {
            "base-url" => self.base_url = None,
            "default-model" => self.default_model = None,
            "default-mode" => self.default_mode = None,
            "include-failed-turns" => self.include_failed_turns = None,
            "diagnostics-file" => self.diagnostics_file = None,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn print_all(&self) {
        println!("Current configuration:");
        print_entry("base-url", self.base_url.as_deref());
        print_entry("default-model", self.default_model.as_deref());
        print_entry("default-mode", self.default_mode.map(ChatMode::as_str));
        match self.include_failed_turns() {
            true => println!("  include-failed-turns: on"),
            false => println!("  include-failed-turns: off"),
        }
        let diagnostics = self.diagnostics_file.as_deref().map(path_display);
        print_entry("diagnostics-file", diagnostics.as_deref());
    }
}

fn print_entry(key: &str, value: Option<&str>) {
    match value {
        Some(value) => println!("  {key}: {value}"),
        None => println!("  {key}: (unset)"),
    }
}

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key: {key} (expected one of: {})",
        CONFIG_KEYS.join(", ")
    )
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(format!("expected on/off, got '{other}'")),
    }
}

/// `OLLAMA_HOST` may be a bare `host:port`; give it a scheme.
fn normalize_host(host: &str) -> String {
    let host = host.trim();
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
