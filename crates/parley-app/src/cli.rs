//! CLI argument definitions for the Parley demo binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

/// Parley - drive a conversational voice agent's turn coordinator against
/// in-process collaborators.
#[derive(Parser, Debug)]
#[command(name = "parley", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Recorded-dialog manifest (JSON). Overrides `recorded.manifest`.
    #[arg(short = 'r', long = "recorded")]
    pub recorded: Option<PathBuf>,

    /// Things the simulated user says, one per argument, in order.
    #[arg(short = 's', long = "say")]
    pub say: Vec<String>,

    /// Stop after this many ticks. Runs until Ctrl-C when omitted.
    #[arg(short = 't', long = "ticks")]
    pub ticks: Option<u64>,

    /// Ticks between two simulated user utterances.
    #[arg(long = "say-every", default_value_t = 60)]
    pub say_every: u64,

    /// Answer only from recorded dialog, falling back to the retry phrase.
    #[arg(long = "cached-only")]
    pub cached_only: bool,

    /// Print coordinator events to stdout as JSON lines.
    #[arg(long = "json")]
    pub json: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > PARLEY_CONFIG env var > ~/.parley/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("PARLEY_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the recorded-dialog manifest.
    ///
    /// Priority: --recorded flag > config file value.
    pub fn resolve_manifest(&self, configured: Option<&str>) -> Option<PathBuf> {
        self.recorded
            .clone()
            .or_else(|| configured.filter(|p| !p.is_empty()).map(PathBuf::from))
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".parley").join("config.toml");
    }
    PathBuf::from("config.toml")
}
