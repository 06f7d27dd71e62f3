//! CLI command implementations for Conquest.

pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod tournament;
pub(crate) mod validate;

mod output;

use clap::ValueEnum;
use std::error::Error;
use std::fmt;

/// Output format for the `run` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// Final board state as structured text.
    State,
}

/// Output format for the `replay` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum ReplayFormat {
    /// Final position only.
    Final,
    /// Every position after each recorded event.
    Steps,
    /// Final snapshot as JSON.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(format!("JSON serialization failed: {e}"))
    }
}

impl From<conquest::ConfigError> for CliError {
    fn from(e: conquest::ConfigError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<conquest::ScenarioError> for CliError {
    fn from(e: conquest::ScenarioError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<conquest::game::SetupError> for CliError {
    fn from(e: conquest::game::SetupError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<conquest::TournamentError> for CliError {
    fn from(e: conquest::TournamentError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<conquest::ReplayError> for CliError {
    fn from(e: conquest::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

/// Seed from the clock when none is given.
pub(crate) fn seed_or_clock(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(42, |d| d.as_secs() ^ u64::from(d.subsec_nanos()))
    })
}
