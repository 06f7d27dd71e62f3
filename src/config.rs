//! Rules configuration.
//!
//! Every field has a default matching the classic board game, so a rules file
//! only needs to name the values it changes:
//!
//! ```toml
//! moves_per_turn = 3
//! die_faces = 8
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Tunable game rules shared by the engine, the combat resolver, and the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Reinforcements granted regardless of territory count.
    pub min_reinforcements: u32,
    /// Territories needed per reinforcement army.
    pub territories_per_reinforcement: u32,
    /// Faces on each die (values roll in `1..=die_faces`).
    pub die_faces: u8,
    /// Most dice an attacker may roll in one round.
    pub max_attacker_dice: u32,
    /// Most dice a defender may roll in one round.
    pub max_defender_dice: u32,
    /// Troop movements allowed in the moving phase of one turn.
    pub moves_per_turn: u32,
    /// Events one drain of the stack may process before it counts as livelock.
    pub max_events_per_drain: usize,
    /// Deepest the event stack may grow.
    pub max_stack_depth: usize,
    /// Push a `rejected` event for every rejected action.
    pub emit_rejections: bool,
    /// Run the invariant checker after every drain.
    pub check_invariants: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            min_reinforcements: 3,
            territories_per_reinforcement: 3,
            die_faces: 6,
            max_attacker_dice: 3,
            max_defender_dice: 2,
            moves_per_turn: 1,
            max_events_per_drain: 100_000,
            max_stack_depth: 10_000,
            emit_rejections: true,
            check_invariants: true,
        }
    }
}

/// Errors raised while loading or validating [`Rules`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The rules file could not be read.
    #[error("failed to read rules file {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The rules file is not valid TOML.
    #[error("invalid TOML rules: {0}")]
    Toml(#[from] toml::de::Error),
    /// The rules file is not valid JSON.
    #[error("invalid JSON rules: {0}")]
    Json(#[from] serde_json::Error),
    /// A field holds a value the engine cannot run with.
    #[error("invalid rule `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why it was refused.
        reason: &'static str,
    },
}

impl Rules {
    /// Load rules from a `.toml` or `.json` file and validate them.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let rules: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&text)?
        } else {
            toml::from_str(&text)?
        };

        rules.validate()?;
        Ok(rules)
    }

    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.die_faces == 0 {
            return Err(ConfigError::Invalid {
                field: "die_faces",
                reason: "dice need at least one face",
            });
        }
        if self.territories_per_reinforcement == 0 {
            return Err(ConfigError::Invalid {
                field: "territories_per_reinforcement",
                reason: "divisor must be positive",
            });
        }
        if self.max_attacker_dice == 0 {
            return Err(ConfigError::Invalid {
                field: "max_attacker_dice",
                reason: "attacker must roll at least one die",
            });
        }
        if self.max_defender_dice == 0 {
            return Err(ConfigError::Invalid {
                field: "max_defender_dice",
                reason: "defender must roll at least one die",
            });
        }
        if self.max_events_per_drain == 0 {
            return Err(ConfigError::Invalid {
                field: "max_events_per_drain",
                reason: "drain budget must be positive",
            });
        }
        if self.max_stack_depth == 0 {
            return Err(ConfigError::Invalid {
                field: "max_stack_depth",
                reason: "stack depth must be positive",
            });
        }
        Ok(())
    }
}
