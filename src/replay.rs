//! Game replay and viewing system.
//!
//! Simulations are deterministic given the starting position, the rules,
//! the dice seed and the participant submissions, so a recording holds only:
//! - `seed: u64` - the dice seed
//! - `scenario` - the starting position
//! - `rules` - the rules the game ran under
//! - `events` - every accepted submission, in order
//!
//! No state deltas needed. To view position N, re-run the first N
//! submissions against a fresh simulation. Each submission notes how many
//! events had been processed when it arrived, so batched submissions land
//! on the stack together just as they did live.
//!
//! # Time Travel
//!
//! - **Forward**: Resubmit the next recorded event and process up to the
//!   point the following one arrived
//! - **Backward**: Rebuild and re-run up to (`cursor` - 1)
//! - **Seek to N**: Rebuild if needed and re-run up to N

mod text;

pub use text::render_text;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Rules;
use crate::engine::{RunStatus, Simulation, Submission, View};
use crate::error::{EngineFault, RejectReason};
use crate::game::SetupError;
use crate::scenario::Scenario;

/// Minimal recording: seed, starting position, rules and submissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    /// Dice seed.
    pub seed: u64,
    /// Starting position.
    pub scenario: Scenario,
    /// Rules the game ran under.
    pub rules: Rules,
    /// Accepted participant submissions in order.
    pub events: Vec<Submission>,
}

impl Recording {
    /// Capture the inputs of a finished or running simulation.
    #[must_use]
    pub fn new(seed: u64, scenario: Scenario, rules: Rules, events: Vec<Submission>) -> Self {
        Self {
            seed,
            scenario,
            rules,
            events,
        }
    }

    /// Save recording to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file operations fail.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load recording from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Error type for replay operations.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Reading or writing a recording failed.
    #[error("recording I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The recording is not valid JSON.
    #[error("invalid recording: {0}")]
    Json(#[from] serde_json::Error),
    /// The recorded starting position is invalid.
    #[error("invalid starting position: {0}")]
    Setup(#[from] SetupError),
    /// The engine halted during replay.
    #[error("engine fault during replay: {0}")]
    Engine(#[from] EngineFault),
    /// A resubmitted event received a different sequence number.
    #[error("replay diverged at event {index}: expected sequence {expected}, got {actual}")]
    Diverged {
        /// Index into the recorded events.
        index: usize,
        /// Recorded sequence.
        expected: u64,
        /// Sequence assigned on replay.
        actual: u64,
    },
    /// The simulation could not reach the point a recorded event arrived at.
    #[error("replay misaligned at event {index}: recorded after {expected} processed events, reached {actual}")]
    Misaligned {
        /// Index into the recorded events.
        index: usize,
        /// Processed events when it was recorded.
        expected: u64,
        /// Processed events reached on replay.
        actual: u64,
    },
    /// The engine refused a recorded event outright.
    #[error("recorded event {index} refused: {reason}")]
    Refused {
        /// Index into the recorded events.
        index: usize,
        /// Why it was refused.
        reason: RejectReason,
    },
    /// Requested position is past the end of the recording.
    #[error("position {requested} out of bounds (recording has {len} events)")]
    OutOfBounds {
        /// Requested position.
        requested: usize,
        /// Events in the recording.
        len: usize,
    },
    /// Every recorded event has been replayed.
    #[error("recording is already at its end")]
    Finished,
}

/// Replay engine - steps through a recording deterministically.
///
/// The cursor counts recorded events already resubmitted; position 0 is the
/// state after the opening drain.
#[derive(Debug)]
pub struct ReplayEngine {
    recording: Recording,
    sim: Simulation,
    cursor: usize,
}

impl ReplayEngine {
    /// Create a replay engine positioned before the first recorded event.
    ///
    /// # Errors
    ///
    /// Returns an error if the starting position is invalid or the opening
    /// drain faults.
    pub fn new(recording: Recording) -> Result<Self, ReplayError> {
        let sim = Self::fresh(&recording)?;
        Ok(Self {
            recording,
            sim,
            cursor: 0,
        })
    }

    fn fresh(recording: &Recording) -> Result<Simulation, ReplayError> {
        let state = recording.scenario.build(recording.rules)?;
        let mut sim = Simulation::seeded(state, recording.seed);
        settle(&mut sim, recording, 0)?;
        Ok(sim)
    }

    /// Get the recording.
    #[must_use]
    pub const fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Recorded events already replayed.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Recorded events in total.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recording.events.len()
    }

    /// Whether the recording holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recording.events.is_empty()
    }

    /// Whether every recorded event has been replayed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.len()
    }

    /// The simulation at the current position.
    #[must_use]
    pub const fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Read-only view at the current position.
    #[must_use]
    pub fn view(&self) -> View<'_> {
        self.sim.view()
    }

    /// Resubmit the next recorded event, then process events up to the
    /// point the one after it was submitted (or to the end of the drain).
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Finished`] at the end of the recording,
    /// [`ReplayError::Diverged`] if the event lands on a different sequence
    /// than it was recorded with, and [`ReplayError::Misaligned`] if the
    /// stack runs dry before the next submission point.
    pub fn step_forward(&mut self) -> Result<RunStatus, ReplayError> {
        let index = self.cursor;
        let Some(recorded) = self.recording.events.get(index) else {
            return Err(ReplayError::Finished);
        };
        let expected = recorded.event.sequence();
        let event = self
            .sim
            .submit(recorded.event.to_intent())
            .map_err(|reason| ReplayError::Refused { index, reason })?;
        if event.sequence() != expected {
            return Err(ReplayError::Diverged {
                index,
                expected,
                actual: event.sequence(),
            });
        }
        self.cursor += 1;
        debug!(index, sequence = expected, "replayed event");
        settle(&mut self.sim, &self.recording, self.cursor)
    }

    /// Step back one recorded event.
    ///
    /// # Errors
    ///
    /// Returns an error if already at position 0 or re-running fails.
    pub fn step_backward(&mut self) -> Result<(), ReplayError> {
        if self.cursor == 0 {
            return Err(ReplayError::OutOfBounds {
                requested: 0,
                len: self.len(),
            });
        }
        self.seek(self.cursor - 1)
    }

    /// Jump to position `target`.
    ///
    /// Seeking backward rebuilds the simulation and re-runs from the start.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` is past the end or re-running fails.
    pub fn seek(&mut self, target: usize) -> Result<(), ReplayError> {
        if target > self.len() {
            return Err(ReplayError::OutOfBounds {
                requested: target,
                len: self.len(),
            });
        }
        if target < self.cursor {
            self.sim = Self::fresh(&self.recording)?;
            self.cursor = 0;
        }
        while self.cursor < target {
            self.step_forward()?;
        }
        Ok(())
    }

    /// Replay every remaining event.
    ///
    /// # Errors
    ///
    /// Returns the first divergence or engine fault.
    pub fn run_to_end(&mut self) -> Result<RunStatus, ReplayError> {
        while !self.is_finished() {
            self.step_forward()?;
        }
        Ok(self.sim.status())
    }

    /// Render the current position as text.
    #[must_use]
    pub fn render_text(&self) -> String {
        render_text(&self.sim.view())
    }
}

/// Process events until the simulation reaches the point recorded event
/// `index` was submitted at, or drain fully past the last one.
fn settle(sim: &mut Simulation, recording: &Recording, index: usize) -> Result<RunStatus, ReplayError> {
    let Some(next) = recording.events.get(index) else {
        return Ok(sim.run()?);
    };
    while sim.processed() < next.processed {
        if sim.step()?.is_none() {
            break;
        }
    }
    if sim.processed() != next.processed {
        return Err(ReplayError::Misaligned {
            index,
            expected: next.processed,
            actual: sim.processed(),
        });
    }
    if sim.pending() == 0 {
        return Ok(sim.run()?);
    }
    Ok(sim.status())
}
