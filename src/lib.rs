// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Conquest: a deterministic, event-driven simulation core for
//! turn-based territory-conquest games.
//!
//! This crate provides:
//! - A LIFO event stack driving every state change
//! - A per-turn state machine (placement, attacking, moving)
//! - Dice combat with persistent attack sessions
//! - A decision protocol for pluggable participants
//! - Bit-exact replay from a seed and the recorded submissions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Tournament Runner / Replay        │
//! ├─────────────────────────────────────┤
//! │   Agents (decision protocol)        │
//! ├─────────────────────────────────────┤
//! │   Simulation (event stack + loop)   │
//! ├─────────────────────────────────────┤
//! │   Game Logic (board, turn, combat)  │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use conquest::{AgentKind, TournamentConfig, run_game};
//!
//! let config = TournamentConfig {
//!     board_width: 4,
//!     board_height: 3,
//!     starting_armies: 12,
//!     ..TournamentConfig::default()
//! };
//! let result = run_game(42, &[AgentKind::Aggressive, AgentKind::Random], &config).unwrap();
//! assert_eq!(result.player_stats.len(), 2);
//! ```

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod game;
pub mod replay;
pub mod scenario;
pub mod tournament;

pub use error::{EngineFault, RejectReason};

// Re-export key types at crate root for convenience
pub use agent::{Agent, AgentKind, Decision, decide};
pub use config::{ConfigError, Rules};
pub use engine::{RunStatus, Simulation, Snapshot, Submission, View};
pub use event::{Context, Event, EventName, Intent};
pub use game::{Board, GameState, Player, PlayerId, Territory, TerritoryId, TurnPhase};
pub use replay::{Recording, ReplayEngine, ReplayError};
pub use scenario::{Scenario, ScenarioError};
pub use tournament::{GameResult, TournamentConfig, TournamentError, run_game, run_scenario};
