//! Game layer.
//!
//! Holds the rules-level model the engine mutates:
//! - Board of territories with adjacency and continents
//! - Player roster with elimination and rotation
//! - Per-turn state machine (placement, attacking, moving)
//! - Dice combat resolution
//! - Invariant checks run after every drain

mod board;
mod combat;
mod invariants;
mod player;
mod state;
mod turn;

pub use board::{Board, Continent, Territory, TerritoryId};
pub use combat::{
    CombatError, DiceRound, DiceSource, FightSession, PairOutcome, ScriptedDice, SeededDice, Side,
    attacker_dice_count, defender_dice_count,
};
pub use invariants::{InvariantViolation, assert_invariants, check_invariants};
pub use player::{Player, PlayerId};
pub use state::{ArmyLedger, GamePhase, GameState, MAX_PLAYERS, SetupError};
pub use turn::{TransitionError, TurnPhase, TurnState, reinforcements_for};
