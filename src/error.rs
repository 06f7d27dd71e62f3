//! Error types for the simulation engine.
//!
//! Two kinds of failure exist. A [`RejectReason`] means an event arrived that
//! the rules forbid; the game state is untouched and play continues. An
//! [`EngineFault`] means the engine itself can no longer trust its state and
//! has halted.

use crate::event::{ContextError, EventName};
use crate::game::{CombatError, InvariantViolation, PlayerId, TerritoryId, TransitionError, TurnPhase};

/// Why an event was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    /// A participant submitted an engine-internal event.
    #[error("`{0}` is not a participant action")]
    NotAnAction(EventName),
    /// The game has already ended.
    #[error("the game is over")]
    GameOver,
    /// The engine halted on a fault and accepts nothing further.
    #[error("the engine has halted")]
    Halted,
    /// No turn is in progress.
    #[error("no turn is in progress")]
    NoActiveTurn,
    /// A turn was started while another is still running.
    #[error("a turn is already in progress")]
    TurnInProgress,
    /// The acting player is not the current player.
    #[error("not player {actual}'s turn (current player is {expected})")]
    NotYourTurn {
        /// Player whose turn it is.
        expected: PlayerId,
        /// Player named by the event.
        actual: PlayerId,
    },
    /// The player is not in the roster.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// The player has been eliminated.
    #[error("player {0} has been eliminated")]
    PlayerEliminated(PlayerId),
    /// The action is not legal in the current phase.
    #[error("`{action}` is not allowed during the {phase} phase")]
    WrongPhase {
        /// Refused action.
        action: EventName,
        /// Phase the turn is in.
        phase: TurnPhase,
    },
    /// The territory does not exist.
    #[error("unknown territory {0}")]
    UnknownTerritory(TerritoryId),
    /// The player does not own the territory.
    #[error("player {player} does not own territory {territory}")]
    NotOwner {
        /// Territory named by the event.
        territory: TerritoryId,
        /// Acting player.
        player: PlayerId,
    },
    /// An attack targeted a territory the attacker already owns.
    #[error("territory {0} is already yours")]
    OwnTerritory(TerritoryId),
    /// The two territories do not share a border.
    #[error("territory {from} is not adjacent to {to}")]
    NotAdjacent {
        /// Source territory.
        from: TerritoryId,
        /// Target territory.
        to: TerritoryId,
    },
    /// The territory cannot spare that many armies.
    #[error("territory {territory} has {available} armies, cannot commit {requested}")]
    InsufficientArmies {
        /// Source territory.
        territory: TerritoryId,
        /// Armies on it.
        available: u32,
        /// Armies requested.
        requested: u32,
    },
    /// An army count of zero was given.
    #[error("army count must be at least 1, got {0}")]
    InvalidArmyCount(u32),
    /// A placement asked for more armies than remain.
    #[error("only {remaining} reinforcements remain, cannot place {requested}")]
    InsufficientReinforcements {
        /// Reinforcements still unplaced.
        remaining: u32,
        /// Armies requested.
        requested: u32,
    },
    /// The turn cannot end while reinforcements remain unplaced.
    #[error("{0} reinforcements must be placed before ending the turn")]
    ReinforcementsRemaining(u32),
    /// No attack session is open.
    #[error("no attack is in progress")]
    NoActiveAttack,
    /// The attack session can roll no further.
    #[error("the attack cannot continue")]
    AttackExhausted,
    /// The event names territories that differ from the open attack.
    #[error("event does not match the attack in progress")]
    SessionMismatch,
    /// A conquest arrived while the defender still holds armies.
    #[error("territory {0} still has defenders")]
    DefenderNotDefeated(TerritoryId),
    /// No movements remain this turn.
    #[error("movement limit of {limit} per turn reached")]
    MoveLimitReached {
        /// Movements allowed per turn.
        limit: u32,
    },
    /// The event context is missing a field or has a field of the wrong type.
    #[error("malformed event: {0}")]
    Malformed(#[from] ContextError),
}

impl RejectReason {
    /// Stable machine-readable code carried by `rejected` events.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotAnAction(_) => "not_an_action",
            Self::GameOver => "game_over",
            Self::Halted => "engine_halted",
            Self::NoActiveTurn => "no_active_turn",
            Self::TurnInProgress => "turn_in_progress",
            Self::NotYourTurn { .. } => "not_your_turn",
            Self::UnknownPlayer(_) => "unknown_player",
            Self::PlayerEliminated(_) => "player_eliminated",
            Self::WrongPhase { .. } => "wrong_phase",
            Self::UnknownTerritory(_) => "unknown_territory",
            Self::NotOwner { .. } => "not_owner",
            Self::OwnTerritory(_) => "own_territory",
            Self::NotAdjacent { .. } => "not_adjacent",
            Self::InsufficientArmies { .. } => "insufficient_armies",
            Self::InvalidArmyCount(_) => "invalid_army_count",
            Self::InsufficientReinforcements { .. } => "insufficient_reinforcements",
            Self::ReinforcementsRemaining(_) => "reinforcements_remaining",
            Self::NoActiveAttack => "no_active_attack",
            Self::AttackExhausted => "attack_exhausted",
            Self::SessionMismatch => "session_mismatch",
            Self::DefenderNotDefeated(_) => "defender_not_defeated",
            Self::MoveLimitReached { .. } => "move_limit_reached",
            Self::Malformed(_) => "malformed_event",
        }
    }
}

/// Unrecoverable engine failure. The simulation halts after reporting one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineFault {
    /// The stack did not empty within the per-drain event budget.
    #[error("livelock: stack still busy after {processed} events")]
    Livelock {
        /// Events processed in the drain.
        processed: usize,
    },
    /// The stack grew past its depth bound.
    #[error("event stack exceeded depth {depth}")]
    StackOverflow {
        /// Configured bound.
        depth: usize,
    },
    /// An effect referenced a territory that does not exist.
    #[error("effect references unknown territory {0}")]
    UnknownTerritory(TerritoryId),
    /// An effect referenced a player that does not exist.
    #[error("effect references unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// An army count would drop below zero.
    #[error("territory {territory} has {available} armies, cannot remove {requested}")]
    ArmyUnderflow {
        /// Territory concerned.
        territory: TerritoryId,
        /// Armies on it.
        available: u32,
        /// Armies to remove.
        requested: u32,
    },
    /// An army count would overflow.
    #[error("army count overflow on territory {0}")]
    ArmyOverflow(TerritoryId),
    /// A territory would be left with no armies outside a conquest.
    #[error("territory {0} would be left empty")]
    EmptyTerritory(TerritoryId),
    /// A conquest effect found defenders still present.
    #[error("conquest of territory {0} with defenders remaining")]
    ConquestWithDefenders(TerritoryId),
    /// An effect needed a turn but none is active.
    #[error("no active turn")]
    NoActiveTurn,
    /// A turn started while another was active.
    #[error("a turn is already active")]
    TurnAlreadyActive,
    /// An effect needed an attack session but none is open.
    #[error("no attack session is open")]
    NoActiveFight,
    /// An attack session opened while another was still open.
    #[error("an attack session is already open")]
    FightAlreadyOpen,
    /// The attack session disagrees with the board.
    #[error("attack session desync on territory {territory}: session has {session}, board has {board}")]
    SessionDesync {
        /// Territory concerned.
        territory: TerritoryId,
        /// Armies the session expects.
        session: u32,
        /// Armies on the board.
        board: u32,
    },
    /// The run loop finished with no turn to wait on.
    #[error("stack drained with no turn in progress")]
    Stalled,
    /// A turn-phase transition failed.
    #[error("turn transition failed: {0}")]
    Transition(#[from] TransitionError),
    /// Combat bookkeeping failed.
    #[error("combat failed: {0}")]
    Combat(#[from] CombatError),
    /// The invariant checker found violations after a drain.
    #[error("invariants violated: {}", format_violations(.0))]
    Invariant(Vec<InvariantViolation>),
}

fn format_violations(violations: &[InvariantViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
