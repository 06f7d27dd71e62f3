//! Per-turn state machine.
//!
//! ```text
//! Placement --(reinforcements exhausted)--> Attacking --(end_attack)--> Moving
//!     |                                         |                          |
//!     +------------(forfeit)--------------------+--------(end_turn)--------+--> next player
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::Rules;
use crate::game::{FightSession, PlayerId, TerritoryId};

/// Phase within a single player's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    /// Placing reinforcements.
    Placement,
    /// Launching and resolving attacks.
    Attacking,
    /// Moving armies between owned territories.
    Moving,
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Placement => "placement",
            Self::Attacking => "attacking",
            Self::Moving => "moving",
        })
    }
}

/// Illegal change to a [`TurnState`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The phase order forbids this move.
    #[error("cannot move from {from} to {to}")]
    Illegal {
        /// Current phase.
        from: TurnPhase,
        /// Requested phase.
        to: TurnPhase,
    },
    /// Placement cannot end with reinforcements left.
    #[error("{0} reinforcements still unplaced")]
    ReinforcementsRemaining(u32),
    /// Attacking cannot end with a session open.
    #[error("an attack session is still open")]
    FightOpen,
    /// A placement outside the placement phase.
    #[error("placements are only allowed during placement")]
    NotPlacing,
    /// A placement larger than the remaining reinforcements.
    #[error("cannot place {requested} with {remaining} remaining")]
    Overplaced {
        /// Reinforcements left.
        remaining: u32,
        /// Armies requested.
        requested: u32,
    },
}

/// Reinforcements for a player holding `territories`, before continent bonuses.
#[must_use]
pub fn reinforcements_for(territories: u32, rules: &Rules) -> u32 {
    let divisor = rules.territories_per_reinforcement.max(1);
    (territories / divisor).max(rules.min_reinforcements)
}

/// State of the turn in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    /// Player taking the turn.
    pub player: PlayerId,
    /// Current phase.
    pub phase: TurnPhase,
    /// Reinforcements granted at turn start.
    pub reinforcements: u32,
    /// Reinforcements not yet placed.
    pub reinforcements_remaining: u32,
    /// Placements made this turn, in order.
    pub placements: Vec<(TerritoryId, u32)>,
    /// Attack sessions opened this turn.
    pub attacks_made: u32,
    /// Territories conquered this turn.
    pub conquests: u32,
    /// Movements made this turn.
    pub moves_made: u32,
    /// Open attack session, if any.
    pub fight: Option<FightSession>,
}

impl TurnState {
    /// Begin a turn. A turn with nothing to place starts in [`TurnPhase::Attacking`].
    #[must_use]
    pub const fn begin(player: PlayerId, reinforcements: u32) -> Self {
        Self {
            player,
            phase: if reinforcements == 0 {
                TurnPhase::Attacking
            } else {
                TurnPhase::Placement
            },
            reinforcements,
            reinforcements_remaining: reinforcements,
            placements: Vec::new(),
            attacks_made: 0,
            conquests: 0,
            moves_made: 0,
            fight: None,
        }
    }

    /// Move to `next`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] if the order forbids it or the current phase is unfinished.
    pub fn advance(&mut self, next: TurnPhase) -> Result<(), TransitionError> {
        match (self.phase, next) {
            (TurnPhase::Placement, TurnPhase::Attacking) if self.reinforcements_remaining > 0 => {
                Err(TransitionError::ReinforcementsRemaining(self.reinforcements_remaining))
            }
            (TurnPhase::Attacking, TurnPhase::Moving) if self.fight.is_some() => {
                Err(TransitionError::FightOpen)
            }
            (TurnPhase::Placement, TurnPhase::Attacking) | (TurnPhase::Attacking, TurnPhase::Moving) => {
                self.phase = next;
                Ok(())
            }
            (from, to) => Err(TransitionError::Illegal { from, to }),
        }
    }

    /// Record a placement of `count` armies on `territory`.
    ///
    /// # Errors
    ///
    /// Returns [`TransitionError`] outside placement or when over-placing.
    pub fn place(&mut self, territory: TerritoryId, count: u32) -> Result<(), TransitionError> {
        if self.phase != TurnPhase::Placement {
            return Err(TransitionError::NotPlacing);
        }
        let remaining = self
            .reinforcements_remaining
            .checked_sub(count)
            .ok_or(TransitionError::Overplaced {
                remaining: self.reinforcements_remaining,
                requested: count,
            })?;
        self.reinforcements_remaining = remaining;
        self.placements.push((territory, count));
        Ok(())
    }

    /// Armies placed so far this turn.
    #[must_use]
    pub fn placed(&self) -> u32 {
        self.placements.iter().map(|(_, count)| count).sum()
    }

    /// Movements still allowed this turn.
    #[must_use]
    pub const fn moves_left(&self, rules: &Rules) -> u32 {
        rules.moves_per_turn.saturating_sub(self.moves_made)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinforcement_formula() {
        let rules = Rules::default();
        assert_eq!(reinforcements_for(1, &rules), 3);
        assert_eq!(reinforcements_for(9, &rules), 3);
        assert_eq!(reinforcements_for(11, &rules), 3);
        assert_eq!(reinforcements_for(12, &rules), 4);
        assert_eq!(reinforcements_for(42, &rules), 14);
    }

    #[test]
    fn test_placement_then_attacking() {
        let mut turn = TurnState::begin(1, 3);
        assert_eq!(turn.phase, TurnPhase::Placement);
        assert_eq!(
            turn.advance(TurnPhase::Attacking),
            Err(TransitionError::ReinforcementsRemaining(3))
        );

        turn.place(4, 2).unwrap();
        turn.place(5, 1).unwrap();
        assert_eq!(turn.reinforcements_remaining, 0);
        assert_eq!(turn.placed(), 3);
        turn.advance(TurnPhase::Attacking).unwrap();
        assert_eq!(turn.phase, TurnPhase::Attacking);
    }

    #[test]
    fn test_overplacement_leaves_state_unchanged() {
        let mut turn = TurnState::begin(1, 3);
        assert_eq!(
            turn.place(4, 5),
            Err(TransitionError::Overplaced {
                remaining: 3,
                requested: 5
            })
        );
        assert_eq!(turn.reinforcements_remaining, 3);
        assert!(turn.placements.is_empty());
    }

    #[test]
    fn test_no_backward_transitions() {
        let mut turn = TurnState::begin(1, 0);
        assert_eq!(turn.phase, TurnPhase::Attacking);
        turn.advance(TurnPhase::Moving).unwrap();
        assert!(matches!(
            turn.advance(TurnPhase::Attacking),
            Err(TransitionError::Illegal { .. })
        ));
        assert!(matches!(
            turn.advance(TurnPhase::Placement),
            Err(TransitionError::Illegal { .. })
        ));
    }

    #[test]
    fn test_open_fight_blocks_moving() {
        let mut turn = TurnState::begin(1, 0);
        turn.fight = Some(FightSession::new(1, 2, 1, 2, 1, 2, 1));
        assert_eq!(turn.advance(TurnPhase::Moving), Err(TransitionError::FightOpen));
    }

    #[test]
    fn test_moves_left() {
        let rules = Rules::default();
        let mut turn = TurnState::begin(1, 0);
        assert_eq!(turn.moves_left(&rules), 1);
        turn.moves_made = 1;
        assert_eq!(turn.moves_left(&rules), 0);
    }
}
