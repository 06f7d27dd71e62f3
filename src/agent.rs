//! Decision makers.
//!
//! When the engine is waiting on a player it hands their [`Agent`] a read-only
//! [`View`]. The agent proposes an action for the current phase or declines
//! with [`Decision::NoAction`], which [`decide`] maps to the phase's ending
//! action so a turn can always progress.

mod aggressive;
mod defensive;
mod random;

pub use aggressive::AggressiveAgent;
pub use defensive::DefensiveAgent;
pub use random::RandomAgent;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::View;
use crate::event::Intent;
use crate::game::{GameState, PlayerId, TerritoryId, TurnPhase};

/// An agent's answer to a decision request.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Submit this action.
    Act(Intent),
    /// Decline to act this phase.
    NoAction,
}

/// Something that chooses actions for one player.
pub trait Agent: fmt::Debug + Send {
    /// Short name for reports.
    fn name(&self) -> &str;

    /// Choose a placement. Declining forfeits the remaining reinforcements.
    fn propose_placement(&mut self, view: &View<'_>) -> Decision;

    /// Choose an attack or roll the open one. Declining ends the attacking phase.
    fn propose_attack(&mut self, view: &View<'_>) -> Decision;

    /// Choose a movement. Declining ends the turn.
    fn propose_movement(&mut self, view: &View<'_>) -> Decision;

    /// Choose how to end the turn once no movements remain.
    fn propose_end(&mut self, view: &View<'_>) -> Decision {
        Decision::Act(Intent::end_turn(view.player()))
    }
}

/// Ask `agent` for the current player's next action.
///
/// [`Decision::NoAction`] becomes a forfeit during placement, `end_attack`
/// while attacking, and `end_turn` while moving.
pub fn decide(agent: &mut dyn Agent, view: &View<'_>) -> Intent {
    let player = view.player();
    let phase = view.phase().unwrap_or(TurnPhase::Moving);
    let decision = match phase {
        TurnPhase::Placement => agent.propose_placement(view),
        TurnPhase::Attacking => agent.propose_attack(view),
        TurnPhase::Moving if view.moves_left() == 0 => agent.propose_end(view),
        TurnPhase::Moving => agent.propose_movement(view),
    };
    match decision {
        Decision::Act(intent) => intent,
        Decision::NoAction => match phase {
            TurnPhase::Placement => Intent::forfeit(player),
            TurnPhase::Attacking => Intent::end_attack(player),
            TurnPhase::Moving => Intent::end_turn(player),
        },
    }
}

/// Built-in agent strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Uniformly random legal actions.
    Random,
    /// Piles armies on the front and attacks with advantage.
    Aggressive,
    /// Reinforces weak borders and attacks only with overwhelming odds.
    Defensive,
}

impl AgentKind {
    /// Every built-in strategy.
    pub const ALL: [Self; 3] = [Self::Random, Self::Aggressive, Self::Defensive];

    /// Build an agent of this kind for `player`, seeded from `seed`.
    #[must_use]
    pub fn build(self, player: PlayerId, seed: u64) -> Box<dyn Agent> {
        let seed = seed.wrapping_add(u64::from(player));
        match self {
            Self::Random => Box::new(RandomAgent::new(seed)),
            Self::Aggressive => Box::new(AggressiveAgent::new()),
            Self::Defensive => Box::new(DefensiveAgent::new()),
        }
    }

    /// Name used on the command line and in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Aggressive => "aggressive",
            Self::Defensive => "defensive",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown agent `{s}` (expected random, aggressive, or defensive)"))
    }
}

/// A possible attack: source, target, and the armies on each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AttackOption {
    pub(crate) from: TerritoryId,
    pub(crate) to: TerritoryId,
    pub(crate) attackers: u32,
    pub(crate) defenders: u32,
}

/// Every attack `player` could legally open, in territory order.
pub(crate) fn attack_options(game: &GameState, player: PlayerId) -> Vec<AttackOption> {
    game.board
        .owned_by(player)
        .filter(|t| t.can_attack())
        .flat_map(move |source| {
            game.board.enemy_neighbors(source.id).map(move |target| AttackOption {
                from: source.id,
                to: target.id,
                attackers: source.armies,
                defenders: target.armies,
            })
        })
        .collect()
}

/// A possible movement: source, target, and the armies on the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MoveOption {
    pub(crate) from: TerritoryId,
    pub(crate) to: TerritoryId,
    pub(crate) available: u32,
}

/// Every movement `player` could legally make, in territory order.
pub(crate) fn move_options(game: &GameState, player: PlayerId) -> Vec<MoveOption> {
    game.board
        .owned_by(player)
        .filter(|t| t.armies > 1)
        .flat_map(move |source| {
            source
                .adjacent
                .iter()
                .filter_map(move |id| game.board.get(*id))
                .filter(move |target| target.owner == player)
                .map(move |target| MoveOption {
                    from: source.id,
                    to: target.id,
                    available: source.armies,
                })
        })
        .collect()
}
