//! State mutations produced by handlers.
//!
//! Handlers only read state; every change to the game goes through [`apply`].
//! Arithmetic is checked, and a failed check becomes an [`EngineFault`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EngineFault;
use crate::game::{
    DiceRound, FightSession, GameState, PlayerId, Territory, TerritoryId, TurnPhase, TurnState,
};

/// One atomic change to the game or the turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    /// Begin `player`'s turn with `reinforcements` to place.
    StartTurn {
        /// Player whose turn begins.
        player: PlayerId,
        /// Reinforcements granted.
        reinforcements: u32,
    },
    /// Add reinforcements to a territory.
    PlaceArmies {
        /// Target territory.
        territory: TerritoryId,
        /// Armies placed.
        count: u32,
    },
    /// Move the turn to another phase.
    AdvancePhase(TurnPhase),
    /// Open an attack session.
    OpenFight(FightSession),
    /// Close the open session without a conquest.
    CloseFight,
    /// Apply one dice round to the open session and the board.
    ApplyRound(DiceRound),
    /// Transfer the defending territory to the attacker.
    Conquer {
        /// Attacking territory.
        from: TerritoryId,
        /// Conquered territory.
        to: TerritoryId,
        /// New owner.
        player: PlayerId,
        /// Armies relocated into the conquered territory.
        relocate: u32,
    },
    /// Remove a player from the game.
    Eliminate(PlayerId),
    /// Move armies between two owned territories.
    TransferArmies {
        /// Source territory.
        from: TerritoryId,
        /// Target territory.
        to: TerritoryId,
        /// Armies moved.
        count: u32,
    },
    /// Finish the current turn and hand play to `next_player`.
    EndTurn {
        /// Player who moves next.
        next_player: PlayerId,
    },
}

/// Apply `effect`.
///
/// `last_fight` receives every session that closes, so observers can still
/// inspect a fight after it ends.
pub(crate) fn apply(
    game: &mut GameState,
    turn: &mut Option<TurnState>,
    last_fight: &mut Option<FightSession>,
    effect: &Effect,
) -> Result<(), EngineFault> {
    match effect {
        Effect::StartTurn {
            player,
            reinforcements,
        } => {
            if turn.is_some() {
                return Err(EngineFault::TurnAlreadyActive);
            }
            info!(
                player,
                turn = game.turn,
                round = game.round,
                reinforcements,
                "turn started"
            );
            *turn = Some(TurnState::begin(*player, *reinforcements));
        }

        Effect::PlaceArmies { territory, count } => {
            active(turn)?.place(*territory, *count)?;
            let t = territory_mut(game, *territory)?;
            t.armies = t
                .armies
                .checked_add(*count)
                .ok_or(EngineFault::ArmyOverflow(*territory))?;
            game.ledger.placed = game.ledger.placed.saturating_add(u64::from(*count));
        }

        Effect::AdvancePhase(next) => {
            let t = active(turn)?;
            t.advance(*next)?;
            debug!(player = t.player, phase = %next, "phase advanced");
        }

        Effect::OpenFight(session) => {
            let t = active(turn)?;
            if t.fight.is_some() {
                return Err(EngineFault::FightAlreadyOpen);
            }
            debug!(
                attacker = session.attacker,
                defender = session.defender,
                committed = session.committed,
                "attack opened"
            );
            t.fight = Some(session.clone());
            t.attacks_made = t.attacks_made.saturating_add(1);
        }

        Effect::CloseFight => {
            let session = active(turn)?.fight.take().ok_or(EngineFault::NoActiveFight)?;
            debug!(
                attacker = session.attacker,
                defender = session.defender,
                rounds = session.history.len(),
                "attack closed"
            );
            *last_fight = Some(session);
        }

        Effect::ApplyRound(round) => {
            let session = active(turn)?
                .fight
                .as_mut()
                .ok_or(EngineFault::NoActiveFight)?;
            check_sync(game, session.attacker, session.attacking_armies)?;
            check_sync(game, session.defender, session.defending_armies)?;
            session.record(round)?;

            remove_armies(game, session.attacker, round.attacker_losses)?;
            remove_armies(game, session.defender, round.defender_losses)?;
            let lost = u64::from(round.attacker_losses) + u64::from(round.defender_losses);
            game.ledger.lost = game.ledger.lost.saturating_add(lost);
            debug!(
                attacker_dice = ?round.attacker_dice,
                defender_dice = ?round.defender_dice,
                attacker_losses = round.attacker_losses,
                defender_losses = round.defender_losses,
                "dice round"
            );
        }

        Effect::Conquer {
            from,
            to,
            player,
            relocate,
        } => {
            let t = active(turn)?;
            let session = t.fight.take().ok_or(EngineFault::NoActiveFight)?;
            t.conquests = t.conquests.saturating_add(1);

            let target = territory_mut(game, *to)?;
            if target.armies > 0 {
                return Err(EngineFault::ConquestWithDefenders(*to));
            }
            let previous = target.owner;
            target.owner = *player;
            target.armies = *relocate;

            let source = territory_mut(game, *from)?;
            let left = source
                .armies
                .checked_sub(*relocate)
                .ok_or(EngineFault::ArmyUnderflow {
                    territory: *from,
                    available: source.armies,
                    requested: *relocate,
                })?;
            if left == 0 {
                return Err(EngineFault::EmptyTerritory(*from));
            }
            source.armies = left;

            info!(
                player,
                from_player = previous,
                territory = to,
                armies = relocate,
                "territory conquered"
            );
            *last_fight = Some(session);
        }

        Effect::Eliminate(player) => {
            let p = game
                .player_mut(*player)
                .ok_or(EngineFault::UnknownPlayer(*player))?;
            p.eliminate();
            info!(player, turn = game.turn, "player eliminated");
        }

        Effect::TransferArmies { from, to, count } => {
            let source = territory_mut(game, *from)?;
            let left = source
                .armies
                .checked_sub(*count)
                .ok_or(EngineFault::ArmyUnderflow {
                    territory: *from,
                    available: source.armies,
                    requested: *count,
                })?;
            if left == 0 {
                return Err(EngineFault::EmptyTerritory(*from));
            }
            source.armies = left;

            let target = territory_mut(game, *to)?;
            target.armies = target
                .armies
                .checked_add(*count)
                .ok_or(EngineFault::ArmyOverflow(*to))?;

            let t = active(turn)?;
            t.moves_made = t.moves_made.saturating_add(1);
        }

        Effect::EndTurn { next_player } => {
            let finished = turn.take().ok_or(EngineFault::NoActiveTurn)?;
            if finished.reinforcements_remaining > 0 {
                warn!(
                    player = finished.player,
                    discarded = finished.reinforcements_remaining,
                    "turn ended with unplaced reinforcements"
                );
            }
            if let Some(session) = finished.fight {
                *last_fight = Some(session);
            }
            game.pass_turn(*next_player);
        }
    }
    Ok(())
}

fn active(turn: &mut Option<TurnState>) -> Result<&mut TurnState, EngineFault> {
    turn.as_mut().ok_or(EngineFault::NoActiveTurn)
}

fn territory_mut(game: &mut GameState, id: TerritoryId) -> Result<&mut Territory, EngineFault> {
    game.board
        .get_mut(id)
        .ok_or(EngineFault::UnknownTerritory(id))
}

fn check_sync(game: &GameState, id: TerritoryId, expected: u32) -> Result<(), EngineFault> {
    let board = game
        .board
        .get(id)
        .ok_or(EngineFault::UnknownTerritory(id))?
        .armies;
    if board == expected {
        Ok(())
    } else {
        Err(EngineFault::SessionDesync {
            territory: id,
            session: expected,
            board,
        })
    }
}

fn remove_armies(game: &mut GameState, id: TerritoryId, count: u32) -> Result<(), EngineFault> {
    let t = territory_mut(game, id)?;
    t.armies = t
        .armies
        .checked_sub(count)
        .ok_or(EngineFault::ArmyUnderflow {
            territory: id,
            available: t.armies,
            requested: count,
        })?;
    Ok(())
}
