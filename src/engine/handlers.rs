//! Event handlers.
//!
//! Each handler validates its event against a read-only view of the game and
//! either rejects it or returns the effects to apply and the follow-up events
//! to push. Follow-ups are pushed in order, so the last one runs first.

use crate::error::RejectReason;
use crate::event::{Event, EventName, Intent};
use crate::game::{
    DiceSource, FightSession, GameState, PlayerId, Territory, TerritoryId, TurnPhase, TurnState,
};

use super::Effect;

/// What a handler decided.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Apply `effects`, then push `follow_ups`.
    Applied {
        /// Mutations to apply, in order.
        effects: Vec<Effect>,
        /// Events to push, in order.
        follow_ups: Vec<Intent>,
    },
    /// Refuse the event; nothing changes.
    Rejected(RejectReason),
    /// Apply `effects` and end the game.
    Terminal {
        /// Mutations to apply, in order.
        effects: Vec<Effect>,
        /// Winning player, if any.
        winner: Option<PlayerId>,
    },
}

impl Outcome {
    fn apply(effects: Vec<Effect>) -> Self {
        Self::Applied {
            effects,
            follow_ups: Vec::new(),
        }
    }
}

type Handler = fn(&Event, &GameState, Option<&TurnState>, &mut dyn DiceSource) -> Result<Outcome, RejectReason>;

/// Route `event` to its handler.
pub(crate) fn dispatch(
    event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    dice: &mut dyn DiceSource,
) -> Outcome {
    let handler: Handler = match event.name() {
        EventName::GameStart => game_start,
        EventName::TurnStart => turn_start,
        EventName::PlaceTroop => place_troop,
        EventName::Attack => attack,
        EventName::ResolveAttackRound => resolve_attack_round,
        EventName::EndAttack => end_attack,
        EventName::MoveTroops => move_troops,
        EventName::EndTurn => end_turn,
        EventName::Conquest => conquest,
        EventName::Rejected => rejected,
    };
    handler(event, game, turn, dice).unwrap_or_else(Outcome::Rejected)
}

/// The turn of the player named by `event`, which must be the current player.
fn acting<'a>(
    event: &Event,
    game: &GameState,
    turn: Option<&'a TurnState>,
) -> Result<(PlayerId, &'a TurnState), RejectReason> {
    if game.is_game_over() {
        return Err(RejectReason::GameOver);
    }
    let player = event.context().player("player")?;
    let turn = turn.ok_or(RejectReason::NoActiveTurn)?;
    if player != turn.player {
        return Err(RejectReason::NotYourTurn {
            expected: turn.player,
            actual: player,
        });
    }
    Ok((player, turn))
}

fn require_phase(event: &Event, turn: &TurnState, phase: TurnPhase) -> Result<(), RejectReason> {
    if turn.phase == phase {
        Ok(())
    } else {
        Err(RejectReason::WrongPhase {
            action: event.name(),
            phase: turn.phase,
        })
    }
}

fn territory(game: &GameState, id: TerritoryId) -> Result<&Territory, RejectReason> {
    game.board.get(id).ok_or(RejectReason::UnknownTerritory(id))
}

fn owned(game: &GameState, id: TerritoryId, player: PlayerId) -> Result<&Territory, RejectReason> {
    let t = territory(game, id)?;
    if t.owner == player {
        Ok(t)
    } else {
        Err(RejectReason::NotOwner {
            territory: id,
            player,
        })
    }
}

fn game_start(
    _event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    _dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    if game.is_game_over() {
        return Err(RejectReason::GameOver);
    }
    if turn.is_some() {
        return Err(RejectReason::TurnInProgress);
    }
    if game.active_count() <= 1 {
        return Ok(Outcome::Terminal {
            effects: Vec::new(),
            winner: game.sole_survivor(),
        });
    }
    Ok(Outcome::Applied {
        effects: Vec::new(),
        follow_ups: vec![Intent::turn_start(game.current_player)],
    })
}

fn turn_start(
    event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    _dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    if game.is_game_over() {
        return Err(RejectReason::GameOver);
    }
    if turn.is_some() {
        return Err(RejectReason::TurnInProgress);
    }
    let player = event.context().player("player")?;
    let entry = game.player(player).ok_or(RejectReason::UnknownPlayer(player))?;
    if entry.is_eliminated() {
        return Err(RejectReason::PlayerEliminated(player));
    }
    if player != game.current_player {
        return Err(RejectReason::NotYourTurn {
            expected: game.current_player,
            actual: player,
        });
    }
    Ok(Outcome::apply(vec![Effect::StartTurn {
        player,
        reinforcements: game.reinforcements(player),
    }]))
}

fn place_troop(
    event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    _dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    let (player, turn) = acting(event, game, turn)?;
    require_phase(event, turn, TurnPhase::Placement)?;

    let ctx = event.context();
    let id = ctx.territory("territory")?;
    let count = ctx.count_or("army_count", 1)?;
    owned(game, id, player)?;
    if count == 0 {
        return Err(RejectReason::InvalidArmyCount(count));
    }
    if count > turn.reinforcements_remaining {
        return Err(RejectReason::InsufficientReinforcements {
            remaining: turn.reinforcements_remaining,
            requested: count,
        });
    }

    let mut effects = vec![Effect::PlaceArmies {
        territory: id,
        count,
    }];
    if count == turn.reinforcements_remaining {
        effects.push(Effect::AdvancePhase(TurnPhase::Attacking));
    }
    Ok(Outcome::apply(effects))
}

fn attack(
    event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    _dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    let (player, turn) = acting(event, game, turn)?;
    require_phase(event, turn, TurnPhase::Attacking)?;

    let ctx = event.context();
    let from = ctx.territory("attacker_territory")?;
    let to = ctx.territory("defender_territory")?;
    let count = ctx.count("army_count")?;

    let source = owned(game, from, player)?;
    let target = territory(game, to)?;
    if target.owner == player {
        return Err(RejectReason::OwnTerritory(to));
    }
    if !source.is_adjacent_to(to) {
        return Err(RejectReason::NotAdjacent { from, to });
    }
    if count == 0 {
        return Err(RejectReason::InvalidArmyCount(count));
    }
    if count >= source.armies {
        return Err(RejectReason::InsufficientArmies {
            territory: from,
            available: source.armies,
            requested: count,
        });
    }

    let mut effects = Vec::with_capacity(2);
    if turn.fight.is_some() {
        effects.push(Effect::CloseFight);
    }
    effects.push(Effect::OpenFight(FightSession::new(
        player,
        target.owner,
        from,
        to,
        count,
        source.armies,
        target.armies,
    )));
    Ok(Outcome::apply(effects))
}

fn resolve_attack_round(
    event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    let (player, turn) = acting(event, game, turn)?;
    require_phase(event, turn, TurnPhase::Attacking)?;

    let session = turn.fight.as_ref().ok_or(RejectReason::NoActiveAttack)?;
    if !session.can_continue() {
        return Err(RejectReason::AttackExhausted);
    }
    let round = session
        .fight_round(&game.rules, dice)
        .map_err(|_| RejectReason::AttackExhausted)?;

    let mut after = session.clone();
    if after.record(&round).is_err() {
        // Applying the round re-records it and halts the engine.
        return Ok(Outcome::apply(vec![Effect::ApplyRound(round)]));
    }

    let mut effects = vec![Effect::ApplyRound(round)];
    let mut follow_ups = Vec::new();
    if after.is_conquest() {
        follow_ups.push(Intent::conquest(
            player,
            after.attacker,
            after.defender,
            after.committed_remaining(),
        ));
    } else if !after.can_continue() {
        effects.push(Effect::CloseFight);
    }
    Ok(Outcome::Applied {
        effects,
        follow_ups,
    })
}

fn conquest(
    event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    _dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    let (player, turn) = acting(event, game, turn)?;
    require_phase(event, turn, TurnPhase::Attacking)?;

    let ctx = event.context();
    let from = ctx.territory("attacker_territory")?;
    let to = ctx.territory("defender_territory")?;
    let count = ctx.count("army_count")?;

    let session = turn.fight.as_ref().ok_or(RejectReason::NoActiveAttack)?;
    if session.attacker != from || session.defender != to {
        return Err(RejectReason::SessionMismatch);
    }
    let source = owned(game, from, player)?;
    let target = territory(game, to)?;
    if target.armies > 0 || !session.is_conquest() {
        return Err(RejectReason::DefenderNotDefeated(to));
    }
    if count == 0 {
        return Err(RejectReason::InvalidArmyCount(count));
    }
    if count >= source.armies {
        return Err(RejectReason::InsufficientArmies {
            territory: from,
            available: source.armies,
            requested: count,
        });
    }

    let loser = target.owner;
    let mut effects = vec![Effect::Conquer {
        from,
        to,
        player,
        relocate: count,
    }];
    if game.board.count_owned(loser) == 1 {
        effects.push(Effect::Eliminate(loser));
    }
    Ok(Outcome::apply(effects))
}

fn end_attack(
    event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    _dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    let (_, turn) = acting(event, game, turn)?;
    require_phase(event, turn, TurnPhase::Attacking)?;

    let mut effects = Vec::with_capacity(2);
    if turn.fight.is_some() {
        effects.push(Effect::CloseFight);
    }
    effects.push(Effect::AdvancePhase(TurnPhase::Moving));
    Ok(Outcome::apply(effects))
}

fn move_troops(
    event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    _dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    let (player, turn) = acting(event, game, turn)?;
    require_phase(event, turn, TurnPhase::Moving)?;
    if turn.moves_left(&game.rules) == 0 {
        return Err(RejectReason::MoveLimitReached {
            limit: game.rules.moves_per_turn,
        });
    }

    let ctx = event.context();
    let from = ctx.territory("source_territory")?;
    let to = ctx.territory("target_territory")?;
    let count = ctx.count("army_count")?;

    let source = owned(game, from, player)?;
    owned(game, to, player)?;
    if !source.is_adjacent_to(to) {
        return Err(RejectReason::NotAdjacent { from, to });
    }
    if count == 0 {
        return Err(RejectReason::InvalidArmyCount(count));
    }
    if count >= source.armies {
        return Err(RejectReason::InsufficientArmies {
            territory: from,
            available: source.armies,
            requested: count,
        });
    }

    Ok(Outcome::apply(vec![Effect::TransferArmies {
        from,
        to,
        count,
    }]))
}

fn end_turn(
    event: &Event,
    game: &GameState,
    turn: Option<&TurnState>,
    _dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    let (player, turn) = acting(event, game, turn)?;
    let forfeit = event.context().flag("forfeit")?;
    if !forfeit && turn.phase == TurnPhase::Placement && turn.reinforcements_remaining > 0 {
        return Err(RejectReason::ReinforcementsRemaining(turn.reinforcements_remaining));
    }

    if game.active_count() <= 1 {
        return Ok(Outcome::Terminal {
            effects: vec![Effect::EndTurn {
                next_player: player,
            }],
            winner: game.sole_survivor(),
        });
    }

    let next_player = game.next_player_after(player).unwrap_or(player);
    Ok(Outcome::Applied {
        effects: vec![Effect::EndTurn { next_player }],
        follow_ups: vec![Intent::turn_start(next_player)],
    })
}

#[allow(clippy::unnecessary_wraps)]
fn rejected(
    _event: &Event,
    _game: &GameState,
    _turn: Option<&TurnState>,
    _dice: &mut dyn DiceSource,
) -> Result<Outcome, RejectReason> {
    Ok(Outcome::apply(Vec::new()))
}
