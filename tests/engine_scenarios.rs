//! Integration tests for the simulation loop.
//!
//! Each test drives a small hand-built board through the public API only.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use conquest::engine::{RunStatus, Simulation};
use conquest::event::{EventName, Intent};
use conquest::game::{Board, GameState, Player, ScriptedDice, Territory, TurnPhase};
use conquest::{RejectReason, Rules};

fn players() -> Vec<Player> {
    vec![Player::new(1, "Red"), Player::new(2, "Blue")]
}

/// 3 (P1, 1) - 1 (P1, 3) - 2 (P2, 2)
fn duel(dice: ScriptedDice) -> Simulation {
    let mut board = Board::new();
    board.insert(Territory::new(1, 1, 3));
    board.insert(Territory::new(2, 2, 2));
    board.insert(Territory::new(3, 1, 1));
    board.connect(1, 2);
    board.connect(1, 3);
    let state = GameState::new(board, players(), Rules::default()).unwrap();
    let mut sim = Simulation::new(state, dice);
    sim.run().unwrap();
    sim
}

fn submit(sim: &mut Simulation, intent: Intent) -> RunStatus {
    sim.submit(intent).unwrap();
    sim.run().unwrap()
}

/// Submit an action that must be refused, and check nothing changed.
fn submit_rejected(sim: &mut Simulation, intent: Intent) -> RejectReason {
    let game = sim.game().clone();
    let turn = sim.turn().cloned();
    let event = sim.submit(intent).unwrap();
    sim.run().unwrap();

    let rejection = sim.last_rejection().unwrap();
    assert_eq!(rejection.sequence, event.sequence());
    assert_eq!(sim.game(), &game);
    assert_eq!(sim.turn(), turn.as_ref());
    rejection.reason.clone()
}

#[test]
fn test_three_armies_against_two_conquers() {
    let mut sim = duel(ScriptedDice::new([6, 5, 4], [3, 2]));
    // Keep the attacking stack at 3 armies.
    submit(&mut sim, Intent::place_troop(1, 3, 3));
    submit(&mut sim, Intent::attack(1, 1, 2, 2));
    let status = submit(&mut sim, Intent::resolve_attack_round(1));

    let fight = sim.view().last_fight().unwrap().clone();
    let round = &fight.history[0];
    assert_eq!(round.attacker_dice, vec![6, 5]);
    assert_eq!(round.defender_dice, vec![3, 2]);
    assert_eq!(round.defender_losses, 2);
    assert_eq!(round.attacker_losses, 0);

    let board = &sim.game().board;
    let conquered = board.get(2).unwrap();
    assert_eq!(conquered.owner, 1);
    assert!(conquered.armies >= 1);
    assert!(board.get(1).unwrap().armies >= 1);
    assert_eq!(board.get(1).unwrap().armies + conquered.armies, 3);

    // Blue is out, but the game only ends when Red ends the turn.
    assert!(!sim.game().is_active(2));
    assert_eq!(
        status,
        RunStatus::AwaitingDecision {
            player: 1,
            phase: TurnPhase::Attacking
        }
    );
    assert!(!sim.is_game_over());

    assert_eq!(
        submit(&mut sim, Intent::end_turn(1)),
        RunStatus::GameOver { winner: Some(1) }
    );
    assert_eq!(sim.submit(Intent::end_turn(1)), Err(RejectReason::GameOver));
}

#[test]
fn test_reinforcements_follow_territory_count() {
    let mut board = Board::new();
    for id in 1..=9 {
        board.insert(Territory::new(id, 1, 1));
        if id > 1 {
            board.connect(id - 1, id);
        }
    }
    board.insert(Territory::new(10, 2, 1));
    board.connect(9, 10);
    let state = GameState::new(board, players(), Rules::default()).unwrap();
    let mut sim = Simulation::seeded(state, 3);
    sim.run().unwrap();

    assert_eq!(sim.view().reinforcements_remaining(), 3);
    assert_eq!(
        submit_rejected(&mut sim, Intent::place_troop(1, 1, 5)),
        RejectReason::InsufficientReinforcements {
            remaining: 3,
            requested: 5
        }
    );

    let status = submit(&mut sim, Intent::place_troop(1, 1, 3));
    assert_eq!(
        status,
        RunStatus::AwaitingDecision {
            player: 1,
            phase: TurnPhase::Attacking
        }
    );
    assert_eq!(sim.game().board.get(1).unwrap().armies, 4);
}

#[test]
fn test_move_from_single_army_is_rejected() {
    let mut sim = duel(ScriptedDice::new([], []));
    submit(&mut sim, Intent::place_troop(1, 1, 3));
    submit(&mut sim, Intent::end_attack(1));
    assert_eq!(sim.view().phase(), Some(TurnPhase::Moving));

    assert!(matches!(
        submit_rejected(&mut sim, Intent::move_troops(1, 3, 1, 1)),
        RejectReason::InsufficientArmies {
            territory: 3,
            available: 1,
            requested: 1
        }
    ));

    submit(&mut sim, Intent::move_troops(1, 1, 3, 5));
    assert_eq!(sim.game().board.get(1).unwrap().armies, 1);
    assert_eq!(sim.game().board.get(3).unwrap().armies, 6);
}

#[test]
fn test_phases_advance_in_order() {
    let mut sim = duel(ScriptedDice::new([], []));

    assert!(matches!(
        submit_rejected(&mut sim, Intent::end_turn(1)),
        RejectReason::ReinforcementsRemaining(3)
    ));
    assert!(matches!(
        submit_rejected(&mut sim, Intent::end_attack(1)),
        RejectReason::WrongPhase { .. }
    ));
    assert!(matches!(
        submit_rejected(&mut sim, Intent::move_troops(1, 1, 3, 1)),
        RejectReason::WrongPhase { .. }
    ));

    submit(&mut sim, Intent::place_troop(1, 1, 3));
    submit(&mut sim, Intent::end_attack(1));
    assert!(matches!(
        submit_rejected(&mut sim, Intent::attack(1, 1, 2, 1)),
        RejectReason::WrongPhase { .. }
    ));

    let status = submit(&mut sim, Intent::end_turn(1));
    assert_eq!(
        status,
        RunStatus::AwaitingDecision {
            player: 2,
            phase: TurnPhase::Placement
        }
    );
    assert_eq!(sim.game().turn, 1);
    assert_eq!(sim.game().round, 0);
}

#[test]
fn test_out_of_turn_and_internal_events_are_refused() {
    let mut sim = duel(ScriptedDice::new([], []));

    assert!(matches!(
        submit_rejected(&mut sim, Intent::place_troop(2, 2, 1)),
        RejectReason::NotYourTurn {
            expected: 1,
            actual: 2
        }
    ));
    assert_eq!(
        sim.submit(Intent::new(EventName::TurnStart, conquest::Context::new())),
        Err(RejectReason::NotAnAction(EventName::TurnStart))
    );
}

#[test]
fn test_rejection_event_is_recorded_on_tape() {
    let mut sim = duel(ScriptedDice::new([], []));
    let before = sim.tape().len();
    submit_rejected(&mut sim, Intent::end_attack(1));

    let names: Vec<EventName> = sim.tape()[before..].iter().map(|e| e.event.name()).collect();
    assert_eq!(names, vec![EventName::EndAttack, EventName::Rejected]);
    let rejected = &sim.tape()[before + 1].event;
    assert_eq!(rejected.context().text("action"), Some("end_attack"));
    assert_eq!(rejected.context().text("reason"), Some("wrong_phase"));
}

#[test]
fn test_forfeit_discards_reinforcements() {
    let mut sim = duel(ScriptedDice::new([], []));
    sim.forfeit(1).unwrap();
    let status = sim.run().unwrap();
    assert_eq!(
        status,
        RunStatus::AwaitingDecision {
            player: 2,
            phase: TurnPhase::Placement
        }
    );
    assert_eq!(sim.game().board.total_armies(), 6);
    assert_eq!(sim.game().ledger.placed, 0);
}
