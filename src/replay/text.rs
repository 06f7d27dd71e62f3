//! Plain-text rendering of the simulation state.
//!
//! Readable by people and easy to diff between replay positions.

#![allow(clippy::format_push_string)]

use crate::engine::View;
use crate::game::{DiceRound, FightSession, GameState};

/// Render a view to structured text.
///
/// Output format:
/// ```text
/// === TURN 4 / ROUND 2 ===
/// Current: P1 (Red), attacking, 0 reinforcements left, 1 moves left
///
/// PLAYERS:
/// - P1 Red: 5 territories, 17 armies
/// - P2 Blue: ELIMINATED
///
/// TERRITORIES:
/// - [0] r0c0 P1 x3 | borders 1, 4
///
/// FIGHT: 3 (P1) -> 4 (P2), committed 5, attackers 4, defenders 1
///   round 1: [6, 5, 4] vs [3, 2] -> attacker -0, defender -2
/// ```
#[must_use]
pub fn render_text(view: &View<'_>) -> String {
    let mut output = String::new();
    let game = view.game();

    render_header(&mut output, view);
    render_players(&mut output, game);
    render_territories(&mut output, game);

    if let Some(fight) = view.fight() {
        render_fight(&mut output, "FIGHT", fight);
    } else if let Some(fight) = view.last_fight() {
        render_fight(&mut output, "LAST FIGHT", fight);
    }

    if let Some(rejection) = view.last_rejection() {
        let player = rejection
            .player
            .map_or_else(|| "-".to_string(), |p| format!("P{p}"));
        output.push_str(&format!(
            "LAST REJECTION: #{} {} by {}: {}\n",
            rejection.sequence, rejection.action, player, rejection.reason
        ));
    }

    if game.is_game_over() {
        match game.winner {
            Some(winner) => output.push_str(&format!("GAME OVER: winner P{winner}\n")),
            None => output.push_str("GAME OVER: no winner\n"),
        }
    }

    output
}

fn render_header(output: &mut String, view: &View<'_>) {
    let game = view.game();
    output.push_str(&format!(
        "=== TURN {} / ROUND {} ===\n",
        game.turn, game.round
    ));

    let player = view.player();
    let name = game.player(player).map_or("?", |p| p.name.as_str());
    match view.phase() {
        Some(phase) => output.push_str(&format!(
            "Current: P{player} ({name}), {phase}, {} reinforcements left, {} moves left\n\n",
            view.reinforcements_remaining(),
            view.moves_left()
        )),
        None => output.push_str(&format!("Current: P{player} ({name}), between turns\n\n")),
    }
}

fn render_players(output: &mut String, game: &GameState) {
    output.push_str("PLAYERS:\n");
    for player in &game.players {
        if player.is_eliminated() {
            output.push_str(&format!("- P{} {}: ELIMINATED\n", player.id, player.name));
        } else {
            output.push_str(&format!(
                "- P{} {}: {} territories, {} armies\n",
                player.id, player.name, player.territories, player.armies
            ));
        }
    }
    output.push('\n');
}

fn render_territories(output: &mut String, game: &GameState) {
    output.push_str("TERRITORIES:\n");
    for territory in game.board.iter() {
        let borders: Vec<String> = territory.adjacent.iter().map(ToString::to_string).collect();
        output.push_str(&format!(
            "- [{}] {} P{} x{} | borders {}\n",
            territory.id,
            territory.name,
            territory.owner,
            territory.armies,
            borders.join(", ")
        ));
    }
    output.push('\n');
}

fn render_fight(output: &mut String, label: &str, fight: &FightSession) {
    output.push_str(&format!(
        "{label}: {} (P{}) -> {} (P{}), committed {}, attackers {}, defenders {}\n",
        fight.attacker,
        fight.player,
        fight.defender,
        fight.defending_player,
        fight.committed,
        fight.attacking_armies,
        fight.defending_armies
    ));
    for (index, round) in fight.history.iter().enumerate() {
        output.push_str(&format!("  round {}: {}\n", index + 1, format_round(round)));
    }
    if fight.is_conquest() {
        output.push_str("  defender defeated\n");
    }
}

fn format_round(round: &DiceRound) -> String {
    format!(
        "{:?} vs {:?} -> attacker -{}, defender -{}",
        round.attacker_dice, round.defender_dice, round.attacker_losses, round.defender_losses
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::engine::Simulation;
    use crate::event::Intent;
    use crate::game::{Board, Player, ScriptedDice, Territory};

    fn sim() -> Simulation {
        let mut board = Board::new();
        board.insert(Territory::new(1, 1, 4).with_name("North"));
        board.insert(Territory::new(2, 2, 2).with_name("South"));
        board.connect(1, 2);
        let players = vec![Player::new(1, "Red"), Player::new(2, "Blue")];
        let state = GameState::new(board, players, Rules::default()).unwrap();
        let mut sim = Simulation::new(state, ScriptedDice::new([6, 5, 4], [3, 2]));
        sim.run().unwrap();
        sim
    }

    #[test]
    fn test_render_header_and_board() {
        let sim = sim();
        let text = render_text(&sim.view());
        assert!(text.starts_with("=== TURN 0 / ROUND 0 ===\n"));
        assert!(text.contains("Current: P1 (Red), placement, 3 reinforcements left"));
        assert!(text.contains("- P2 Blue: 1 territories, 2 armies"));
        assert!(text.contains("- [1] North P1 x4 | borders 2"));
    }

    #[test]
    fn test_render_fight_history_and_game_over() {
        let mut sim = sim();
        sim.submit(Intent::place_troop(1, 1, 3)).unwrap();
        sim.run().unwrap();
        sim.submit(Intent::attack(1, 1, 2, 6)).unwrap();
        sim.run().unwrap();
        sim.submit(Intent::resolve_attack_round(1)).unwrap();
        sim.run().unwrap();

        let text = render_text(&sim.view());
        assert!(text.contains("LAST FIGHT: 1 (P1) -> 2 (P2)"));
        assert!(text.contains("round 1: [6, 5, 4] vs [3, 2] -> attacker -0, defender -2"));
        assert!(text.contains("defender defeated"));
        assert!(text.contains("- P2 Blue: ELIMINATED"));
    }

    #[test]
    fn test_render_rejection() {
        let mut sim = sim();
        sim.submit(Intent::end_attack(1)).unwrap();
        sim.run().unwrap();
        let text = render_text(&sim.view());
        assert!(text.contains("LAST REJECTION: #"));
        assert!(text.contains("end_attack by P1"));
    }
}
