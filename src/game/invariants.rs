//! Game invariants - sanity checks that detect engine bugs.
//!
//! These hold at every quiescent point (stack empty). Rules validation keeps
//! illegal events out, so a violation here always means the engine itself
//! mutated state incorrectly.

use crate::game::{GamePhase, GameState};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invariant violation: {message}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    /// Violation with the given description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    for territory in state.board.iter() {
        if state.player(territory.owner).is_none() {
            violations.push(InvariantViolation::new(format!(
                "Territory {} owned by unknown player {}",
                territory.id, territory.owner
            )));
        }
        if territory.armies == 0 {
            violations.push(InvariantViolation::new(format!(
                "Territory {} has no armies",
                territory.id
            )));
        }
        for &neighbor in &territory.adjacent {
            if !state.board.are_adjacent(neighbor, territory.id) {
                violations.push(InvariantViolation::new(format!(
                    "Border {}-{} is not symmetric",
                    territory.id, neighbor
                )));
            }
        }
    }

    for player in &state.players {
        let owned = state.board.count_owned(player.id);
        if player.active && owned == 0 {
            violations.push(InvariantViolation::new(format!(
                "Active player {} owns no territory",
                player.id
            )));
        }
        if !player.active && owned > 0 {
            violations.push(InvariantViolation::new(format!(
                "Dead player {} still owns {} territories",
                player.id, owned
            )));
        }
        if player.territories != owned {
            violations.push(InvariantViolation::new(format!(
                "Player {} records {} territories but owns {}",
                player.id, player.territories, owned
            )));
        }
    }

    let on_board = state.board.total_armies();
    let expected = state.ledger.expected_on_board();
    if on_board != expected {
        violations.push(InvariantViolation::new(format!(
            "Board holds {on_board} armies but the army ledger expects {expected}"
        )));
    }

    match state.phase {
        GamePhase::Playing => {
            if !state.is_active(state.current_player) {
                violations.push(InvariantViolation::new(format!(
                    "Current player {} is not active",
                    state.current_player
                )));
            }
            if state.winner.is_some() {
                violations.push(InvariantViolation::new("Winner set while still playing"));
            }
        }
        GamePhase::GameEnd => {
            if let Some(winner) = state.winner.filter(|w| !state.is_active(*w)) {
                violations.push(InvariantViolation::new(format!(
                    "Winner {winner} has been eliminated"
                )));
            }
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::game::{Board, Player, Territory};

    fn create_valid_game() -> GameState {
        let mut board = Board::new();
        board.insert(Territory::new(1, 1, 4));
        board.insert(Territory::new(2, 2, 2));
        board.connect(1, 2);
        let players = vec![Player::new(1, "Red"), Player::new(2, "Blue")];
        GameState::new(board, players, Rules::default()).unwrap()
    }

    #[test]
    fn test_valid_game_passes() {
        let game = create_valid_game();
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_empty_territory_detected() {
        let mut game = create_valid_game();
        if let Some(t) = game.board.get_mut(2) {
            t.armies = 0;
        }
        game.ledger.lost = 2;
        let violations = check_invariants(&game);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("no armies"));
    }

    #[test]
    fn test_ledger_mismatch_detected() {
        let mut game = create_valid_game();
        if let Some(t) = game.board.get_mut(1) {
            t.armies += 3;
        }
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("ledger")));
    }

    #[test]
    fn test_dead_player_with_territory_detected() {
        let mut game = create_valid_game();
        game.players[1].eliminate();

        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("Dead player")));
    }

    #[test]
    fn test_stale_player_totals_detected() {
        let mut game = create_valid_game();
        if let Some(t) = game.board.get_mut(2) {
            t.owner = 1;
        }
        let violations = check_invariants(&game);
        assert!(violations.iter().any(|v| v.message.contains("records")));
    }

    #[test]
    fn test_assert_passes_on_valid_game() {
        assert_invariants(&create_valid_game());
    }
}
