//! Deterministic board generation for tournaments.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::game::{MAX_PLAYERS, PlayerId, TerritoryId};
use crate::scenario::{PlayerSpec, Scenario, TerritorySpec};

/// Error type for board generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapGenError {
    /// Fewer than two players requested.
    #[error("need at least 2 players, got {0}")]
    TooFewPlayers(usize),
    /// More players than supported.
    #[error("at most {MAX_PLAYERS} players supported, got {0}")]
    TooManyPlayers(usize),
    /// The grid does not fit in territory ids.
    #[error("grid {width}x{height} is too large")]
    GridTooLarge {
        /// Requested width.
        width: u16,
        /// Requested height.
        height: u16,
    },
    /// Not every player would get a territory.
    #[error("{territories} territories cannot be shared among {players} players")]
    BoardTooSmall {
        /// Territories on the grid.
        territories: usize,
        /// Players requested.
        players: usize,
    },
    /// Starting armies do not cover one per territory.
    #[error("{starting} starting armies cannot cover {needed} territories")]
    NotEnoughArmies {
        /// Territories the largest holding has.
        needed: usize,
        /// Armies each player starts with.
        starting: u32,
    },
}

/// Generate a `width` x `height` grid scenario for `num_players`.
///
/// Territories border their four orthogonal neighbours. Ownership is dealt
/// round-robin over a shuffled order, and each player's `starting_armies`
/// are spread at random over their territories with at least one on each.
///
/// # Errors
///
/// Returns [`MapGenError`] if the parameters cannot produce a legal board.
pub fn generate_scenario(
    seed: u64,
    width: u16,
    height: u16,
    num_players: usize,
    starting_armies: u32,
) -> Result<Scenario, MapGenError> {
    if num_players < 2 {
        return Err(MapGenError::TooFewPlayers(num_players));
    }
    if num_players > MAX_PLAYERS {
        return Err(MapGenError::TooManyPlayers(num_players));
    }
    let count = usize::from(width) * usize::from(height);
    if TerritoryId::try_from(count).is_err() {
        return Err(MapGenError::GridTooLarge { width, height });
    }
    if count < num_players {
        return Err(MapGenError::BoardTooSmall {
            territories: count,
            players: num_players,
        });
    }
    let per_player = count.div_ceil(num_players);
    if usize::try_from(starting_armies).is_ok_and(|armies| armies < per_player) {
        return Err(MapGenError::NotEnoughArmies {
            needed: per_player,
            starting: starting_armies,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let players: Vec<PlayerSpec> = (1..=num_players)
        .filter_map(|n| PlayerId::try_from(n).ok())
        .map(|id| PlayerSpec {
            id,
            name: format!("Player {id}"),
        })
        .collect();

    let mut territories: Vec<TerritorySpec> = Vec::with_capacity(count);
    for row in 0..height {
        for col in 0..width {
            let id = row * width + col;
            let mut adjacent = Vec::with_capacity(4);
            if row > 0 {
                adjacent.push(id - width);
            }
            if col > 0 {
                adjacent.push(id - 1);
            }
            if col + 1 < width {
                adjacent.push(id + 1);
            }
            if row + 1 < height {
                adjacent.push(id + width);
            }
            territories.push(TerritorySpec {
                id,
                name: format!("r{row}c{col}"),
                owner: 0,
                armies: 1,
                adjacent,
            });
        }
    }

    let mut order: Vec<usize> = (0..count).collect();
    order.shuffle(&mut rng);
    for (deal, &index) in order.iter().enumerate() {
        territories[index].owner = players[deal % num_players].id;
    }

    for player in &players {
        let owned: Vec<usize> = territories
            .iter()
            .enumerate()
            .filter(|(_, t)| t.owner == player.id)
            .map(|(i, _)| i)
            .collect();
        let placed = u32::try_from(owned.len()).unwrap_or(u32::MAX);
        for _ in 0..starting_armies.saturating_sub(placed) {
            let index = owned[rng.gen_range(0..owned.len())];
            territories[index].armies += 1;
        }
    }

    Ok(Scenario {
        name: format!("grid-{width}x{height}-{seed}"),
        players,
        territories,
        continents: Vec::new(),
        first_player: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;

    #[test]
    fn test_generate_is_deterministic() {
        let a = generate_scenario(42, 6, 7, 3, 20).unwrap();
        let b = generate_scenario(42, 6, 7, 3, 20).unwrap();
        assert_eq!(a, b);
        let c = generate_scenario(43, 6, 7, 3, 20).unwrap();
        assert_ne!(a.territories, c.territories);
    }

    #[test]
    fn test_generated_board_is_playable() {
        let scenario = generate_scenario(7, 5, 4, 4, 10).unwrap();
        let state = scenario.build(Rules::default()).unwrap();
        assert_eq!(state.board.len(), 20);
        assert_eq!(state.active_count(), 4);
        for player in &state.players {
            assert_eq!(player.territories, 5);
            assert_eq!(player.armies, 10);
        }
        assert!(state.board.are_adjacent(0, 1));
        assert!(state.board.are_adjacent(0, 5));
        assert!(!state.board.are_adjacent(4, 5));
    }

    #[test]
    fn test_generation_errors() {
        assert_eq!(
            generate_scenario(1, 4, 4, 1, 10),
            Err(MapGenError::TooFewPlayers(1))
        );
        assert_eq!(
            generate_scenario(1, 4, 4, 9, 10),
            Err(MapGenError::TooManyPlayers(9))
        );
        assert_eq!(
            generate_scenario(1, 1, 2, 3, 10),
            Err(MapGenError::BoardTooSmall {
                territories: 2,
                players: 3
            })
        );
        assert_eq!(
            generate_scenario(1, 6, 7, 2, 20),
            Err(MapGenError::NotEnoughArmies {
                needed: 21,
                starting: 20
            })
        );
    }
}
