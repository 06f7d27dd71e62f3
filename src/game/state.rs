//! Game state management.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, Rules};
use crate::game::{Board, Player, PlayerId, TerritoryId, reinforcements_for};

/// Maximum number of players in a game.
pub const MAX_PLAYERS: usize = 8;

/// Whether the game is still being played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Turns are being taken.
    Playing,
    /// A winner has been decided; no further events are accepted.
    GameEnd,
}

/// Running account of armies entering and leaving the board.
///
/// At every quiescent point `initial + placed - lost` equals the armies on the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmyLedger {
    /// Armies on the board at setup.
    pub initial: u64,
    /// Reinforcements placed since.
    pub placed: u64,
    /// Armies lost in combat.
    pub lost: u64,
}

impl ArmyLedger {
    /// Armies the board should hold.
    #[must_use]
    pub const fn expected_on_board(&self) -> u64 {
        self.initial.saturating_add(self.placed).saturating_sub(self.lost)
    }
}

/// An initial state the engine refuses to run.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Fewer than two players.
    #[error("need at least 2 players, got {0}")]
    TooFewPlayers(usize),
    /// More players than the engine supports.
    #[error("at most {MAX_PLAYERS} players supported, got {0}")]
    TooManyPlayers(usize),
    /// Two roster entries share an id.
    #[error("duplicate player id {0}")]
    DuplicatePlayer(PlayerId),
    /// Two territories share an id.
    #[error("duplicate territory id {0}")]
    DuplicateTerritory(TerritoryId),
    /// The board has no territories.
    #[error("board has no territories")]
    EmptyBoard,
    /// A territory's owner is not in the roster.
    #[error("territory {territory} is owned by unknown player {owner}")]
    UnknownOwner {
        /// Territory concerned.
        territory: TerritoryId,
        /// Owner named.
        owner: PlayerId,
    },
    /// A territory starts with no armies.
    #[error("territory {0} has no armies")]
    EmptyTerritory(TerritoryId),
    /// A territory lists itself as a neighbour.
    #[error("territory {0} is adjacent to itself")]
    SelfAdjacent(TerritoryId),
    /// A territory lists a neighbour that does not exist.
    #[error("territory {territory} borders unknown territory {neighbor}")]
    UnknownNeighbor {
        /// Territory concerned.
        territory: TerritoryId,
        /// Missing neighbour.
        neighbor: TerritoryId,
    },
    /// A continent lists a territory that does not exist.
    #[error("continent {continent} includes unknown territory {territory}")]
    UnknownContinentMember {
        /// Continent concerned.
        continent: String,
        /// Missing territory.
        territory: TerritoryId,
    },
    /// A border is recorded on one side only.
    #[error("border {a}-{b} is not symmetric")]
    AsymmetricBorder {
        /// Side listing the border.
        a: TerritoryId,
        /// Side missing it.
        b: TerritoryId,
    },
    /// The first player named is not an active roster member.
    #[error("first player {0} is not an active player")]
    InvalidFirstPlayer(PlayerId),
    /// The rules are unusable.
    #[error(transparent)]
    Rules(#[from] ConfigError),
}

/// Complete game state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// The board.
    pub board: Board,
    /// Roster in rotation order.
    pub players: Vec<Player>,
    /// Player whose turn it is.
    pub current_player: PlayerId,
    /// Player-turns completed.
    pub turn: u32,
    /// Full rotations of the roster completed.
    pub round: u32,
    /// Playing or ended.
    pub phase: GamePhase,
    /// Winner once the game has ended.
    pub winner: Option<PlayerId>,
    /// Rules in force.
    pub rules: Rules,
    /// Army accounting.
    pub ledger: ArmyLedger,
}

impl GameState {
    /// Validate and build a game state. Players owning no territory start eliminated.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] describing the first problem found.
    pub fn new(board: Board, mut players: Vec<Player>, rules: Rules) -> Result<Self, SetupError> {
        rules.validate()?;

        if players.len() < 2 {
            return Err(SetupError::TooFewPlayers(players.len()));
        }
        if players.len() > MAX_PLAYERS {
            return Err(SetupError::TooManyPlayers(players.len()));
        }

        let mut ids = BTreeSet::new();
        for player in &players {
            if !ids.insert(player.id) {
                return Err(SetupError::DuplicatePlayer(player.id));
            }
        }

        if board.is_empty() {
            return Err(SetupError::EmptyBoard);
        }

        for territory in board.iter() {
            if !ids.contains(&territory.owner) {
                return Err(SetupError::UnknownOwner {
                    territory: territory.id,
                    owner: territory.owner,
                });
            }
            if territory.armies == 0 {
                return Err(SetupError::EmptyTerritory(territory.id));
            }
            for &neighbor in &territory.adjacent {
                if neighbor == territory.id {
                    return Err(SetupError::SelfAdjacent(territory.id));
                }
                let Some(other) = board.get(neighbor) else {
                    return Err(SetupError::UnknownNeighbor {
                        territory: territory.id,
                        neighbor,
                    });
                };
                if !other.is_adjacent_to(territory.id) {
                    return Err(SetupError::AsymmetricBorder {
                        a: territory.id,
                        b: neighbor,
                    });
                }
            }
        }

        for player in &mut players {
            player.active = board.count_owned(player.id) > 0;
        }

        // Validation above guarantees some territory has a roster owner.
        let current_player = players
            .iter()
            .find(|p| p.active)
            .map_or(players[0].id, |p| p.id);

        let ledger = ArmyLedger {
            initial: board.total_armies(),
            placed: 0,
            lost: 0,
        };

        let mut state = Self {
            board,
            players,
            current_player,
            turn: 0,
            round: 0,
            phase: GamePhase::Playing,
            winner: None,
            rules,
            ledger,
        };
        state.refresh_player_stats();
        Ok(state)
    }

    /// Hand the first turn to `player` instead of the first active roster entry.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError::InvalidFirstPlayer`] if `player` is not active.
    pub fn with_first_player(mut self, player: PlayerId) -> Result<Self, SetupError> {
        if !self.is_active(player) {
            return Err(SetupError::InvalidFirstPlayer(player));
        }
        self.current_player = player;
        Ok(self)
    }

    /// Player by id.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Mutable player by id.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Whether `id` is in the roster and not eliminated.
    #[must_use]
    pub fn is_active(&self, id: PlayerId) -> bool {
        self.player(id).is_some_and(|p| p.active)
    }

    /// Players still in the game, in roster order.
    pub fn active_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.active)
    }

    /// Number of players still in the game.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_players().count()
    }

    /// The last player standing, if exactly one remains.
    #[must_use]
    pub fn sole_survivor(&self) -> Option<PlayerId> {
        let mut active = self.active_players();
        let first = active.next()?;
        active.next().is_none().then_some(first.id)
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameEnd
    }

    /// Reinforcements `player` receives at the start of a turn.
    #[must_use]
    pub fn reinforcements(&self, player: PlayerId) -> u32 {
        let base = reinforcements_for(self.board.count_owned(player), &self.rules);
        base.saturating_add(self.board.continent_bonus(player))
    }

    /// Next active player after `id` in roster order, wrapping around.
    ///
    /// Returns `id` itself if nobody else is active.
    #[must_use]
    pub fn next_player_after(&self, id: PlayerId) -> Option<PlayerId> {
        let start = self.players.iter().position(|p| p.id == id)?;
        let n = self.players.len();
        (1..=n)
            .map(|offset| &self.players[(start + offset) % n])
            .find(|p| p.active)
            .map(|p| p.id)
    }

    /// Advance the turn counters and hand the turn to `next`.
    ///
    /// The round counter increments when rotation wraps back to the start of the roster.
    pub fn pass_turn(&mut self, next: PlayerId) {
        let position = |id: PlayerId| self.players.iter().position(|p| p.id == id);
        let wrapped = matches!(
            (position(self.current_player), position(next)),
            (Some(from), Some(to)) if to <= from
        );
        if wrapped {
            self.round = self.round.saturating_add(1);
        }
        self.turn = self.turn.saturating_add(1);
        self.current_player = next;
    }

    /// End the game.
    pub const fn finish(&mut self, winner: Option<PlayerId>) {
        self.phase = GamePhase::GameEnd;
        self.winner = winner;
    }

    /// Recompute each player's territory and army totals from the board.
    pub fn refresh_player_stats(&mut self) {
        for player in &mut self.players {
            player.territories = self.board.count_owned(player.id);
            player.armies = u32::try_from(self.board.armies_of(player.id)).unwrap_or(u32::MAX);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Territory;

    fn board(owners: &[(TerritoryId, PlayerId, u32)]) -> Board {
        let mut board = Board::new();
        for &(id, owner, armies) in owners {
            board.insert(Territory::new(id, owner, armies));
        }
        board
    }

    fn roster(ids: &[PlayerId]) -> Vec<Player> {
        ids.iter().map(|&id| Player::new(id, format!("P{id}"))).collect()
    }

    #[test]
    fn test_new_state() {
        let mut b = board(&[(1, 1, 3), (2, 2, 2)]);
        b.connect(1, 2);
        let state = GameState::new(b, roster(&[1, 2]), Rules::default()).unwrap();

        assert_eq!(state.current_player, 1);
        assert_eq!(state.turn, 0);
        assert_eq!(state.round, 0);
        assert_eq!(state.ledger.initial, 5);
        assert_eq!(state.player(1).map(|p| p.armies), Some(3));
        assert!(!state.is_game_over());
    }

    #[test]
    fn test_landless_players_start_eliminated() {
        let b = board(&[(1, 1, 1), (2, 3, 1)]);
        let state = GameState::new(b, roster(&[1, 2, 3]), Rules::default()).unwrap();
        assert!(!state.is_active(2));
        assert_eq!(state.active_count(), 2);
    }

    #[test]
    fn test_setup_errors() {
        let b = board(&[(1, 1, 1)]);
        assert!(matches!(
            GameState::new(b.clone(), roster(&[1]), Rules::default()),
            Err(SetupError::TooFewPlayers(1))
        ));
        assert!(matches!(
            GameState::new(b.clone(), roster(&[1, 1]), Rules::default()),
            Err(SetupError::DuplicatePlayer(1))
        ));
        assert!(matches!(
            GameState::new(board(&[(1, 9, 1)]), roster(&[1, 2]), Rules::default()),
            Err(SetupError::UnknownOwner { owner: 9, .. })
        ));
        assert!(matches!(
            GameState::new(board(&[(1, 1, 0)]), roster(&[1, 2]), Rules::default()),
            Err(SetupError::EmptyTerritory(1))
        ));

        let mut dangling = board(&[(1, 1, 1)]);
        if let Some(t) = dangling.get_mut(1) {
            t.adjacent.insert(5);
        }
        assert!(matches!(
            GameState::new(dangling, roster(&[1, 2]), Rules::default()),
            Err(SetupError::UnknownNeighbor { neighbor: 5, .. })
        ));
    }

    #[test]
    fn test_rotation_skips_eliminated() {
        let b = board(&[(1, 1, 1), (2, 2, 1), (3, 3, 1)]);
        let mut state = GameState::new(b, roster(&[1, 2, 3]), Rules::default()).unwrap();
        assert_eq!(state.next_player_after(1), Some(2));
        assert_eq!(state.next_player_after(3), Some(1));

        if let Some(p) = state.player_mut(2) {
            p.eliminate();
        }
        assert_eq!(state.next_player_after(1), Some(3));
    }

    #[test]
    fn test_pass_turn_counts_rounds() {
        let b = board(&[(1, 1, 1), (2, 2, 1)]);
        let mut state = GameState::new(b, roster(&[1, 2]), Rules::default()).unwrap();
        state.pass_turn(2);
        assert_eq!((state.turn, state.round), (1, 0));
        state.pass_turn(1);
        assert_eq!((state.turn, state.round), (2, 1));
    }

    #[test]
    fn test_reinforcements_include_continent_bonus() {
        let mut b = board(&[(1, 1, 1), (2, 1, 1), (3, 2, 1)]);
        b.add_continent(crate::game::Continent {
            name: "North".to_string(),
            territories: [1, 2].into_iter().collect(),
            bonus: 2,
        });
        let state = GameState::new(b, roster(&[1, 2]), Rules::default()).unwrap();
        assert_eq!(state.reinforcements(1), 5);
        assert_eq!(state.reinforcements(2), 3);
    }

    #[test]
    fn test_sole_survivor() {
        let b = board(&[(1, 1, 1), (2, 2, 1)]);
        let mut state = GameState::new(b, roster(&[1, 2]), Rules::default()).unwrap();
        assert_eq!(state.sole_survivor(), None);
        if let Some(p) = state.player_mut(2) {
            p.eliminate();
        }
        assert_eq!(state.sole_survivor(), Some(1));
    }
}
