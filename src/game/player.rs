//! Player roster entries.

use serde::{Deserialize, Serialize};

/// Unique identifier for a player.
pub type PlayerId = u8;

/// State for a single player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier for this player.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Whether the player is still in the game.
    pub active: bool,
    /// Territories owned, refreshed after every event.
    pub territories: u32,
    /// Armies on the board, refreshed after every event.
    pub armies: u32,
}

impl Player {
    /// Create an active player with no holdings recorded yet.
    #[must_use]
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            active: true,
            territories: 0,
            armies: 0,
        }
    }

    /// Eliminate this player.
    pub const fn eliminate(&mut self) {
        self.active = false;
    }

    /// Whether this player has been eliminated.
    #[must_use]
    pub const fn is_eliminated(&self) -> bool {
        !self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let player = Player::new(1, "Red");
        assert_eq!(player.id, 1);
        assert_eq!(player.name, "Red");
        assert!(player.active);
        assert_eq!(player.territories, 0);
    }

    #[test]
    fn test_player_elimination() {
        let mut player = Player::new(2, "Blue");
        assert!(!player.is_eliminated());
        player.eliminate();
        assert!(player.is_eliminated());
    }
}
