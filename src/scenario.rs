//! Scenario files: a roster, a board, and optional continents.
//!
//! Scenarios load from JSON or TOML. Adjacency may be listed on either side of
//! a border; loading makes every border symmetric.
//!
//! ```toml
//! [[players]]
//! id = 1
//! name = "Red"
//!
//! [[territories]]
//! id = 1
//! owner = 1
//! armies = 3
//! adjacent = [2]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Rules;
use crate::game::{
    Board, Continent, GameState, Player, PlayerId, SetupError, Territory, TerritoryId,
};

/// Roster entry in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSpec {
    /// Player id.
    pub id: PlayerId,
    /// Display name.
    #[serde(default)]
    pub name: String,
}

/// Territory in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritorySpec {
    /// Territory id.
    pub id: TerritoryId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Owning player.
    pub owner: PlayerId,
    /// Starting armies.
    pub armies: u32,
    /// Bordering territories.
    #[serde(default)]
    pub adjacent: Vec<TerritoryId>,
}

/// Continent in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinentSpec {
    /// Display name.
    pub name: String,
    /// Member territories.
    pub territories: Vec<TerritoryId>,
    /// Bonus reinforcements for owning every member.
    pub bonus: u32,
}

/// A complete starting position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    #[serde(default)]
    pub name: String,
    /// Roster in rotation order.
    pub players: Vec<PlayerSpec>,
    /// Board territories.
    pub territories: Vec<TerritorySpec>,
    /// Continents.
    #[serde(default)]
    pub continents: Vec<ContinentSpec>,
    /// Player who takes the first turn; defaults to the first active roster entry.
    #[serde(default)]
    pub first_player: Option<PlayerId>,
}

/// Errors raised while loading a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The file could not be read or written.
    #[error("scenario I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON.
    #[error("invalid JSON scenario: {0}")]
    Json(#[from] serde_json::Error),
    /// The file is not valid TOML.
    #[error("invalid TOML scenario: {0}")]
    Toml(#[from] toml::de::Error),
    /// The scenario describes an invalid game.
    #[error("invalid scenario: {0}")]
    Setup(#[from] SetupError),
}

impl Scenario {
    /// Load a scenario from a `.toml` or `.json` file.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path)?;
        if path.extension().is_some_and(|ext| ext == "toml") {
            Ok(toml::from_str(&text)?)
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }

    /// Save the scenario as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError`] if serialization or writing fails.
    pub fn save(&self, path: &Path) -> Result<(), ScenarioError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Build a validated game state under `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the scenario is not a legal starting position.
    pub fn build(&self, rules: Rules) -> Result<GameState, SetupError> {
        let mut board = Board::new();
        for spec in &self.territories {
            let mut territory = Territory::new(spec.id, spec.owner, spec.armies);
            if !spec.name.is_empty() {
                territory = territory.with_name(spec.name.clone());
            }
            if board.insert(territory).is_some() {
                return Err(SetupError::DuplicateTerritory(spec.id));
            }
        }

        for spec in &self.territories {
            for &neighbor in &spec.adjacent {
                if neighbor == spec.id {
                    return Err(SetupError::SelfAdjacent(spec.id));
                }
                if !board.contains(neighbor) {
                    return Err(SetupError::UnknownNeighbor {
                        territory: spec.id,
                        neighbor,
                    });
                }
                board.connect(spec.id, neighbor);
            }
        }

        for spec in &self.continents {
            if let Some(&missing) = spec.territories.iter().find(|id| !board.contains(**id)) {
                return Err(SetupError::UnknownContinentMember {
                    continent: spec.name.clone(),
                    territory: missing,
                });
            }
            board.add_continent(Continent {
                name: spec.name.clone(),
                territories: spec.territories.iter().copied().collect(),
                bonus: spec.bonus,
            });
        }

        let players = self
            .players
            .iter()
            .map(|p| {
                let name = if p.name.is_empty() {
                    format!("Player {}", p.id)
                } else {
                    p.name.clone()
                };
                Player::new(p.id, name)
            })
            .collect();

        let state = GameState::new(board, players, rules)?;
        match self.first_player {
            Some(first) => state.with_first_player(first),
            None => Ok(state),
        }
    }

    /// Capture the board and roster of `state` as a scenario.
    #[must_use]
    pub fn from_state(state: &GameState) -> Self {
        Self {
            name: String::new(),
            players: state
                .players
                .iter()
                .map(|p| PlayerSpec {
                    id: p.id,
                    name: p.name.clone(),
                })
                .collect(),
            territories: state
                .board
                .iter()
                .map(|t| TerritorySpec {
                    id: t.id,
                    name: t.name.clone(),
                    owner: t.owner,
                    armies: t.armies,
                    adjacent: t.adjacent.iter().copied().collect(),
                })
                .collect(),
            continents: state
                .board
                .continents()
                .iter()
                .map(|c| ContinentSpec {
                    name: c.name.clone(),
                    territories: c.territories.iter().copied().collect(),
                    bonus: c.bonus,
                })
                .collect(),
            first_player: Some(state.current_player),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TOML: &str = r#"
name = "pair"

[[players]]
id = 1
name = "Red"

[[players]]
id = 2

[[territories]]
id = 10
owner = 1
armies = 3
adjacent = [11]

[[territories]]
id = 11
owner = 2
armies = 2
"#;

    #[test]
    fn test_load_toml_symmetrises_adjacency() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(TOML.as_bytes()).unwrap();

        let scenario = Scenario::load(file.path()).unwrap();
        let state = scenario.build(Rules::default()).unwrap();
        assert!(state.board.are_adjacent(11, 10));
        assert_eq!(state.player(2).map(|p| p.name.as_str()), Some("Player 2"));
    }

    #[test]
    fn test_json_save_and_load() {
        let scenario: Scenario = toml::from_str(TOML).unwrap();
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        scenario.save(file.path()).unwrap();
        let loaded = Scenario::load(file.path()).unwrap();
        assert_eq!(loaded, scenario);
    }

    #[test]
    fn test_build_rejects_bad_boards() {
        let mut scenario: Scenario = toml::from_str(TOML).unwrap();
        scenario.territories[0].adjacent.push(99);
        assert!(matches!(
            scenario.build(Rules::default()),
            Err(SetupError::UnknownNeighbor { neighbor: 99, .. })
        ));

        let mut scenario: Scenario = toml::from_str(TOML).unwrap();
        scenario.territories[1].id = 10;
        assert!(matches!(
            scenario.build(Rules::default()),
            Err(SetupError::DuplicateTerritory(10))
        ));

        let mut scenario: Scenario = toml::from_str(TOML).unwrap();
        scenario.continents.push(ContinentSpec {
            name: "Isles".to_string(),
            territories: vec![10, 42],
            bonus: 2,
        });
        assert!(matches!(
            scenario.build(Rules::default()),
            Err(SetupError::UnknownContinentMember { territory: 42, ref continent }) if continent == "Isles"
        ));

        let mut scenario: Scenario = toml::from_str(TOML).unwrap();
        scenario.first_player = Some(7);
        assert!(matches!(
            scenario.build(Rules::default()),
            Err(SetupError::InvalidFirstPlayer(7))
        ));
    }

    #[test]
    fn test_from_state_rebuilds_same_game() {
        let scenario: Scenario = toml::from_str(TOML).unwrap();
        let state = scenario.build(Rules::default()).unwrap();
        let again = Scenario::from_state(&state).build(Rules::default()).unwrap();
        assert_eq!(again, state);
    }
}
