//! Territories, adjacency, and continents.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::game::PlayerId;

/// Unique identifier for a territory.
pub type TerritoryId = u16;

/// A single territory on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Territory {
    /// Unique identifier.
    pub id: TerritoryId,
    /// Display name.
    pub name: String,
    /// Owning player.
    pub owner: PlayerId,
    /// Armies stationed here.
    pub armies: u32,
    /// Territories sharing a border with this one.
    pub adjacent: BTreeSet<TerritoryId>,
}

impl Territory {
    /// Create a territory with no neighbours and a generated name.
    #[must_use]
    pub fn new(id: TerritoryId, owner: PlayerId, armies: u32) -> Self {
        Self {
            id,
            name: format!("T{id}"),
            owner,
            armies,
            adjacent: BTreeSet::new(),
        }
    }

    /// Replace the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Whether `other` shares a border with this territory.
    #[must_use]
    pub fn is_adjacent_to(&self, other: TerritoryId) -> bool {
        self.adjacent.contains(&other)
    }

    /// Whether this territory can launch an attack (it must keep one army home).
    #[must_use]
    pub const fn can_attack(&self) -> bool {
        self.armies > 1
    }
}

/// A named group of territories worth bonus reinforcements to a sole owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continent {
    /// Display name.
    pub name: String,
    /// Member territories.
    pub territories: BTreeSet<TerritoryId>,
    /// Extra reinforcements for owning every member.
    pub bonus: u32,
}

/// The board: every territory keyed by id, plus continents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    territories: BTreeMap<TerritoryId, Territory>,
    #[serde(default)]
    continents: Vec<Continent>,
}

impl Board {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a territory, returning any territory it replaced.
    pub fn insert(&mut self, territory: Territory) -> Option<Territory> {
        self.territories.insert(territory.id, territory)
    }

    /// Record a border between `a` and `b` in both directions.
    ///
    /// Ids not on the board are recorded on whichever side exists; the
    /// invariant checker reports the dangling reference.
    pub fn connect(&mut self, a: TerritoryId, b: TerritoryId) {
        if let Some(t) = self.territories.get_mut(&a) {
            t.adjacent.insert(b);
        }
        if let Some(t) = self.territories.get_mut(&b) {
            t.adjacent.insert(a);
        }
    }

    /// Add a continent.
    pub fn add_continent(&mut self, continent: Continent) {
        self.continents.push(continent);
    }

    /// Territory by id.
    #[must_use]
    pub fn get(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories.get(&id)
    }

    /// Mutable territory by id.
    pub fn get_mut(&mut self, id: TerritoryId) -> Option<&mut Territory> {
        self.territories.get_mut(&id)
    }

    /// Whether the territory exists.
    #[must_use]
    pub fn contains(&self, id: TerritoryId) -> bool {
        self.territories.contains_key(&id)
    }

    /// Number of territories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.territories.len()
    }

    /// Whether the board has no territories.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.territories.is_empty()
    }

    /// All territories in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Territory> {
        self.territories.values()
    }

    /// All continents.
    #[must_use]
    pub fn continents(&self) -> &[Continent] {
        &self.continents
    }

    /// Whether `a` and `b` share a border.
    #[must_use]
    pub fn are_adjacent(&self, a: TerritoryId, b: TerritoryId) -> bool {
        self.get(a).is_some_and(|t| t.is_adjacent_to(b))
    }

    /// Territories owned by `player` in id order.
    pub fn owned_by(&self, player: PlayerId) -> impl Iterator<Item = &Territory> {
        self.territories.values().filter(move |t| t.owner == player)
    }

    /// Number of territories owned by `player`.
    #[must_use]
    pub fn count_owned(&self, player: PlayerId) -> u32 {
        let count = self.owned_by(player).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Armies `player` has on the board.
    #[must_use]
    pub fn armies_of(&self, player: PlayerId) -> u64 {
        self.owned_by(player).map(|t| u64::from(t.armies)).sum()
    }

    /// Armies on the whole board.
    #[must_use]
    pub fn total_armies(&self) -> u64 {
        self.territories.values().map(|t| u64::from(t.armies)).sum()
    }

    /// Neighbours of `id` owned by someone other than its owner.
    pub fn enemy_neighbors(&self, id: TerritoryId) -> impl Iterator<Item = &Territory> {
        let territory = self.get(id);
        let owner = territory.map(|t| t.owner);
        territory
            .into_iter()
            .flat_map(|t| t.adjacent.iter())
            .filter_map(move |adj| self.get(*adj))
            .filter(move |n| Some(n.owner) != owner)
    }

    /// Whether `id` borders at least one enemy territory.
    #[must_use]
    pub fn is_border(&self, id: TerritoryId) -> bool {
        self.enemy_neighbors(id).next().is_some()
    }

    /// Continent bonus reinforcements earned by `player`.
    #[must_use]
    pub fn continent_bonus(&self, player: PlayerId) -> u32 {
        self.continents
            .iter()
            .filter(|c| {
                !c.territories.is_empty()
                    && c.territories
                        .iter()
                        .all(|id| self.get(*id).is_some_and(|t| t.owner == player))
            })
            .map(|c| c.bonus)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_board() -> Board {
        let mut board = Board::new();
        board.insert(Territory::new(1, 1, 3));
        board.insert(Territory::new(2, 1, 1));
        board.insert(Territory::new(3, 2, 2));
        board.connect(1, 2);
        board.connect(2, 3);
        board
    }

    #[test]
    fn test_connect_is_symmetric() {
        let board = line_board();
        assert!(board.are_adjacent(1, 2));
        assert!(board.are_adjacent(2, 1));
        assert!(!board.are_adjacent(1, 3));
    }

    #[test]
    fn test_ownership_queries() {
        let board = line_board();
        assert_eq!(board.count_owned(1), 2);
        assert_eq!(board.count_owned(2), 1);
        assert_eq!(board.armies_of(1), 4);
        assert_eq!(board.total_armies(), 6);
    }

    #[test]
    fn test_border_detection() {
        let board = line_board();
        assert!(!board.is_border(1));
        assert!(board.is_border(2));
        assert!(board.is_border(3));
        let enemies: Vec<_> = board.enemy_neighbors(2).map(|t| t.id).collect();
        assert_eq!(enemies, vec![3]);
    }

    #[test]
    fn test_continent_bonus() {
        let mut board = line_board();
        board.add_continent(Continent {
            name: "West".to_string(),
            territories: [1, 2].into_iter().collect(),
            bonus: 2,
        });
        board.add_continent(Continent {
            name: "All".to_string(),
            territories: [1, 2, 3].into_iter().collect(),
            bonus: 5,
        });
        assert_eq!(board.continent_bonus(1), 2);
        assert_eq!(board.continent_bonus(2), 0);
    }

    #[test]
    fn test_can_attack_needs_two_armies() {
        assert!(Territory::new(1, 1, 2).can_attack());
        assert!(!Territory::new(1, 1, 1).can_attack());
    }
}
