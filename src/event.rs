//! Events: named, context-carrying units of work.
//!
//! Participants and the engine speak the same vocabulary. Participants may only
//! submit the six actions in [`EventName::ACTIONS`]; the rest are produced by
//! the engine itself as follow-ups.

mod stack;

pub use stack::EventStack;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::game::{PlayerId, TerritoryId};

/// Every event name the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    /// Opens the game and schedules the first turn.
    GameStart,
    /// Begins a player's turn and grants reinforcements.
    TurnStart,
    /// Places reinforcement armies on an owned territory.
    PlaceTroop,
    /// Opens an attack session between adjacent territories.
    Attack,
    /// Rolls one round of dice in the open attack session.
    ResolveAttackRound,
    /// Stops attacking and moves to the moving phase.
    EndAttack,
    /// Moves armies between adjacent owned territories.
    MoveTroops,
    /// Ends the current turn.
    EndTurn,
    /// Transfers a defeated territory to the attacker.
    Conquest,
    /// Records that an earlier event was refused.
    Rejected,
}

impl EventName {
    /// Names a participant may submit.
    pub const ACTIONS: [Self; 6] = [
        Self::PlaceTroop,
        Self::Attack,
        Self::ResolveAttackRound,
        Self::EndAttack,
        Self::MoveTroops,
        Self::EndTurn,
    ];

    /// Wire name of this event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GameStart => "game_start",
            Self::TurnStart => "turn_start",
            Self::PlaceTroop => "place_troop",
            Self::Attack => "attack",
            Self::ResolveAttackRound => "resolve_attack_round",
            Self::EndAttack => "end_attack",
            Self::MoveTroops => "move_troops",
            Self::EndTurn => "end_turn",
            Self::Conquest => "conquest",
            Self::Rejected => "rejected",
        }
    }

    /// Whether a participant may submit this name.
    #[must_use]
    pub const fn is_action(self) -> bool {
        matches!(
            self,
            Self::PlaceTroop
                | Self::Attack
                | Self::ResolveAttackRound
                | Self::EndAttack
                | Self::MoveTroops
                | Self::EndTurn
        )
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "game_start" => Ok(Self::GameStart),
            "turn_start" => Ok(Self::TurnStart),
            "place_troop" => Ok(Self::PlaceTroop),
            "attack" => Ok(Self::Attack),
            "resolve_attack_round" => Ok(Self::ResolveAttackRound),
            "end_attack" => Ok(Self::EndAttack),
            "move_troops" => Ok(Self::MoveTroops),
            "end_turn" => Ok(Self::EndTurn),
            "conquest" => Ok(Self::Conquest),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown event name `{other}`")),
        }
    }
}

/// A context field was missing or held the wrong kind of value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The field is absent.
    #[error("missing field `{0}`")]
    Missing(String),
    /// The field is present but has the wrong type.
    #[error("field `{field}` must be {expected}")]
    WrongType {
        /// Field name.
        field: String,
        /// Description of the expected type.
        expected: &'static str,
    },
    /// The field is numeric but does not fit its target type.
    #[error("field `{field}` is out of range: {value}")]
    OutOfRange {
        /// Field name.
        field: String,
        /// Value found.
        value: u64,
    },
}

/// Key/value payload of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, Value>);

impl Context {
    /// Empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, returning the context for chaining.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Raw value of a field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the context has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate fields in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Required unsigned integer field.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if the field is absent or not a non-negative integer.
    pub fn u64(&self, key: &str) -> Result<u64, ContextError> {
        let value = self
            .0
            .get(key)
            .ok_or_else(|| ContextError::Missing(key.to_string()))?;
        value.as_u64().ok_or_else(|| ContextError::WrongType {
            field: key.to_string(),
            expected: "a non-negative integer",
        })
    }

    /// Required player id field.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if the field is absent, mistyped, or too large.
    pub fn player(&self, key: &str) -> Result<PlayerId, ContextError> {
        self.narrow(key)
    }

    /// Required territory id field.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if the field is absent, mistyped, or too large.
    pub fn territory(&self, key: &str) -> Result<TerritoryId, ContextError> {
        self.narrow(key)
    }

    /// Required army count field.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if the field is absent, mistyped, or too large.
    pub fn count(&self, key: &str) -> Result<u32, ContextError> {
        self.narrow(key)
    }

    /// Army count field that falls back to `default` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError`] if the field is present but mistyped or too large.
    pub fn count_or(&self, key: &str, default: u32) -> Result<u32, ContextError> {
        if self.0.contains_key(key) {
            self.count(key)
        } else {
            Ok(default)
        }
    }

    /// Boolean field that is `false` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::WrongType`] if the field is present but not a boolean.
    pub fn flag(&self, key: &str) -> Result<bool, ContextError> {
        match self.0.get(key) {
            None => Ok(false),
            Some(value) => value.as_bool().ok_or_else(|| ContextError::WrongType {
                field: key.to_string(),
                expected: "a boolean",
            }),
        }
    }

    /// String field, if present.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    fn narrow<T: TryFrom<u64>>(&self, key: &str) -> Result<T, ContextError> {
        let value = self.u64(key)?;
        T::try_from(value).map_err(|_| ContextError::OutOfRange {
            field: key.to_string(),
            value,
        })
    }
}

/// Unique identifier of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A request to create an event. The engine stamps it into an [`Event`].
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    /// Event name.
    pub name: EventName,
    /// Event payload.
    pub context: Context,
}

impl Intent {
    /// Intent with an arbitrary name and context.
    #[must_use]
    pub const fn new(name: EventName, context: Context) -> Self {
        Self { name, context }
    }

    /// Place `count` reinforcements on `territory`.
    #[must_use]
    pub fn place_troop(player: PlayerId, territory: TerritoryId, count: u32) -> Self {
        Self::new(
            EventName::PlaceTroop,
            Context::new()
                .with("player", player)
                .with("territory", territory)
                .with("army_count", count),
        )
    }

    /// Attack `defender` from `attacker`, committing `count` armies.
    #[must_use]
    pub fn attack(player: PlayerId, attacker: TerritoryId, defender: TerritoryId, count: u32) -> Self {
        Self::new(
            EventName::Attack,
            Context::new()
                .with("player", player)
                .with("attacker_territory", attacker)
                .with("defender_territory", defender)
                .with("army_count", count),
        )
    }

    /// Roll one round in the open attack session.
    #[must_use]
    pub fn resolve_attack_round(player: PlayerId) -> Self {
        Self::new(
            EventName::ResolveAttackRound,
            Context::new().with("player", player),
        )
    }

    /// Stop attacking.
    #[must_use]
    pub fn end_attack(player: PlayerId) -> Self {
        Self::new(EventName::EndAttack, Context::new().with("player", player))
    }

    /// Move `count` armies from `source` to `target`.
    #[must_use]
    pub fn move_troops(player: PlayerId, source: TerritoryId, target: TerritoryId, count: u32) -> Self {
        Self::new(
            EventName::MoveTroops,
            Context::new()
                .with("player", player)
                .with("source_territory", source)
                .with("target_territory", target)
                .with("army_count", count),
        )
    }

    /// End the turn normally.
    #[must_use]
    pub fn end_turn(player: PlayerId) -> Self {
        Self::new(EventName::EndTurn, Context::new().with("player", player))
    }

    /// End the turn from any phase, discarding unplaced reinforcements.
    #[must_use]
    pub fn forfeit(player: PlayerId) -> Self {
        Self::new(
            EventName::EndTurn,
            Context::new().with("player", player).with("forfeit", true),
        )
    }

    pub(crate) fn game_start() -> Self {
        Self::new(EventName::GameStart, Context::new())
    }

    pub(crate) fn turn_start(player: PlayerId) -> Self {
        Self::new(EventName::TurnStart, Context::new().with("player", player))
    }

    pub(crate) fn conquest(
        player: PlayerId,
        attacker: TerritoryId,
        defender: TerritoryId,
        count: u32,
    ) -> Self {
        Self::new(
            EventName::Conquest,
            Context::new()
                .with("player", player)
                .with("attacker_territory", attacker)
                .with("defender_territory", defender)
                .with("army_count", count),
        )
    }

    pub(crate) fn rejected(
        action: EventName,
        player: Option<PlayerId>,
        reason: &crate::RejectReason,
    ) -> Self {
        let mut context = Context::new()
            .with("action", action.as_str())
            .with("reason", reason.code())
            .with("message", reason.to_string());
        if let Some(player) = player {
            context = context.with("player", player);
        }
        Self::new(EventName::Rejected, context)
    }
}

/// A stamped event: unique id, name, context, and its place in the engine's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    name: EventName,
    context: Context,
    sequence: u64,
}

impl Event {
    pub(crate) fn stamp(intent: Intent, sequence: u64) -> Self {
        Self {
            id: EventId::random(),
            name: intent.name,
            context: intent.context,
            sequence,
        }
    }

    /// Unique id.
    #[must_use]
    pub const fn id(&self) -> EventId {
        self.id
    }

    /// Event name.
    #[must_use]
    pub const fn name(&self) -> EventName {
        self.name
    }

    /// Event payload.
    #[must_use]
    pub const fn context(&self) -> &Context {
        &self.context
    }

    /// Order in which the engine created this event.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Player named by the event, if it names a valid one.
    #[must_use]
    pub fn player(&self) -> Option<PlayerId> {
        self.context.player("player").ok()
    }

    /// An intent that would recreate this event.
    #[must_use]
    pub fn to_intent(&self) -> Intent {
        Intent::new(self.name, self.context.clone())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.sequence, self.name)?;
        for (key, value) in self.context.iter() {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}
