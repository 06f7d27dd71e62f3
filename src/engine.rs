//! Simulation engine.
//!
//! The engine owns the game state and a LIFO stack of pending events. Each
//! step pops one event, hands it to its handler, applies the resulting effects,
//! and pushes any follow-up events. A drain ends when the stack is empty, at
//! which point the engine is waiting on a participant decision or the game is
//! over.
//!
//! ```text
//! submit(intent) ──► [ stack ] ──pop──► handler ──► effects ──► GameState
//!                        ▲                  │
//!                        └── follow-ups ◄───┘
//! ```

mod effects;
mod handlers;

pub use effects::Effect;
pub use handlers::Outcome;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{EngineFault, RejectReason};
use crate::event::{Event, EventName, EventStack, Intent};
use crate::game::{
    DiceSource, FightSession, GameState, PlayerId, SeededDice, TurnPhase, TurnState,
    check_invariants,
};

/// Where the engine stands after a drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The stack is empty and `player` must act.
    AwaitingDecision {
        /// Player to act.
        player: PlayerId,
        /// Phase of their turn.
        phase: TurnPhase,
    },
    /// Events are still waiting on the stack.
    Pending {
        /// Events on the stack.
        pending: usize,
    },
    /// The game has ended.
    GameOver {
        /// Winning player, if any.
        winner: Option<PlayerId>,
    },
}

/// What happened to one processed event.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The event was accepted.
    Applied {
        /// Effects applied.
        effects: Vec<Effect>,
        /// Follow-up events pushed.
        follow_ups: usize,
    },
    /// The event was refused.
    Rejected(RejectReason),
    /// The event ended the game.
    Terminal {
        /// Winning player, if any.
        winner: Option<PlayerId>,
        /// Pending events discarded.
        discarded: usize,
    },
}

/// A processed event and its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct TapeEntry {
    /// The event.
    pub event: Event,
    /// What it did.
    pub outcome: StepOutcome,
}

/// An accepted participant submission and where it entered the loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Events the simulation had processed when this one was submitted.
    pub processed: u64,
    /// The stamped event.
    pub event: Event,
}

/// The most recent refusal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Sequence of the refused event.
    pub sequence: u64,
    /// Name of the refused event.
    pub action: EventName,
    /// Player the event named, if any.
    pub player: Option<PlayerId>,
    /// Why it was refused.
    pub reason: RejectReason,
}

/// Read-only view handed to decision makers.
#[derive(Debug, Clone, Copy)]
pub struct View<'a> {
    game: &'a GameState,
    turn: Option<&'a TurnState>,
    last_fight: Option<&'a FightSession>,
    last_rejection: Option<&'a Rejection>,
}

impl<'a> View<'a> {
    /// The game state.
    #[must_use]
    pub const fn game(&self) -> &'a GameState {
        self.game
    }

    /// The turn in progress.
    #[must_use]
    pub const fn turn(&self) -> Option<&'a TurnState> {
        self.turn
    }

    /// Player whose turn it is.
    #[must_use]
    pub const fn player(&self) -> PlayerId {
        self.game.current_player
    }

    /// Phase of the turn in progress.
    #[must_use]
    pub fn phase(&self) -> Option<TurnPhase> {
        self.turn.map(|t| t.phase)
    }

    /// Open attack session.
    #[must_use]
    pub fn fight(&self) -> Option<&'a FightSession> {
        self.turn.and_then(|t| t.fight.as_ref())
    }

    /// Most recently closed attack session.
    #[must_use]
    pub const fn last_fight(&self) -> Option<&'a FightSession> {
        self.last_fight
    }

    /// Most recent refusal.
    #[must_use]
    pub const fn last_rejection(&self) -> Option<&'a Rejection> {
        self.last_rejection
    }

    /// Reinforcements the current player has yet to place.
    #[must_use]
    pub fn reinforcements_remaining(&self) -> u32 {
        self.turn.map_or(0, |t| t.reinforcements_remaining)
    }

    /// Movements the current player may still make.
    #[must_use]
    pub fn moves_left(&self) -> u32 {
        self.turn.map_or(0, |t| t.moves_left(&self.game.rules))
    }
}

/// Owned copy of the engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Game state.
    pub game: GameState,
    /// Turn in progress.
    pub turn: Option<TurnState>,
    /// Most recently closed attack session.
    pub last_fight: Option<FightSession>,
    /// Events waiting on the stack.
    pub pending: usize,
    /// Sequence the next event will receive.
    pub next_sequence: u64,
}

/// The event-driven simulation.
#[derive(Debug)]
pub struct Simulation {
    game: GameState,
    turn: Option<TurnState>,
    stack: EventStack,
    dice: Box<dyn DiceSource>,
    next_sequence: u64,
    processed: u64,
    inputs: Vec<Submission>,
    tape: Vec<TapeEntry>,
    record_tape: bool,
    last_fight: Option<FightSession>,
    last_rejection: Option<Rejection>,
    halted: Option<EngineFault>,
}

impl Simulation {
    /// Create a simulation with `game_start` on the stack.
    #[must_use]
    pub fn new(game: GameState, dice: impl DiceSource + 'static) -> Self {
        let mut sim = Self {
            game,
            turn: None,
            stack: EventStack::new(),
            dice: Box::new(dice),
            next_sequence: 0,
            processed: 0,
            inputs: Vec::new(),
            tape: Vec::new(),
            record_tape: true,
            last_fight: None,
            last_rejection: None,
            halted: None,
        };
        let start = sim.stamp(Intent::game_start());
        sim.stack.push(start);
        sim
    }

    /// Create a simulation with seeded dice.
    #[must_use]
    pub fn seeded(game: GameState, seed: u64) -> Self {
        Self::new(game, SeededDice::new(seed))
    }

    /// Stop recording processed events on the tape.
    #[must_use]
    pub fn without_tape(mut self) -> Self {
        self.record_tape = false;
        self
    }

    /// Submit a participant action.
    ///
    /// The event is stamped and pushed; it is validated when processed.
    ///
    /// # Errors
    ///
    /// Returns [`RejectReason`] if the name is engine-internal, the game is
    /// over, or the engine has halted.
    pub fn submit(&mut self, intent: Intent) -> Result<Event, RejectReason> {
        if self.halted.is_some() {
            return Err(RejectReason::Halted);
        }
        if self.game.is_game_over() {
            return Err(RejectReason::GameOver);
        }
        if !intent.name.is_action() {
            debug!(name = %intent.name, "refused internal event from participant");
            return Err(RejectReason::NotAnAction(intent.name));
        }
        let event = self.stamp(intent);
        self.inputs.push(Submission {
            processed: self.processed,
            event: event.clone(),
        });
        self.stack.push(event.clone());
        Ok(event)
    }

    /// Submit a forfeit on behalf of `player`, ending their turn from any phase.
    ///
    /// # Errors
    ///
    /// Same as [`Simulation::submit`].
    pub fn forfeit(&mut self, player: PlayerId) -> Result<Event, RejectReason> {
        warn!(player, "turn forfeited");
        self.submit(Intent::forfeit(player))
    }

    /// Process the top event, if any.
    ///
    /// # Errors
    ///
    /// Returns [`EngineFault`] if applying effects fails; the engine halts.
    pub fn step(&mut self) -> Result<Option<StepOutcome>, EngineFault> {
        self.ensure_running()?;
        let Some(event) = self.stack.pop() else {
            return Ok(None);
        };
        self.processed += 1;
        debug!(sequence = event.sequence(), event = %event.name(), "processing event");

        let outcome = handlers::dispatch(&event, &self.game, self.turn.as_ref(), self.dice.as_mut());

        let step = match outcome {
            Outcome::Applied {
                effects,
                follow_ups,
            } => {
                self.apply_all(&effects)?;
                let pushed = follow_ups.len();
                for intent in follow_ups {
                    self.push(intent)?;
                }
                StepOutcome::Applied {
                    effects,
                    follow_ups: pushed,
                }
            }
            Outcome::Rejected(reason) => {
                self.reject(&event, &reason)?;
                StepOutcome::Rejected(reason)
            }
            Outcome::Terminal { effects, winner } => {
                self.apply_all(&effects)?;
                self.game.finish(winner);
                let discarded = self.stack.clear();
                info!(
                    winner = ?winner,
                    turns = self.game.turn,
                    rounds = self.game.round,
                    discarded,
                    "game over"
                );
                StepOutcome::Terminal { winner, discarded }
            }
        };

        if self.record_tape {
            self.tape.push(TapeEntry {
                event,
                outcome: step.clone(),
            });
        }
        Ok(Some(step))
    }

    /// Process events until the stack is empty.
    ///
    /// # Errors
    ///
    /// Returns [`EngineFault`] on livelock, stack overflow, a failed effect,
    /// or an invariant violation.
    pub fn run(&mut self) -> Result<RunStatus, EngineFault> {
        self.ensure_running()?;
        let budget = self.game.rules.max_events_per_drain;
        let mut drained = 0usize;
        while !self.stack.is_empty() {
            if drained >= budget {
                return Err(self.halt(EngineFault::Livelock { processed: drained }));
            }
            self.step()?;
            drained += 1;
        }

        if self.game.rules.check_invariants {
            let violations = check_invariants(&self.game);
            if !violations.is_empty() {
                return Err(self.halt(EngineFault::Invariant(violations)));
            }
        }

        if !self.game.is_game_over() && self.turn.is_none() {
            return Err(self.halt(EngineFault::Stalled));
        }
        Ok(self.status())
    }

    /// Current status without processing anything.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if self.game.is_game_over() {
            return RunStatus::GameOver {
                winner: self.game.winner,
            };
        }
        match &self.turn {
            Some(turn) if self.stack.is_empty() => RunStatus::AwaitingDecision {
                player: turn.player,
                phase: turn.phase,
            },
            _ => RunStatus::Pending {
                pending: self.stack.len(),
            },
        }
    }

    /// Read-only view for decision makers.
    #[must_use]
    pub fn view(&self) -> View<'_> {
        View {
            game: &self.game,
            turn: self.turn.as_ref(),
            last_fight: self.last_fight.as_ref(),
            last_rejection: self.last_rejection.as_ref(),
        }
    }

    /// Owned copy of the engine state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            game: self.game.clone(),
            turn: self.turn.clone(),
            last_fight: self.last_fight.clone(),
            pending: self.stack.len(),
            next_sequence: self.next_sequence,
        }
    }

    /// The game state.
    #[must_use]
    pub const fn game(&self) -> &GameState {
        &self.game
    }

    /// The turn in progress.
    #[must_use]
    pub const fn turn(&self) -> Option<&TurnState> {
        self.turn.as_ref()
    }

    /// Every processed event in order, if the tape is on.
    #[must_use]
    pub fn tape(&self) -> &[TapeEntry] {
        &self.tape
    }

    /// Every accepted participant submission in order.
    #[must_use]
    pub fn inputs(&self) -> &[Submission] {
        &self.inputs
    }

    /// Events popped off the stack so far.
    #[must_use]
    pub const fn processed(&self) -> u64 {
        self.processed
    }

    /// Most recent refusal.
    #[must_use]
    pub const fn last_rejection(&self) -> Option<&Rejection> {
        self.last_rejection.as_ref()
    }

    /// Events waiting on the stack.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.stack.len()
    }

    /// Fault that halted the engine, if any.
    #[must_use]
    pub const fn halted(&self) -> Option<&EngineFault> {
        self.halted.as_ref()
    }

    /// Whether the game has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }

    fn stamp(&mut self, intent: Intent) -> Event {
        let event = Event::stamp(intent, self.next_sequence);
        self.next_sequence += 1;
        event
    }

    fn push(&mut self, intent: Intent) -> Result<(), EngineFault> {
        let depth = self.game.rules.max_stack_depth;
        if self.stack.len() >= depth {
            return Err(self.halt(EngineFault::StackOverflow { depth }));
        }
        let event = self.stamp(intent);
        self.stack.push(event);
        Ok(())
    }

    fn apply_all(&mut self, batch: &[Effect]) -> Result<(), EngineFault> {
        for effect in batch {
            effects::apply(&mut self.game, &mut self.turn, &mut self.last_fight, effect)
                .map_err(|fault| self.halt(fault))?;
        }
        self.game.refresh_player_stats();
        Ok(())
    }

    fn reject(&mut self, event: &Event, reason: &RejectReason) -> Result<(), EngineFault> {
        let player = event.player();
        debug!(
            sequence = event.sequence(),
            action = %event.name(),
            code = reason.code(),
            %reason,
            "event rejected"
        );
        self.last_rejection = Some(Rejection {
            sequence: event.sequence(),
            action: event.name(),
            player,
            reason: reason.clone(),
        });
        if self.game.rules.emit_rejections && event.name() != EventName::Rejected {
            self.push(Intent::rejected(event.name(), player, reason))?;
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), EngineFault> {
        match &self.halted {
            Some(fault) => Err(fault.clone()),
            None => Ok(()),
        }
    }

    fn halt(&mut self, fault: EngineFault) -> EngineFault {
        error!(%fault, "engine halted");
        self.halted = Some(fault.clone());
        fault
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rules;
    use crate::game::{Board, Player, ScriptedDice, Territory};

    fn duel() -> GameState {
        let mut board = Board::new();
        board.insert(Territory::new(1, 1, 3));
        board.insert(Territory::new(2, 2, 2));
        board.insert(Territory::new(3, 1, 1));
        board.insert(Territory::new(4, 2, 1));
        board.connect(1, 2);
        board.connect(1, 3);
        board.connect(2, 4);
        let players = vec![Player::new(1, "Red"), Player::new(2, "Blue")];
        GameState::new(board, players, Rules::default()).unwrap()
    }

    #[test]
    fn test_start_awaits_first_placement() {
        let mut sim = Simulation::seeded(duel(), 1);
        assert_eq!(
            sim.run().unwrap(),
            RunStatus::AwaitingDecision {
                player: 1,
                phase: TurnPhase::Placement
            }
        );
        assert_eq!(sim.view().reinforcements_remaining(), 3);
        assert_eq!(sim.tape().len(), 2);
    }

    #[test]
    fn test_internal_names_refused_at_submit() {
        let mut sim = Simulation::seeded(duel(), 1);
        sim.run().unwrap();
        let intent = Intent::new(EventName::Conquest, crate::event::Context::new());
        assert_eq!(
            sim.submit(intent),
            Err(RejectReason::NotAnAction(EventName::Conquest))
        );
        assert!(sim.inputs().is_empty());
    }

    #[test]
    fn test_rejection_emits_rejected_event() {
        let mut sim = Simulation::seeded(duel(), 1);
        sim.run().unwrap();
        let before = sim.snapshot();

        let submitted = sim.submit(Intent::place_troop(1, 2, 1)).unwrap();
        sim.run().unwrap();

        let rejection = sim.last_rejection().unwrap();
        assert_eq!(rejection.sequence, submitted.sequence());
        assert_eq!(rejection.reason.code(), "not_owner");
        let last = sim.tape().last().unwrap();
        assert_eq!(last.event.name(), EventName::Rejected);
        assert_eq!(last.event.context().text("reason"), Some("not_owner"));

        let after = sim.snapshot();
        assert_eq!(before.game, after.game);
        assert_eq!(before.turn, after.turn);
    }

    #[test]
    fn test_rejections_can_stay_silent() {
        let mut state = duel();
        state.rules.emit_rejections = false;
        let mut sim = Simulation::seeded(state, 1);
        sim.run().unwrap();
        sim.submit(Intent::place_troop(1, 2, 1)).unwrap();
        sim.run().unwrap();
        assert_eq!(sim.tape().last().map(|e| e.event.name()), Some(EventName::PlaceTroop));
    }

    #[test]
    fn test_conquest_eliminates_and_ends_game() {
        let mut board = Board::new();
        board.insert(Territory::new(1, 1, 3));
        board.insert(Territory::new(2, 2, 2));
        board.connect(1, 2);
        let players = vec![Player::new(1, "Red"), Player::new(2, "Blue")];
        let state = GameState::new(board, players, Rules::default()).unwrap();

        let mut sim = Simulation::new(state, ScriptedDice::new([6, 5], [3, 2]));
        sim.run().unwrap();
        sim.submit(Intent::place_troop(1, 1, 3)).unwrap();
        sim.run().unwrap();
        sim.submit(Intent::attack(1, 1, 2, 2)).unwrap();
        sim.run().unwrap();
        sim.submit(Intent::resolve_attack_round(1)).unwrap();
        let status = sim.run().unwrap();
        assert!(matches!(status, RunStatus::AwaitingDecision { player: 1, .. }));

        let game = sim.game();
        assert_eq!(game.board.get(2).map(|t| t.owner), Some(1));
        assert!(!game.is_active(2));
        assert!(sim.view().fight().is_none());
        assert!(sim.view().last_fight().is_some());

        sim.submit(Intent::end_turn(1)).unwrap();
        assert_eq!(sim.run().unwrap(), RunStatus::GameOver { winner: Some(1) });
        assert_eq!(
            sim.submit(Intent::end_turn(1)),
            Err(RejectReason::GameOver)
        );
    }

    #[test]
    fn test_livelock_halts_engine() {
        let mut state = duel();
        state.rules.max_events_per_drain = 1;
        let mut sim = Simulation::seeded(state, 1);
        let fault = sim.run().unwrap_err();
        assert_eq!(fault, EngineFault::Livelock { processed: 1 });
        assert_eq!(sim.run(), Err(EngineFault::Livelock { processed: 1 }));
        assert_eq!(sim.submit(Intent::end_turn(1)), Err(RejectReason::Halted));
    }

    #[test]
    fn test_stack_overflow_halts_engine() {
        let mut state = duel();
        state.rules.max_stack_depth = 1;
        let mut sim = Simulation::seeded(state, 1);
        sim.run().unwrap();
        sim.submit(Intent::end_turn(2)).unwrap();
        sim.submit(Intent::end_turn(2)).unwrap();

        // The first refusal's `rejected` event has no room on the stack.
        let fault = sim.run().unwrap_err();
        assert_eq!(fault, EngineFault::StackOverflow { depth: 1 });
        assert_eq!(sim.halted(), Some(&fault));
        assert_eq!(sim.run(), Err(fault.clone()));
        assert_eq!(sim.step(), Err(fault));
        assert_eq!(sim.submit(Intent::end_turn(1)), Err(RejectReason::Halted));
    }

    #[test]
    fn test_refused_turn_start_stalls_engine() {
        let mut state = duel();
        state.current_player = 7;
        state.rules.check_invariants = false;
        let mut sim = Simulation::seeded(state, 1);

        let fault = sim.run().unwrap_err();
        assert_eq!(fault, EngineFault::Stalled);
        assert!(sim.turn().is_none());
        assert!(matches!(
            sim.last_rejection().map(|r| &r.reason),
            Some(RejectReason::UnknownPlayer(7))
        ));
        assert_eq!(sim.run(), Err(EngineFault::Stalled));
        assert_eq!(sim.submit(Intent::end_turn(1)), Err(RejectReason::Halted));
    }

    #[test]
    fn test_inputs_note_events_processed_before_submission() {
        let mut sim = Simulation::seeded(duel(), 3);
        sim.run().unwrap();
        let opened = sim.processed();
        assert_eq!(opened, 2);

        sim.submit(Intent::place_troop(1, 1, 1)).unwrap();
        sim.submit(Intent::end_attack(1)).unwrap();
        sim.run().unwrap();
        sim.submit(Intent::end_turn(2)).unwrap();

        let marks: Vec<u64> = sim.inputs().iter().map(|s| s.processed).collect();
        assert_eq!(marks[..2], [opened, opened]);
        assert!(marks[2] > opened);
    }

    #[test]
    fn test_step_reports_each_event() {
        let mut sim = Simulation::seeded(duel(), 3);
        let first = sim.step().unwrap().unwrap();
        assert!(matches!(first, StepOutcome::Applied { follow_ups: 1, .. }));
        assert_eq!(sim.status(), RunStatus::Pending { pending: 1 });
        sim.step().unwrap();
        assert!(sim.step().unwrap().is_none());
    }
}
