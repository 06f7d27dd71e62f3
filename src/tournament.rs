//! Tournament runner.
//!
//! Provides a pure function interface: `(seed, agents) -> GameResult`
//!
//! The runner handles:
//! - Deterministic board generation
//! - Driving the simulation between decision points
//! - Caller-side forfeit policy (rejection and decision caps per turn)
//! - Elimination tracking and the max-turn cap

mod mapgen;

pub use mapgen::{MapGenError, generate_scenario};

use serde::Serialize;
use tracing::{debug, info};

use crate::agent::{Agent, AgentKind, decide};
use crate::config::Rules;
use crate::engine::{RunStatus, Simulation};
use crate::error::{EngineFault, RejectReason};
use crate::game::{MAX_PLAYERS, PlayerId, SetupError};
use crate::replay::Recording;
use crate::scenario::Scenario;

/// Configuration for a tournament game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TournamentConfig {
    /// Player-turns before the game is stopped without a winner.
    pub max_turns: u32,
    /// Generated board width.
    pub board_width: u16,
    /// Generated board height.
    pub board_height: u16,
    /// Armies each player starts with on a generated board.
    pub starting_armies: u32,
    /// Refused actions in one turn before the turn is forfeited.
    pub max_rejections_per_turn: u32,
    /// Decisions in one turn before the turn is forfeited.
    pub max_decisions_per_turn: u32,
    /// Game rules.
    pub rules: Rules,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            max_turns: 500,
            board_width: 6,
            board_height: 7,
            starting_armies: 30,
            max_rejections_per_turn: 8,
            max_decisions_per_turn: 2_000,
            rules: Rules::default(),
        }
    }
}

/// Statistics for a single player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlayerStats {
    /// Player identifier.
    pub player_id: PlayerId,
    /// Participant that played.
    pub agent: AgentKind,
    /// Territories held at the end.
    pub territories: u32,
    /// Armies on the board at the end.
    pub armies: u32,
    /// Turn the player was eliminated (None if survived).
    pub eliminated_turn: Option<u32>,
    /// Actions the engine refused.
    pub rejections: u32,
    /// Turns forfeited by the runner.
    pub forfeits: u32,
}

/// Final result of a game.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// The winning player (None if the turn cap was hit).
    pub winner: Option<PlayerId>,
    /// Player-turns played.
    pub turns_played: u32,
    /// Full rotations played.
    pub rounds: u32,
    /// Per-player statistics.
    pub player_stats: Vec<PlayerStats>,
    /// Elimination order (first eliminated is index 0).
    pub elimination_order: Vec<PlayerId>,
    /// The seed used for this game.
    pub seed: u64,
    /// Everything needed to replay the game.
    pub recording: Recording,
}

/// Error type for tournament operations.
#[derive(Debug, thiserror::Error)]
pub enum TournamentError {
    /// Not enough players (minimum 2).
    #[error("Too few players: {0} (minimum 2)")]
    TooFewPlayers(usize),
    /// Too many players.
    #[error("Too many players: {0} (maximum {MAX_PLAYERS})")]
    TooManyPlayers(usize),
    /// The scenario roster and agent list differ in length.
    #[error("scenario has {players} players but {agents} agents were given")]
    AgentMismatch {
        /// Players in the scenario.
        players: usize,
        /// Agents supplied.
        agents: usize,
    },
    /// Board generation failed.
    #[error("Map generation failed: {0}")]
    MapGeneration(#[from] MapGenError),
    /// The starting position is invalid.
    #[error("Invalid starting position: {0}")]
    Setup(#[from] SetupError),
    /// The engine halted.
    #[error("Engine fault: {0}")]
    Engine(#[from] EngineFault),
    /// The engine refused a runner submission outright.
    #[error("Submission refused: {0}")]
    Submission(#[from] RejectReason),
}

/// Run a complete game on a generated board.
///
/// This is the main entry point - a pure function from inputs to result.
/// Player `n` of the generated roster (ids start at 1) is driven by
/// `agents[n - 1]`.
///
/// # Errors
///
/// Returns [`TournamentError`] if the player count is out of range, board
/// generation fails, or the engine halts.
pub fn run_game(
    seed: u64,
    agents: &[AgentKind],
    config: &TournamentConfig,
) -> Result<GameResult, TournamentError> {
    check_player_count(agents.len())?;
    let scenario = generate_scenario(
        seed,
        config.board_width,
        config.board_height,
        agents.len(),
        config.starting_armies,
    )?;
    run_scenario(seed, &scenario, agents, config)
}

/// Run a complete game from an explicit starting position.
///
/// Agents are assigned to the scenario roster in order.
///
/// # Errors
///
/// Returns [`TournamentError`] if the agents do not match the roster, the
/// scenario is invalid, or the engine halts.
pub fn run_scenario(
    seed: u64,
    scenario: &Scenario,
    agents: &[AgentKind],
    config: &TournamentConfig,
) -> Result<GameResult, TournamentError> {
    check_player_count(agents.len())?;
    if scenario.players.len() != agents.len() {
        return Err(TournamentError::AgentMismatch {
            players: scenario.players.len(),
            agents: agents.len(),
        });
    }
    let state = scenario.build(config.rules)?;
    let seats = scenario
        .players
        .iter()
        .zip(agents)
        .map(|(spec, &kind)| Seat::new(spec.id, kind, seed))
        .collect();

    let runner = GameRunner {
        sim: Simulation::seeded(state, seed).without_tape(),
        seats,
        config: *config,
        seed,
        scenario: scenario.clone(),
        elimination_order: Vec::new(),
        turn_marker: 0,
        rejections_this_turn: 0,
        decisions_this_turn: 0,
        awaiting: None,
    };
    runner.run()
}

fn check_player_count(count: usize) -> Result<(), TournamentError> {
    if count < 2 {
        return Err(TournamentError::TooFewPlayers(count));
    }
    if count > MAX_PLAYERS {
        return Err(TournamentError::TooManyPlayers(count));
    }
    Ok(())
}

/// Per-player state kept by the runner.
#[derive(Debug)]
struct Seat {
    player_id: PlayerId,
    kind: AgentKind,
    agent: Box<dyn Agent>,
    eliminated_turn: Option<u32>,
    rejections: u32,
    forfeits: u32,
}

impl Seat {
    fn new(player_id: PlayerId, kind: AgentKind, seed: u64) -> Self {
        Self {
            player_id,
            kind,
            agent: kind.build(player_id, seed),
            eliminated_turn: None,
            rejections: 0,
            forfeits: 0,
        }
    }
}

/// Internal game runner.
struct GameRunner {
    sim: Simulation,
    seats: Vec<Seat>,
    config: TournamentConfig,
    seed: u64,
    scenario: Scenario,
    elimination_order: Vec<PlayerId>,
    /// Turn counter the per-turn caps refer to.
    turn_marker: u32,
    rejections_this_turn: u32,
    decisions_this_turn: u32,
    /// Sequence of the last submission not yet checked for refusal.
    awaiting: Option<u64>,
}

impl GameRunner {
    fn run(mut self) -> Result<GameResult, TournamentError> {
        loop {
            let status = self.sim.run()?;
            self.update_eliminations();
            match status {
                RunStatus::GameOver { winner } => return Ok(self.build_result(winner)),
                RunStatus::Pending { .. } => {}
                RunStatus::AwaitingDecision { player, .. } => {
                    if self.sim.game().turn >= self.config.max_turns {
                        debug!(seed = self.seed, "turn cap reached");
                        return Ok(self.build_result(None));
                    }
                    self.take_decision(player)?;
                }
            }
        }
    }

    /// Ask the seated agent for one action, or forfeit when a cap is hit.
    fn take_decision(&mut self, player: PlayerId) -> Result<(), TournamentError> {
        let Some(index) = self.seats.iter().position(|s| s.player_id == player) else {
            // Every roster entry is seated, so only a forfeit can move the game on.
            self.sim.forfeit(player)?;
            return Ok(());
        };

        if let Some(sequence) = self.awaiting.take() {
            let refused = self
                .sim
                .last_rejection()
                .is_some_and(|r| r.sequence == sequence);
            if refused {
                self.rejections_this_turn += 1;
                self.seats[index].rejections += 1;
            }
        }

        let turn = self.sim.game().turn;
        if turn != self.turn_marker {
            self.turn_marker = turn;
            self.rejections_this_turn = 0;
            self.decisions_this_turn = 0;
        }

        if self.rejections_this_turn >= self.config.max_rejections_per_turn
            || self.decisions_this_turn >= self.config.max_decisions_per_turn
        {
            self.seats[index].forfeits += 1;
            self.sim.forfeit(player)?;
            return Ok(());
        }

        let seat = &mut self.seats[index];
        let intent = decide(seat.agent.as_mut(), &self.sim.view());
        self.decisions_this_turn += 1;
        match self.sim.submit(intent) {
            Ok(event) => self.awaiting = Some(event.sequence()),
            Err(reason) => {
                debug!(player, %reason, "submission refused");
                self.rejections_this_turn += 1;
                self.seats[index].rejections += 1;
            }
        }
        Ok(())
    }

    /// Update elimination tracking after game state changes.
    fn update_eliminations(&mut self) {
        let turn = self.sim.game().turn;
        for seat in &mut self.seats {
            if seat.eliminated_turn.is_some() {
                continue;
            }
            if !self.sim.game().is_active(seat.player_id) {
                seat.eliminated_turn = Some(turn);
                self.elimination_order.push(seat.player_id);
            }
        }
    }

    /// Build the final game result.
    fn build_result(self, winner: Option<PlayerId>) -> GameResult {
        let game = self.sim.game();
        let player_stats = self
            .seats
            .iter()
            .map(|seat| {
                let player = game.player(seat.player_id);
                PlayerStats {
                    player_id: seat.player_id,
                    agent: seat.kind,
                    territories: player.map_or(0, |p| p.territories),
                    armies: player.map_or(0, |p| p.armies),
                    eliminated_turn: seat.eliminated_turn,
                    rejections: seat.rejections,
                    forfeits: seat.forfeits,
                }
            })
            .collect();

        info!(
            seed = self.seed,
            winner = ?winner,
            turns = game.turn,
            "game finished"
        );

        GameResult {
            winner,
            turns_played: game.turn,
            rounds: game.round,
            player_stats,
            elimination_order: self.elimination_order,
            seed: self.seed,
            recording: Recording {
                seed: self.seed,
                scenario: self.scenario,
                rules: game.rules,
                events: self.sim.inputs().to_vec(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> TournamentConfig {
        TournamentConfig {
            board_width: 4,
            board_height: 3,
            starting_armies: 12,
            max_turns: 200,
            ..TournamentConfig::default()
        }
    }

    #[test]
    fn test_tournament_error_display() {
        let err = TournamentError::TooFewPlayers(1);
        assert!(format!("{err}").contains("Too few players"));

        let err = TournamentError::TooManyPlayers(10);
        assert!(format!("{err}").contains("Too many players"));
    }

    #[test]
    fn test_tournament_config_default() {
        let config = TournamentConfig::default();
        assert_eq!(config.max_turns, 500);
        assert_eq!(config.board_width, 6);
        assert_eq!(config.board_height, 7);
        assert_eq!(config.max_rejections_per_turn, 8);
    }

    #[test]
    fn test_run_game_player_count() {
        let config = TournamentConfig::default();
        assert!(matches!(
            run_game(42, &[AgentKind::Random], &config),
            Err(TournamentError::TooFewPlayers(1))
        ));
        let agents = [AgentKind::Random; 9];
        assert!(matches!(
            run_game(42, &agents, &config),
            Err(TournamentError::TooManyPlayers(9))
        ));
    }

    #[test]
    fn test_run_game_is_deterministic() {
        let agents = [AgentKind::Aggressive, AgentKind::Random];
        let a = run_game(7, &agents, &small_config()).unwrap();
        let b = run_game(7, &agents, &small_config()).unwrap();
        assert_eq!(a.winner, b.winner);
        assert_eq!(a.turns_played, b.turns_played);
        assert_eq!(a.player_stats, b.player_stats);
        // Event ids are fresh per run; sequences and payloads are not.
        let inputs = |r: &GameResult| {
            r.recording
                .events
                .iter()
                .map(|s| (s.processed, s.event.sequence(), s.event.to_intent()))
                .collect::<Vec<_>>()
        };
        assert_eq!(inputs(&a), inputs(&b));
    }

    #[test]
    fn test_finished_game_reports_consistent_stats() {
        let agents = [AgentKind::Aggressive, AgentKind::Aggressive];
        let result = run_game(3, &agents, &small_config()).unwrap();
        assert_eq!(result.player_stats.len(), 2);
        if let Some(winner) = result.winner {
            assert_eq!(result.elimination_order.len(), 1);
            assert_ne!(result.elimination_order[0], winner);
            let loser = result
                .player_stats
                .iter()
                .find(|s| s.player_id != winner)
                .unwrap();
            assert_eq!(loser.territories, 0);
            assert!(loser.eliminated_turn.is_some());
        } else {
            assert_eq!(result.turns_played, 200);
        }
    }

    #[test]
    fn test_turn_cap_reports_no_winner() {
        let config = TournamentConfig {
            max_turns: 2,
            ..small_config()
        };
        let agents = [AgentKind::Defensive, AgentKind::Defensive];
        let result = run_game(11, &agents, &config).unwrap();
        assert_eq!(result.winner, None);
        assert_eq!(result.turns_played, 2);
    }

    #[test]
    fn test_scenario_agent_mismatch() {
        let scenario = generate_scenario(1, 4, 3, 3, 12).unwrap();
        let result = run_scenario(
            1,
            &scenario,
            &[AgentKind::Random, AgentKind::Random],
            &small_config(),
        );
        assert!(matches!(
            result,
            Err(TournamentError::AgentMismatch {
                players: 3,
                agents: 2
            })
        ));
    }
}
