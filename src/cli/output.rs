//! Output formatting utilities for CLI.

#![allow(clippy::format_push_string, clippy::cast_precision_loss)]

use conquest::AgentKind;
use conquest::tournament::{GameResult, PlayerStats};
use serde::Serialize;

/// JSON-serializable game result.
#[derive(Debug, Serialize)]
pub(super) struct JsonGameResult<'a> {
    /// Random seed used.
    seed: u64,
    /// Winner player ID (null if the turn cap was hit).
    winner: Option<u8>,
    /// Player-turns played.
    turns_played: u32,
    /// Full rotations played.
    rounds: u32,
    /// Elimination order.
    elimination_order: &'a [u8],
    /// Per-player results.
    players: &'a [PlayerStats],
}

impl<'a> JsonGameResult<'a> {
    /// Create from a `GameResult`.
    pub(super) fn from_game_result(result: &'a GameResult) -> Self {
        Self {
            seed: result.seed,
            winner: result.winner,
            turns_played: result.turns_played,
            rounds: result.rounds,
            elimination_order: &result.elimination_order,
            players: &result.player_stats,
        }
    }
}

/// Format a game result as human-readable text.
pub(super) fn format_text(result: &GameResult) -> String {
    let mut output = String::new();

    output.push_str(&format!("Game Result (seed: {})\n", result.seed));
    let winner = result
        .winner
        .and_then(|w| result.player_stats.iter().find(|s| s.player_id == w));
    if let Some(stats) = winner {
        output.push_str(&format!(
            "  Winner: Player {} ({})\n",
            stats.player_id, stats.agent
        ));
    } else {
        output.push_str("  Winner: none (turn cap)\n");
    }
    output.push_str(&format!(
        "  Turns: {} ({} rounds)\n\n",
        result.turns_played, result.rounds
    ));

    for stats in &result.player_stats {
        output.push_str(&format!(
            "  Player {} ({}): {} territories, {} armies",
            stats.player_id, stats.agent, stats.territories, stats.armies
        ));
        if stats.rejections > 0 || stats.forfeits > 0 {
            output.push_str(&format!(
                ", {} rejected, {} forfeited",
                stats.rejections, stats.forfeits
            ));
        }
        if let Some(turn) = stats.eliminated_turn {
            output.push_str(&format!(" [eliminated turn {turn}]"));
        }
        output.push('\n');
    }

    output
}

/// Tournament statistics for aggregated results.
#[derive(Debug, Default)]
pub(super) struct TournamentStats {
    /// Total games played.
    pub(super) games_played: u64,
    /// Games that failed to run.
    pub(super) failures: u64,
    /// Win count per seat.
    wins: Vec<u64>,
    /// Games stopped by the turn cap.
    draws: u64,
    /// Territories held at game end, summed per seat.
    total_territories: Vec<u64>,
    /// Rejected actions summed per seat.
    total_rejections: Vec<u64>,
    /// Total turns across all games.
    total_turns: u64,
}

impl TournamentStats {
    /// Create new stats for n seats.
    pub(super) fn new(num_players: usize) -> Self {
        Self {
            games_played: 0,
            failures: 0,
            wins: vec![0; num_players],
            draws: 0,
            total_territories: vec![0; num_players],
            total_rejections: vec![0; num_players],
            total_turns: 0,
        }
    }

    /// Add a game result to the stats.
    pub(super) fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns_played);

        match result.winner {
            Some(winner) => {
                let seat = result.player_stats.iter().position(|s| s.player_id == winner);
                if let Some(wins) = seat.and_then(|i| self.wins.get_mut(i)) {
                    *wins += 1;
                }
            }
            None => self.draws += 1,
        }

        for (seat, stats) in result.player_stats.iter().enumerate() {
            if seat < self.total_territories.len() {
                self.total_territories[seat] += u64::from(stats.territories);
                self.total_rejections[seat] += u64::from(stats.rejections);
            }
        }
    }

    /// Record a game that failed to run.
    pub(super) const fn add_failure(&mut self) {
        self.failures += 1;
    }

    /// Merge another thread's stats into this one.
    pub(super) fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.failures += other.failures;
        self.draws += other.draws;
        self.total_turns += other.total_turns;
        for (a, b) in self.wins.iter_mut().zip(&other.wins) {
            *a += b;
        }
        for (a, b) in self.total_territories.iter_mut().zip(&other.total_territories) {
            *a += b;
        }
        for (a, b) in self.total_rejections.iter_mut().zip(&other.total_rejections) {
            *a += b;
        }
    }

    /// Get win rate for a seat (0.0-1.0).
    pub(super) fn win_rate(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins.get(seat).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Average territories held at game end.
    pub(super) fn avg_territories(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_territories.get(seat).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Average rejected actions per game.
    pub(super) fn avg_rejections(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_rejections.get(seat).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Get average game length.
    pub(super) fn avg_turns(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games_played as f64
    }
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total games played.
    games_played: u64,
    /// Games that failed to run.
    failures: u64,
    /// Per-seat statistics.
    players: Vec<JsonTournamentPlayer>,
    /// Games stopped by the turn cap.
    draws: u64,
    /// Average game length in turns.
    avg_turns: f64,
}

/// JSON-serializable per-seat tournament stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentPlayer {
    /// Seat (1-based, matches player id on generated boards).
    player: usize,
    /// Agent kind.
    agent: AgentKind,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average territories at game end.
    avg_territories: f64,
    /// Average rejected actions per game.
    avg_rejections: f64,
}

impl JsonTournamentResult {
    /// Create from stats and seat agents.
    pub(super) fn from_stats(stats: &TournamentStats, agents: &[AgentKind]) -> Self {
        let players = agents
            .iter()
            .enumerate()
            .map(|(i, &agent)| JsonTournamentPlayer {
                player: i + 1,
                agent,
                wins: stats.wins.get(i).copied().unwrap_or(0),
                win_rate: stats.win_rate(i),
                avg_territories: stats.avg_territories(i),
                avg_rejections: stats.avg_rejections(i),
            })
            .collect();

        Self {
            games_played: stats.games_played,
            failures: stats.failures,
            players,
            draws: stats.draws,
            avg_turns: stats.avg_turns(),
        }
    }
}

/// Format tournament stats as human-readable text.
pub(super) fn format_tournament_text(stats: &TournamentStats, agents: &[AgentKind]) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tournament Results ({} games)\n", stats.games_played));
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for (i, agent) in agents.iter().enumerate() {
        let wins = stats.wins.get(i).copied().unwrap_or(0);
        let rate = stats.win_rate(i) * 100.0;
        output.push_str(&format!(
            "  Player {} ({agent}): {rate:.1}% ({wins} wins)\n",
            i + 1
        ));
    }
    let draw_rate = if stats.games_played == 0 {
        0.0
    } else {
        stats.draws as f64 / stats.games_played as f64 * 100.0
    };
    output.push_str(&format!(
        "  Turn cap: {} ({draw_rate:.1}%)\n\n",
        stats.draws
    ));

    output.push_str("Average Territories Held:\n");
    for (i, agent) in agents.iter().enumerate() {
        output.push_str(&format!(
            "  Player {} ({agent}): {:.1} ({:.1} rejected actions/game)\n",
            i + 1,
            stats.avg_territories(i),
            stats.avg_rejections(i)
        ));
    }

    output.push_str(&format!(
        "\nAverage Game Length: {:.0} turns\n",
        stats.avg_turns()
    ));
    if stats.failures > 0 {
        output.push_str(&format!("Failed games: {}\n", stats.failures));
    }

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats, agents: &[AgentKind]) -> String {
    let mut output = String::new();

    output.push_str("player,agent,wins,win_rate,avg_territories,avg_rejections\n");

    for (i, agent) in agents.iter().enumerate() {
        output.push_str(&format!(
            "{},{},{},{:.4},{:.2},{:.2}\n",
            i + 1,
            agent,
            stats.wins.get(i).copied().unwrap_or(0),
            stats.win_rate(i),
            stats.avg_territories(i),
            stats.avg_rejections(i)
        ));
    }

    output
}
