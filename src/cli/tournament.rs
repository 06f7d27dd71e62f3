//! Tournament command implementation.

#![allow(clippy::cast_precision_loss)]

use super::output::{
    JsonTournamentResult, TournamentStats, format_tournament_csv, format_tournament_text,
};
use super::{CliError, TournamentFormat, seed_or_clock};
use conquest::AgentKind;
use conquest::tournament::{TournamentConfig, run_game};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;
use tracing::warn;

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the tournament fails.
pub(crate) fn execute(
    agents: &[AgentKind],
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    config: TournamentConfig,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed_or_clock(seed);

    // Fail fast on a configuration no game can run under.
    run_game(base_seed, agents, &TournamentConfig {
        max_turns: 0,
        ..config
    })?;

    let pb = if progress {
        let pb = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let num_players = agents.len();

    // Each thread accumulates into its own TournamentStats, then we merge at the end
    let stats = (0..games)
        .into_par_iter()
        .fold(
            || TournamentStats::new(num_players),
            |mut local_stats, i| {
                let game_seed = base_seed.wrapping_add(i);
                match run_game(game_seed, agents, &config) {
                    Ok(result) => local_stats.add_result(&result),
                    Err(e) => {
                        warn!(seed = game_seed, error = %e, "game failed");
                        local_stats.add_failure();
                    }
                }
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local_stats
            },
        )
        .reduce(
            || TournamentStats::new(num_players),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_tournament_text(&stats, agents));
            println!();
            println!(
                "Duration: {:.2}s ({games_per_sec:.0} games/sec)",
                duration.as_secs_f64()
            );
        }
        TournamentFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonTournamentResult::from_stats(&stats, agents))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats, agents));
        }
    }

    Ok(())
}
