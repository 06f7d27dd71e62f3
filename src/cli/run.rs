//! Run command implementation.

use super::output::{JsonGameResult, format_text};
use super::{CliError, OutputFormat, seed_or_clock};
use conquest::replay::ReplayEngine;
use conquest::tournament::{TournamentConfig, run_game, run_scenario};
use conquest::{AgentKind, Scenario};
use std::path::PathBuf;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the game fails to run.
pub(crate) fn execute(
    agents: &[AgentKind],
    seed: Option<u64>,
    scenario: Option<PathBuf>,
    config: TournamentConfig,
    format: OutputFormat,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let seed = seed_or_clock(seed);
    let names: Vec<String> = agents.iter().map(ToString::to_string).collect();

    if !quiet {
        println!("Running game with seed {seed}...");
        println!("Players: {}", names.join(", "));
        println!();
    }

    let result = match scenario {
        Some(path) => {
            let scenario = Scenario::load(&path).map_err(|e| {
                CliError::new(format!("Failed to load scenario {}: {e}", path.display()))
            })?;
            run_scenario(seed, &scenario, agents, &config)?
        }
        None => run_game(seed, agents, &config)?,
    };

    if let Some(save_path) = save {
        result
            .recording
            .save(&save_path)
            .map_err(|e| CliError::new(format!("Failed to save recording: {e}")))?;
        if !quiet {
            println!("Recording saved to: {}", save_path.display());
            println!();
        }
    }

    match format {
        OutputFormat::Text => {
            print!("{}", format_text(&result));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonGameResult::from_game_result(&result))?;
            println!("{json}");
        }
        OutputFormat::State => {
            let mut engine = ReplayEngine::new(result.recording.clone())?;
            engine.run_to_end()?;
            println!("{}", engine.render_text());
            print!("{}", format_text(&result));
        }
    }

    Ok(())
}
