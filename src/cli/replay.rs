//! Replay command implementation.

use super::{CliError, ReplayFormat};
use conquest::replay::{Recording, ReplayEngine};
use std::path::Path;

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or diverges.
pub(crate) fn execute(
    recording_path: &Path,
    format: ReplayFormat,
    stop_at: Option<usize>,
) -> Result<(), CliError> {
    let recording = Recording::load(recording_path).map_err(|e| {
        CliError::new(format!(
            "Failed to load recording {}: {e}",
            recording_path.display()
        ))
    })?;

    let mut engine = ReplayEngine::new(recording)?;
    let target = stop_at.unwrap_or_else(|| engine.len()).min(engine.len());

    match format {
        ReplayFormat::Final => {
            engine.seek(target)?;
            print_position(&engine);
        }
        ReplayFormat::Steps => {
            print_position(&engine);
            while engine.cursor() < target {
                engine.step_forward()?;
                println!();
                print_position(&engine);
            }
        }
        ReplayFormat::Json => {
            engine.seek(target)?;
            let json = serde_json::to_string_pretty(&engine.simulation().snapshot())?;
            println!("{json}");
        }
    }

    Ok(())
}

fn print_position(engine: &ReplayEngine) {
    println!("--- event {}/{} ---", engine.cursor(), engine.len());
    print!("{}", engine.render_text());
}
