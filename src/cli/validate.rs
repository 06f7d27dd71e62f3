//! Scenario validation command implementation.

use super::CliError;
use conquest::game::check_invariants;
use conquest::{Rules, Scenario};
use std::path::Path;

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the scenario cannot be read, is not a legal starting
/// position, or breaks an invariant.
pub(crate) fn execute(scenario_path: &Path, rules_path: Option<&Path>) -> Result<(), CliError> {
    println!("Validating: {}", scenario_path.display());
    println!();

    let rules = match rules_path {
        Some(path) => Rules::load(path)?,
        None => Rules::default(),
    };
    print_check("Rules", true);

    let scenario = Scenario::load(scenario_path)?;
    print_check("Scenario parses", true);

    let state = match scenario.build(rules) {
        Ok(state) => {
            print_check("Starting position", true);
            state
        }
        Err(e) => {
            print_check("Starting position", false);
            return Err(e.into());
        }
    };

    let violations = check_invariants(&state);
    print_check("Invariants", violations.is_empty());
    if !violations.is_empty() {
        for violation in &violations {
            println!("    - {violation}");
        }
        return Err(CliError::new(format!(
            "{} invariant violation(s)",
            violations.len()
        )));
    }

    println!();
    println!("Summary:");
    if !scenario.name.is_empty() {
        println!("  Name:         {}", scenario.name);
    }
    println!("  Players:      {} ({} active)", state.players.len(), state.active_count());
    println!("  Territories:  {}", state.board.len());
    println!("  Continents:   {}", state.board.continents().len());
    println!("  Armies:       {}", state.board.total_armies());
    println!("  First player: {}", state.current_player);
    println!();
    println!("Validation successful!");

    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
