//! Aggressive agent.

use crate::agent::{Agent, Decision, attack_options, move_options};
use crate::engine::View;
use crate::event::Intent;

/// Stacks armies on its strongest front and attacks whenever it outnumbers the defender.
#[derive(Debug, Clone, Copy, Default)]
pub struct AggressiveAgent;

impl AggressiveAgent {
    /// Create the agent.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Agent for AggressiveAgent {
    fn name(&self) -> &str {
        "aggressive"
    }

    fn propose_placement(&mut self, view: &View<'_>) -> Decision {
        let player = view.player();
        let board = &view.game().board;

        // Strongest border territory, lowest id on ties; fall back to any owned territory.
        let mut best = None;
        for t in board.owned_by(player).filter(|t| board.is_border(t.id)) {
            if best.is_none_or(|(_, armies)| t.armies > armies) {
                best = Some((t.id, t.armies));
            }
        }
        let target = best
            .map(|(id, _)| id)
            .or_else(|| board.owned_by(player).next().map(|t| t.id));

        match target {
            Some(id) => Decision::Act(Intent::place_troop(
                player,
                id,
                view.reinforcements_remaining(),
            )),
            None => Decision::NoAction,
        }
    }

    fn propose_attack(&mut self, view: &View<'_>) -> Decision {
        let player = view.player();
        if view.fight().is_some() {
            return Decision::Act(Intent::resolve_attack_round(player));
        }

        let mut best = None;
        for option in attack_options(view.game(), player) {
            if option.attackers <= option.defenders {
                continue;
            }
            let margin = option.attackers - option.defenders;
            if best.is_none_or(|(_, m)| margin > m) {
                best = Some((option, margin));
            }
        }

        match best {
            Some((option, _)) => Decision::Act(Intent::attack(
                player,
                option.from,
                option.to,
                option.attackers - 1,
            )),
            None => Decision::NoAction,
        }
    }

    fn propose_movement(&mut self, view: &View<'_>) -> Decision {
        let player = view.player();
        let board = &view.game().board;

        // Push idle interior armies toward the front.
        let mut best = None;
        for option in move_options(view.game(), player) {
            if board.is_border(option.from) || !board.is_border(option.to) {
                continue;
            }
            if best.is_none_or(|(_, available)| option.available > available) {
                best = Some((option, option.available));
            }
        }

        match best {
            Some((option, _)) => Decision::Act(Intent::move_troops(
                player,
                option.from,
                option.to,
                option.available - 1,
            )),
            None => Decision::NoAction,
        }
    }
}
