//! Defensive agent.

use crate::agent::{Agent, Decision, attack_options, move_options};
use crate::engine::View;
use crate::event::Intent;

/// Shores up its weakest border and only attacks with at least double the defenders.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefensiveAgent;

impl DefensiveAgent {
    /// Create the agent.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Agent for DefensiveAgent {
    fn name(&self) -> &str {
        "defensive"
    }

    fn propose_placement(&mut self, view: &View<'_>) -> Decision {
        let player = view.player();
        let board = &view.game().board;

        let mut weakest = None;
        for t in board.owned_by(player).filter(|t| board.is_border(t.id)) {
            if weakest.is_none_or(|(_, armies)| t.armies < armies) {
                weakest = Some((t.id, t.armies));
            }
        }
        let target = weakest
            .map(|(id, _)| id)
            .or_else(|| board.owned_by(player).next().map(|t| t.id));

        match target {
            Some(id) => Decision::Act(Intent::place_troop(player, id, 1)),
            None => Decision::NoAction,
        }
    }

    fn propose_attack(&mut self, view: &View<'_>) -> Decision {
        let player = view.player();
        if let Some(fight) = view.fight() {
            // Keep rolling only while still ahead.
            return if fight.effective_attackers() > fight.defending_armies {
                Decision::Act(Intent::resolve_attack_round(player))
            } else {
                Decision::NoAction
            };
        }

        attack_options(view.game(), player)
            .into_iter()
            .find(|o| o.attackers > o.defenders.saturating_mul(2))
            .map_or(Decision::NoAction, |o| {
                Decision::Act(Intent::attack(player, o.from, o.to, o.attackers - 1))
            })
    }

    fn propose_movement(&mut self, view: &View<'_>) -> Decision {
        let player = view.player();
        let board = &view.game().board;

        // Strongest source feeding the weakest bordering target.
        let mut best = None;
        for option in move_options(view.game(), player) {
            if !board.is_border(option.to) {
                continue;
            }
            let Some(target) = board.get(option.to) else {
                continue;
            };
            if target.armies.saturating_add(1) >= option.available {
                continue;
            }
            let key = (option.available, u32::MAX - target.armies);
            if best.is_none_or(|(_, k)| key > k) {
                best = Some((option, key));
            }
        }

        match best {
            Some((option, _)) => Decision::Act(Intent::move_troops(
                player,
                option.from,
                option.to,
                ((option.available - 1) / 2).max(1),
            )),
            None => Decision::NoAction,
        }
    }
}
