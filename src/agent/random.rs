//! Random agent.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::agent::{Agent, Decision, attack_options, move_options};
use crate::engine::View;
use crate::event::Intent;
use crate::game::Territory;

/// Picks uniformly among legal actions.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: ChaCha8Rng,
    attack_probability: f64,
}

impl RandomAgent {
    /// Agent seeded from `seed` that opens an attack half the time.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            attack_probability: 0.5,
        }
    }

    /// Change how often a new attack is opened.
    #[must_use]
    pub fn with_attack_probability(mut self, probability: f64) -> Self {
        self.attack_probability = probability;
        self
    }
}

impl Agent for RandomAgent {
    fn name(&self) -> &str {
        "random"
    }

    fn propose_placement(&mut self, view: &View<'_>) -> Decision {
        let player = view.player();
        let owned: Vec<&Territory> = view.game().board.owned_by(player).collect();
        match owned.choose(&mut self.rng) {
            Some(t) => Decision::Act(Intent::place_troop(player, t.id, 1)),
            None => Decision::NoAction,
        }
    }

    fn propose_attack(&mut self, view: &View<'_>) -> Decision {
        let player = view.player();
        if view.fight().is_some() {
            return Decision::Act(Intent::resolve_attack_round(player));
        }
        if !self.rng.gen_bool(self.attack_probability.clamp(0.0, 1.0)) {
            return Decision::NoAction;
        }
        let options = attack_options(view.game(), player);
        match options.choose(&mut self.rng) {
            Some(option) => Decision::Act(Intent::attack(
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
        let options = move_options(view.game(), player);
        let Some(option) = options.choose(&mut self.rng).copied() else {
            return Decision::NoAction;
        };
        let count = self.rng.gen_range(1..option.available);
        Decision::Act(Intent::move_troops(player, option.from, option.to, count))
    }
}
