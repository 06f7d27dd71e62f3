//! Dice combat resolution.
//!
//! An attack is a session of rounds. Each round the attacker rolls up to
//! `max_attacker_dice` (never more than armies minus one) and the defender up
//! to `max_defender_dice`. Dice are sorted high to low and paired; each pair
//! costs the lower side one army, and ties go to the defender.

use std::collections::VecDeque;
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::Rules;
use crate::game::{PlayerId, TerritoryId};

/// Which side of a fight a die belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The attacking territory.
    Attacker,
    /// The defending territory.
    Defender,
}

/// Source of die rolls.
///
/// Injected into the engine so games can be seeded or scripted.
pub trait DiceSource: fmt::Debug + Send {
    /// Roll one die for `side`, returning a value in `1..=faces`.
    fn roll(&mut self, side: Side, faces: u8) -> u8;
}

/// Dice driven by a seeded `ChaCha8` generator.
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: ChaCha8Rng,
}

impl SeededDice {
    /// Dice seeded from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl DiceSource for SeededDice {
    fn roll(&mut self, _side: Side, faces: u8) -> u8 {
        self.rng.gen_range(1..=faces.max(1))
    }
}

/// Dice that replay fixed per-side sequences, for tests and puzzles.
///
/// Once a side's sequence runs out it rolls 1s.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDice {
    attacker: VecDeque<u8>,
    defender: VecDeque<u8>,
    exhausted: bool,
}

impl ScriptedDice {
    /// Dice that will roll `attacker` and `defender` in order.
    #[must_use]
    pub fn new(attacker: impl IntoIterator<Item = u8>, defender: impl IntoIterator<Item = u8>) -> Self {
        Self {
            attacker: attacker.into_iter().collect(),
            defender: defender.into_iter().collect(),
            exhausted: false,
        }
    }

    /// Whether any roll fell past the end of its script.
    #[must_use]
    pub const fn exhausted(&self) -> bool {
        self.exhausted
    }
}

impl DiceSource for ScriptedDice {
    fn roll(&mut self, side: Side, faces: u8) -> u8 {
        let queue = match side {
            Side::Attacker => &mut self.attacker,
            Side::Defender => &mut self.defender,
        };
        if let Some(value) = queue.pop_front() {
            value.clamp(1, faces.max(1))
        } else {
            self.exhausted = true;
            1
        }
    }
}

/// Dice the attacker rolls with `armies` effective attacking armies.
#[must_use]
pub fn attacker_dice_count(armies: u32, rules: &Rules) -> u32 {
    armies.saturating_sub(1).min(rules.max_attacker_dice)
}

/// Dice the defender rolls with `armies` defending armies.
#[must_use]
pub fn defender_dice_count(armies: u32, rules: &Rules) -> u32 {
    armies.min(rules.max_defender_dice)
}

/// One compared pair of dice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairOutcome {
    /// Attacker's die.
    pub attacker: u8,
    /// Defender's die.
    pub defender: u8,
    /// Side that won the pair.
    pub winner: Side,
}

/// One round of dice and its casualties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRound {
    /// Attacker dice, highest first.
    pub attacker_dice: Vec<u8>,
    /// Defender dice, highest first.
    pub defender_dice: Vec<u8>,
    /// Compared pairs, highest first.
    pub pairs: Vec<PairOutcome>,
    /// Armies the attacker lost.
    pub attacker_losses: u32,
    /// Armies the defender lost.
    pub defender_losses: u32,
}

impl DiceRound {
    /// Sort both hands and compare them pairwise.
    #[must_use]
    pub fn compare(mut attacker_dice: Vec<u8>, mut defender_dice: Vec<u8>) -> Self {
        attacker_dice.sort_unstable_by(|a, b| b.cmp(a));
        defender_dice.sort_unstable_by(|a, b| b.cmp(a));

        let pairs: Vec<PairOutcome> = attacker_dice
            .iter()
            .zip(&defender_dice)
            .map(|(&attacker, &defender)| PairOutcome {
                attacker,
                defender,
                winner: if attacker > defender {
                    Side::Attacker
                } else {
                    Side::Defender
                },
            })
            .collect();

        let mut attacker_losses = 0;
        let mut defender_losses = 0;
        for pair in &pairs {
            match pair.winner {
                Side::Attacker => defender_losses += 1,
                Side::Defender => attacker_losses += 1,
            }
        }

        Self {
            attacker_dice,
            defender_dice,
            pairs,
            attacker_losses,
            defender_losses,
        }
    }

    /// Roll a round for the given army counts.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError`] if either side is unable to roll.
    pub fn roll(
        attacking_armies: u32,
        defending_armies: u32,
        rules: &Rules,
        dice: &mut dyn DiceSource,
    ) -> Result<Self, CombatError> {
        let attacker_count = attacker_dice_count(attacking_armies, rules);
        if attacker_count == 0 {
            return Err(CombatError::AttackerCannotRoll {
                armies: attacking_armies,
            });
        }
        let defender_count = defender_dice_count(defending_armies, rules);
        if defender_count == 0 {
            return Err(CombatError::DefenderDefeated);
        }

        let attacker = (0..attacker_count)
            .map(|_| dice.roll(Side::Attacker, rules.die_faces))
            .collect();
        let defender = (0..defender_count)
            .map(|_| dice.roll(Side::Defender, rules.die_faces))
            .collect();
        Ok(Self::compare(attacker, defender))
    }
}

/// Combat bookkeeping failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CombatError {
    /// The attacker has too few armies to roll a die.
    #[error("attacker with {armies} armies cannot roll")]
    AttackerCannotRoll {
        /// Effective attacking armies.
        armies: u32,
    },
    /// The defender has no armies left.
    #[error("defender has no armies left")]
    DefenderDefeated,
    /// A round claimed more casualties than a side has.
    #[error("{side:?} loses {losses} of {armies} armies")]
    CasualtiesExceedArmies {
        /// Side concerned.
        side: Side,
        /// Armies it has.
        armies: u32,
        /// Casualties claimed.
        losses: u32,
    },
}

/// An open attack between two territories, spanning one or more rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FightSession {
    /// Attacking player.
    pub player: PlayerId,
    /// Defending player.
    pub defending_player: PlayerId,
    /// Source territory.
    pub attacker: TerritoryId,
    /// Target territory.
    pub defender: TerritoryId,
    /// Armies committed when the attack opened.
    pub committed: u32,
    /// Armies currently on the source territory.
    pub attacking_armies: u32,
    /// Armies currently on the target territory.
    pub defending_armies: u32,
    /// Rounds fought so far.
    pub history: Vec<DiceRound>,
}

impl FightSession {
    /// Open a session with the current board counts.
    #[must_use]
    pub const fn new(
        player: PlayerId,
        defending_player: PlayerId,
        attacker: TerritoryId,
        defender: TerritoryId,
        committed: u32,
        attacking_armies: u32,
        defending_armies: u32,
    ) -> Self {
        Self {
            player,
            defending_player,
            attacker,
            defender,
            committed,
            attacking_armies,
            defending_armies,
            history: Vec::new(),
        }
    }

    /// Attacker casualties across all rounds.
    #[must_use]
    pub fn attacker_losses(&self) -> u32 {
        self.history.iter().map(|r| r.attacker_losses).sum()
    }

    /// Defender casualties across all rounds.
    #[must_use]
    pub fn defender_losses(&self) -> u32 {
        self.history.iter().map(|r| r.defender_losses).sum()
    }

    /// Committed armies still alive.
    #[must_use]
    pub fn committed_remaining(&self) -> u32 {
        self.committed.saturating_sub(self.attacker_losses())
    }

    /// Armies the attacker fights with this round: the survivors of the
    /// commitment plus the one that must stay home, capped by the board.
    #[must_use]
    pub fn effective_attackers(&self) -> u32 {
        self.attacking_armies
            .min(self.committed_remaining().saturating_add(1))
    }

    /// Whether another round can be rolled.
    #[must_use]
    pub fn can_continue(&self) -> bool {
        self.defending_armies > 0 && self.effective_attackers() >= 2
    }

    /// Whether the defender has been wiped out.
    #[must_use]
    pub const fn is_conquest(&self) -> bool {
        self.defending_armies == 0
    }

    /// Roll the next round without recording it.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError`] if the session cannot continue.
    pub fn fight_round(&self, rules: &Rules, dice: &mut dyn DiceSource) -> Result<DiceRound, CombatError> {
        DiceRound::roll(self.effective_attackers(), self.defending_armies, rules, dice)
    }

    /// Apply a round's casualties to the session.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError::CasualtiesExceedArmies`] if either side would go negative.
    pub fn record(&mut self, round: &DiceRound) -> Result<(), CombatError> {
        let attacking = self
            .attacking_armies
            .checked_sub(round.attacker_losses)
            .ok_or(CombatError::CasualtiesExceedArmies {
                side: Side::Attacker,
                armies: self.attacking_armies,
                losses: round.attacker_losses,
            })?;
        let defending = self
            .defending_armies
            .checked_sub(round.defender_losses)
            .ok_or(CombatError::CasualtiesExceedArmies {
                side: Side::Defender,
                armies: self.defending_armies,
                losses: round.defender_losses,
            })?;
        self.attacking_armies = attacking;
        self.defending_armies = defending;
        self.history.push(round.clone());
        Ok(())
    }

    /// Roll rounds until the session can no longer continue, returning how many were fought.
    ///
    /// # Errors
    ///
    /// Returns [`CombatError`] if a round fails to apply.
    pub fn fight_to_completion(&mut self, rules: &Rules, dice: &mut dyn DiceSource) -> Result<usize, CombatError> {
        let mut rounds = 0;
        while self.can_continue() {
            let round = self.fight_round(rules, dice)?;
            self.record(&round)?;
            rounds += 1;
        }
        Ok(rounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dice_counts() {
        let rules = Rules::default();
        assert_eq!(attacker_dice_count(1, &rules), 0);
        assert_eq!(attacker_dice_count(2, &rules), 1);
        assert_eq!(attacker_dice_count(3, &rules), 2);
        assert_eq!(attacker_dice_count(4, &rules), 3);
        assert_eq!(attacker_dice_count(10, &rules), 3);
        assert_eq!(defender_dice_count(0, &rules), 0);
        assert_eq!(defender_dice_count(1, &rules), 1);
        assert_eq!(defender_dice_count(5, &rules), 2);
    }

    #[test]
    fn test_compare_sorts_and_pairs() {
        let round = DiceRound::compare(vec![4, 6, 5], vec![2, 3]);
        assert_eq!(round.attacker_dice, vec![6, 5, 4]);
        assert_eq!(round.defender_dice, vec![3, 2]);
        assert_eq!(round.pairs.len(), 2);
        assert_eq!(round.defender_losses, 2);
        assert_eq!(round.attacker_losses, 0);
    }

    #[test]
    fn test_ties_go_to_defender() {
        let round = DiceRound::compare(vec![5, 3], vec![5, 3]);
        assert_eq!(round.attacker_losses, 2);
        assert_eq!(round.defender_losses, 0);
        assert!(round.pairs.iter().all(|p| p.winner == Side::Defender));
    }

    #[test]
    fn test_roll_uses_script() {
        let rules = Rules::default();
        let mut dice = ScriptedDice::new([6, 5, 4], [3, 2]);
        let round = DiceRound::roll(3, 2, &rules, &mut dice).unwrap();
        assert_eq!(round.attacker_dice, vec![6, 5]);
        assert_eq!(round.defender_losses, 2);
        assert!(!dice.exhausted());
    }

    #[test]
    fn test_roll_refuses_single_army() {
        let rules = Rules::default();
        let mut dice = SeededDice::new(1);
        assert_eq!(
            DiceRound::roll(1, 3, &rules, &mut dice),
            Err(CombatError::AttackerCannotRoll { armies: 1 })
        );
        assert_eq!(
            DiceRound::roll(4, 0, &rules, &mut dice),
            Err(CombatError::DefenderDefeated)
        );
    }

    #[test]
    fn test_seeded_dice_deterministic() {
        let mut a = SeededDice::new(42);
        let mut b = SeededDice::new(42);
        for _ in 0..50 {
            let roll = a.roll(Side::Attacker, 6);
            assert_eq!(roll, b.roll(Side::Attacker, 6));
            assert!((1..=6).contains(&roll));
        }
    }

    #[test]
    fn test_effective_attackers_capped_by_commitment() {
        let session = FightSession::new(1, 2, 1, 2, 2, 10, 3);
        assert_eq!(session.effective_attackers(), 3);
        let session = FightSession::new(1, 2, 1, 2, 9, 4, 3);
        assert_eq!(session.effective_attackers(), 4);
    }

    #[test]
    fn test_record_tracks_casualties() {
        let mut session = FightSession::new(1, 2, 1, 2, 3, 4, 2);
        session
            .record(&DiceRound::compare(vec![6, 1], vec![5, 4]))
            .unwrap();
        assert_eq!(session.attacking_armies, 3);
        assert_eq!(session.defending_armies, 1);
        assert_eq!(session.committed_remaining(), 2);
        assert!(session.can_continue());
    }

    #[test]
    fn test_record_rejects_excess_losses() {
        let mut session = FightSession::new(1, 2, 1, 2, 1, 2, 1);
        let round = DiceRound::compare(vec![6, 6], vec![1, 1]);
        assert!(matches!(
            session.record(&round),
            Err(CombatError::CasualtiesExceedArmies {
                side: Side::Defender,
                ..
            })
        ));
        assert!(session.history.is_empty());
    }

    #[test]
    fn test_fight_to_completion_ends_session() {
        let rules = Rules::default();
        let mut dice = SeededDice::new(7);
        let mut session = FightSession::new(1, 2, 1, 2, 5, 6, 4);
        let rounds = session.fight_to_completion(&rules, &mut dice).unwrap();
        assert!(rounds > 0);
        assert!(!session.can_continue());
        assert!(session.attacking_armies >= 1);
        if session.is_conquest() {
            assert!(session.committed_remaining() >= 1);
        }
    }
}
