//! Mutation operators for token programs.
//!
//! A mutation is a burst of one or more edits applied to a single [`Individual`].
//! Each edit draws one of three operators, weighted by [`OperatorWeights`]:
//!
//! - **Perturb** - add a signed, zero-biased perturbation to a random token's magnitude
//! - **Shrink** - divide a random token's magnitude by `1 + |perturbation|`
//! - **Insert** - insert a random non-reserved token at a random position and perturb it
//!
//! # Burst Length
//!
//! The number of edits is `1 + floor(u² · max_edits)` for a uniform `u`, where
//! `max_edits = max(1, ceil(2 · mutation_rate))`. Squaring `u` skews bursts toward
//! few edits while still allowing long ones at higher rates.
//!
//! # Capacity
//!
//! An insertion into a full program fails with [`CapacityExceededError`] and stops
//! the whole burst: edits already applied stay applied, the remaining ones are
//! skipped. Callers treat the child as failed.

use brainfuzz_program::{CapacityExceededError, TokenType};
use rand::Rng;

use crate::{DeletionPolicy, EvolutionParams, Individual, OperatorWeights, random};

/// One edit of a mutation burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum MutationOp {
    Perturb,
    Shrink,
    Insert,
}

impl MutationOp {
    /// Draws an operator with probability proportional to its weight.
    pub fn sample<R>(weights: &OperatorWeights, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let pick = random::uniform(rng) * weights.total();
        if pick < weights.perturb {
            Self::Perturb
        } else if pick < weights.perturb + weights.shrink {
            Self::Shrink
        } else {
            Self::Insert
        }
    }
}

/// Applies mutation bursts to individuals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mutator {
    /// Maximum program length; insertions beyond it fail
    pub capacity: usize,
    /// Scale of magnitude perturbations
    pub strength: f64,
    /// Controls the maximum burst length
    pub rate: f64,
    pub weights: OperatorWeights,
    pub deletion: DeletionPolicy,
}

impl Mutator {
    #[must_use]
    pub fn from_params(params: &EvolutionParams, capacity: usize) -> Self {
        Self {
            capacity,
            strength: params.mutation_strength,
            rate: params.mutation_rate,
            weights: params.operator_weights,
            deletion: params.deletion,
        }
    }

    /// Upper bound on the number of edits in one burst.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn max_edits(&self) -> usize {
        ((self.rate * 2.0).ceil() as usize).max(1)
    }

    /// Draws the number of edits for one burst, in `1..=max_edits`.
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn burst_len<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let max_edits = self.max_edits();
        let u = random::uniform(rng);
        (1 + (u * u * max_edits as f64) as usize).min(max_edits)
    }

    /// Applies one mutation burst and returns the number of edits drawn.
    ///
    /// On [`CapacityExceededError`] the burst stops at the failing insertion.
    ///
    /// # Example
    ///
    /// ```
    /// use brainfuzz_evolution::{EvolutionParams, Mutator, ProgramArena, mutation_rng};
    /// use brainfuzz_program::{Token, TokenType};
    ///
    /// let mut arena = ProgramArena::new(1, 8).unwrap();
    /// arena.load(0, &[Token::new(TokenType::new(1).unwrap(), 2.0)]).unwrap();
    ///
    /// let mutator = Mutator::from_params(&EvolutionParams::default(), 8);
    /// let mut individual = arena.individual_mut(0);
    /// mutator.mutate(&mut individual, &mut mutation_rng(3)).ok();
    ///
    /// let recomputed: f64 = individual.tokens().iter().map(|t| t.magnitude.abs()).sum();
    /// assert!((individual.size() - recomputed).abs() < 1e-9);
    /// ```
    pub fn mutate<R>(
        &self,
        individual: &mut Individual<'_>,
        rng: &mut R,
    ) -> Result<usize, CapacityExceededError>
    where
        R: Rng + ?Sized,
    {
        let edits = self.burst_len(rng);
        for _ in 0..edits {
            let op = MutationOp::sample(&self.weights, rng);
            self.apply(op, individual, rng)?;
        }
        Ok(edits)
    }

    /// Applies a single edit.
    ///
    /// Perturb and shrink are no-ops on an empty program.
    pub fn apply<R>(
        &self,
        op: MutationOp,
        individual: &mut Individual<'_>,
        rng: &mut R,
    ) -> Result<(), CapacityExceededError>
    where
        R: Rng + ?Sized,
    {
        match op {
            MutationOp::Perturb => {
                if individual.is_empty() {
                    return Ok(());
                }
                let index = rng.random_range(0..individual.len());
                self.perturb(individual, index, rng);
            }
            MutationOp::Shrink => {
                if individual.is_empty() {
                    return Ok(());
                }
                let index = rng.random_range(0..individual.len());
                self.shrink(individual, index, rng);
            }
            MutationOp::Insert => {
                let len = individual.len();
                if len >= self.capacity.min(individual.capacity()) {
                    return Err(CapacityExceededError {
                        len: len + 1,
                        max_len: self.capacity.min(individual.capacity()),
                    });
                }
                let index = rng.random_range(0..=len);
                let token_type: TokenType = rng.random();
                individual.insert(index, token_type)?;
                self.perturb(individual, index, rng);
            }
        }
        Ok(())
    }

    fn perturb<R>(&self, individual: &mut Individual<'_>, index: usize, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let magnitude = individual.tokens()[index].magnitude;
        let delta = random::perturbation(rng, self.strength);
        individual.set_magnitude(index, magnitude + delta);
    }

    fn shrink<R>(&self, individual: &mut Individual<'_>, index: usize, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let magnitude = individual.tokens()[index].magnitude;
        let divisor = 1.0 + random::perturbation(rng, self.strength).abs();
        let shrunk = magnitude / divisor;
        debug_assert!(shrunk.abs() <= magnitude.abs());
        individual.set_magnitude(index, shrunk);

        if let DeletionPolicy::BelowThreshold { threshold } = self.deletion
            && shrunk.abs() < threshold
        {
            individual.remove(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use brainfuzz_program::Token;

    use super::*;
    use crate::{ProgramArena, mutation_rng};

    fn ty(value: u8) -> TokenType {
        TokenType::new(value).unwrap()
    }

    fn mutator(capacity: usize) -> Mutator {
        Mutator::from_params(&EvolutionParams::default(), capacity)
    }

    fn assert_size_invariant(individual: &Individual<'_>) {
        let recomputed: f64 = individual
            .tokens()
            .iter()
            .map(|t| t.magnitude.abs())
            .sum();
        assert!(
            (individual.size() - recomputed).abs() <= 1e-9 * recomputed.max(1.0),
            "size {} != recomputed {recomputed}",
            individual.size()
        );
        assert!(individual.size() >= 0.0);
        assert!(individual.len() <= individual.capacity());
    }

    #[test]
    fn test_size_invariant_holds_after_every_mutation() {
        let mut arena = ProgramArena::new(1, 32).unwrap();
        arena
            .load(0, &[Token::new(ty(1), 2.0), Token::new(ty(2), -1.0)])
            .unwrap();
        let mutator = mutator(32);
        for seed in 0..500 {
            let mut individual = arena.individual_mut(0);
            let _ = mutator.mutate(&mut individual, &mut mutation_rng(seed));
            assert_size_invariant(&individual);
        }
    }

    #[test]
    fn test_insert_into_full_program_fails_unchanged() {
        let tokens = [Token::new(ty(3), 1.0), Token::new(ty(4), -0.5)];
        let mut arena = ProgramArena::new(1, 2).unwrap();
        arena.load(0, &tokens).unwrap();

        let mut individual = arena.individual_mut(0);
        let err = mutator(2)
            .apply(MutationOp::Insert, &mut individual, &mut mutation_rng(0))
            .unwrap_err();
        assert_eq!(err, CapacityExceededError { len: 3, max_len: 2 });
        assert_eq!(individual.tokens(), tokens);
        assert!((individual.size() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_mutator_capacity_below_storage() {
        let mut arena = ProgramArena::new(1, 8).unwrap();
        arena.load(0, &[Token::new(ty(1), 1.0)]).unwrap();
        let mut individual = arena.individual_mut(0);
        assert!(
            mutator(1)
                .apply(MutationOp::Insert, &mut individual, &mut mutation_rng(0))
                .is_err()
        );
        assert_eq!(individual.len(), 1);
    }

    #[test]
    fn test_insert_adds_non_reserved_perturbed_token() {
        let mut arena = ProgramArena::new(1, 4).unwrap();
        arena.load(0, &[]).unwrap();
        let mut individual = arena.individual_mut(0);
        let mut rng = mutation_rng(11);
        mutator(4)
            .apply(MutationOp::Insert, &mut individual, &mut rng)
            .unwrap();

        assert_eq!(individual.len(), 1);
        let token = individual.tokens()[0];
        assert!(!token.token_type.is_reserved());
        assert!((individual.size() - token.magnitude.abs()).abs() < 1e-12);
        assert!(token.magnitude.abs() <= 0.25 * 2.0);
    }

    #[test]
    fn test_empty_program_skips_perturb_and_shrink() {
        let mut arena = ProgramArena::new(1, 4).unwrap();
        arena.load(0, &[]).unwrap();
        let mut individual = arena.individual_mut(0);
        let mut rng = mutation_rng(5);
        let mutator = mutator(4);
        mutator
            .apply(MutationOp::Perturb, &mut individual, &mut rng)
            .unwrap();
        mutator
            .apply(MutationOp::Shrink, &mut individual, &mut rng)
            .unwrap();
        assert!(individual.is_empty());
        assert_eq!(individual.size(), 0.0);
    }

    #[test]
    fn test_shrink_moves_toward_zero_and_never_deletes_by_default() {
        let mut arena = ProgramArena::new(1, 1).unwrap();
        arena.load(0, &[Token::new(ty(2), -3.0)]).unwrap();
        let mutator = mutator(1);
        let mut rng = mutation_rng(21);
        let mut individual = arena.individual_mut(0);

        let mut previous = 3.0;
        for _ in 0..200 {
            mutator
                .apply(MutationOp::Shrink, &mut individual, &mut rng)
                .unwrap();
            let magnitude = individual.tokens()[0].magnitude;
            assert!(magnitude <= 0.0);
            assert!(magnitude.abs() <= previous);
            previous = magnitude.abs();
            assert_size_invariant(&individual);
        }
        // Deletion is disabled: the token survives even after shrinking toward zero.
        assert_eq!(individual.len(), 1);
    }

    #[test]
    fn test_deletion_policy_removes_tiny_tokens() {
        let mut arena = ProgramArena::new(1, 2).unwrap();
        arena
            .load(0, &[Token::new(ty(1), 0.001), Token::new(ty(2), 0.001)])
            .unwrap();
        let mutator = Mutator {
            deletion: DeletionPolicy::BelowThreshold { threshold: 0.01 },
            ..mutator(2)
        };
        let mut individual = arena.individual_mut(0);
        let mut rng = mutation_rng(8);
        mutator
            .apply(MutationOp::Shrink, &mut individual, &mut rng)
            .unwrap();
        assert_eq!(individual.len(), 1);
        assert_size_invariant(&individual);
    }

    /// Replays a burst edit by edit on the same stream `mutate` would use.
    ///
    /// Returns the program at the first failed insertion and the operation the
    /// burst would have applied next, if any edits remained.
    fn replay_until_failure(
        mutator: &Mutator,
        tokens: &[Token],
        seed: u64,
    ) -> Option<(Vec<Token>, f64, Option<MutationOp>)> {
        let mut arena = ProgramArena::new(1, tokens.len()).unwrap();
        arena.load(0, tokens).unwrap();
        let mut individual = arena.individual_mut(0);
        let mut rng = mutation_rng(seed);
        let edits = mutator.burst_len(&mut rng);
        for edit in 0..edits {
            let op = MutationOp::sample(&mutator.weights, &mut rng);
            if mutator.apply(op, &mut individual, &mut rng).is_err() {
                let next =
                    (edit + 1 < edits).then(|| MutationOp::sample(&mutator.weights, &mut rng));
                return Some((individual.tokens().to_vec(), individual.size(), next));
            }
        }
        None
    }

    #[test]
    fn test_capacity_failure_aborts_burst() {
        let tokens = [Token::new(ty(1), 1.0), Token::new(ty(5), -2.0)];
        let mutator = Mutator {
            rate: 10.0,
            weights: OperatorWeights {
                perturb: 1.0,
                shrink: 0.0,
                insert: 1.0,
            },
            ..mutator(2)
        };

        let mut checked = 0;
        for seed in 0..200 {
            let Some((at_failure, size_at_failure, next)) =
                replay_until_failure(&mutator, &tokens, seed)
            else {
                continue;
            };
            // Only bursts that would perturb after the failed insertion can tell
            // an abort from a skip.
            if next != Some(MutationOp::Perturb) {
                continue;
            }
            checked += 1;

            let mut arena = ProgramArena::new(1, 2).unwrap();
            arena.load(0, &tokens).unwrap();
            let mut individual = arena.individual_mut(0);
            let err = mutator
                .mutate(&mut individual, &mut mutation_rng(seed))
                .unwrap_err();
            assert_eq!(err, CapacityExceededError { len: 3, max_len: 2 });
            assert_eq!(individual.len(), 2);
            for (actual, expected) in individual.tokens().iter().zip(&at_failure) {
                assert_eq!(actual.token_type, expected.token_type);
                assert_eq!(actual.magnitude.to_bits(), expected.magnitude.to_bits());
            }
            assert_eq!(individual.size().to_bits(), size_at_failure.to_bits());
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_burst_len_bounds() {
        let mut rng = mutation_rng(2);
        for rate in [0.1, 1.0, 3.0, 10.0] {
            let mutator = Mutator { rate, ..mutator(8) };
            let max = mutator.max_edits();
            for _ in 0..200 {
                let edits = mutator.burst_len(&mut rng);
                assert!((1..=max).contains(&edits));
            }
        }
        assert_eq!(Mutator { rate: 3.0, ..mutator(8) }.max_edits(), 6);
        assert_eq!(Mutator { rate: 0.1, ..mutator(8) }.max_edits(), 1);
    }

    #[test]
    fn test_operator_sampling_follows_weights() {
        let weights = OperatorWeights::default();
        let mut rng = mutation_rng(4);
        let mut counts = [0_u32; 3];
        for _ in 0..13_000 {
            match MutationOp::sample(&weights, &mut rng) {
                MutationOp::Perturb => counts[0] += 1,
                MutationOp::Shrink => counts[1] += 1,
                MutationOp::Insert => counts[2] += 1,
            }
        }
        // Expected 10000 / 2000 / 1000.
        assert!((9_000..11_000).contains(&counts[0]));
        assert!((1_500..2_500).contains(&counts[1]));
        assert!((700..1_300).contains(&counts[2]));
    }

    #[test]
    fn test_same_seed_same_child() {
        let seed_tokens = [Token::new(ty(1), 1.0), Token::new(ty(5), 0.5)];
        let mutator = mutator(16);
        let mut children = Vec::new();
        for _ in 0..2 {
            let mut arena = ProgramArena::new(1, 16).unwrap();
            arena.load(0, &seed_tokens).unwrap();
            let mut individual = arena.individual_mut(0);
            mutator
                .mutate(&mut individual, &mut mutation_rng(1234))
                .unwrap();
            children.push(individual.tokens().to_vec());
        }
        assert_eq!(children[0], children[1]);
    }
}
