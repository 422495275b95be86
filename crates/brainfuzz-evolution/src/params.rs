use serde::{Deserialize, Serialize};

use crate::InvalidParamsError;

/// Tunable constants of an evolution run.
///
/// Every field has a default, so a params file only needs to list what it changes.
///
/// # Example
///
/// ```
/// use brainfuzz_evolution::EvolutionParams;
///
/// let params: EvolutionParams =
///     serde_json::from_str(r#"{ "generation_size": 32, "survival_rate": 0.25 }"#).unwrap();
/// assert_eq!(params.generation_size, 32);
/// assert_eq!(params.mutation_rate, EvolutionParams::default().mutation_rate);
/// params.validate().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionParams {
    /// Number of population slots in the arena
    pub generation_size: usize,
    /// Scale of magnitude perturbations
    pub mutation_strength: f64,
    /// Controls the maximum number of edits in one mutation burst (`ceil(2 * rate)`)
    pub mutation_rate: f64,
    /// Relative weights of the mutation operators
    pub operator_weights: OperatorWeights,
    /// Base survival probability of ranked slots below the top
    pub survival_rate: f64,
    /// Per-rank decay of the survival multiplier, in `(0, 1)`
    pub survival_falloff: f64,
    /// Replay count passed to the oracle for per-generation scoring
    pub precision: f64,
    /// Replay count passed to the oracle when scoring the seed program
    pub seed_precision: f64,
    /// Whether shrunk tokens may be deleted
    pub deletion: DeletionPolicy,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            generation_size: 16,
            mutation_strength: 2.0,
            mutation_rate: 3.0,
            operator_weights: OperatorWeights::default(),
            survival_rate: 0.5,
            survival_falloff: 0.9,
            precision: 1.0,
            seed_precision: 100.0,
            deletion: DeletionPolicy::Disabled,
        }
    }
}

impl EvolutionParams {
    pub fn validate(&self) -> Result<(), InvalidParamsError> {
        let invalid = |field, reason| Err(InvalidParamsError { field, reason });

        if self.generation_size == 0 {
            return invalid("generation_size", "must be at least 1");
        }
        if !(self.mutation_strength.is_finite() && self.mutation_strength >= 0.0) {
            return invalid("mutation_strength", "must be finite and non-negative");
        }
        if !(self.mutation_rate.is_finite() && self.mutation_rate > 0.0) {
            return invalid("mutation_rate", "must be finite and positive");
        }
        self.operator_weights.validate()?;
        if !(0.0..=1.0).contains(&self.survival_rate) {
            return invalid("survival_rate", "must be in [0, 1]");
        }
        if !(self.survival_falloff > 0.0 && self.survival_falloff < 1.0) {
            return invalid("survival_falloff", "must be in (0, 1)");
        }
        if let DeletionPolicy::BelowThreshold { threshold } = self.deletion
            && !(threshold.is_finite() && threshold >= 0.0)
        {
            return invalid("deletion.threshold", "must be finite and non-negative");
        }
        Ok(())
    }
}

/// Relative weights of the three mutation operators.
///
/// Weights are normalized by their sum when an operator is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorWeights {
    pub perturb: f64,
    pub shrink: f64,
    pub insert: f64,
}

impl Default for OperatorWeights {
    fn default() -> Self {
        Self {
            perturb: 1.0,
            shrink: 0.2,
            insert: 0.1,
        }
    }
}

impl OperatorWeights {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.perturb + self.shrink + self.insert
    }

    fn validate(&self) -> Result<(), InvalidParamsError> {
        let weights = [self.perturb, self.shrink, self.insert];
        if weights.iter().any(|w| !(w.is_finite() && *w >= 0.0)) {
            return Err(InvalidParamsError {
                field: "operator_weights",
                reason: "must be finite and non-negative",
            });
        }
        if self.total() <= 0.0 {
            return Err(InvalidParamsError {
                field: "operator_weights",
                reason: "must have a positive sum",
            });
        }
        Ok(())
    }
}

/// What the shrink operator does with tokens whose magnitude becomes tiny.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum DeletionPolicy {
    /// Tokens are never removed once inserted.
    #[default]
    Disabled,
    /// A shrunk token whose magnitude drops below `threshold` is removed.
    BelowThreshold { threshold: f64 },
}
