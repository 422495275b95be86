use brainfuzz_evolution::{EvolutionParams, EvolutionSeed};
use brainfuzz_program::Program;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An evolved program together with how it was obtained.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainedProgram {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub generations: u64,
    pub final_score: f64,
    pub final_size: f64,
    pub rng_seed: EvolutionSeed,
    pub params: EvolutionParams,
    pub program: Program,
}
