use brainfuzz_program::{Program, Token};
use brainfuzz_stats::descriptive::DescriptiveStats;
use rand::Rng as _;
use rand_pcg::Pcg32;

use crate::{
    EvolutionParams, EvolutionSeed, EvolveError, Mutator, ProgramArena, SlotState, SurvivorSet,
    mutation_rng, selection,
};

/// Scores a program. Higher is better.
///
/// The oracle typically runs the program through an interpreter `precision` times
/// and aggregates the results. The engine treats any returned value as valid,
/// including heavily penalized scores for programs that failed to run.
///
/// Closures of the form `FnMut(&[Token], f64, f64) -> f64` implement this trait.
pub trait ScoringOracle {
    /// Scores `program`, whose aggregate size is `size`.
    fn score(&mut self, program: &[Token], size: f64, precision: f64) -> f64;
}

impl<F> ScoringOracle for F
where
    F: FnMut(&[Token], f64, f64) -> f64,
{
    fn score(&mut self, program: &[Token], size: f64, precision: f64) -> f64 {
        self(program, size, precision)
    }
}

/// Best program observed over a run, kept outside the population.
#[derive(Debug, Clone, PartialEq)]
pub struct Champion {
    tokens: Vec<Token>,
    size: f64,
    score: f64,
    seed: u64,
    generation: Option<u64>,
}

impl Champion {
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn size(&self) -> f64 {
        self.size
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Provenance seed of the mutation that produced the champion (0 for the seed program).
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generation in which the champion was found, or `None` for the seed program.
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// A NaN champion score loses to any number, matching the ranking order.
    fn is_beaten_by(&self, score: f64) -> bool {
        !score.is_nan() && (self.score.is_nan() || score > self.score)
    }

    fn record(&mut self, arena: &ProgramArena, slot: usize, generation: u64) {
        let info = arena.info(slot);
        self.tokens.clear();
        self.tokens.extend_from_slice(arena.tokens(slot));
        self.size = info.size();
        self.score = info.score();
        self.seed = info.seed();
        self.generation = Some(generation);
    }
}

/// Summary of one generation, returned by [`Evolution::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Zero-based index of the generation
    pub generation: u64,
    /// Slots scored this generation
    pub alive: usize,
    /// Slots that could not be respawned because mutation hit the length limit
    pub respawn_failures: usize,
    /// Slots retained as parents for the next generation
    pub survivors: usize,
    /// Best score of this generation
    pub best_score: f64,
    /// Length of this generation's best program
    pub best_len: usize,
    pub champion_score: f64,
    pub champion_len: usize,
    /// Whether the champion was replaced this generation
    pub champion_improved: bool,
    /// Distribution of this generation's scores
    pub score_stats: Option<DescriptiveStats>,
}

/// Result of [`evolve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvolutionSummary {
    pub generations: u64,
    pub final_score: f64,
    pub final_len: usize,
    pub final_size: f64,
}

/// Generational driver: owns the arena, the champion and the run's random stream.
///
/// # Example
///
/// ```
/// use brainfuzz_evolution::{Evolution, EvolutionParams, EvolutionSeed};
/// use brainfuzz_program::{Program, Token};
///
/// let seed = Program::new(8);
/// let oracle = |tokens: &[Token], _size: f64, _precision: f64| -(tokens.len() as f64);
/// let mut evolution =
///     Evolution::new(&seed, oracle, EvolutionParams::default(), EvolutionSeed::from_u128(1))
///         .unwrap();
///
/// for _ in 0..10 {
///     let report = evolution.step();
///     assert!(report.survivors >= 1);
/// }
///
/// let mut out = Program::new(8);
/// evolution.finish(&mut out).unwrap();
/// assert!(out.is_empty());
/// ```
#[derive(Debug)]
pub struct Evolution<O> {
    params: EvolutionParams,
    mutator: Mutator,
    arena: ProgramArena,
    ranking: Vec<usize>,
    champion: Champion,
    rng: Pcg32,
    oracle: O,
    generation: u64,
}

impl<O> Evolution<O>
where
    O: ScoringOracle,
{
    /// Validates `params`, allocates the arena and scores the seed program.
    ///
    /// The seed occupies slot 0 as the sole survivor and becomes the initial champion.
    pub fn new(
        seed: &Program,
        mut oracle: O,
        params: EvolutionParams,
        rng_seed: EvolutionSeed,
    ) -> Result<Self, EvolveError> {
        params.validate()?;
        let max_len = seed.max_len();
        let mut arena = ProgramArena::new(params.generation_size, max_len)?;

        let mut ranking = Vec::new();
        ranking
            .try_reserve_exact(params.generation_size)
            .map_err(|_| crate::ArenaAllocationError {
                generation_size: params.generation_size,
                max_len,
            })?;
        let mut champion_tokens = Vec::new();
        champion_tokens
            .try_reserve_exact(max_len)
            .map_err(|_| crate::ArenaAllocationError {
                generation_size: params.generation_size,
                max_len,
            })?;

        arena.load(0, seed.tokens())?;
        let size = arena.info(0).size();
        let score = oracle.score(arena.tokens(0), size, params.seed_precision);
        arena.set_score(0, score);
        arena.set_state(0, SlotState::Alive);
        arena.survivors_mut().push(0, score);

        champion_tokens.extend_from_slice(arena.tokens(0));
        let champion = Champion {
            tokens: champion_tokens,
            size,
            score,
            seed: 0,
            generation: None,
        };

        Ok(Self {
            mutator: Mutator::from_params(&params, max_len),
            params,
            arena,
            ranking,
            champion,
            rng: rng_seed.rng(),
            oracle,
            generation: 0,
        })
    }

    #[must_use]
    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    #[must_use]
    pub fn arena(&self) -> &ProgramArena {
        &self.arena
    }

    #[must_use]
    pub fn champion(&self) -> &Champion {
        &self.champion
    }

    /// Parents available to the next generation.
    #[must_use]
    pub fn survivors(&self) -> &SurvivorSet {
        self.arena.survivors()
    }

    /// Number of generations run so far.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Runs one generation: respawn, score, rank, retain survivors, update champion.
    pub fn step(&mut self) -> GenerationReport {
        let generation = self.generation;
        let respawn_failures = self.respawn();
        self.score_alive();

        selection::rank_slots(self.arena.infos(), &mut self.ranking);
        let alive = self.ranking.len();
        let score_stats =
            DescriptiveStats::new(self.ranking.iter().map(|&slot| self.arena.info(slot).score()));
        let best = self.ranking.first().copied();

        let survivors = selection::retain_survivors(
            &mut self.arena,
            &self.ranking,
            self.params.survival_rate,
            self.params.survival_falloff,
            &mut self.rng,
        );

        let mut champion_improved = false;
        let (best_score, best_len) = match best {
            Some(slot) => {
                if self.champion.is_beaten_by(self.arena.info(slot).score()) {
                    self.champion.record(&self.arena, slot, generation);
                    champion_improved = true;
                }
                let info = self.arena.info(slot);
                (info.score(), info.len())
            }
            None => (f64::NAN, 0),
        };

        self.generation += 1;
        GenerationReport {
            generation,
            alive,
            respawn_failures,
            survivors,
            best_score,
            best_len,
            champion_score: self.champion.score,
            champion_len: self.champion.len(),
            champion_improved,
            score_stats,
        }
    }

    /// Writes the champion into `out` and releases the arena.
    pub fn finish(self, out: &mut Program) -> Result<EvolutionSummary, EvolveError> {
        out.replace_tokens(&self.champion.tokens)?;
        Ok(EvolutionSummary {
            generations: self.generation,
            final_score: self.champion.score,
            final_len: self.champion.len(),
            final_size: self.champion.size,
        })
    }

    /// Refills every dead slot from a sampled survivor and mutates it.
    ///
    /// Returns the number of slots left dead by a failed mutation.
    fn respawn(&mut self) -> usize {
        let mut failures = 0;
        for slot in 0..self.arena.generation_size() {
            if self.arena.info(slot).state().is_alive() {
                continue;
            }
            let Some(parent) = selection::select_parent(self.arena.survivors(), &mut self.rng)
            else {
                break;
            };
            let seed: u64 = self.rng.random();
            self.arena.clone_slot(parent, slot, seed);

            let mut individual = self.arena.individual_mut(slot);
            match self.mutator.mutate(&mut individual, &mut mutation_rng(seed)) {
                Ok(_) => self.arena.set_state(slot, SlotState::Alive),
                Err(_) => failures += 1,
            }
        }
        failures
    }

    fn score_alive(&mut self) {
        for slot in 0..self.arena.generation_size() {
            let info = self.arena.info(slot);
            if info.state().is_dead() {
                continue;
            }
            let score =
                self.oracle
                    .score(self.arena.tokens(slot), info.size(), self.params.precision);
            self.arena.set_score(slot, score);
        }
    }
}

/// Evolves `program` for exactly `generations` generations and writes the champion back.
///
/// With `generations == 0` the program is left as it was and the summary reports
/// the seed's score.
pub fn evolve<O>(
    program: &mut Program,
    generations: u64,
    oracle: O,
    params: &EvolutionParams,
    rng_seed: EvolutionSeed,
) -> Result<EvolutionSummary, EvolveError>
where
    O: ScoringOracle,
{
    let mut evolution = Evolution::new(program, oracle, params.clone(), rng_seed)?;
    for _ in 0..generations {
        evolution.step();
    }
    evolution.finish(program)
}
