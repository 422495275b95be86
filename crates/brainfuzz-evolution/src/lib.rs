//! Evolutionary search over Brainfuzz token programs.
//!
//! This crate evolves a population of variable-length token programs against a
//! caller-supplied scoring oracle. It keeps a fixed-capacity, fitness-weighted set
//! of survivors between generations and tracks the best program ever observed.
//!
//! # How a Run Works
//!
//! 1. **Seed** - The seed program is copied into slot 0 of the [`ProgramArena`], scored,
//!    and becomes the sole survivor and the first [`Champion`]
//! 2. **Respawn** - Every dead slot is refilled from a parent sampled from the survivor
//!    set (roulette wheel over squared score) and mutated
//! 3. **Score** - Every alive slot is scored by the [`ScoringOracle`]
//! 4. **Rank & Select** - Alive slots are ranked by score; the top slot always survives
//!    and the rest survive with a probability that falls off with rank and relative score
//! 5. **Champion** - The champion is replaced when the top score strictly beats it
//! 6. **Repeat** - Steps 2-5 run once per generation; the champion is written back at the end
//!
//! # Architecture
//!
//! ```text
//! Evolution (driver, champion, run RNG)
//!     ↓ owns
//! ProgramArena (slots × max_len tokens, ProgramInfo per slot, SurvivorSet)
//!     ↓ lends
//! Individual (invariant-preserving view of one slot)
//!     ↓ edited by
//! Mutator (perturb / shrink / insert bursts)
//! ```
//!
//! # Example
//!
//! ```
//! use brainfuzz_evolution::{EvolutionParams, EvolutionSeed, evolve};
//! use brainfuzz_program::{Program, Token, TokenType};
//!
//! let seed = Token::new(TokenType::new(1).unwrap(), 2.0);
//! let mut program = Program::from_tokens(vec![seed], 8).unwrap();
//!
//! // Reward larger programs.
//! let oracle = |_tokens: &[Token], size: f64, _precision: f64| size;
//!
//! let summary = evolve(
//!     &mut program,
//!     50,
//!     oracle,
//!     &EvolutionParams::default(),
//!     EvolutionSeed::from_u128(42),
//! )
//! .unwrap();
//! assert!(summary.final_score >= 2.0);
//! assert!(program.len() <= 8);
//! ```
//!
//! # Current Limitations
//!
//! - **Single-threaded**: respawn and scoring run sequentially, since the oracle is
//!   an `FnMut`
//! - **No crossover**: children differ from their parent by mutation only
//! - **No token deletion by default**: see [`DeletionPolicy`]

pub use self::{
    arena::*, evolution::*, individual::*, mutation::*, params::*, random::*, selection::*,
};

mod arena;
mod evolution;
mod individual;
mod mutation;
mod params;
mod random;
mod selection;

/// The program arena could not be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("failed to allocate arena for {generation_size} programs of up to {max_len} tokens")]
pub struct ArenaAllocationError {
    pub generation_size: usize,
    pub max_len: usize,
}

/// An [`EvolutionParams`] field is out of its valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid evolution parameter `{field}`: {reason}")]
pub struct InvalidParamsError {
    pub field: &'static str,
    pub reason: &'static str,
}

/// Errors surfaced by the engine before any generation runs, or when writing back.
#[derive(Debug, Clone, Copy, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EvolveError {
    #[display("{_0}")]
    CapacityExceeded(brainfuzz_program::CapacityExceededError),
    #[display("{_0}")]
    Allocation(ArenaAllocationError),
    #[display("{_0}")]
    InvalidParams(InvalidParamsError),
}
