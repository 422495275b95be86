use brainfuzz_program::{CapacityExceededError, Token};

use crate::{ArenaAllocationError, Individual, ProgramInfo, SlotState};

/// Fixed-capacity storage for one evolution run.
///
/// A single token block holds `generation_size` slots of `max_len` tokens each.
/// Next to it live one [`ProgramInfo`] per slot and the [`SurvivorSet`]. Everything
/// is allocated once in [`ProgramArena::new`]; slots are reused, never resized,
/// and no two slots share storage.
#[derive(Debug, Clone)]
pub struct ProgramArena {
    max_len: usize,
    tokens: Vec<Token>,
    infos: Vec<ProgramInfo>,
    survivors: SurvivorSet,
}

impl ProgramArena {
    /// Allocates an arena with every slot dead and empty.
    ///
    /// # Example
    ///
    /// ```
    /// use brainfuzz_evolution::ProgramArena;
    ///
    /// let arena = ProgramArena::new(16, 64).unwrap();
    /// assert_eq!(arena.generation_size(), 16);
    /// assert!(arena.infos().iter().all(|info| info.state().is_dead()));
    ///
    /// assert!(ProgramArena::new(usize::MAX, 2).is_err());
    /// ```
    pub fn new(generation_size: usize, max_len: usize) -> Result<Self, ArenaAllocationError> {
        let error = ArenaAllocationError {
            generation_size,
            max_len,
        };
        let token_count = generation_size.checked_mul(max_len).ok_or(error)?;

        let mut tokens = Vec::new();
        tokens.try_reserve_exact(token_count).map_err(|_| error)?;
        tokens.resize(token_count, Token::default());

        let mut infos = Vec::new();
        infos.try_reserve_exact(generation_size).map_err(|_| error)?;
        infos.resize(generation_size, ProgramInfo::default());

        let survivor_capacity = generation_size.checked_add(1).ok_or(error)?;
        let mut survivors = Vec::new();
        survivors
            .try_reserve_exact(survivor_capacity)
            .map_err(|_| error)?;

        Ok(Self {
            max_len,
            tokens,
            infos,
            survivors: SurvivorSet {
                entries: survivors,
                total_squared_score: 0.0,
            },
        })
    }

    #[must_use]
    pub fn generation_size(&self) -> usize {
        self.infos.len()
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    #[must_use]
    pub fn infos(&self) -> &[ProgramInfo] {
        &self.infos
    }

    #[must_use]
    pub fn info(&self, slot: usize) -> &ProgramInfo {
        &self.infos[slot]
    }

    /// Returns the current tokens of `slot`.
    #[must_use]
    pub fn tokens(&self, slot: usize) -> &[Token] {
        &self.storage(slot)[..self.infos[slot].len]
    }

    #[must_use]
    pub fn survivors(&self) -> &SurvivorSet {
        &self.survivors
    }

    pub(crate) fn survivors_mut(&mut self) -> &mut SurvivorSet {
        &mut self.survivors
    }

    /// Returns an invariant-preserving view of `slot` for mutation.
    pub fn individual_mut(&mut self, slot: usize) -> Individual<'_> {
        let range = self.slot_range(slot);
        Individual::new(&mut self.tokens[range], &mut self.infos[slot])
    }

    /// Copies `tokens` into `slot`, computing its size from scratch.
    ///
    /// The slot is left dead with a zero score.
    pub fn load(&mut self, slot: usize, tokens: &[Token]) -> Result<(), CapacityExceededError> {
        if tokens.len() > self.max_len {
            return Err(CapacityExceededError {
                len: tokens.len(),
                max_len: self.max_len,
            });
        }
        let start = self.slot_range(slot).start;
        self.tokens[start..start + tokens.len()].copy_from_slice(tokens);
        self.infos[slot] = ProgramInfo {
            state: SlotState::Dead,
            len: tokens.len(),
            size: tokens.iter().map(|t| t.magnitude.abs()).sum(),
            score: 0.0,
            seed: 0,
        };
        Ok(())
    }

    /// Clones the program, length and size of `from` into `to`.
    ///
    /// The destination is left dead with a zero score and the given provenance seed.
    pub fn clone_slot(&mut self, from: usize, to: usize, seed: u64) {
        debug_assert_ne!(from, to);
        let source = self.infos[from];
        let src = self.slot_range(from);
        let dst = self.slot_range(to).start;
        self.tokens
            .copy_within(src.start..src.start + source.len, dst);
        self.infos[to] = ProgramInfo {
            state: SlotState::Dead,
            len: source.len,
            size: source.size,
            score: 0.0,
            seed,
        };
    }

    pub(crate) fn set_state(&mut self, slot: usize, state: SlotState) {
        self.infos[slot].state = state;
    }

    pub(crate) fn set_score(&mut self, slot: usize, score: f64) {
        self.infos[slot].score = score;
    }

    fn storage(&self, slot: usize) -> &[Token] {
        &self.tokens[self.slot_range(slot)]
    }

    fn slot_range(&self, slot: usize) -> std::ops::Range<usize> {
        assert!(slot < self.infos.len(), "slot {slot} out of bounds");
        let start = slot * self.max_len;
        start..start + self.max_len
    }
}

/// A survivor slot and its squared score at the time it was retained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Survivor {
    pub slot: usize,
    pub squared_score: f64,
}

/// Slots eligible to be sampled as parents in the next generation.
///
/// Survivors are referenced by slot index, never copied.
#[derive(Debug, Clone, Default)]
pub struct SurvivorSet {
    entries: Vec<Survivor>,
    total_squared_score: f64,
}

impl SurvivorSet {
    #[must_use]
    pub fn entries(&self) -> &[Survivor] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, slot: usize) -> bool {
        self.entries.iter().any(|s| s.slot == slot)
    }

    /// Sum of `score²` over all survivors.
    #[must_use]
    pub fn total_squared_score(&self) -> f64 {
        self.total_squared_score
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.total_squared_score = 0.0;
    }

    pub(crate) fn push(&mut self, slot: usize, score: f64) {
        let squared_score = score * score;
        self.entries.push(Survivor {
            slot,
            squared_score,
        });
        self.total_squared_score += squared_score;
    }
}
