use brainfuzz_program::{CapacityExceededError, Token, TokenType};

/// Largest negative `size` attributed to floating-point cancellation.
///
/// Residue within this bound is rounded to zero. Anything more negative is a
/// bookkeeping defect and is left visible.
pub const SIZE_RESIDUE: f64 = 1e-6;

/// Liveness of an arena slot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum SlotState {
    /// Free to be overwritten by the next respawn.
    #[default]
    Dead,
    /// Holds a program that is scored this generation.
    Alive,
}

/// Metadata of one arena slot.
///
/// `size` always equals the sum of absolute magnitudes of the slot's first `len`
/// tokens. It is maintained incrementally by [`Individual`] and only recomputed
/// from scratch when a program is loaded.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ProgramInfo {
    pub(crate) state: SlotState,
    pub(crate) len: usize,
    pub(crate) size: f64,
    pub(crate) score: f64,
    pub(crate) seed: u64,
}

impl ProgramInfo {
    #[must_use]
    pub fn state(&self) -> SlotState {
        self.state
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn size(&self) -> f64 {
        self.size
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Provenance seed of the mutation burst that produced this program.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

/// Mutable view of one arena slot: its token storage plus its metadata.
///
/// All edits go through methods that keep `size` in sync with the tokens and
/// `len` within the slot's capacity.
#[derive(Debug)]
pub struct Individual<'a> {
    storage: &'a mut [Token],
    info: &'a mut ProgramInfo,
}

impl<'a> Individual<'a> {
    /// Binds a view over `storage`, whose length is the slot's capacity.
    pub fn new(storage: &'a mut [Token], info: &'a mut ProgramInfo) -> Self {
        debug_assert!(info.len <= storage.len());
        Self { storage, info }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.info.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.info.len == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    #[must_use]
    pub fn size(&self) -> f64 {
        self.info.size
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.storage[..self.info.len]
    }

    /// Sets the magnitude of the token at `index` and adjusts `size` by the delta.
    ///
    /// This is the only operation that changes a magnitude.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn set_magnitude(&mut self, index: usize, magnitude: f64) {
        let token = &mut self.storage[..self.info.len][index];
        let old = token.magnitude;
        token.magnitude = magnitude;
        self.info.size += magnitude.abs() - old.abs();
        debug_assert!(
            self.info.size > -SIZE_RESIDUE,
            "size went negative: {}",
            self.info.size
        );
        if self.info.size < 0.0 && self.info.size > -SIZE_RESIDUE {
            self.info.size = 0.0;
        }
    }

    /// Inserts a zero-magnitude token at `index`, shifting later tokens right.
    ///
    /// Fails without modifying the program if it is already full.
    ///
    /// # Panics
    ///
    /// Panics if `index > self.len()`.
    pub fn insert(
        &mut self,
        index: usize,
        token_type: TokenType,
    ) -> Result<(), CapacityExceededError> {
        let len = self.info.len;
        if len >= self.storage.len() {
            return Err(CapacityExceededError {
                len: len + 1,
                max_len: self.storage.len(),
            });
        }
        assert!(index <= len, "insert index {index} out of bounds (len {len})");
        self.storage.copy_within(index..len, index + 1);
        self.storage[index] = Token::new(token_type, 0.0);
        self.info.len += 1;
        Ok(())
    }

    /// Removes the token at `index`, shifting later tokens left.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn remove(&mut self, index: usize) -> Token {
        let token = self.tokens()[index];
        self.set_magnitude(index, 0.0);
        let len = self.info.len;
        self.storage.copy_within(index + 1..len, index);
        self.info.len -= 1;
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(value: u8) -> TokenType {
        TokenType::new(value).unwrap()
    }

    fn recomputed_size(individual: &Individual<'_>) -> f64 {
        individual.tokens().iter().map(|t| t.magnitude.abs()).sum()
    }

    #[test]
    fn test_set_magnitude_tracks_size() {
        let mut storage = [Token::default(); 4];
        let mut info = ProgramInfo::default();
        let mut ind = Individual::new(&mut storage, &mut info);

        ind.insert(0, ty(1)).unwrap();
        ind.insert(1, ty(2)).unwrap();
        ind.set_magnitude(0, 3.0);
        ind.set_magnitude(1, -1.5);
        assert!((ind.size() - 4.5).abs() < 1e-12);

        ind.set_magnitude(0, -0.5);
        assert!((ind.size() - recomputed_size(&ind)).abs() < 1e-12);
        assert!((ind.size() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_insert_shifts_tokens() {
        let mut storage = [Token::default(); 3];
        let mut info = ProgramInfo::default();
        let mut ind = Individual::new(&mut storage, &mut info);

        ind.insert(0, ty(1)).unwrap();
        ind.insert(1, ty(3)).unwrap();
        ind.insert(1, ty(2)).unwrap();
        let types: Vec<u8> = ind.tokens().iter().map(|t| t.token_type.value()).collect();
        assert_eq!(types, [1, 2, 3]);
        assert_eq!(ind.size(), 0.0);
    }

    #[test]
    fn test_insert_when_full_leaves_program_unchanged() {
        let mut storage = [Token::default(); 1];
        let mut info = ProgramInfo::default();
        let mut ind = Individual::new(&mut storage, &mut info);

        ind.insert(0, ty(4)).unwrap();
        ind.set_magnitude(0, 1.25);
        let err = ind.insert(0, ty(5)).unwrap_err();
        assert_eq!(err, CapacityExceededError { len: 2, max_len: 1 });
        assert_eq!(ind.len(), 1);
        assert_eq!(ind.tokens()[0], Token::new(ty(4), 1.25));
        assert!((ind.size() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_cancellation_residue_rounds_to_zero() {
        let mut storage = [Token::new(ty(1), 0.5); 1];
        let mut info = ProgramInfo {
            len: 1,
            size: 0.5 - 1e-12,
            ..ProgramInfo::default()
        };
        let mut ind = Individual::new(&mut storage, &mut info);

        ind.set_magnitude(0, 0.0);
        assert_eq!(ind.size(), 0.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "size went negative")]
    fn test_negative_size_is_not_repaired() {
        let mut storage = [Token::new(ty(1), 1.0); 1];
        let mut info = ProgramInfo {
            len: 1,
            ..ProgramInfo::default()
        };
        let mut ind = Individual::new(&mut storage, &mut info);

        ind.set_magnitude(0, 0.0);
    }

    #[test]
    fn test_remove_updates_size() {
        let mut storage = [Token::default(); 3];
        let mut info = ProgramInfo::default();
        let mut ind = Individual::new(&mut storage, &mut info);

        for (i, m) in [1.0, -2.0, 4.0].into_iter().enumerate() {
            ind.insert(i, ty(1)).unwrap();
            ind.set_magnitude(i, m);
        }
        let removed = ind.remove(1);
        assert_eq!(removed.magnitude, -2.0);
        assert_eq!(ind.len(), 2);
        assert_eq!(ind.tokens()[1].magnitude, 4.0);
        assert!((ind.size() - 5.0).abs() < 1e-12);
    }
}
