use serde::{Deserialize, Serialize};

use crate::{CapacityExceededError, Token};

/// An ordered token sequence with a fixed maximum length.
///
/// The buffer is owned by the caller. The evolution engine reads the seed from it
/// and writes the evolved program back into it, growing the logical length up to
/// [`Program::max_len`] but never past it.
///
/// # Example
///
/// ```
/// use brainfuzz_program::{Program, Token, TokenType};
///
/// let token = Token::new(TokenType::new(1).unwrap(), 1.0);
/// let program = Program::from_tokens(vec![token; 3], 3).unwrap();
/// assert_eq!(program.len(), program.max_len());
///
/// assert!(Program::from_tokens(vec![token; 4], 3).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawProgram")]
pub struct Program {
    max_len: usize,
    tokens: Vec<Token>,
}

#[derive(Deserialize)]
struct RawProgram {
    max_len: usize,
    tokens: Vec<Token>,
}

impl TryFrom<RawProgram> for Program {
    type Error = CapacityExceededError;

    fn try_from(raw: RawProgram) -> Result<Self, Self::Error> {
        Self::from_tokens(raw.tokens, raw.max_len)
    }
}

impl Program {
    /// Creates an empty program that may hold up to `max_len` tokens.
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len,
            tokens: Vec::new(),
        }
    }

    /// Creates a program from existing tokens.
    ///
    /// Fails if there are more tokens than `max_len`.
    pub fn from_tokens(tokens: Vec<Token>, max_len: usize) -> Result<Self, CapacityExceededError> {
        if tokens.len() > max_len {
            return Err(CapacityExceededError {
                len: tokens.len(),
                max_len,
            });
        }
        Ok(Self { max_len, tokens })
    }

    #[must_use]
    pub fn max_len(&self) -> usize {
        self.max_len
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
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Returns the aggregate size, the sum of absolute token magnitudes.
    #[must_use]
    pub fn size(&self) -> f64 {
        self.tokens.iter().map(|t| t.magnitude.abs()).sum()
    }

    /// Appends a token, failing if the program is already at its maximum length.
    pub fn push(&mut self, token: Token) -> Result<(), CapacityExceededError> {
        if self.tokens.len() >= self.max_len {
            return Err(CapacityExceededError {
                len: self.tokens.len() + 1,
                max_len: self.max_len,
            });
        }
        self.tokens.push(token);
        Ok(())
    }

    /// Replaces the whole token sequence, keeping the maximum length.
    pub fn replace_tokens(&mut self, tokens: &[Token]) -> Result<(), CapacityExceededError> {
        if tokens.len() > self.max_len {
            return Err(CapacityExceededError {
                len: tokens.len(),
                max_len: self.max_len,
            });
        }
        self.tokens.clear();
        self.tokens.extend_from_slice(tokens);
        Ok(())
    }
}
