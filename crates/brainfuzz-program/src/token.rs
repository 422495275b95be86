use rand::{
    Rng,
    distr::{Distribution, StandardUniform},
};
use serde::{Deserialize, Serialize};

use crate::InvalidTokenTypeError;

/// Discrete type tag of a [`Token`].
///
/// Valid values are `0..=TokenType::MAX`. Type `0` ([`TokenType::RESERVED`]) is
/// reserved by the interpreter: it may appear in hand-written programs, but
/// random generation never produces it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct TokenType(u8);

impl TokenType {
    /// Largest valid type tag.
    pub const MAX: u8 = 7;

    /// The reserved type tag.
    pub const RESERVED: Self = Self(0);

    /// Creates a token type, returning `None` if `value` exceeds [`Self::MAX`].
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Self(value))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn is_reserved(self) -> bool {
        self.0 == Self::RESERVED.0
    }
}

impl TryFrom<u8> for TokenType {
    type Error = InvalidTokenTypeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(InvalidTokenTypeError { value })
    }
}

impl From<TokenType> for u8 {
    fn from(value: TokenType) -> Self {
        value.0
    }
}

/// Samples a uniformly random non-reserved type in `1..=TokenType::MAX`.
impl Distribution<TokenType> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> TokenType {
        TokenType(rng.random_range(1..=TokenType::MAX))
    }
}

/// Atomic unit of a program: a type tag plus a signed magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub token_type: TokenType,
    pub magnitude: f64,
}

impl Token {
    #[must_use]
    pub const fn new(token_type: TokenType, magnitude: f64) -> Self {
        Self {
            token_type,
            magnitude,
        }
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::new(TokenType::RESERVED, 0.0)
    }
}
