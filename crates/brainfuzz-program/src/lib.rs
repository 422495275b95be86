//! Token and program data model for Brainfuzz.
//!
//! A Brainfuzz program is an ordered sequence of [`Token`]s. Each token pairs a
//! discrete [`TokenType`] with a continuous magnitude; the interpreter that gives
//! those tokens meaning lives outside this crate; here they are plain values.
//!
//! - [`Token`] / [`TokenType`] - the atomic unit of a program
//! - [`Program`] - a caller-owned token buffer with a fixed maximum length
//!
//! # Example
//!
//! ```
//! use brainfuzz_program::{Program, Token, TokenType};
//!
//! let mut program = Program::new(4);
//! program.push(Token::new(TokenType::new(1).unwrap(), 2.0)).unwrap();
//! program.push(Token::new(TokenType::new(3).unwrap(), -0.5)).unwrap();
//!
//! assert_eq!(program.len(), 2);
//! assert_eq!(program.size(), 2.5);
//! ```

pub use self::{program::*, token::*};

mod program;
mod token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("program length {len} exceeds its maximum length {max_len}")]
pub struct CapacityExceededError {
    pub len: usize,
    pub max_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("token type {value} is out of range")]
pub struct InvalidTokenTypeError {
    pub value: u8,
}
