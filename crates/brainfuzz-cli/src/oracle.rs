use brainfuzz_evolution::ScoringOracle;
use brainfuzz_program::Token;

/// Built-in scoring oracles for exercising the engine without an interpreter.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum OracleKind {
    /// Score is the aggregate size
    #[default]
    Size,
    /// Every program scores the same
    Constant,
    /// Rewards aggregate size close to a target, with a small length penalty
    Target,
}

impl OracleKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Constant => "constant",
            Self::Target => "target",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DemoOracle {
    kind: OracleKind,
    target: f64,
}

const CONSTANT_SCORE: f64 = 5.0;
const LENGTH_PENALTY: f64 = 0.01;

impl DemoOracle {
    pub fn new(kind: OracleKind, target: f64) -> Self {
        Self { kind, target }
    }
}

impl ScoringOracle for DemoOracle {
    #[expect(clippy::cast_precision_loss)]
    fn score(&mut self, program: &[Token], size: f64, _precision: f64) -> f64 {
        match self.kind {
            OracleKind::Size => size,
            OracleKind::Constant => CONSTANT_SCORE,
            OracleKind::Target => {
                // Positive and peaking at the target, so squared-score selection favors it.
                1.0 / (1.0 + (size - self.target).abs()) - LENGTH_PENALTY * program.len() as f64
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use brainfuzz_program::TokenType;

    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("size".parse::<OracleKind>().unwrap(), OracleKind::Size);
        assert_eq!("Target".parse::<OracleKind>().unwrap(), OracleKind::Target);
        assert!("nope".parse::<OracleKind>().is_err());
    }

    #[test]
    fn test_target_peaks_at_target() {
        let mut oracle = DemoOracle::new(OracleKind::Target, 3.0);
        let token = Token::new(TokenType::new(1).unwrap(), 3.0);
        let at = oracle.score(&[token], 3.0, 1.0);
        let off = oracle.score(&[token], 5.0, 1.0);
        assert!(at > off);
        assert!((at - (1.0 - LENGTH_PENALTY)).abs() < 1e-12);
    }
}
