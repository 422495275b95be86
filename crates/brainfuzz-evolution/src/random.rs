use std::fmt;

use rand::{
    Rng, SeedableRng as _,
    distr::{Distribution, StandardUniform},
};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Seed for a reproducible evolution run.
///
/// A 128-bit seed that initializes the run's random stream. Two runs with the same
/// seed, seed program, parameters and a deterministic oracle produce the same
/// champion. Serialized as a 32-character hex string.
///
/// # Example
///
/// ```
/// use brainfuzz_evolution::EvolutionSeed;
/// use rand::Rng as _;
///
/// let seed: EvolutionSeed = rand::rng().random();
/// let parsed: EvolutionSeed = seed.to_string().parse().unwrap();
/// assert_eq!(seed, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvolutionSeed([u8; 16]);

impl EvolutionSeed {
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_be_bytes())
    }

    /// Creates the run's random stream.
    #[must_use]
    pub fn rng(self) -> Pcg32 {
        Pcg32::from_seed(self.0)
    }
}

impl fmt::Display for EvolutionSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", u128::from_be_bytes(self.0))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid hex seed: {reason}")]
pub struct ParseSeedError {
    pub reason: String,
}

impl std::str::FromStr for EvolutionSeed {
    type Err = ParseSeedError;

    fn from_str(hex_str: &str) -> Result<Self, Self::Err> {
        if hex_str.len() != 32 {
            return Err(ParseSeedError {
                reason: format!("expected 32 characters, got {}", hex_str.len()),
            });
        }
        let num = u128::from_str_radix(hex_str, 16).map_err(|e| ParseSeedError {
            reason: format!("{hex_str} ({e})"),
        })?;
        Ok(Self::from_u128(num))
    }
}

impl Serialize for EvolutionSeed {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EvolutionSeed {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let hex_str = String::deserialize(deserializer)?;
        hex_str.parse().map_err(serde::de::Error::custom)
    }
}

impl Distribution<EvolutionSeed> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> EvolutionSeed {
        let mut seed = [0; 16];
        rng.fill(&mut seed);
        EvolutionSeed(seed)
    }
}

/// Creates the random stream for one mutation burst from a provenance seed.
///
/// The same seed applied to the same parent always yields the same child.
#[must_use]
pub fn mutation_rng(seed: u64) -> Pcg32 {
    Pcg32::seed_from_u64(seed)
}

/// Draws a uniform real in `[0, 1)`.
pub fn uniform<R>(rng: &mut R) -> f64
where
    R: Rng + ?Sized,
{
    rng.random::<f64>()
}

/// Squares `x`, keeping its sign.
#[must_use]
pub fn signed_square(x: f64) -> f64 {
    x * x.abs()
}

/// Draws a signed perturbation in `(-strength / 4, strength / 4)`, biased toward zero.
pub fn perturbation<R>(rng: &mut R, strength: f64) -> f64
where
    R: Rng + ?Sized,
{
    signed_square(uniform(rng) - 0.5) * strength
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_serialization() {
        let seed = EvolutionSeed::from_u128(0x0123_4567_89ab_cdef_fedc_ba98_7654_3210);
        let json = serde_json::to_string(&seed).unwrap();
        assert_eq!(json, "\"0123456789abcdeffedcba9876543210\"");
        assert_eq!(serde_json::from_str::<EvolutionSeed>(&json).unwrap(), seed);

        let upper: EvolutionSeed = "0123456789ABCDEFFEDCBA9876543210".parse().unwrap();
        assert_eq!(upper, seed);
    }

    #[test]
    fn test_seed_rejects_bad_hex() {
        assert!("".parse::<EvolutionSeed>().is_err());
        assert!("0123".parse::<EvolutionSeed>().is_err());
        let err = "ghijklmnopqrstuvwxyzghijklmnopqr"
            .parse::<EvolutionSeed>()
            .unwrap_err();
        assert!(err.to_string().contains("invalid hex"));
    }

    #[test]
    fn test_same_seed_same_stream() {
        let seed = EvolutionSeed::from_u128(99);
        let mut a = seed.rng();
        let mut b = seed.rng();
        for _ in 0..20 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }

        let mut a = mutation_rng(5);
        let mut b = mutation_rng(5);
        assert_eq!(uniform(&mut a).to_bits(), uniform(&mut b).to_bits());
    }

    #[test]
    fn test_signed_square() {
        assert_eq!(signed_square(0.5), 0.25);
        assert_eq!(signed_square(-0.5), -0.25);
        assert_eq!(signed_square(0.0), 0.0);
    }

    #[test]
    fn test_perturbation_bounds() {
        let mut rng = mutation_rng(1);
        for _ in 0..1000 {
            let p = perturbation(&mut rng, 2.0);
            assert!(p.abs() <= 0.5);
        }
    }
}
