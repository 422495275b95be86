//! Statistical summaries for the Brainfuzz project.
//!
//! - [`descriptive`]: min/max/mean/median/variance over a dataset, used to summarize
//!   the scores of one generation.
//!
//! # Examples
//!
//! ```
//! use brainfuzz_stats::descriptive::DescriptiveStats;
//!
//! let scores = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(scores).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```

pub mod descriptive;
