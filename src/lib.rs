//! # circle-lottery - Mechanism-Design Experiments on a Circle
//!
//! A research computation engine for randomized facility-location mechanisms
//! with agents on a circular metric space. It enumerates canonical agent
//! position tuples, evaluates lotteries (rules mapping positions to a
//! selection distribution over agents) against strategyproofness and several
//! ratio criteria, and reports worst-case / aggregate statistics.
//!
//! ## Core Components
//!
//! - **Graphs**: pluggable circular distance metrics ([`Circle`],
//!   [`SplitCircle`], [`CustomCircle`])
//! - **Generators**: lazy, one-shot enumeration of canonical position tuples
//!   with pruning filters ([`cl_seqs`])
//! - **Lotteries**: pure position-to-distribution rules plus combinators
//!   ([`cl_lottery`], [`cl_table`])
//! - **Quantities**: per-tuple scalar metrics ([`cl_quantity`])
//! - **Drivers**: streaming strategyproofness check, random-dictatorship
//!   ratio and aggregate scoring ([`cl_eval`])
//!
//! ## Usage
//!
//! ```no_run
//! use cl_rust::{check, Circle, IncreasingSeqs, uniform_dictatorship, Verbosity};
//!
//! let graph = Circle::new(6);
//! let lottery = uniform_dictatorship();
//! let mut generator = IncreasingSeqs::new(0, 6, 3);
//! assert!(check(&lottery, &mut generator, &graph, Verbosity::None));
//! ```
//!
//! Everything is single-threaded and deterministic: a driver pulls tuples
//! from the generator chain, evaluates the lottery against the graph and
//! folds the per-tuple values into running statistics in one pass.

// Shared constants and helpers
pub mod cl_interface;

// Distance metrics
pub mod cl_graph;

// Tuple enumeration engine
pub mod cl_seqs;

// Lottery construction and combination
pub mod cl_lottery;
pub mod cl_table;

// Scoring and evaluation
pub mod cl_eval;
pub mod cl_quantity;

// Re-export commonly used types
pub use cl_eval::{check, rd_ratio, score, Misreports};
pub use cl_graph::{Circle, CustomCircle, Graph, SplitCircle};
pub use cl_interface::{binomial_coefficient, num_of_increasing_seqs, round4, Verbosity, EPS};
pub use cl_lottery::{
    circle_rank, distance_based_lottery, gap_based_lottery, mixed_lottery, opt_lottery,
    opposition_based_lottery, power_rank, randomized_lottery, randomized_lottery2,
    reversed_lottery, uniform_dictatorship, uniform_rank, Lottery,
};
pub use cl_quantity::{ApproxRatio, PcdBound, Quantity, SumQ};
pub use cl_seqs::{
    AsymmetricSeqs, BalanceFilter, BoundedDistinctSeqs, DominanceFilter, IncreasingSeqs,
    PredicateFilter, SeqGenerator, StreamSeqs,
};
pub use cl_table::{table_lottery, LotteryTable, TableError};
