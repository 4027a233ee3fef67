// Shared constants and numeric helpers used across the engine
//
// Everything here is a pure function or an immutable constant. The rest of
// the crate keeps no process-wide mutable state, so this module is the whole
// "global" surface of the library.

/// Tolerance for all floating-point comparisons in the engine.
///
/// Penalties above `-EPS` count as non-negative for the strategyproofness
/// verdict, and costs below `EPS` count as zero for ratio guards.
pub const EPS: f64 = 1e-6;

/// True if `x` is distinguishable from zero under [`EPS`].
pub fn nzero(x: f64) -> bool {
    x > EPS || x < -EPS
}

/// Round `x` to `p` decimal places, normalizing negative zero to `0.0`.
pub fn round_to(x: f64, p: u32) -> f64 {
    let multiplier = 10f64.powi(p as i32);
    let t = (x * multiplier).round() / multiplier;
    if t == 0.0 {
        0.0
    } else {
        t
    }
}

/// Round to 4 decimal places, the precision used for all reported values.
pub fn round4(x: f64) -> f64 {
    round_to(x, 4)
}

/// Binomial coefficient C(n, k); 0 when `k > n`.
///
/// Iterates over `min(k, n-k)` factors, dividing at each step so the running
/// product stays exact as long as the final result fits in a `u64`.
pub fn binomial_coefficient(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut res: u64 = 1;
    for l in 0..k {
        res = res * (n - l) / (l + 1);
    }
    res
}

/// Number of weakly-increasing sequences of length `len` over `bound` values.
///
/// Multiset-combination count: C(len + bound - 1, len); 0 when there are no
/// values to draw from.
pub fn num_of_increasing_seqs(len: u64, bound: u64) -> u64 {
    if bound == 0 {
        return 0;
    }
    binomial_coefficient(len + bound - 1, len)
}

/// How much a run reports to stdout.
///
/// `None` computes silently, `Answer` prints the bare result value, `Summary`
/// adds the human-readable summary lines, `All` additionally prints one
/// record per enumerated sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    None,
    Answer,
    Summary,
    All,
}
