// Lottery construction and combination library
//
// A lottery is a pure function from an agent-position tuple to a selection
// probability distribution over the agents. Constructors capture only
// immutable configuration (graph size, precomputed tables), so a built
// lottery stays read-only for the whole run.

use crate::cl_graph::Graph;
use crate::cl_quantity::{opt_cost, vertex_cost};

/// Positions (n agents) -> probabilities (n reals, summing to 1 when built
/// normalized).
pub type Lottery = Box<dyn Fn(&[usize]) -> Vec<f64>>;

// ============================================================================
// Rank functions
// ============================================================================

/// Constant rank; every point on the circle weighs the same.
pub fn uniform_rank(_x: f64) -> f64 {
    1.0
}

/// Rank by wrapped distance from the origin.
pub fn circle_rank(x: f64) -> f64 {
    x.min(1.0 - x)
}

/// Power-mean rank of `x` and `1-x` with exponent `e`.
pub fn power_rank(e: f64) -> impl Fn(f64) -> f64 {
    move |x: f64| ((x.powf(e) + (1.0 - x).powf(e)) / 2.0).powf(1.0 / e)
}

// ============================================================================
// Base lotteries
// ============================================================================

/// Random dictatorship: `1/n` for every agent. Known strategyproof, the
/// reference baseline for [`crate::cl_eval::rd_ratio`].
pub fn uniform_dictatorship() -> Lottery {
    Box::new(|seq| vec![1.0 / seq.len() as f64; seq.len()])
}

/// Rank-weighted arc-length lottery.
///
/// Precomputes a prefix sum of `ranks` sampled at the midpoint of each of the
/// `size` unit arcs. An agent's score sums, over every agent `j`, the rank
/// mass of the arc between the two boundary agents of its opposite interval,
/// adding `size` before indexing where the arc wraps. Normalized by total
/// rank mass times agent count.
pub fn distance_based_lottery<F: Fn(f64) -> f64>(size: usize, ranks: F) -> Lottery {
    let mut weights = vec![0.0; size + 1];
    let mut prefix_sum = 0.0;
    for i in 0..size {
        prefix_sum += ranks((i as f64 + 0.5) / size as f64);
        weights[i + 1] = prefix_sum;
    }
    Box::new(move |seq| {
        let rank_of_range = |b: usize, a: usize| weights[b] - weights[a];
        let n = seq.len();
        let dis = n / 2;
        let mut res = Vec::with_capacity(n);
        for i in 0..n {
            let range_start = (i + dis) % n;
            let range_end = (range_start + 1) % n;
            let mut probability = 0.0;
            for j in 0..n {
                probability += if range_start < j {
                    rank_of_range(seq[j] - seq[range_start], seq[j] - seq[range_end])
                } else if range_end <= j {
                    rank_of_range(size + seq[j] - seq[range_start], seq[j] - seq[range_end])
                } else {
                    rank_of_range(seq[range_end] - seq[j], seq[range_start] - seq[j])
                };
            }
            res.push(probability / prefix_sum / n as f64);
        }
        res
    })
}

/// Gap-weighted lottery.
///
/// Positions are doubled into `[0, 2)` (each position plus a `+1` wrapped
/// copy); agent `i` scores the weight vector slid over the consecutive gaps
/// starting at its own position, the doubled copies supplying the wrap-around
/// gaps. `weights` must not be longer than the tuple.
pub fn gap_based_lottery(size: usize, weights: Vec<f64>, normalize: bool) -> Lottery {
    Box::new(move |seq| {
        let n = seq.len();
        let mut pos = vec![0.0; 2 * n];
        for i in 0..n {
            pos[i] = seq[i] as f64 / size as f64;
            pos[i + n] = pos[i] + 1.0;
        }
        let mut res = vec![0.0; n];
        for (i, r) in res.iter_mut().enumerate() {
            let mut s = 0.0;
            for (j, w) in weights.iter().enumerate() {
                s += w * (pos[i + j + 1] - pos[i + j]);
            }
            *r = s;
        }
        if normalize {
            let total: f64 = res.iter().sum();
            for el in &mut res {
                *el /= total;
            }
        }
        res
    })
}

/// Opposite-gap lottery: agent `i` scores `weight_fn` of the normalized gap
/// between the two agents `n/2` positions away, `+1`-wrapped where that gap
/// crosses the anchor.
pub fn opposition_based_lottery<F: Fn(f64) -> f64 + 'static>(
    size: usize,
    weight_fn: F,
    normalize: bool,
) -> Lottery {
    Box::new(move |seq| {
        let n = seq.len();
        let dis = n / 2;
        let mut res = vec![0.0; n];
        for (i, r) in res.iter_mut().enumerate() {
            let idx1 = (i + dis) % n;
            let idx2 = (i + dis + 1) % n;
            let mut diff = (seq[idx2] as f64 - seq[idx1] as f64) / size as f64;
            if i + dis == n - 1 {
                diff += 1.0;
            }
            *r = weight_fn(diff);
        }
        if normalize {
            let total: f64 = res.iter().sum();
            for el in &mut res {
                *el /= total;
            }
        }
        res
    })
}

/// Uniform lottery over the agents whose position minimizes total distance
/// cost.
pub fn opt_lottery<G: Graph + 'static>(g: G) -> Lottery {
    Box::new(move |seq| {
        let min_cost = opt_cost(&g, seq);
        let mut res: Vec<f64> = seq
            .iter()
            .map(|&x| {
                if vertex_cost(&g, seq, x) == min_cost {
                    1.0
                } else {
                    0.0
                }
            })
            .collect();
        let total: f64 = res.iter().sum();
        for el in &mut res {
            *el /= total;
        }
        res
    })
}

// ============================================================================
// Combinators
// ============================================================================

/// Evaluate on the point-reflected tuple and reverse the result.
///
/// `reversed_lottery(size, reversed_lottery(size, lot))` equals `lot`
/// exactly: the transform is an involution.
pub fn reversed_lottery(size: usize, lot: Lottery) -> Lottery {
    Box::new(move |seq| {
        let reflected: Vec<usize> = seq.iter().rev().map(|&x| size - x).collect();
        let mut res = lot(&reflected);
        res.reverse();
        res
    })
}

/// Elementwise mixture `a * lot1 + (1 - a) * lot2`.
pub fn mixed_lottery(a: f64, lot1: Lottery, lot2: Lottery) -> Lottery {
    Box::new(move |seq| {
        let mut res = lot1(seq);
        let tmp = lot2(seq);
        for (r, t) in res.iter_mut().zip(tmp) {
            *r = *r * a + t * (1.0 - a);
        }
        res
    })
}

/// Multiplicities of an ordered non-decreasing triple drawn with repeats:
/// all distinct, one pair, all same.
const TRIPLE_MULTIPLIERS: [f64; 3] = [6.0, 3.0, 1.0];

/// Derive an n-agent rule from a 3-agent rule by marginalizing over all
/// triples drawn with repeats from the agent set (O(n^3) per evaluation).
pub fn randomized_lottery(lot: Lottery) -> Lottery {
    Box::new(move |seq| {
        let n = seq.len();
        let mut res = vec![0.0; n];
        let div = (n * n * n) as f64;
        let mut triple = Vec::with_capacity(3);
        for i0 in 0..n {
            triple.push(seq[i0]);
            for i1 in i0..n {
                triple.push(seq[i1]);
                for i2 in i1..n {
                    triple.push(seq[i2]);
                    let eq_num = usize::from(i0 == i1) + usize::from(i1 == i2);
                    let mul = TRIPLE_MULTIPLIERS[eq_num];
                    let inner = lot(&triple);
                    res[i0] += mul * inner[0];
                    res[i1] += mul * inner[1];
                    res[i2] += mul * inner[2];
                    triple.pop();
                }
                triple.pop();
            }
            triple.pop();
        }
        for el in &mut res {
            *el /= div;
        }
        res
    })
}

/// As [`randomized_lottery`] but over strictly increasing triples only,
/// weighted uniformly.
pub fn randomized_lottery2(lot: Lottery) -> Lottery {
    Box::new(move |seq| {
        let n = seq.len();
        let mut res = vec![0.0; n];
        let div = (n * (n - 1) * (n - 2) / 6) as f64;
        let mut triple = Vec::with_capacity(3);
        for i0 in 0..n {
            triple.push(seq[i0]);
            for i1 in i0 + 1..n {
                triple.push(seq[i1]);
                for i2 in i1 + 1..n {
                    triple.push(seq[i2]);
                    let inner = lot(&triple);
                    res[i0] += inner[0];
                    res[i1] += inner[1];
                    res[i2] += inner[2];
                    triple.pop();
                }
                triple.pop();
            }
            triple.pop();
        }
        for el in &mut res {
            *el /= div;
        }
        res
    })
}
