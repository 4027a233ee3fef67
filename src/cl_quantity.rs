// Per-tuple scalar metrics and their composition
//
// Cost helpers are free pure functions; the Quantity trait packages a metric
// so the aggregate driver can fold any of them over an enumeration.

use crate::cl_graph::Graph;
use crate::cl_interface::nzero;
use crate::cl_lottery::Lottery;
use crate::cl_seqs::{PredicateFilter, SeqGenerator};

/// Total distance from `vertex` to every agent position.
pub fn vertex_cost(g: &dyn Graph, seq: &[usize], vertex: usize) -> f64 {
    seq.iter().map(|&x| g.distance(vertex, x)).sum()
}

/// Expected cost of `seq` for the agent whose true position is
/// `agent_vertex`, under the distribution `lot` produces for `seq`.
pub fn lottery_cost_at(agent_vertex: usize, seq: &[usize], g: &dyn Graph, lot: &Lottery) -> f64 {
    seq.iter()
        .zip(lot(seq))
        .map(|(&b, p)| g.distance(agent_vertex, b) * p)
        .sum()
}

/// Expected total cost of `seq` under `lot`: each agent's vertex cost
/// weighted by its selection probability.
pub fn lottery_cost(lot: &Lottery, g: &dyn Graph, seq: &[usize]) -> f64 {
    seq.iter()
        .zip(lot(seq))
        .map(|(&a, p)| p * vertex_cost(g, seq, a))
        .sum()
}

/// Minimal vertex cost over the agents of `seq`.
pub fn opt_cost(g: &dyn Graph, seq: &[usize]) -> f64 {
    seq.iter()
        .map(|&x| vertex_cost(g, seq, x))
        .fold(f64::INFINITY, f64::min)
}

/// Distance from each agent to the agent `n/2` positions around the tuple.
pub fn opposite_distances(g: &dyn Graph, seq: &[usize]) -> Vec<f64> {
    let n = seq.len();
    (0..n)
        .map(|i| g.distance(seq[i], seq[(i + n / 2) % n]))
        .collect()
}

/// Guarded ratio shared by the ratio metrics: exactly 1 when both costs
/// vanish, +infinity when only the optimum does.
fn guarded_ratio(real_cost: f64, optimal_cost: f64) -> f64 {
    if nzero(optimal_cost) {
        real_cost / optimal_cost
    } else if nzero(real_cost) {
        f64::INFINITY
    } else {
        1.0
    }
}

/// Proportional-cost-deviation bound: `2 * sum d(1-d) / sum d` over the
/// opposite-agent pairing.
pub fn pcd_bound_value(g: &dyn Graph, seq: &[usize]) -> f64 {
    let dis_opp = opposite_distances(g, seq);
    let optimal_cost: f64 = dis_opp.iter().sum();
    let real_cost: f64 = 2.0 * dis_opp.iter().map(|d| d * (1.0 - d)).sum::<f64>();
    guarded_ratio(real_cost, optimal_cost)
}

/// Expected cost under `lot` divided by the optimal-agent cost.
pub fn approximation_ratio(lot: &Lottery, g: &dyn Graph, seq: &[usize]) -> f64 {
    let mut optimal_cost = f64::INFINITY;
    let mut real_cost = 0.0;
    for (&a, p) in seq.iter().zip(lot(seq)) {
        let c = vertex_cost(g, seq, a);
        real_cost += p * c;
        optimal_cost = optimal_cost.min(c);
    }
    guarded_ratio(real_cost, optimal_cost)
}

// ============================================================================
// Quantity abstraction
// ============================================================================

/// A per-tuple scalar metric.
pub trait Quantity {
    fn score(&self, seq: &[usize], g: &dyn Graph) -> f64;
}

/// [`approximation_ratio`] of a borrowed lottery.
pub struct ApproxRatio<'a> {
    lot: &'a Lottery,
}

impl<'a> ApproxRatio<'a> {
    pub fn new(lot: &'a Lottery) -> Self {
        Self { lot }
    }
}

impl Quantity for ApproxRatio<'_> {
    fn score(&self, seq: &[usize], g: &dyn Graph) -> f64 {
        approximation_ratio(self.lot, g, seq)
    }
}

/// [`pcd_bound_value`]; needs no configuration.
pub struct PcdBound;

impl Quantity for PcdBound {
    fn score(&self, seq: &[usize], g: &dyn Graph) -> f64 {
        pcd_bound_value(g, seq)
    }
}

/// Sum of two exclusively-owned sub-quantities.
pub struct SumQ<'a> {
    q1: Box<dyn Quantity + 'a>,
    q2: Box<dyn Quantity + 'a>,
}

impl<'a> SumQ<'a> {
    pub fn new(q1: Box<dyn Quantity + 'a>, q2: Box<dyn Quantity + 'a>) -> Self {
        Self { q1, q2 }
    }
}

impl Quantity for SumQ<'_> {
    fn score(&self, seq: &[usize], g: &dyn Graph) -> f64 {
        self.q1.score(seq, g) + self.q2.score(seq, g)
    }
}

// ============================================================================
// Configuration analysis predicates
// ============================================================================

/// Index of the optimal middle agent: among agents that see exactly half the
/// tuple within half the circle ahead, the one with minimal vertex cost.
///
/// Ties break to the first index in enumeration order. `is_zero_opt` depends
/// on that: with several optimal points anchored at 0, index 0 wins.
pub fn opt_agent(g: &dyn Graph, seq: &[usize]) -> usize {
    let n = seq.len();
    let mut opt = 0;
    let mut min_cost = f64::INFINITY;
    let mut right_agent = 0usize;
    for curr_agent in 0..n {
        while unrolled(seq, g.size(), right_agent) - (seq[curr_agent] as i64)
            < (g.size() / 2) as i64
        {
            right_agent += 1;
        }
        if right_agent > curr_agent && (right_agent - curr_agent) * 2 == n + 1 {
            let curr_cost = vertex_cost(g, seq, seq[curr_agent]);
            if curr_cost < min_cost {
                min_cost = curr_cost;
                opt = curr_agent;
            }
        }
    }
    opt
}

/// Position of the cyclically-unrolled agent `idx` (wraps add a full circle).
fn unrolled(seq: &[usize], graph_size: usize, idx: usize) -> i64 {
    (seq[idx % seq.len()] + graph_size * (idx / seq.len())) as i64
}

/// True when `curr_agent` sees exactly half the tuple within half the circle
/// ahead of it.
pub fn is_agent_middle(curr_agent: usize, g: &dyn Graph, seq: &[usize]) -> bool {
    let n = seq.len();
    let mut right_agent = curr_agent;
    while ((unrolled(seq, g.size(), right_agent) - (seq[curr_agent] as i64)) as f64)
        < g.size() as f64 / 2.0
    {
        right_agent += 1;
    }
    (right_agent - curr_agent) * 2 == n + 1
}

/// True when the anchor agent is the optimal point.
pub fn is_zero_opt(g: &dyn Graph, seq: &[usize]) -> bool {
    opt_agent(g, seq) == 0
}

/// Ratio of the distance mass outside a `span`-wide neighborhood of the
/// optimal agent to the mass inside it.
pub fn centrality(g: &dyn Graph, seq: &[usize], span: usize) -> f64 {
    let n = seq.len();
    let center = opt_agent(g, seq);
    let mut central = 0.0;
    for i in center + n - span..=center + n + span {
        central += g.distance(seq[i % n], seq[center]);
    }
    let mut other = 0.0;
    for i in center + span + 1..center + n - span {
        other += g.distance(seq[i % n], seq[center]);
    }
    other / central
}

/// True when every opposite-pair distance is at least `threshold`.
pub fn is_sparse(g: &dyn Graph, seq: &[usize], threshold: f64) -> bool {
    opposite_distances(g, seq)
        .into_iter()
        .fold(f64::INFINITY, f64::min)
        >= threshold
}

/// Keep only tuples whose centrality reaches `threshold`.
pub fn centrality_filter<G: Graph + 'static>(
    inner: Box<dyn SeqGenerator>,
    g: G,
    threshold: f64,
    span: usize,
) -> PredicateFilter {
    PredicateFilter::new(
        inner,
        Box::new(move |seq| centrality(&g, seq, span) >= threshold),
    )
}

/// Keep only tuples with all opposite-pair distances at least `threshold`.
pub fn sparse_filter<G: Graph + 'static>(
    inner: Box<dyn SeqGenerator>,
    g: G,
    threshold: f64,
) -> PredicateFilter {
    PredicateFilter::new(inner, Box::new(move |seq| is_sparse(&g, seq, threshold)))
}
