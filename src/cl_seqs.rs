// Canonical position-tuple generators
//
// This module contains the streaming enumeration engine: pull-based, lazy
// generators of weakly-increasing agent-position tuples anchored at their
// first element, plus owning filter wrappers. Generators are one-shot: once
// `advance` returns false they are exhausted for good.

use crate::cl_interface::num_of_increasing_seqs;
use log::warn;
use std::cmp::Ordering;
use std::io::BufRead;

/// Pull-based tuple generator.
///
/// `advance` mutates the current tuple in place and returns `true`, or
/// returns `false` and stays exhausted forever. `current` is only valid
/// between a successful `advance` and the next call; the slice is owned by
/// the generator and reused across steps.
pub trait SeqGenerator {
    /// Step to the next tuple. Returns `false` when exhausted (terminal).
    fn advance(&mut self) -> bool;

    /// Read-only view of the tuple produced by the last successful `advance`.
    fn current(&self) -> &[usize];

    /// Estimated number of tuples this generator will produce.
    ///
    /// Used for pre-flight cost estimation before committing to a full
    /// enumeration. Pruned variants over-estimate; `0.0` means unknown.
    fn approx_size(&self) -> f64;
}

/// Compare a tuple against its point reflection.
///
/// The reflection maps `v -> (end - v) % end`, reverses the order, and
/// rotates so the reflected tuple is anchored where the input's leading
/// zeros were. Returns `true` when the reflection is lexicographically not
/// smaller, i.e. when `seq` is the canonical representative of its
/// opposite-agent equivalence class.
fn reflection_not_less(seq: &[usize], end: usize) -> bool {
    let size = seq.len();
    let num_zeros = seq.iter().take_while(|&&v| v == 0).count();
    for t in 0..size {
        let m = (size - num_zeros + t) % size;
        let refl = (end - seq[size - 1 - m]) % end;
        match refl.cmp(&seq[t]) {
            Ordering::Less => return false,
            Ordering::Greater => return true,
            Ordering::Equal => {}
        }
    }
    true
}

// ============================================================================
// Plain increasing sequences
// ============================================================================

/// All weakly-increasing tuples of length `size` over `[start, end)`,
/// anchored at `start` (the first element never moves), in lexicographic
/// order.
pub struct IncreasingSeqs {
    start: usize,
    end: usize,
    size: usize,
    seq: Vec<usize>,
    started: bool,
    done: bool,
}

impl IncreasingSeqs {
    pub fn new(start: usize, end: usize, size: usize) -> Self {
        Self {
            start,
            end,
            size,
            seq: Vec::with_capacity(size),
            started: false,
            done: false,
        }
    }
}

impl SeqGenerator for IncreasingSeqs {
    fn advance(&mut self) -> bool {
        if self.done {
            return false;
        }
        if !self.started {
            self.started = true;
            if self.size == 0 || self.start >= self.end {
                self.done = true;
                return false;
            }
            self.seq = vec![self.start; self.size];
            return true;
        }
        // Successor rule: increment the last element; on overflow pop and
        // retry the previous position; then fill the tail with the new value.
        // Once only the anchor remains the enumeration is over for good.
        while self.seq.last() == Some(&(self.end - 1)) {
            self.seq.pop();
        }
        if self.seq.len() <= 1 {
            self.done = true;
            return false;
        }
        *self.seq.last_mut().unwrap() += 1;
        let last = *self.seq.last().unwrap();
        while self.seq.len() < self.size {
            self.seq.push(last);
        }
        true
    }

    fn current(&self) -> &[usize] {
        &self.seq
    }

    fn approx_size(&self) -> f64 {
        num_of_increasing_seqs(self.size as u64, (self.end - self.start) as u64) as f64
    }
}

// ============================================================================
// Asymmetric (reflection-canonical) sequences
// ============================================================================

/// As [`IncreasingSeqs`], keeping only the canonical representative of each
/// reflection-equivalence class: tuples whose point reflection is
/// lexicographically smaller are rejected and the search backtracks.
pub struct AsymmetricSeqs {
    inner: IncreasingSeqs,
}

impl AsymmetricSeqs {
    pub fn new(start: usize, end: usize, size: usize) -> Self {
        Self {
            inner: IncreasingSeqs::new(start, end, size),
        }
    }
}

impl SeqGenerator for AsymmetricSeqs {
    fn advance(&mut self) -> bool {
        loop {
            if !self.inner.advance() {
                return false;
            }
            if reflection_not_less(&self.inner.seq, self.inner.end) {
                return true;
            }
            // Backtrack past the rejected candidate, not just its tail fill
            self.inner.seq.pop();
        }
    }

    fn current(&self) -> &[usize] {
        self.inner.current()
    }

    fn approx_size(&self) -> f64 {
        // Each equivalence class has at most two members
        self.inner.approx_size() / 2.0
    }
}

// ============================================================================
// Bounded-distinct sequences
// ============================================================================

/// Successor enumeration with a live distinct-value counter: a candidate
/// increment that would introduce a distinct value beyond `bound` is rejected
/// locally, without popping further. With `asymmetric` the reflection
/// canonicalization of [`AsymmetricSeqs`] applies on top.
pub struct BoundedDistinctSeqs {
    start: usize,
    end: usize,
    size: usize,
    bound: usize,
    asymmetric: bool,
    num_distinct: usize,
    seq: Vec<usize>,
    started: bool,
    done: bool,
}

impl BoundedDistinctSeqs {
    pub fn new(start: usize, end: usize, size: usize, bound: usize, asymmetric: bool) -> Self {
        Self {
            start,
            end,
            size,
            bound,
            asymmetric,
            num_distinct: 1,
            seq: Vec::with_capacity(size),
            started: false,
            done: false,
        }
    }

    fn pop_tracked(&mut self) -> usize {
        let last = *self.seq.last().unwrap();
        if self.seq.len() >= 2 && self.seq[self.seq.len() - 2] != last {
            self.num_distinct -= 1;
        }
        self.seq.pop();
        last
    }

    /// Push `el`, keeping the distinct counter current; refuses a push that
    /// would exceed the bound. Only called on a non-empty tuple.
    fn push_tracked(&mut self, el: usize) -> bool {
        if let Some(&prev) = self.seq.last() {
            if prev != el {
                if self.num_distinct >= self.bound {
                    return false;
                }
                self.num_distinct += 1;
            }
        }
        self.seq.push(el);
        true
    }
}

impl SeqGenerator for BoundedDistinctSeqs {
    fn advance(&mut self) -> bool {
        if self.done {
            return false;
        }
        if !self.started {
            self.started = true;
            if self.size == 0 || self.start >= self.end || self.bound == 0 {
                self.done = true;
                return false;
            }
            self.seq = vec![self.start; self.size];
            self.num_distinct = 1;
            if !self.asymmetric || reflection_not_less(&self.seq, self.end) {
                return true;
            }
            self.pop_tracked();
        }
        loop {
            while self.seq.last() == Some(&(self.end - 1)) {
                self.pop_tracked();
            }
            // Only the anchor (or nothing) left: no further candidate exists
            if self.seq.len() <= 1 {
                self.done = true;
                return false;
            }
            let el = self.pop_tracked() + 1;
            if !self.push_tracked(el) {
                continue;
            }
            while self.seq.len() < self.size {
                self.seq.push(el);
            }
            if !self.asymmetric || reflection_not_less(&self.seq, self.end) {
                return true;
            }
            self.pop_tracked();
        }
    }

    fn current(&self) -> &[usize] {
        &self.seq
    }

    fn approx_size(&self) -> f64 {
        use crate::cl_interface::binomial_coefficient;
        let values = (self.end - self.start) as u64;
        let mut res: u64 = 0;
        for i in 1..=(self.bound as u64).min(values).min(self.size as u64) {
            res += binomial_coefficient(values, i) * num_of_increasing_seqs(self.size as u64 - i, i) / 2;
        }
        // slightly overestimated
        res as f64
    }
}

// ============================================================================
// Stream-backed sequences
// ============================================================================

/// Tuples read from a line-oriented text stream.
///
/// Each line is whitespace-separated integers, sorted and shifted so the
/// minimum becomes the zero anchor. Lines starting with `print ` / `println `
/// instead echo the remainder to stdout (without / with a trailing newline)
/// and are skipped. A malformed integer is reported and the whole line is
/// discarded; the stream keeps going.
pub struct StreamSeqs<R: BufRead> {
    reader: R,
    seq: Vec<usize>,
}

impl<R: BufRead> StreamSeqs<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            seq: Vec::new(),
        }
    }
}

impl<R: BufRead> SeqGenerator for StreamSeqs<R> {
    fn advance(&mut self) -> bool {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return false,
                Ok(_) => {}
                Err(e) => {
                    warn!("input stream error: {}", e);
                    return false;
                }
            }
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if let Some(rest) = trimmed.strip_prefix("print ") {
                print!("{}", rest);
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix("println ") {
                println!("{}", rest);
                continue;
            }
            let mut vals: Vec<i64> = Vec::new();
            let mut malformed = false;
            for tok in trimmed.split_whitespace() {
                match tok.parse::<i64>() {
                    Ok(v) => vals.push(v),
                    Err(e) => {
                        warn!("{} on arg: {}", e, tok);
                        malformed = true;
                        break;
                    }
                }
            }
            if malformed || vals.is_empty() {
                continue;
            }
            vals.sort_unstable();
            let min_val = vals[0];
            self.seq.clear();
            self.seq.extend(vals.iter().map(|v| (v - min_val) as usize));
            return true;
        }
    }

    fn current(&self) -> &[usize] {
        &self.seq
    }

    fn approx_size(&self) -> f64 {
        0.0
    }
}

// ============================================================================
// Filters
// ============================================================================

/// True when no cyclic gap between consecutive positions exceeds half the
/// graph, including the wrap-around gap between last and first.
pub fn is_balanced(seq: &[usize], graph_size: usize) -> bool {
    if seq.is_empty() {
        return true;
    }
    let bound = graph_size / 2;
    for w in seq.windows(2) {
        if w[1] - w[0] > bound {
            return false;
        }
    }
    graph_size
        .checked_sub(seq[0] + *seq.last().unwrap())
        .map_or(false, |gap| gap <= bound)
}

/// True when no value repeats contiguously more than half the tuple length.
pub fn is_nondominant(seq: &[usize]) -> bool {
    let mut el = 0;
    let mut consecutive = 0;
    for &x in seq {
        if x == el {
            consecutive += 1;
            if consecutive > seq.len() / 2 {
                return false;
            }
        } else {
            el = x;
            consecutive = 1;
        }
    }
    true
}

/// Skips tuples with a cyclic gap larger than half the graph.
pub struct BalanceFilter {
    inner: Box<dyn SeqGenerator>,
    graph_size: usize,
}

impl BalanceFilter {
    pub fn new(inner: Box<dyn SeqGenerator>, graph_size: usize) -> Self {
        Self { inner, graph_size }
    }
}

impl SeqGenerator for BalanceFilter {
    fn advance(&mut self) -> bool {
        loop {
            if !self.inner.advance() {
                return false;
            }
            if is_balanced(self.inner.current(), self.graph_size) {
                return true;
            }
        }
    }

    fn current(&self) -> &[usize] {
        self.inner.current()
    }

    fn approx_size(&self) -> f64 {
        // Pre-filter estimate: the skip rate is not known up front
        self.inner.approx_size()
    }
}

/// Skips tuples where one value repeats contiguously more than half the
/// tuple length.
pub struct DominanceFilter {
    inner: Box<dyn SeqGenerator>,
}

impl DominanceFilter {
    pub fn new(inner: Box<dyn SeqGenerator>) -> Self {
        Self { inner }
    }
}

impl SeqGenerator for DominanceFilter {
    fn advance(&mut self) -> bool {
        loop {
            if !self.inner.advance() {
                return false;
            }
            if is_nondominant(self.inner.current()) {
                return true;
            }
        }
    }

    fn current(&self) -> &[usize] {
        self.inner.current()
    }

    fn approx_size(&self) -> f64 {
        self.inner.approx_size()
    }
}

/// Filter with an arbitrary keep-predicate; used for the centrality and
/// sparsity analyses.
pub struct PredicateFilter {
    inner: Box<dyn SeqGenerator>,
    keep: Box<dyn Fn(&[usize]) -> bool>,
}

impl PredicateFilter {
    pub fn new(inner: Box<dyn SeqGenerator>, keep: Box<dyn Fn(&[usize]) -> bool>) -> Self {
        Self { inner, keep }
    }
}

impl SeqGenerator for PredicateFilter {
    fn advance(&mut self) -> bool {
        loop {
            if !self.inner.advance() {
                return false;
            }
            if (self.keep)(self.inner.current()) {
                return true;
            }
        }
    }

    fn current(&self) -> &[usize] {
        self.inner.current()
    }

    fn approx_size(&self) -> f64 {
        self.inner.approx_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cl_interface::num_of_increasing_seqs;
    use std::io::Cursor;

    fn collect_all(gen: &mut dyn SeqGenerator) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        while gen.advance() {
            out.push(gen.current().to_vec());
        }
        out
    }

    fn reflect(seq: &[usize], end: usize) -> Vec<usize> {
        // Reference implementation of the canonical reflection
        let size = seq.len();
        let num_zeros = seq.iter().take_while(|&&v| v == 0).count();
        (0..size)
            .map(|t| {
                let m = (size - num_zeros + t) % size;
                (end - seq[size - 1 - m]) % end
            })
            .collect()
    }

    #[test]
    fn test_plain_small_enumeration() {
        let mut g = IncreasingSeqs::new(0, 2, 3);
        let all = collect_all(&mut g);
        assert_eq!(all, vec![vec![0, 0, 0], vec![0, 0, 1], vec![0, 1, 1]]);
    }

    #[test]
    fn test_plain_count_matches_closed_form() {
        // Anchored tuples: the tail of length n-1 ranges freely over k values
        for (n, k) in [(2, 3), (3, 4), (4, 5), (3, 6), (5, 4)] {
            let mut g = IncreasingSeqs::new(0, k, n);
            let count = collect_all(&mut g).len() as u64;
            assert_eq!(
                count,
                num_of_increasing_seqs(n as u64 - 1, k as u64),
                "count mismatch for n={} k={}",
                n,
                k
            );
        }
    }

    #[test]
    fn test_plain_tuples_sorted_and_anchored() {
        let mut g = IncreasingSeqs::new(0, 5, 4);
        while g.advance() {
            let seq = g.current();
            assert_eq!(seq[0], 0);
            assert!(seq.windows(2).all(|w| w[0] <= w[1]));
            assert!(seq.iter().all(|&v| v < 5));
        }
    }

    #[test]
    fn test_plain_approx_size_upper_bounds_count() {
        let mut g = IncreasingSeqs::new(0, 6, 3);
        let approx = g.approx_size();
        let count = collect_all(&mut g).len();
        assert!(approx >= count as f64);
    }

    #[test]
    fn test_plain_empty_range() {
        let mut g = IncreasingSeqs::new(3, 3, 4);
        assert_eq!(g.approx_size(), 0.0);
        assert!(!g.advance());
        assert!(!g.advance());
    }

    #[test]
    fn test_plain_exhaustion_is_terminal() {
        let mut g = IncreasingSeqs::new(0, 2, 2);
        while g.advance() {}
        assert!(!g.advance());
        assert!(!g.advance());
    }

    #[test]
    fn test_asymmetric_tuples_not_greater_than_reflection() {
        let end = 6;
        let mut g = AsymmetricSeqs::new(0, end, 3);
        let all = collect_all(&mut g);
        assert!(!all.is_empty());
        for seq in &all {
            let refl = reflect(seq, end);
            assert!(
                refl.as_slice() >= seq.as_slice(),
                "tuple {:?} is greater than its reflection {:?}",
                seq,
                refl
            );
        }
    }

    #[test]
    fn test_asymmetric_is_subset_of_plain() {
        let mut plain = IncreasingSeqs::new(0, 5, 3);
        let all_plain = collect_all(&mut plain);
        let mut asym = AsymmetricSeqs::new(0, 5, 3);
        let all_asym = collect_all(&mut asym);
        assert!(all_asym.len() < all_plain.len());
        for seq in &all_asym {
            assert!(all_plain.contains(seq));
        }
    }

    #[test]
    fn test_asymmetric_covers_all_classes() {
        // Every plain tuple is represented by itself or its reflection
        let end = 6;
        let mut plain = IncreasingSeqs::new(0, end, 3);
        let all_plain = collect_all(&mut plain);
        let mut asym = AsymmetricSeqs::new(0, end, 3);
        let all_asym = collect_all(&mut asym);
        for seq in &all_plain {
            let mut refl = reflect(seq, end);
            refl.sort_unstable();
            assert!(
                all_asym.contains(seq) || all_asym.iter().any(|s| {
                    let mut sorted = s.clone();
                    sorted.sort_unstable();
                    sorted == refl
                }),
                "class of {:?} has no representative",
                seq
            );
        }
    }

    #[test]
    fn test_bounded_distinct_respects_bound() {
        for bound in 1..4 {
            let mut g = BoundedDistinctSeqs::new(0, 6, 4, bound, true);
            while g.advance() {
                let mut distinct = 1;
                for w in g.current().windows(2) {
                    if w[0] != w[1] {
                        distinct += 1;
                    }
                }
                assert!(
                    distinct <= bound,
                    "tuple {:?} exceeds distinct bound {}",
                    g.current(),
                    bound
                );
            }
        }
    }

    #[test]
    fn test_bounded_distinct_full_bound_equals_asymmetric() {
        let mut asym = AsymmetricSeqs::new(0, 5, 4);
        let all_asym = collect_all(&mut asym);
        let mut bounded = BoundedDistinctSeqs::new(0, 5, 4, 4, true);
        let all_bounded = collect_all(&mut bounded);
        assert_eq!(all_asym, all_bounded);
    }

    #[test]
    fn test_bounded_distinct_non_asymmetric_mode() {
        let mut plain = IncreasingSeqs::new(0, 4, 3);
        let all_plain = collect_all(&mut plain);
        let mut bounded = BoundedDistinctSeqs::new(0, 4, 3, 3, false);
        let all_bounded = collect_all(&mut bounded);
        assert_eq!(all_plain, all_bounded);
    }

    #[test]
    fn test_asymmetric_exhaustion_is_terminal() {
        let mut g = AsymmetricSeqs::new(0, 3, 2);
        while g.advance() {}
        assert!(!g.advance(), "exhausted generator restarted");
        assert!(!g.advance());
    }

    #[test]
    fn test_bounded_single_distinct_value() {
        // With bound 1 only the constant tuple qualifies; the failed-push
        // backtracking must not restart enumeration at a shifted anchor
        let mut g = BoundedDistinctSeqs::new(0, 6, 4, 1, true);
        let all = collect_all(&mut g);
        assert_eq!(all, vec![vec![0, 0, 0, 0]]);
        assert!(!g.advance());
    }

    #[test]
    fn test_bounded_exhaustion_is_terminal() {
        for bound in 1..4 {
            let mut g = BoundedDistinctSeqs::new(0, 5, 3, bound, true);
            while g.advance() {}
            assert!(!g.advance(), "exhausted generator restarted, bound {}", bound);
            assert!(!g.advance());
        }
    }

    #[test]
    fn test_bounded_distinct_approx_size_is_upper_bound() {
        for bound in 1..4 {
            let mut g = BoundedDistinctSeqs::new(0, 6, 4, bound, true);
            let approx = g.approx_size();
            let count = collect_all(&mut g).len();
            assert!(
                approx >= count as f64,
                "approx {} below true count {} for bound {}",
                approx,
                count,
                bound
            );
        }
    }

    #[test]
    fn test_stream_seqs_sorts_and_anchors() {
        let input = "3 1 5\n10 10 12\n";
        let mut g = StreamSeqs::new(Cursor::new(input));
        assert!(g.advance());
        assert_eq!(g.current(), &[0, 2, 4]);
        assert!(g.advance());
        assert_eq!(g.current(), &[0, 0, 2]);
        assert!(!g.advance());
    }

    #[test]
    fn test_stream_seqs_negative_values_shift_to_zero() {
        let mut g = StreamSeqs::new(Cursor::new("-2 0 3\n"));
        assert!(g.advance());
        assert_eq!(g.current(), &[0, 2, 5]);
    }

    #[test]
    fn test_stream_seqs_skips_malformed_lines() {
        let input = "1 x 3\n0 1 2\n";
        let mut g = StreamSeqs::new(Cursor::new(input));
        assert!(g.advance());
        assert_eq!(g.current(), &[0, 1, 2]);
        assert!(!g.advance());
    }

    #[test]
    fn test_stream_seqs_skips_directives_and_blank_lines() {
        let input = "println header\n\n0 1\nprint tail\n";
        let mut g = StreamSeqs::new(Cursor::new(input));
        assert!(g.advance());
        assert_eq!(g.current(), &[0, 1]);
        assert!(!g.advance());
    }

    #[test]
    fn test_stream_seqs_approx_size_unknown() {
        let g = StreamSeqs::new(Cursor::new(""));
        assert_eq!(g.approx_size(), 0.0);
    }

    #[test]
    fn test_is_balanced() {
        // graph size 10, half = 5
        assert!(is_balanced(&[0, 3, 7], 10));
        assert!(!is_balanced(&[0, 6, 7], 10), "gap 0->6 exceeds half");
        // wrap gap: 10 - 0 - 2 = 8 > 5
        assert!(!is_balanced(&[0, 1, 2], 10));
    }

    #[test]
    fn test_is_nondominant() {
        assert!(is_nondominant(&[0, 1, 2, 3]));
        assert!(is_nondominant(&[0, 0, 1, 1]));
        assert!(!is_nondominant(&[0, 0, 0, 1]));
        assert!(!is_nondominant(&[0, 2, 2, 2, 3]));
    }

    #[test]
    fn test_balance_filter_keeps_only_balanced() {
        let inner = Box::new(IncreasingSeqs::new(0, 6, 3));
        let mut filtered = BalanceFilter::new(inner, 6);
        let all = collect_all(&mut filtered);
        assert!(!all.is_empty());
        for seq in &all {
            assert!(is_balanced(seq, 6), "unbalanced tuple {:?} passed", seq);
        }
    }

    #[test]
    fn test_dominance_filter_rejects_dominated() {
        let inner = Box::new(IncreasingSeqs::new(0, 4, 4));
        let mut filtered = DominanceFilter::new(inner);
        let all = collect_all(&mut filtered);
        assert!(!all.is_empty());
        for seq in &all {
            assert!(is_nondominant(seq), "dominated tuple {:?} passed", seq);
        }
    }

    #[test]
    fn test_filter_passes_through_inner_estimate() {
        let inner = Box::new(IncreasingSeqs::new(0, 6, 3));
        let expected = inner.approx_size();
        let filtered = BalanceFilter::new(inner, 6);
        assert_eq!(filtered.approx_size(), expected);
    }

    #[test]
    fn test_predicate_filter() {
        let inner = Box::new(IncreasingSeqs::new(0, 5, 3));
        let mut filtered =
            PredicateFilter::new(inner, Box::new(|seq: &[usize]| seq[2] - seq[0] >= 3));
        while filtered.advance() {
            let seq = filtered.current();
            assert!(seq[2] - seq[0] >= 3);
        }
    }
}
