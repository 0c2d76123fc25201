//! Smoothing-aware depth-first evaluation of shared circuits.
//!
//! [`SmoothedEvaluator::depth_first`] folds a circuit bottom-up with a
//! caller-supplied *combine* function. The evaluator does the bookkeeping:
//! it visits every reachable node once (memoized by handle), and for every
//! decision node it reports, next to the children's results, which
//! variables each child actually covers and which variables the vtree
//! expects on the prime and sub side. The combine function alone decides
//! what to do with that, e.g. multiply by `2` per missing variable.
//!
//! A child's covered variables are keyed by the child's **own** vtree node,
//! never by the path that reached it, so a node shared between parents with
//! different expectations always contributes the same cached value and each
//! parent corrects for its own gap.
//!
//! # Example
//!
//! ```
//! use num_bigint::BigUint;
//! use sdd_wmc::circuit::Circuit;
//! use sdd_wmc::smooth::{model_count, SmoothedEvaluator};
//! use sdd_wmc::vtree::{Vtree, VtreeId};
//!
//! // x1 ∨ x2 over the vtree ((x1 x2) (x3 x4))
//! let mut circuit = Circuit::new(Vtree::balanced(4));
//! let a = circuit.mk_literal(1);
//! let na = circuit.mk_literal(-1);
//! let b = circuit.mk_literal(2);
//! let t = circuit.true_node();
//! let f = circuit.mk_decision(VtreeId::new(1), vec![(a, t), (na, b)]);
//!
//! let local = SmoothedEvaluator::new(&circuit, true, false);
//! assert_eq!(local.depth_first(f, model_count).unwrap(), BigUint::from(3u32));
//!
//! let global = SmoothedEvaluator::new(&circuit, true, true);
//! assert_eq!(global.depth_first(f, model_count).unwrap(), BigUint::from(12u32));
//! ```

use std::cell::{Cell, OnceCell};
use std::collections::HashMap;

use log::debug;
use num_bigint::BigUint;

use crate::bitset::BitSet;
use crate::circuit::{CircuitManager, NodeKind};
use crate::error::{Error, Result};
use crate::expected::ExpectedVariableIndex;
use crate::flat::log_sum_exp;
use crate::types::Var;
use crate::vtree::VtreeId;
use crate::weights::LiteralWeights;

/// Evaluator configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct SmoothOptions {
    /// Report expected variable sets so combine functions can smooth.
    pub smooth: bool,
    /// Also account for the variables above the start node's vtree node.
    pub smooth_to_root: bool,
    /// Reuse results of shared nodes within a call.
    pub memoize: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            smooth: true,
            smooth_to_root: false,
            memoize: true,
        }
    }
}

/// Counters for the most recent [`SmoothedEvaluator::depth_first`] call.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct TraversalStats {
    pub combine_calls: usize,
    pub cache_hits: usize,
}

/// Results of one decision element, handed to the combine function.
#[derive(Debug, Clone)]
pub struct Pair<'a, R> {
    pub prime: R,
    pub sub: R,
    /// Variables of the prime's own vtree node; `None` for constants or
    /// when smoothing is off.
    pub prime_vars: Option<&'a BitSet>,
    /// Variables of the sub's own vtree node; `None` for constants or
    /// when smoothing is off.
    pub sub_vars: Option<&'a BitSet>,
}

enum Frame<'m, N> {
    Enter(N),
    Exit(N, &'m [(N, N)]),
}

/// Memoized bottom-up folding of a circuit that reports the expected
/// variable sets a combine function needs for smoothing.
pub struct SmoothedEvaluator<'m, M: CircuitManager> {
    mgr: &'m M,
    options: SmoothOptions,
    index: OnceCell<ExpectedVariableIndex>,
    stats: Cell<TraversalStats>,
}

impl<'m, M: CircuitManager> SmoothedEvaluator<'m, M> {
    /// Creates a memoizing evaluator with the given smoothing flags.
    pub fn new(mgr: &'m M, smooth: bool, smooth_to_root: bool) -> Self {
        Self::with_options(
            mgr,
            SmoothOptions {
                smooth,
                smooth_to_root,
                ..SmoothOptions::default()
            },
        )
    }

    /// Creates an evaluator; the expected-variable index is built lazily on
    /// the first smoothed call.
    pub fn with_options(mgr: &'m M, options: SmoothOptions) -> Self {
        Self {
            mgr,
            options,
            index: OnceCell::new(),
            stats: Cell::new(TraversalStats::default()),
        }
    }

    /// Creates an evaluator around an already built index.
    pub fn with_index(mgr: &'m M, options: SmoothOptions, index: ExpectedVariableIndex) -> Self {
        let evaluator = Self::with_options(mgr, options);
        let _ = evaluator.index.set(index);
        evaluator
    }

    pub fn options(&self) -> SmoothOptions {
        self.options
    }

    pub fn manager(&self) -> &'m M {
        self.mgr
    }

    /// The expected-variable index of the manager's vtree.
    pub fn expected(&self) -> &ExpectedVariableIndex {
        self.index.get_or_init(|| ExpectedVariableIndex::build(self.mgr.vtree()))
    }

    pub fn last_stats(&self) -> TraversalStats {
        self.stats.get()
    }

    /// Folds the circuit rooted at `start` with `combine`.
    ///
    /// `combine(node, pairs, expected_prime, expected_sub)` is called once per
    /// distinct reachable node (per occurrence when memoization is off):
    /// with `pairs = None` for leaves, and with one [`Pair`] per element for
    /// decision nodes. The expected sets are the variables of the node's
    /// left and right vtree children, or `None` when smoothing is off.
    ///
    /// With smoothing on, two extra calls may follow the traversal, both
    /// shaped like a single-element decision whose sub is the constant
    /// true: one when `start` is a bare leaf (smoothed against all
    /// variables), and one for `smooth_to_root` when `start` is normalized
    /// below the vtree root.
    pub fn depth_first<R, F>(&self, start: M::Node, mut combine: F) -> Result<R>
    where
        R: Clone,
        F: FnMut(&NodeKind<'_, M::Node>, Option<&[Pair<'_, R>]>, Option<&BitSet>, Option<&BitSet>) -> R,
    {
        let mgr: &'m M = self.mgr;
        let index = if self.options.smooth { Some(self.expected()) } else { None };
        let used = |node: M::Node| index.and_then(|ix| mgr.node_vtree(node).map(|v| ix.vars(v)));

        let mut stats = TraversalStats::default();
        let mut cache: HashMap<M::Node, R> = HashMap::new();
        let mut values: Vec<R> = Vec::new();
        let mut stack = vec![Frame::Enter(start)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(node) => {
                    if self.options.memoize {
                        if let Some(value) = cache.get(&node) {
                            stats.cache_hits += 1;
                            values.push(value.clone());
                            continue;
                        }
                    }
                    match mgr.kind(node)? {
                        NodeKind::Decision(elements) => {
                            stack.push(Frame::Exit(node, elements));
                            for &(prime, sub) in elements.iter().rev() {
                                stack.push(Frame::Enter(sub));
                                stack.push(Frame::Enter(prime));
                            }
                        }
                        leaf => {
                            let value = combine(&leaf, None, None, None);
                            stats.combine_calls += 1;
                            if self.options.memoize {
                                cache.insert(node, value.clone());
                            }
                            values.push(value);
                        }
                    }
                }
                Frame::Exit(node, elements) => {
                    if values.len() < 2 * elements.len() {
                        return Err(Error::ExpectedDecisionNode(format!("{:?} lost its element results", node)));
                    }
                    let results = values.split_off(values.len() - 2 * elements.len());
                    let mut results = results.into_iter();
                    let mut pairs = Vec::with_capacity(elements.len());
                    for &(prime, sub) in elements {
                        if let (Some(prime_value), Some(sub_value)) = (results.next(), results.next()) {
                            pairs.push(Pair {
                                prime: prime_value,
                                sub: sub_value,
                                prime_vars: used(prime),
                                sub_vars: used(sub),
                            });
                        }
                    }

                    let (expected_prime, expected_sub) = match index {
                        Some(ix) => {
                            let (left, right) = self.children_scope(node)?;
                            (Some(ix.vars(left)), Some(ix.vars(right)))
                        }
                        None => (None, None),
                    };

                    let kind = NodeKind::Decision(elements);
                    let value = combine(&kind, Some(&pairs), expected_prime, expected_sub);
                    stats.combine_calls += 1;
                    if self.options.memoize {
                        cache.insert(node, value.clone());
                    }
                    values.push(value);
                }
            }
        }

        let mut result = values
            .pop()
            .ok_or_else(|| Error::ExpectedDecisionNode(format!("{:?} produced no result", start)))?;

        if let Some(ix) = index {
            let kind = mgr.kind(start)?;
            let scope = if kind.is_leaf() {
                // A bare leaf has no decision around it to carry the
                // smoothing context; smooth it against all variables.
                Some(used(start))
            } else if self.options.smooth_to_root {
                mgr.node_vtree(start)
                    .filter(|&v| v != ix.root())
                    .map(|v| Some(ix.vars(v)))
            } else {
                None
            };

            if let Some(start_vars) = scope {
                let empty = BitSet::empty();
                let expected_prime = start_vars.unwrap_or(&empty);
                let expected_sub = ix.root_vars().difference(expected_prime);

                let true_node = mgr.true_node();
                let true_value = match cache.get(&true_node) {
                    Some(value) => value.clone(),
                    None => {
                        stats.combine_calls += 1;
                        combine(&NodeKind::True, None, None, None)
                    }
                };

                let pairs = [Pair {
                    prime: result,
                    sub: true_value,
                    prime_vars: start_vars,
                    sub_vars: None,
                }];
                result = combine(&kind, Some(&pairs), Some(expected_prime), Some(&expected_sub));
                stats.combine_calls += 1;
            }
        }

        debug!(
            "depth_first({:?}): {} combine calls, {} cache hits",
            start, stats.combine_calls, stats.cache_hits
        );
        self.stats.set(stats);
        Ok(result)
    }

    fn children_scope(&self, node: M::Node) -> Result<(VtreeId, VtreeId)> {
        let vtree = self.mgr.vtree();
        let v = self
            .mgr
            .node_vtree(node)
            .ok_or_else(|| Error::ExpectedDecisionNode(format!("{:?} has no vtree node", node)))?;
        match (vtree.left(v), vtree.right(v)) {
            (Some(left), Some(right)) => Ok((left, right)),
            _ => Err(Error::ExpectedDecisionNode(format!("{:?} is normalized for leaf {}", node, v))),
        }
    }
}

fn missing(expected: Option<&BitSet>, used: Option<&BitSet>) -> usize {
    match expected {
        Some(expected) => expected.len().saturating_sub(used.map_or(0, BitSet::len)),
        None => 0,
    }
}

/// Combine function for (smoothed) model counting.
///
/// Every variable a branch leaves out doubles its count.
pub fn model_count<N>(
    node: &NodeKind<'_, N>,
    pairs: Option<&[Pair<'_, BigUint>]>,
    expected_prime: Option<&BitSet>,
    expected_sub: Option<&BitSet>,
) -> BigUint {
    let Some(pairs) = pairs else {
        return match node {
            NodeKind::False => BigUint::ZERO,
            _ => BigUint::from(1u32),
        };
    };
    pairs
        .iter()
        .map(|pair| {
            let prime = &pair.prime << missing(expected_prime, pair.prime_vars);
            let sub = &pair.sub << missing(expected_sub, pair.sub_vars);
            prime * sub
        })
        .sum()
}

fn smoothing_factor(weights: &LiteralWeights, expected: Option<&BitSet>, used: Option<&BitSet>) -> f64 {
    let Some(expected) = expected else {
        return 1.0;
    };
    let factor = |v: usize| weights.var_weight(Var::new(v as u32));
    match used {
        Some(used) => expected.difference(used).iter().map(factor).product(),
        None => expected.iter().map(factor).product(),
    }
}

/// Combine function for (smoothed) weighted model counting.
///
/// Literals weigh what `weights` says (default `1.0`); a variable `v` a
/// branch leaves out contributes `w(v) + w(-v)`.
pub fn weighted_model_count<'w, N: 'w>(
    weights: &'w LiteralWeights,
) -> impl FnMut(&NodeKind<'_, N>, Option<&[Pair<'_, f64>]>, Option<&BitSet>, Option<&BitSet>) -> f64 + 'w {
    move |node, pairs, expected_prime, expected_sub| match pairs {
        None => match node {
            NodeKind::Literal(lit) => weights.get(*lit),
            NodeKind::True => 1.0,
            NodeKind::False | NodeKind::Decision(_) => 0.0,
        },
        Some(pairs) => pairs
            .iter()
            .map(|pair| {
                let prime = pair.prime * smoothing_factor(weights, expected_prime, pair.prime_vars);
                let sub = pair.sub * smoothing_factor(weights, expected_sub, pair.sub_vars);
                prime * sub
            })
            .sum(),
    }
}

fn log_smoothing_factor(weights: &LiteralWeights, expected: Option<&BitSet>, used: Option<&BitSet>) -> f64 {
    let Some(expected) = expected else {
        return 0.0;
    };
    let factor = |v: usize| weights.var_weight(Var::new(v as u32)).ln();
    match used {
        Some(used) => expected.difference(used).iter().map(factor).sum(),
        None => expected.iter().map(factor).sum(),
    }
}

/// Combine function for (smoothed) weighted model counting in log space.
///
/// Computes `ln` of what [`weighted_model_count`] computes without leaving
/// the log domain, so products of many small weights do not underflow. A
/// zero weight yields `-inf`.
pub fn log_weighted_model_count<'w, N: 'w>(
    weights: &'w LiteralWeights,
) -> impl FnMut(&NodeKind<'_, N>, Option<&[Pair<'_, f64>]>, Option<&BitSet>, Option<&BitSet>) -> f64 + 'w {
    move |node, pairs, expected_prime, expected_sub| match pairs {
        None => match node {
            NodeKind::Literal(lit) => weights.get(*lit).ln(),
            NodeKind::True => 0.0,
            NodeKind::False | NodeKind::Decision(_) => f64::NEG_INFINITY,
        },
        Some(pairs) => pairs.iter().fold(f64::NEG_INFINITY, |acc, pair| {
            let prime = pair.prime + log_smoothing_factor(weights, expected_prime, pair.prime_vars);
            let sub = pair.sub + log_smoothing_factor(weights, expected_sub, pair.sub_vars);
            log_sum_exp(acc, prime + sub)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::circuit::{Circuit, NodeId};
    use crate::types::Lit;
    use crate::vtree::Vtree;

    fn count(circuit: &Circuit, f: NodeId, smooth: bool, smooth_to_root: bool) -> u64 {
        let evaluator = SmoothedEvaluator::new(circuit, smooth, smooth_to_root);
        let mc = evaluator.depth_first(f, model_count).unwrap();
        u64::try_from(mc).unwrap()
    }

    fn brute_force(circuit: &Circuit, f: NodeId, weights: &LiteralWeights) -> f64 {
        let n = circuit.vtree().num_vars() as usize;
        let mut total = 0.0;
        for bits in 0u64..(1 << n) {
            let assignment: Vec<bool> = (0..n).map(|i| bits >> i & 1 == 1).collect();
            if circuit.evaluate(f, &assignment) {
                total += (1..=n)
                    .map(|v| {
                        let lit = if assignment[v - 1] { v as i32 } else { -(v as i32) };
                        weights.get(Lit::from(lit))
                    })
                    .product::<f64>();
            }
        }
        total
    }

    /// (a ∧ b) ∨ (c ∧ d) over the right-linear vtree (1 (2 (3 4))).
    fn two_cubes() -> (Circuit, NodeId) {
        let mut circuit = Circuit::new(Vtree::right_linear(&[1, 2, 3, 4]));
        let t = circuit.true_node();
        let f = circuit.false_node();
        let a = circuit.mk_literal(1);
        let na = circuit.mk_literal(-1);
        let b = circuit.mk_literal(2);
        let nb = circuit.mk_literal(-2);
        let c = circuit.mk_literal(3);
        let nc = circuit.mk_literal(-3);
        let d = circuit.mk_literal(4);
        let cd = circuit.mk_decision(VtreeId::new(5), vec![(c, d), (nc, f)]);
        let b_or_cd = circuit.mk_decision(VtreeId::new(3), vec![(b, t), (nb, cd)]);
        let root = circuit.mk_decision(VtreeId::new(1), vec![(a, b_or_cd), (na, cd)]);
        (circuit, root)
    }

    #[test]
    fn test_two_cubes() {
        let (circuit, f) = two_cubes();
        assert_eq!(count(&circuit, f, true, false), 7);
        assert_eq!(count(&circuit, f, false, false), 3);
        assert_eq!(count(&circuit, f, true, true), 7);
        assert_eq!(brute_force(&circuit, f, &LiteralWeights::new()), 7.0);
    }

    #[test]
    fn test_true_formula() {
        let circuit = Circuit::new(Vtree::right_linear(&[1, 2, 3, 4]));
        let t = circuit.true_node();
        assert_eq!(count(&circuit, t, true, false), 16);
        assert_eq!(count(&circuit, t, false, false), 1);
        assert_eq!(count(&circuit, circuit.false_node(), true, false), 0);
    }

    #[test]
    fn test_literal_formula() {
        let mut circuit = Circuit::new(Vtree::right_linear(&[1, 2, 3, 4]));
        let a = circuit.mk_literal(1);
        let na = circuit.mk_literal(-1);
        for f in [a, na] {
            assert_eq!(count(&circuit, f, true, false), 8);
            assert_eq!(count(&circuit, f, true, true), 8);
            assert_eq!(count(&circuit, f, false, false), 1);
        }
    }

    #[test]
    fn test_smooth_to_root() {
        let mut circuit = Circuit::new(Vtree::balanced(4));
        let t = circuit.true_node();
        let a = circuit.mk_literal(1);
        let na = circuit.mk_literal(-1);
        let b = circuit.mk_literal(2);
        let f = circuit.mk_decision(VtreeId::new(1), vec![(a, t), (na, b)]);

        assert_eq!(count(&circuit, f, false, false), 2);
        assert_eq!(count(&circuit, f, true, false), 3);
        assert_eq!(count(&circuit, f, true, true), 3 * 4);
        assert_eq!(count(&circuit, f, false, true), 2);
    }

    #[test]
    fn test_shared_node_with_different_scopes() {
        // f = (a ∧ (b ∧ c)) ∨ (¬a ∧ c): `c` is the sub of both the root
        // (expected {b, c}) and of `b ∧ c` (expected {c}).
        let mut circuit = Circuit::new(Vtree::right_linear(&[1, 2, 3]));
        let fls = circuit.false_node();
        let a = circuit.mk_literal(1);
        let na = circuit.mk_literal(-1);
        let b = circuit.mk_literal(2);
        let nb = circuit.mk_literal(-2);
        let c = circuit.mk_literal(3);
        let bc = circuit.mk_decision(VtreeId::new(3), vec![(b, c), (nb, fls)]);
        let f = circuit.mk_decision(VtreeId::new(1), vec![(a, bc), (na, c)]);

        assert_eq!(count(&circuit, f, true, false), 3);
        assert_eq!(brute_force(&circuit, f, &LiteralWeights::new()), 3.0);

        let evaluator = SmoothedEvaluator::new(&circuit, true, false);
        evaluator.depth_first(f, model_count).unwrap();
        assert_eq!(evaluator.last_stats().cache_hits, 1);
    }

    #[test]
    fn test_weighted_matches_brute_force() {
        let (circuit, f) = two_cubes();
        let weights = LiteralWeights::from_array(4, &[0.8, 0.7, 0.6, 0.5, 0.5, 0.4, 0.3, 0.2]).unwrap();

        let evaluator = SmoothedEvaluator::new(&circuit, true, false);
        let wmc = evaluator.depth_first(f, weighted_model_count(&weights)).unwrap();
        let expected = brute_force(&circuit, f, &weights);
        assert!((wmc - expected).abs() < 1e-12, "{} != {}", wmc, expected);
    }

    #[test]
    fn test_memoization_counts() {
        let (circuit, f) = two_cubes();

        let memo = SmoothedEvaluator::with_options(
            &circuit,
            SmoothOptions {
                smooth: false,
                ..SmoothOptions::default()
            },
        );
        let mut calls = 0;
        memo.depth_first(f, |n, p, e1, e2| {
            calls += 1;
            model_count(n, p, e1, e2)
        })
        .unwrap();
        assert_eq!(calls, circuit.size(f));
        assert_eq!(memo.last_stats().combine_calls, 12);
        assert_eq!(memo.last_stats().cache_hits, 1);

        let no_memo = SmoothedEvaluator::with_options(
            &circuit,
            SmoothOptions {
                smooth: false,
                memoize: false,
                ..SmoothOptions::default()
            },
        );
        let mc = no_memo.depth_first(f, model_count).unwrap();
        assert_eq!(mc, BigUint::from(3u32));
        assert_eq!(no_memo.last_stats().combine_calls, 17);
        assert_eq!(no_memo.last_stats().cache_hits, 0);
    }

    #[test]
    fn test_repeated_calls_are_independent() {
        let (circuit, f) = two_cubes();
        let evaluator = SmoothedEvaluator::new(&circuit, true, false);
        let first = evaluator.depth_first(f, model_count).unwrap();
        let stats = evaluator.last_stats();
        let second = evaluator.depth_first(f, model_count).unwrap();
        assert_eq!(first, second);
        assert_eq!(stats, evaluator.last_stats());
    }

    #[test]
    fn test_structurally_equal_nodes_are_distinct() {
        let mut circuit = Circuit::new(Vtree::balanced(2));
        let a1 = circuit.mk_literal(1);
        let a2 = circuit.mk_literal(1);
        let b = circuit.mk_literal(2);
        let f = circuit.mk_decision(VtreeId::new(1), vec![(a1, b), (a2, b)]);

        let evaluator = SmoothedEvaluator::new(&circuit, false, false);
        evaluator.depth_first(f, model_count).unwrap();
        // a1 and a2 are evaluated separately; b is shared.
        assert_eq!(evaluator.last_stats().combine_calls, 4);
        assert_eq!(evaluator.last_stats().cache_hits, 1);
    }

    #[test]
    fn test_eager_index() {
        let (circuit, f) = two_cubes();
        let index = ExpectedVariableIndex::build(circuit.vtree());
        let evaluator = SmoothedEvaluator::with_index(&circuit, SmoothOptions::default(), index);
        assert_eq!(evaluator.depth_first(f, model_count).unwrap(), BigUint::from(7u32));
    }

    #[test]
    fn test_log_weighted_matches_linear() {
        let (circuit, f) = two_cubes();
        let evaluator = SmoothedEvaluator::new(&circuit, true, false);
        let weights = LiteralWeights::from_array(4, &[0.8, 0.7, 0.6, 0.5, 0.5, 0.4, 0.3, 0.2]).unwrap();

        let wmc = evaluator.depth_first(f, weighted_model_count(&weights)).unwrap();
        let log_wmc = evaluator.depth_first(f, log_weighted_model_count(&weights)).unwrap();
        assert!((log_wmc - wmc.ln()).abs() < 1e-12, "{} != ln {}", log_wmc, wmc);

        // A zero weight on ¬x1 only removes some models.
        let weights = weights.with(-1, 0.0);
        let wmc = evaluator.depth_first(f, weighted_model_count(&weights)).unwrap();
        let log_wmc = evaluator.depth_first(f, log_weighted_model_count(&weights)).unwrap();
        assert!(wmc > 0.0);
        assert!((log_wmc - wmc.ln()).abs() < 1e-12, "{} != ln {}", log_wmc, wmc);

        // With x1 and x3 weightless no model is left.
        let weights = weights.with(1, 0.0).with(3, 0.0);
        let log_wmc = evaluator.depth_first(f, log_weighted_model_count(&weights)).unwrap();
        assert_eq!(log_wmc, f64::NEG_INFINITY);
    }

    #[test]
    fn test_log_weighted_bare_literal() {
        let mut circuit = Circuit::new(Vtree::right_linear(&[1, 2, 3, 4]));
        let a = circuit.mk_literal(1);
        let weights = LiteralWeights::from_array(4, &[0.8, 0.7, 0.6, 0.5, 0.5, 0.4, 0.3, 0.2]).unwrap();
        let evaluator = SmoothedEvaluator::new(&circuit, true, false);

        let wmc = evaluator.depth_first(a, weighted_model_count(&weights)).unwrap();
        let log_wmc = evaluator.depth_first(a, log_weighted_model_count(&weights)).unwrap();
        assert!((log_wmc - wmc.ln()).abs() < 1e-12, "{} != ln {}", log_wmc, wmc);

        let weights = weights.with(1, 0.0);
        let log_wmc = evaluator.depth_first(a, log_weighted_model_count(&weights)).unwrap();
        assert_eq!(log_wmc, f64::NEG_INFINITY);
    }
}
