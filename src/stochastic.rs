//! Stochastic-computing estimation of weighted model counts.
//!
//! The circuit is read as a network of gates over Bernoulli bits: each
//! literal emits `1` with probability equal to its weight, every element
//! `prime ∧ sub` is an AND gate, and every decision node is a multiplexer
//! that forwards exactly one of its elements. The multiplexer picks an
//! element with probability proportional to that element's *scaling* (the
//! number of terms it would contribute with all weights set to one), so the
//! output bit is `1` with probability `WMC / scaling(root)`.
//!
//! Running `bitlength` independent trials and rescaling the fraction of ones
//! gives an unbiased estimate of the non-smoothed WMC whose standard error
//! shrinks as `O(1/sqrt(bitlength))`.
//!
//! No smoothing correction is applied; use
//! [`SmoothedEvaluator`][crate::smooth::SmoothedEvaluator] when variables
//! skipped by a branch must be accounted for.

use std::collections::HashMap;

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::circuit::{CircuitManager, NodeKind};
use crate::error::{Error, Result};
use crate::smooth::{weighted_model_count, SmoothedEvaluator};
use crate::weights::LiteralWeights;

/// Branch-selection data of one node.
#[derive(Debug, Clone, PartialEq)]
pub struct Scaling {
    /// Sum over elements of `scaling(prime) * scaling(sub)`; `1` for leaves.
    pub value: f64,
    /// Running sums of element scalings divided by `value`, one per element.
    pub cumulative: Vec<f64>,
}

/// Sampling-based estimator of the weighted model count below `root`.
pub struct StochasticEvaluator<'m, M: CircuitManager, R: Rng = ChaCha8Rng> {
    mgr: &'m M,
    root: M::Node,
    weights: LiteralWeights,
    rng: R,
    scalings: HashMap<M::Node, Scaling>,
}

impl<'m, M: CircuitManager> StochasticEvaluator<'m, M, ChaCha8Rng> {
    /// Creates an evaluator seeded from the thread-local RNG.
    pub fn new(mgr: &'m M, root: M::Node, weights: LiteralWeights) -> Self {
        Self::with_rng(mgr, root, weights, ChaCha8Rng::from_rng(&mut rand::rng()))
    }

    /// Creates an evaluator with a reproducible random stream.
    pub fn seeded(mgr: &'m M, root: M::Node, weights: LiteralWeights, seed: u64) -> Self {
        Self::with_rng(mgr, root, weights, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<'m, M: CircuitManager, R: Rng> StochasticEvaluator<'m, M, R> {
    pub fn with_rng(mgr: &'m M, root: M::Node, weights: LiteralWeights, rng: R) -> Self {
        Self {
            mgr,
            root,
            weights,
            rng,
            scalings: HashMap::new(),
        }
    }

    pub fn weights(&self) -> &LiteralWeights {
        &self.weights
    }

    /// Scaling of `node`, once [`compute_scalings`][Self::compute_scalings] ran.
    pub fn scaling(&self, node: M::Node) -> Option<&Scaling> {
        self.scalings.get(&node)
    }

    /// Computes the scaling of every node reachable from the root, bottom-up,
    /// visiting each shared node once.
    pub fn compute_scalings(&mut self) -> Result<()> {
        let mgr = self.mgr;
        let mut scalings: HashMap<M::Node, Scaling> = HashMap::new();
        let mut stack = vec![(self.root, false)];

        while let Some((node, expanded)) = stack.pop() {
            if !expanded && scalings.contains_key(&node) {
                continue;
            }
            match mgr.kind(node)? {
                NodeKind::Decision(elements) if !expanded => {
                    stack.push((node, true));
                    for &(prime, sub) in elements {
                        for child in [prime, sub] {
                            if !scalings.contains_key(&child) {
                                stack.push((child, false));
                            }
                        }
                    }
                }
                NodeKind::Decision(elements) => {
                    let mut terms = Vec::with_capacity(elements.len());
                    for &(prime, sub) in elements {
                        let scale = |n: M::Node| {
                            scalings
                                .get(&n)
                                .map(|s| s.value)
                                .ok_or_else(|| Error::ExpectedDecisionNode(format!("{:?} has no scaling", n)))
                        };
                        terms.push(scale(prime)? * scale(sub)?);
                    }
                    let value: f64 = terms.iter().sum();
                    let cumulative = terms
                        .iter()
                        .scan(0.0, |acc, &t| {
                            *acc += t;
                            Some(*acc / value)
                        })
                        .collect();
                    scalings.insert(node, Scaling { value, cumulative });
                }
                _ => {
                    scalings.insert(
                        node,
                        Scaling {
                            value: 1.0,
                            cumulative: Vec::new(),
                        },
                    );
                }
            }
        }

        debug!("computed scalings for {} nodes", scalings.len());
        self.scalings = scalings;
        Ok(())
    }

    /// Estimates the weighted model count from `bitlength` sampled trials.
    ///
    /// # Panics
    ///
    /// Panics if `bitlength == 0`.
    pub fn propagate(&mut self, bitlength: usize) -> Result<f64> {
        assert!(bitlength > 0, "Stochastic propagation needs at least one trial");
        if !self.scalings.contains_key(&self.root) {
            self.compute_scalings()?;
        }

        let mut cache = HashMap::new();
        let mut ones = 0usize;
        for _ in 0..bitlength {
            cache.clear();
            if self.sample(&mut cache)? {
                ones += 1;
            }
        }

        let root_scaling = self.scalings.get(&self.root).map_or(1.0, |s| s.value);
        let estimate = ones as f64 / bitlength as f64 * root_scaling;
        debug!(
            "propagate({}): {} ones, scaling {}, estimate {}",
            bitlength, ones, root_scaling, estimate
        );
        Ok(estimate)
    }

    /// The exact non-smoothed weighted model count, as estimated by
    /// [`propagate`][Self::propagate].
    pub fn propagate_exact(&self) -> Result<f64> {
        let evaluator = SmoothedEvaluator::new(self.mgr, false, false);
        evaluator.depth_first(self.root, weighted_model_count(&self.weights))
    }

    /// Samples one output bit. Shared nodes are drawn once per trial and the
    /// same bit is reused by every reference within it.
    fn sample(&mut self, cache: &mut HashMap<M::Node, bool>) -> Result<bool> {
        enum Frame<N> {
            Enter(N),
            Exit(N),
        }

        let mgr = self.mgr;
        let mut values: Vec<bool> = Vec::new();
        let mut stack = vec![Frame::Enter(self.root)];

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(node) => {
                    if let Some(&bit) = cache.get(&node) {
                        values.push(bit);
                        continue;
                    }
                    let bit = match mgr.kind(node)? {
                        NodeKind::True => true,
                        NodeKind::False => false,
                        NodeKind::Literal(lit) => {
                            let weight = self.weights.get(lit);
                            if !(0.0..=1.0).contains(&weight) {
                                return Err(Error::InvalidWeight {
                                    literal: lit.to_dimacs(),
                                    weight,
                                });
                            }
                            self.rng.random::<f64>() < weight
                        }
                        NodeKind::Decision([]) => {
                            return Err(Error::ExpectedDecisionNode(format!("{:?} has no elements", node)));
                        }
                        NodeKind::Decision(elements) => {
                            let draw: f64 = self.rng.random();
                            let cumulative = self
                                .scalings
                                .get(&node)
                                .map(|s| s.cumulative.as_slice())
                                .ok_or_else(|| Error::ExpectedDecisionNode(format!("{:?} has no scaling", node)))?;
                            let choice = cumulative
                                .iter()
                                .position(|&cw| cw > draw)
                                .unwrap_or(elements.len() - 1);
                            let (prime, sub) = elements[choice];
                            stack.push(Frame::Exit(node));
                            stack.push(Frame::Enter(sub));
                            stack.push(Frame::Enter(prime));
                            continue;
                        }
                    };
                    cache.insert(node, bit);
                    values.push(bit);
                }
                Frame::Exit(node) => {
                    let sub = values.pop();
                    let prime = values.pop();
                    let bit = matches!((prime, sub), (Some(true), Some(true)));
                    cache.insert(node, bit);
                    values.push(bit);
                }
            }
        }

        values
            .pop()
            .ok_or_else(|| Error::ExpectedDecisionNode(format!("{:?} produced no sample", self.root)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use crate::circuit::{Circuit, NodeId};
    use crate::types::{Lit, Var};
    use crate::vtree::{Vtree, VtreeId};

    /// (a ∧ b) ∨ (c ∧ d) over the right-linear vtree (1 (2 (3 4))).
    fn two_cubes() -> (Circuit, NodeId, NodeId) {
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
        (circuit, root, b_or_cd)
    }

    /// `x ∧ x` as a single-element decision; unlike a [`Circuit`], this
    /// manager reaches the same literal twice within one element.
    struct Repeated {
        vtree: Vtree,
        elements: [(u8, u8); 1],
    }

    impl Repeated {
        const TRUE: u8 = 0;
        const X: u8 = 1;
        const ROOT: u8 = 2;

        fn new() -> Self {
            Self {
                vtree: Vtree::right_linear(&[1, 2]),
                elements: [(Self::X, Self::X)],
            }
        }
    }

    impl CircuitManager for Repeated {
        type Node = u8;

        fn vtree(&self) -> &Vtree {
            &self.vtree
        }

        fn true_node(&self) -> u8 {
            Self::TRUE
        }

        fn is_decision(&self, node: u8) -> bool {
            node == Self::ROOT
        }

        fn is_literal(&self, node: u8) -> bool {
            node == Self::X
        }

        fn is_true(&self, node: u8) -> bool {
            node == Self::TRUE
        }

        fn is_false(&self, _node: u8) -> bool {
            false
        }

        fn literal(&self, node: u8) -> Option<Lit> {
            (node == Self::X).then(|| Lit::from(1))
        }

        fn elements(&self, node: u8) -> Option<&[(u8, u8)]> {
            (node == Self::ROOT).then_some(&self.elements[..])
        }

        fn node_vtree(&self, node: u8) -> Option<VtreeId> {
            if node == Self::X {
                self.vtree.var_leaf(Var::new(1))
            } else if node == Self::ROOT {
                Some(self.vtree.root())
            } else {
                None
            }
        }
    }

    fn weights() -> LiteralWeights {
        LiteralWeights::from_array(4, &[0.8, 0.7, 0.6, 0.5, 0.5, 0.4, 0.3, 0.2]).unwrap()
    }

    #[test]
    fn test_scalings() {
        let (circuit, root, b_or_cd) = two_cubes();
        let mut evaluator = StochasticEvaluator::seeded(&circuit, root, weights(), 0);
        evaluator.compute_scalings().unwrap();

        let s = evaluator.scaling(root).unwrap();
        assert_eq!(s.value, 5.0);
        assert_eq!(s.cumulative, vec![0.6, 1.0]);

        let s = evaluator.scaling(b_or_cd).unwrap();
        assert_eq!(s.value, 3.0);
        assert_eq!(s.cumulative.len(), 2);
        assert!((s.cumulative[0] - 1.0 / 3.0).abs() < 1e-12);

        assert_eq!(evaluator.scaling(circuit.true_node()).unwrap().value, 1.0);
    }

    #[test]
    fn test_exact() {
        let (circuit, root, _) = two_cubes();
        let evaluator = StochasticEvaluator::seeded(&circuit, root, weights(), 0);
        let exact = evaluator.propagate_exact().unwrap();
        assert!((exact - 0.248).abs() < 1e-12, "{}", exact);
    }

    #[test]
    fn test_estimate_close_to_exact() {
        let (circuit, root, _) = two_cubes();
        let mut evaluator = StochasticEvaluator::seeded(&circuit, root, weights(), 42);
        let exact = evaluator.propagate_exact().unwrap();
        let estimate = evaluator.propagate(20_000).unwrap();
        assert!((estimate - exact).abs() < 0.05, "estimate {} vs exact {}", estimate, exact);
    }

    #[test]
    fn test_error_decreases_with_bitlength() {
        let (circuit, root, _) = two_cubes();
        let mean_error = |bitlength: usize| {
            let runs = 30;
            let mut total = 0.0;
            for seed in 0..runs {
                let mut evaluator = StochasticEvaluator::seeded(&circuit, root, weights(), seed);
                let exact = evaluator.propagate_exact().unwrap();
                total += (evaluator.propagate(bitlength).unwrap() - exact).abs();
            }
            total / runs as f64
        };
        let coarse = mean_error(10);
        let fine = mean_error(1000);
        assert!(fine < coarse, "MAE(1000) = {} >= MAE(10) = {}", fine, coarse);
    }

    #[test]
    fn test_shared_node_drawn_once_per_trial() {
        let mgr = Repeated::new();
        let weights = LiteralWeights::new().with(1, 0.5);
        let mut evaluator = StochasticEvaluator::seeded(&mgr, Repeated::ROOT, weights, 3);
        let estimate = evaluator.propagate(20_000).unwrap();
        assert_eq!(evaluator.scaling(Repeated::ROOT).unwrap().value, 1.0);
        // Both references see the same bit: P(x ∧ x) = 0.5, not 0.25.
        assert!((estimate - 0.5).abs() < 0.05, "{}", estimate);
    }

    #[test]
    fn test_same_seed_same_estimate() {
        let (circuit, root, _) = two_cubes();
        let mut e1 = StochasticEvaluator::seeded(&circuit, root, weights(), 7);
        let mut e2 = StochasticEvaluator::seeded(&circuit, root, weights(), 7);
        assert_eq!(e1.propagate(500).unwrap(), e2.propagate(500).unwrap());
    }

    #[test]
    fn test_constants() {
        let (circuit, _, _) = two_cubes();
        let mut evaluator = StochasticEvaluator::seeded(&circuit, circuit.true_node(), weights(), 1);
        assert_eq!(evaluator.propagate(10).unwrap(), 1.0);
        let mut evaluator = StochasticEvaluator::seeded(&circuit, circuit.false_node(), weights(), 1);
        assert_eq!(evaluator.propagate(10).unwrap(), 0.0);
    }

    #[test]
    fn test_weight_above_one_is_rejected() {
        let mut circuit = Circuit::new(Vtree::balanced(2));
        let a = circuit.mk_literal(1);
        let weights = LiteralWeights::new().with(1, 1.5);
        let mut evaluator = StochasticEvaluator::seeded(&circuit, a, weights, 0);
        match evaluator.propagate(10) {
            Err(Error::InvalidWeight { literal, weight }) => {
                assert_eq!(literal, 1);
                assert_eq!(weight, 1.5);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    #[should_panic(expected = "at least one trial")]
    fn test_zero_bitlength_panics() {
        let (circuit, root, _) = two_cubes();
        let mut evaluator = StochasticEvaluator::seeded(&circuit, root, weights(), 0);
        let _ = evaluator.propagate(0);
    }
}
