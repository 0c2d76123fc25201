//! # sdd-wmc: Weighted Model Counting over Decision Circuits
//!
//! **`sdd-wmc`** evaluates Boolean and probabilistic circuits (SDDs, NNFs, PSDDs) to compute
//! model counts, weighted model counts and log-probabilities of evidence.
//!
//! ## What is being counted?
//!
//! A circuit is a shared DAG: **decision** nodes are disjunctions of `prime ∧ sub` elements,
//! leaves are literals or constants. Each decision node is normalized for a node of a
//! [`Vtree`][crate::vtree::Vtree], which fixes the variables its branches may mention.
//!
//! A branch that does not mention a variable of its scope still admits both values of it.
//! Counting models *correctly* therefore needs **smoothing**: multiplying every branch by the
//! contribution of the variables it skips. The [`smooth`] module does that on the fly,
//! without rewriting the circuit.
//!
//! ## Key Features
//!
//! - **Generic Smoothed Evaluation**: [`SmoothedEvaluator`][crate::smooth::SmoothedEvaluator] folds any user-supplied combine function over a circuit, handing it the expected and used variable sets of every element.
//! - **Stochastic Estimation**: [`StochasticEvaluator`][crate::stochastic::StochasticEvaluator] estimates weighted counts by sampling the circuit as a stochastic-computing network.
//! - **Flat-File Evaluation**: [`flat`] evaluates `.nnf`, `.sdd` and `.psdd` text in one pass, without building a graph.
//! - **Manager-Agnostic**: evaluators talk to circuits only through the [`CircuitManager`][crate::circuit::CircuitManager] trait.
//! - **1-Based Indexing**: Variables are 1-indexed, matching DIMACS and libsdd files.
//!
//! ## Basic Usage
//!
//! ```rust
//! use num_bigint::BigUint;
//! use sdd_wmc::circuit::Circuit;
//! use sdd_wmc::smooth::{model_count, SmoothedEvaluator};
//! use sdd_wmc::vtree::{Vtree, VtreeId};
//!
//! // 1. A vtree over 2 variables: (x1 x2)
//! let mut circuit = Circuit::new(Vtree::balanced(2));
//!
//! // 2. The function x1, as a decision node at the root: (x1 ∧ ⊤) ∨ (¬x1 ∧ ⊥)
//! let x1 = circuit.mk_literal(1);
//! let not_x1 = circuit.mk_literal(-1);
//! let (t, f) = (circuit.true_node(), circuit.false_node());
//! let root = circuit.mk_decision(VtreeId::new(1), vec![(x1, t), (not_x1, f)]);
//!
//! // 3. Count: x2 is free, so x1 has two models over {x1, x2}
//! let smoothed = SmoothedEvaluator::new(&circuit, true, false);
//! assert_eq!(smoothed.depth_first(root, model_count).unwrap(), BigUint::from(2u32));
//!
//! // 4. Without smoothing the skipped variable is not accounted for
//! let raw = SmoothedEvaluator::new(&circuit, false, false);
//! assert_eq!(raw.depth_first(root, model_count).unwrap(), BigUint::from(1u32));
//! ```
//!
//! ## Core Components
//!
//! - **[`smooth`]**: The smoothing-aware depth-first evaluator and the stock model counters.
//! - **[`stochastic`]**: Sampling-based weighted model counting.
//! - **[`flat`]**: Topological evaluators over serialized circuits.
//! - **[`io`]**: Loading libsdd `.vtree` and `.sdd` files.

pub mod bitset;
pub mod circuit;
pub mod error;
pub mod expected;
pub mod flat;
pub mod io;
pub mod smooth;
pub mod stochastic;
pub mod types;
pub mod vtree;
pub mod weights;
