//! Circuits: shared DAGs of decision nodes over literal and constant leaves.
//!
//! Evaluators never own circuits. They borrow a [`CircuitManager`], which is
//! the capability surface of whatever holds the nodes: probes for the node
//! kind, the ordered `(prime, sub)` elements of decision nodes, and the vtree
//! node each non-constant node is normalized for.
//!
//! [`Circuit`] is the arena-backed manager shipped with this crate. Nodes are
//! identified by [`NodeId`] handles and are **not** hash-consed: two
//! structurally equal nodes created separately are distinct vertices, and
//! evaluators memoize by handle, never by structure.
//!
//! # Example
//!
//! ```
//! use sdd_wmc::circuit::Circuit;
//! use sdd_wmc::vtree::{Vtree, VtreeId};
//!
//! // x1 ∨ x2 normalized for the root of (x1 x2)
//! let mut circuit = Circuit::new(Vtree::balanced(2));
//! let a = circuit.mk_literal(1);
//! let na = circuit.mk_literal(-1);
//! let b = circuit.mk_literal(2);
//! let t = circuit.true_node();
//! let f = circuit.mk_decision(VtreeId::new(1), vec![(a, t), (na, b)]);
//!
//! assert!(circuit.evaluate(f, &[false, true]));
//! assert!(!circuit.evaluate(f, &[false, false]));
//! assert_eq!(circuit.size(f), 5);
//! ```

use std::fmt;
use std::hash::Hash;

use crate::error::{Error, Result};
use crate::types::Lit;
use crate::vtree::{Vtree, VtreeId};

/// The closed set of node shapes an evaluator dispatches on.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NodeKind<'a, N> {
    /// Disjunction of `prime ∧ sub` elements.
    Decision(&'a [(N, N)]),
    Literal(Lit),
    True,
    False,
}

impl<N> NodeKind<'_, N> {
    pub fn is_leaf(&self) -> bool {
        !matches!(self, NodeKind::Decision(_))
    }
}

/// Capability surface of a circuit manager.
///
/// Implementors only answer the probes; [`CircuitManager::kind`] folds them
/// into a [`NodeKind`] once, at the boundary, and reports nodes that match no
/// known shape.
pub trait CircuitManager {
    /// Stable, identity-comparable node handle.
    type Node: Copy + Eq + Hash + fmt::Debug;

    fn vtree(&self) -> &Vtree;

    fn var_count(&self) -> u32 {
        self.vtree().num_vars()
    }

    fn true_node(&self) -> Self::Node;

    fn is_decision(&self, node: Self::Node) -> bool;
    fn is_literal(&self, node: Self::Node) -> bool;
    fn is_true(&self, node: Self::Node) -> bool;
    fn is_false(&self, node: Self::Node) -> bool;

    /// The literal of a literal node.
    fn literal(&self, node: Self::Node) -> Option<Lit>;

    /// The ordered `(prime, sub)` elements of a decision node.
    fn elements(&self, node: Self::Node) -> Option<&[(Self::Node, Self::Node)]>;

    /// The vtree node `node` is normalized for; `None` for constants.
    fn node_vtree(&self, node: Self::Node) -> Option<VtreeId>;

    /// Classifies `node` into the closed [`NodeKind`] union.
    fn kind(&self, node: Self::Node) -> Result<NodeKind<'_, Self::Node>> {
        if self.is_decision(node) {
            return self
                .elements(node)
                .map(NodeKind::Decision)
                .ok_or_else(|| Error::ExpectedDecisionNode(format!("{:?} has no elements", node)));
        }
        if self.is_true(node) {
            Ok(NodeKind::True)
        } else if self.is_false(node) {
            Ok(NodeKind::False)
        } else if self.is_literal(node) {
            self.literal(node)
                .map(NodeKind::Literal)
                .ok_or_else(|| Error::UnknownLeafKind(format!("{:?} is a literal without a literal value", node)))
        } else {
            Err(Error::UnknownLeafKind(format!("{:?}", node)))
        }
    }
}

/// Handle of a node in a [`Circuit`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub const FALSE: NodeId = NodeId(0);
    pub const TRUE: NodeId = NodeId(1);

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Debug, Clone)]
enum Node {
    False,
    True,
    Literal { lit: Lit, vtree: VtreeId },
    Decision { vtree: VtreeId, elements: Vec<(NodeId, NodeId)> },
}

/// Arena of circuit nodes over a fixed vtree.
#[derive(Debug, Clone)]
pub struct Circuit {
    vtree: Vtree,
    nodes: Vec<Node>,
}

impl Circuit {
    pub fn new(vtree: Vtree) -> Self {
        Self {
            vtree,
            // The constants always occupy the first two slots.
            nodes: vec![Node::False, Node::True],
        }
    }

    pub fn true_node(&self) -> NodeId {
        NodeId::TRUE
    }

    pub fn false_node(&self) -> NodeId {
        NodeId::FALSE
    }

    /// Number of allocated nodes, constants included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Allocates a fresh literal node, normalized for the variable's leaf.
    ///
    /// # Panics
    ///
    /// Panics if the variable does not occur in the vtree.
    pub fn mk_literal(&mut self, lit: impl Into<Lit>) -> NodeId {
        let lit = lit.into();
        let vtree = self
            .vtree
            .var_leaf(lit.var())
            .unwrap_or_else(|| panic!("Variable {} is not in the vtree", lit.var()));
        self.alloc(Node::Literal { lit, vtree })
    }

    /// Allocates a decision node normalized for the internal vtree node `vtree`.
    ///
    /// Elements are kept verbatim, in the given order. Primes must be
    /// normalized inside the left subtree and subs inside the right subtree.
    ///
    /// # Panics
    ///
    /// Panics if `vtree` is a leaf, `elements` is empty, or an element
    /// violates the normalization constraint.
    pub fn mk_decision(&mut self, vtree: VtreeId, elements: Vec<(NodeId, NodeId)>) -> NodeId {
        if let Some(violation) = self.decision_violation(vtree, &elements) {
            panic!("{}", violation);
        }
        self.alloc(Node::Decision { vtree, elements })
    }

    /// Describes why `elements` cannot form a decision node at `vtree`.
    pub(crate) fn decision_violation(&self, vtree: VtreeId, elements: &[(NodeId, NodeId)]) -> Option<String> {
        if vtree.index() >= self.vtree.num_nodes() {
            return Some(format!("Vtree node {} does not exist", vtree));
        }
        let (left, right) = match (self.vtree.left(vtree), self.vtree.right(vtree)) {
            (Some(left), Some(right)) => (left, right),
            _ => {
                return Some(format!(
                    "Decision nodes must be normalized for an internal vtree node, got {}",
                    vtree
                ))
            }
        };
        if elements.is_empty() {
            return Some("Decision node needs at least one element".to_string());
        }
        for &(prime, sub) in elements {
            if !self.respects(prime, left) {
                return Some(format!("Prime {} is not normalized under {}", prime, left));
            }
            if !self.respects(sub, right) {
                return Some(format!("Sub {} is not normalized under {}", sub, right));
            }
        }
        None
    }

    fn respects(&self, node: NodeId, scope: VtreeId) -> bool {
        assert!(node.index() < self.nodes.len(), "Unknown node {}", node);
        match self.node_vtree_of(node) {
            Some(v) => self.vtree.is_sub(v, scope),
            None => true,
        }
    }

    fn node_vtree_of(&self, node: NodeId) -> Option<VtreeId> {
        match &self.nodes[node.index()] {
            Node::Literal { vtree, .. } | Node::Decision { vtree, .. } => Some(*vtree),
            Node::False | Node::True => None,
        }
    }

    /// Nodes reachable from `root`, children before parents, each once.
    pub fn topological(&self, root: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![(root, false)];

        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                order.push(node);
                continue;
            }
            if visited[node.index()] {
                continue;
            }
            visited[node.index()] = true;
            stack.push((node, true));
            if let Node::Decision { elements, .. } = &self.nodes[node.index()] {
                for &(prime, sub) in elements.iter().rev() {
                    for child in [sub, prime] {
                        if !visited[child.index()] {
                            stack.push((child, false));
                        }
                    }
                }
            }
        }

        order
    }

    /// Number of distinct nodes reachable from `root`.
    pub fn size(&self, root: NodeId) -> usize {
        self.topological(root).len()
    }

    /// Evaluates the function of `root` under a total assignment, where
    /// `assignment[v - 1]` is the value of variable `v`.
    ///
    /// # Panics
    ///
    /// Panics if the assignment is shorter than the number of variables.
    pub fn evaluate(&self, root: NodeId, assignment: &[bool]) -> bool {
        assert!(
            assignment.len() >= self.vtree.num_vars() as usize,
            "Assignment covers {} of {} variables",
            assignment.len(),
            self.vtree.num_vars()
        );

        let mut value = vec![false; self.nodes.len()];
        for node in self.topological(root) {
            value[node.index()] = match &self.nodes[node.index()] {
                Node::False => false,
                Node::True => true,
                Node::Literal { lit, .. } => lit.agrees_with(assignment[lit.var().id() as usize - 1]),
                Node::Decision { elements, .. } => elements
                    .iter()
                    .any(|&(prime, sub)| value[prime.index()] && value[sub.index()]),
            };
        }
        value[root.index()]
    }
}

impl CircuitManager for Circuit {
    type Node = NodeId;

    fn vtree(&self) -> &Vtree {
        &self.vtree
    }

    fn true_node(&self) -> NodeId {
        NodeId::TRUE
    }

    fn is_decision(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.index()], Node::Decision { .. })
    }

    fn is_literal(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.index()], Node::Literal { .. })
    }

    fn is_true(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.index()], Node::True)
    }

    fn is_false(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.index()], Node::False)
    }

    fn literal(&self, node: NodeId) -> Option<Lit> {
        match self.nodes[node.index()] {
            Node::Literal { lit, .. } => Some(lit),
            _ => None,
        }
    }

    fn elements(&self, node: NodeId) -> Option<&[(NodeId, NodeId)]> {
        match &self.nodes[node.index()] {
            Node::Decision { elements, .. } => Some(elements),
            _ => None,
        }
    }

    fn node_vtree(&self, node: NodeId) -> Option<VtreeId> {
        self.node_vtree_of(node)
    }

    // A closed enum needs no probing.
    fn kind(&self, node: NodeId) -> Result<NodeKind<'_, NodeId>> {
        Ok(match &self.nodes[node.index()] {
            Node::False => NodeKind::False,
            Node::True => NodeKind::True,
            Node::Literal { lit, .. } => NodeKind::Literal(*lit),
            Node::Decision { elements, .. } => NodeKind::Decision(elements),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    /// A manager whose nodes answer no probe, to exercise boundary checks.
    struct Opaque {
        vtree: Vtree,
        decision_without_elements: bool,
    }

    impl CircuitManager for Opaque {
        type Node = u8;

        fn vtree(&self) -> &Vtree {
            &self.vtree
        }
        fn true_node(&self) -> u8 {
            1
        }
        fn is_decision(&self, _: u8) -> bool {
            self.decision_without_elements
        }
        fn is_literal(&self, _: u8) -> bool {
            false
        }
        fn is_true(&self, _: u8) -> bool {
            false
        }
        fn is_false(&self, _: u8) -> bool {
            false
        }
        fn literal(&self, _: u8) -> Option<Lit> {
            None
        }
        fn elements(&self, _: u8) -> Option<&[(u8, u8)]> {
            None
        }
        fn node_vtree(&self, _: u8) -> Option<VtreeId> {
            None
        }
    }

    #[test]
    fn test_probe_unknown_leaf() {
        let mgr = Opaque {
            vtree: Vtree::balanced(1),
            decision_without_elements: false,
        };
        assert!(matches!(mgr.kind(7), Err(Error::UnknownLeafKind(_))));
    }

    #[test]
    fn test_probe_decision_without_elements() {
        let mgr = Opaque {
            vtree: Vtree::balanced(1),
            decision_without_elements: true,
        };
        assert!(matches!(mgr.kind(7), Err(Error::ExpectedDecisionNode(_))));
    }

    #[test]
    fn test_kinds() {
        let mut circuit = Circuit::new(Vtree::balanced(2));
        let a = circuit.mk_literal(-2);
        assert_eq!(circuit.kind(a).unwrap(), NodeKind::Literal(Lit::from(-2)));
        assert_eq!(circuit.kind(NodeId::TRUE).unwrap(), NodeKind::True);
        assert_eq!(circuit.kind(NodeId::FALSE).unwrap(), NodeKind::False);
        assert_eq!(circuit.node_vtree(a), Some(VtreeId::new(2)));
        assert_eq!(circuit.node_vtree(NodeId::TRUE), None);
    }

    #[test]
    fn test_literals_are_not_shared() {
        let mut circuit = Circuit::new(Vtree::balanced(2));
        let a1 = circuit.mk_literal(1);
        let a2 = circuit.mk_literal(1);
        assert_ne!(a1, a2);
        assert_eq!(circuit.kind(a1).unwrap(), circuit.kind(a2).unwrap());
    }

    #[test]
    fn test_topological_shares_nodes() {
        // (x1 ∧ x2) ∨ (¬x1 ∧ x2), with x2 shared
        let mut circuit = Circuit::new(Vtree::balanced(2));
        let a = circuit.mk_literal(1);
        let na = circuit.mk_literal(-1);
        let b = circuit.mk_literal(2);
        let f = circuit.mk_decision(VtreeId::new(1), vec![(a, b), (na, b)]);

        let order = circuit.topological(f);
        assert_eq!(order.len(), 4);
        assert_eq!(*order.last().unwrap(), f);
        let pos = |n| order.iter().position(|&x| x == n).unwrap();
        assert!(pos(b) < pos(f));
        assert!(pos(a) < pos(f));

        assert!(circuit.evaluate(f, &[false, true]));
        assert!(!circuit.evaluate(f, &[true, false]));
    }

    #[test]
    #[should_panic(expected = "not normalized")]
    fn test_decision_rejects_misplaced_prime() {
        let mut circuit = Circuit::new(Vtree::balanced(2));
        let b = circuit.mk_literal(2);
        let t = circuit.true_node();
        circuit.mk_decision(VtreeId::new(1), vec![(b, t)]);
    }

    #[test]
    #[should_panic(expected = "internal vtree node")]
    fn test_decision_rejects_leaf_vtree() {
        let mut circuit = Circuit::new(Vtree::balanced(2));
        let t = circuit.true_node();
        circuit.mk_decision(VtreeId::new(0), vec![(t, t)]);
    }
}
