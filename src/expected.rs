//! Variables expected below each vtree node.
//!
//! Smoothing needs, for every vtree node, the set of variables in its
//! subtree: a branch normalized for a vtree node is expected to mention all of
//! them, and every variable it skips must be accounted for separately.

use std::ops::Index;

use log::debug;

use crate::bitset::BitSet;
use crate::vtree::{Vtree, VtreeId, VtreeNode};

/// Maps each vtree position to the set of variables in its subtree.
///
/// Leaves map to their singleton, internal nodes to the union of their
/// children. Built once per vtree and immutable afterwards.
#[derive(Debug, Clone)]
pub struct ExpectedVariableIndex {
    vars: Vec<BitSet>,
    root: VtreeId,
}

impl ExpectedVariableIndex {
    /// Computes the variable sets of all vtree nodes.
    ///
    /// Uses an explicit stack and a visited flag per position, so deep
    /// (e.g. linear) vtrees do not exhaust the native stack.
    pub fn build(vtree: &Vtree) -> Self {
        let num_nodes = vtree.num_nodes();
        let mut vars = vec![BitSet::empty(); num_nodes];
        let mut visited = BitSet::new(num_nodes);
        let mut stack = vec![vtree.root()];

        while let Some(id) = stack.pop() {
            match *vtree.node(id) {
                VtreeNode::Leaf { var } => {
                    vars[id.index()].insert(var.id() as usize);
                    visited.insert(id.index());
                }
                VtreeNode::Internal { left, right } => {
                    if visited.insert(id.index()) {
                        // First visit: resolve both children before the union.
                        stack.push(id);
                        stack.push(right);
                        stack.push(left);
                    } else {
                        let mut union = vars[left.index()].clone();
                        union.union_with(&vars[right.index()]);
                        vars[id.index()] = union;
                    }
                }
            }
        }

        debug!("expected variable index: {} vtree nodes, {} variables", num_nodes, vtree.num_vars());
        Self {
            vars,
            root: vtree.root(),
        }
    }

    /// The variables in the subtree of `id`.
    pub fn vars(&self, id: VtreeId) -> &BitSet {
        &self.vars[id.index()]
    }

    /// All variables of the vtree.
    pub fn root_vars(&self) -> &BitSet {
        self.vars(self.root)
    }

    pub fn root(&self) -> VtreeId {
        self.root
    }
}

impl Index<VtreeId> for ExpectedVariableIndex {
    type Output = BitSet;

    fn index(&self, id: VtreeId) -> &BitSet {
        self.vars(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    fn set(vars: &[usize]) -> BitSet {
        vars.iter().copied().collect()
    }

    #[test]
    fn test_balanced() {
        let vtree = Vtree::balanced(4);
        let index = ExpectedVariableIndex::build(&vtree);
        assert_eq!(index[VtreeId::new(0)], set(&[1]));
        assert_eq!(index[VtreeId::new(1)], set(&[1, 2]));
        assert_eq!(index[VtreeId::new(5)], set(&[3, 4]));
        assert_eq!(*index.root_vars(), set(&[1, 2, 3, 4]));
    }

    #[test]
    fn test_right_linear() {
        let vtree = Vtree::right_linear(&[2, 1, 4, 3]);
        let index = ExpectedVariableIndex::build(&vtree);
        assert_eq!(index[VtreeId::new(1)], set(&[1, 2, 3, 4]));
        assert_eq!(index[VtreeId::new(3)], set(&[1, 3, 4]));
        assert_eq!(index[VtreeId::new(5)], set(&[3, 4]));
        assert_eq!(index[VtreeId::new(6)], set(&[3]));
    }

    #[test]
    fn test_single_variable() {
        let vtree = Vtree::balanced(1);
        let index = ExpectedVariableIndex::build(&vtree);
        assert_eq!(*index.root_vars(), set(&[1]));
    }

    #[test]
    fn test_deep_vtree() {
        let order: Vec<u32> = (1..=10_000).collect();
        let vtree = Vtree::left_linear(&order);
        let index = ExpectedVariableIndex::build(&vtree);
        assert_eq!(index.root_vars().len(), 10_000);
        assert_eq!(index[VtreeId::new(1)].len(), 2);
    }

    #[test]
    fn test_internal_is_union_of_children() {
        let vtree = Vtree::balanced(7);
        let index = ExpectedVariableIndex::build(&vtree);
        for id in vtree.ids() {
            if let (Some(l), Some(r)) = (vtree.left(id), vtree.right(id)) {
                let mut union = index[l].clone();
                union.union_with(&index[r]);
                assert_eq!(index[id], union);
                assert_eq!(index[id].len(), index[l].len() + index[r].len());
            }
        }
    }
}
