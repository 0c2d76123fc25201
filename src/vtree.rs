//! Vtrees: the partition trees that constrain SDD decompositions.
//!
//! A vtree over `n` variables is a full binary tree with `n` leaves and
//! `2n - 1` nodes. Every node is identified by its **position**, i.e. its
//! index in an in-order traversal, so positions are dense in `0..=2n-2`,
//! leaves sit at even positions, and the left subtree of a node has strictly
//! smaller positions than the node itself. This is the numbering used by
//! libsdd files, which lets [`VtreeId`] double as the position.
//!
//! # Example
//!
//! ```
//! use sdd_wmc::vtree::Vtree;
//!
//! // ((x1 x2) (x3 x4))
//! let vtree = Vtree::balanced(4);
//! assert_eq!(vtree.num_nodes(), 7);
//! assert_eq!(vtree.position(vtree.root()), 3);
//! ```

use std::fmt;

use crate::error::{Error, Result};
use crate::types::Var;

/// Handle of a vtree node; equal to its in-order position.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VtreeId(u32);

impl VtreeId {
    pub const fn new(position: u32) -> Self {
        Self(position)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VtreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VtreeNode {
    Leaf { var: Var },
    Internal { left: VtreeId, right: VtreeId },
}

#[derive(Debug, Clone)]
pub struct Vtree {
    /// Nodes indexed by position.
    nodes: Vec<VtreeNode>,
    parents: Vec<Option<VtreeId>>,
    root: VtreeId,
    num_vars: u32,
    /// Leaf of each variable, indexed by variable id (slot 0 unused).
    var_to_leaf: Vec<Option<VtreeId>>,
}

impl Vtree {
    /// Right-linear vtree `(v1 (v2 (... vn)))` over the given variable order.
    ///
    /// # Panics
    ///
    /// Panics if `order` is empty or is not a permutation of `1..=n`.
    pub fn right_linear(order: &[u32]) -> Self {
        let n = Self::check_order(order);
        let mut nodes = Vec::with_capacity(2 * n - 1);
        for (i, &var) in order.iter().enumerate() {
            nodes.push(VtreeNode::Leaf { var: Var::new(var) });
            if i + 1 < n {
                let pos = 2 * i + 1;
                let right = if i + 2 == n { pos + 1 } else { pos + 2 };
                nodes.push(VtreeNode::Internal {
                    left: VtreeId::new(pos as u32 - 1),
                    right: VtreeId::new(right as u32),
                });
            }
        }
        let root = if n == 1 { 0 } else { 1 };
        Self::assemble(nodes, VtreeId::new(root), n as u32)
    }

    /// Left-linear vtree `(((v1 v2) ...) vn)` over the given variable order.
    ///
    /// # Panics
    ///
    /// Panics if `order` is empty or is not a permutation of `1..=n`.
    pub fn left_linear(order: &[u32]) -> Self {
        let n = Self::check_order(order);
        let mut nodes = Vec::with_capacity(2 * n - 1);
        for (i, &var) in order.iter().enumerate() {
            nodes.push(VtreeNode::Leaf { var: Var::new(var) });
            if i + 1 < n {
                let pos = 2 * i + 1;
                let left = if i == 0 { 0 } else { pos - 2 };
                nodes.push(VtreeNode::Internal {
                    left: VtreeId::new(left as u32),
                    right: VtreeId::new(pos as u32 + 1),
                });
            }
        }
        let root = if n == 1 { 0 } else { 2 * n - 3 };
        Self::assemble(nodes, VtreeId::new(root as u32), n as u32)
    }

    /// Balanced vtree over variables `1..=num_vars` in natural order.
    pub fn balanced(num_vars: u32) -> Self {
        let order: Vec<u32> = (1..=num_vars).collect();
        Self::balanced_with_order(&order)
    }

    /// Balanced vtree over the given variable order; left halves get the
    /// smaller share when the count is odd.
    ///
    /// # Panics
    ///
    /// Panics if `order` is empty or is not a permutation of `1..=n`.
    pub fn balanced_with_order(order: &[u32]) -> Self {
        let n = Self::check_order(order);
        let mut slots: Vec<Option<VtreeNode>> = vec![None; 2 * n - 1];
        let root = Self::fill_balanced(order, 0, &mut slots);
        let nodes = slots.into_iter().flatten().collect();
        Self::assemble(nodes, root, n as u32)
    }

    /// Places the balanced subtree over `order` at positions starting from
    /// `offset`. Recursion depth is logarithmic in the number of variables.
    fn fill_balanced(order: &[u32], offset: usize, slots: &mut [Option<VtreeNode>]) -> VtreeId {
        if order.len() == 1 {
            slots[offset] = Some(VtreeNode::Leaf { var: Var::new(order[0]) });
            return VtreeId::new(offset as u32);
        }
        let (lo, hi) = order.split_at(order.len() / 2);
        let pos = offset + 2 * lo.len() - 1;
        let left = Self::fill_balanced(lo, offset, slots);
        let right = Self::fill_balanced(hi, pos + 1, slots);
        slots[pos] = Some(VtreeNode::Internal { left, right });
        VtreeId::new(pos as u32)
    }

    fn check_order(order: &[u32]) -> usize {
        let n = order.len();
        assert!(n > 0, "Vtree needs at least one variable");
        let mut seen = vec![false; n + 1];
        for &var in order {
            assert!(
                (1..=n as u32).contains(&var) && !seen[var as usize],
                "Variable order must be a permutation of 1..={}",
                n
            );
            seen[var as usize] = true;
        }
        n
    }

    /// Builds a vtree from nodes indexed by position, validating the shape.
    ///
    /// Used by the file loader; every child must be in range and have exactly
    /// one parent, and the leaves must carry each variable of `1..=n` once.
    pub fn from_parts(nodes: Vec<VtreeNode>, root: VtreeId) -> Result<Self> {
        if nodes.is_empty() || nodes.len() % 2 == 0 {
            return Err(Error::format(0, format!("a vtree has an odd number of nodes, got {}", nodes.len())));
        }
        let num_vars = nodes.len().div_ceil(2);
        if root.index() >= nodes.len() {
            return Err(Error::CorruptReference { line: 0, id: root.index() });
        }

        let mut has_parent = vec![false; nodes.len()];
        let mut seen_var = vec![false; num_vars + 1];
        for node in &nodes {
            match *node {
                VtreeNode::Leaf { var } => {
                    let v = var.id() as usize;
                    if v > num_vars || seen_var[v] {
                        return Err(Error::format(0, format!("variable {} is out of range or repeated", var)));
                    }
                    seen_var[v] = true;
                }
                VtreeNode::Internal { left, right } => {
                    for child in [left, right] {
                        let slot = has_parent
                            .get_mut(child.index())
                            .ok_or(Error::CorruptReference { line: 0, id: child.index() })?;
                        if *slot || child == root {
                            return Err(Error::format(0, format!("vtree node {} has more than one parent", child)));
                        }
                        *slot = true;
                    }
                }
            }
        }

        let num_leaves = seen_var.iter().filter(|&&seen| seen).count();
        if num_leaves != num_vars {
            return Err(Error::format(0, format!("expected {} vtree leaves, got {}", num_vars, num_leaves)));
        }

        Ok(Self::assemble(nodes, root, num_vars as u32))
    }

    fn assemble(nodes: Vec<VtreeNode>, root: VtreeId, num_vars: u32) -> Self {
        let mut parents = vec![None; nodes.len()];
        let mut var_to_leaf = vec![None; num_vars as usize + 1];
        for (pos, node) in nodes.iter().enumerate() {
            let id = VtreeId::new(pos as u32);
            match *node {
                VtreeNode::Leaf { var } => var_to_leaf[var.id() as usize] = Some(id),
                VtreeNode::Internal { left, right } => {
                    parents[left.index()] = Some(id);
                    parents[right.index()] = Some(id);
                }
            }
        }
        Self {
            nodes,
            parents,
            root,
            num_vars,
            var_to_leaf,
        }
    }
}

impl Vtree {
    pub fn root(&self) -> VtreeId {
        self.root
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: VtreeId) -> &VtreeNode {
        &self.nodes[id.index()]
    }

    pub fn position(&self, id: VtreeId) -> u32 {
        id.0
    }

    pub fn is_leaf(&self, id: VtreeId) -> bool {
        matches!(self.node(id), VtreeNode::Leaf { .. })
    }

    pub fn left(&self, id: VtreeId) -> Option<VtreeId> {
        match *self.node(id) {
            VtreeNode::Internal { left, .. } => Some(left),
            VtreeNode::Leaf { .. } => None,
        }
    }

    pub fn right(&self, id: VtreeId) -> Option<VtreeId> {
        match *self.node(id) {
            VtreeNode::Internal { right, .. } => Some(right),
            VtreeNode::Leaf { .. } => None,
        }
    }

    pub fn var(&self, id: VtreeId) -> Option<Var> {
        match *self.node(id) {
            VtreeNode::Leaf { var } => Some(var),
            VtreeNode::Internal { .. } => None,
        }
    }

    pub fn parent(&self, id: VtreeId) -> Option<VtreeId> {
        self.parents[id.index()]
    }

    /// Returns the leaf that holds `var`, if the variable is in the vtree.
    pub fn var_leaf(&self, var: Var) -> Option<VtreeId> {
        self.var_to_leaf.get(var.id() as usize).copied().flatten()
    }

    /// Returns true if `id` is `ancestor` or lies in its subtree.
    pub fn is_sub(&self, id: VtreeId, ancestor: VtreeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// All node ids in position order.
    pub fn ids(&self) -> impl Iterator<Item = VtreeId> + '_ {
        (0..self.nodes.len() as u32).map(VtreeId::new)
    }
}
