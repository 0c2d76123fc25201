//! Reading vtrees and SDDs in the libsdd text formats.
//!
//! # Vtree File Format (.vtree)
//!
//! ```text
//! vtree <node_count>
//! L <id> <var>           # leaf node with variable
//! I <id> <left> <right>  # internal node with children
//! ```
//!
//! # SDD File Format (.sdd)
//!
//! ```text
//! sdd <node_count>
//! F <id>                                     # false node
//! T <id>                                     # true node
//! L <id> <vtree_id> <literal>                # literal node
//! D <id> <vtree_id> <size> {<prime> <sub>}*  # decision node
//! ```
//!
//! In both formats nodes appear bottom-up (children before parents), lines
//! starting with `c` are comments, and the last record is the root. Vtree ids
//! are in-order positions.
//!
//! Loaded decision nodes keep their elements verbatim: no normalization,
//! compression or hash-consing is applied, so evaluators see exactly the
//! structure stored in the file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::circuit::{Circuit, CircuitManager, NodeId};
use crate::error::{Error, Result};
use crate::types::{Lit, Var};
use crate::vtree::{Vtree, VtreeId, VtreeNode};

/// Non-comment lines with their 1-based line numbers.
pub(crate) fn records(content: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    content
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, cols)| !cols.is_empty() && cols[0] != "c")
}

pub(crate) fn field<T: std::str::FromStr>(cols: &[&str], index: usize, line: usize, what: &str) -> Result<T> {
    let col = cols
        .get(index)
        .ok_or_else(|| Error::format(line, format!("missing {}", what)))?;
    col.parse()
        .map_err(|_| Error::format(line, format!("invalid {} '{}'", what, col)))
}

/// Parses the `<token> <count> ...` header line.
pub(crate) fn header<'a>(records: &mut impl Iterator<Item = (usize, Vec<&'a str>)>, token: &str) -> Result<usize> {
    let (line, cols) = records
        .next()
        .ok_or_else(|| Error::format(0, format!("missing '{}' header", token)))?;
    if cols.len() < 2 || cols[0] != token {
        return Err(Error::format(line, format!("expected '{} <count>' header, got '{}'", token, cols.join(" "))));
    }
    field(&cols, 1, line, "node count")
}

/// Number of columns of a record with `offset` fixed fields followed by
/// `count` groups of `width` ids.
pub(crate) fn record_len(count: usize, width: usize, offset: usize, line: usize) -> Result<usize> {
    count
        .checked_mul(width)
        .and_then(|n| n.checked_add(offset))
        .ok_or_else(|| Error::format(line, format!("child count {} is out of range", count)))
}

// ─── Vtree I/O ───

impl Vtree {
    /// Reads a vtree from a file in libsdd format.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_vtree_string(&content)
    }

    /// Parses a vtree from libsdd format string.
    pub fn from_vtree_string(content: &str) -> Result<Self> {
        let mut records = records(content);
        let node_count = header(&mut records, "vtree")?;
        let records: Vec<_> = records.collect();
        if node_count > records.len() {
            return Err(Error::format(
                0,
                format!("vtree header declares {} nodes, file has {} records", node_count, records.len()),
            ));
        }

        let mut nodes: Vec<Option<VtreeNode>> = vec![None; node_count];
        let mut root = None;

        for (line, cols) in records {
            let pos: usize = field(&cols, 1, line, "vtree id")?;
            if pos >= node_count {
                return Err(Error::CorruptReference { line, id: pos });
            }
            let node = match cols[0] {
                "L" => {
                    let var: u32 = field(&cols, 2, line, "variable")?;
                    if var == 0 {
                        return Err(Error::format(line, "variable ids start at 1"));
                    }
                    VtreeNode::Leaf { var: Var::new(var) }
                }
                "I" => {
                    let child = |index: usize, what: &str| -> Result<VtreeId> {
                        let target: usize = field(&cols, index, line, what)?;
                        match nodes.get(target) {
                            Some(Some(_)) => Ok(VtreeId::new(target as u32)),
                            _ => Err(Error::CorruptReference { line, id: target }),
                        }
                    };
                    let left = child(2, "left child")?;
                    let right = child(3, "right child")?;
                    VtreeNode::Internal { left, right }
                }
                other => return Err(Error::format(line, format!("unknown vtree node type '{}'", other))),
            };
            if nodes[pos].replace(node).is_some() {
                return Err(Error::format(line, format!("vtree node {} is defined twice", pos)));
            }
            root = Some(VtreeId::new(pos as u32));
        }

        let root = root.ok_or_else(|| Error::format(0, "vtree has no nodes"))?;
        let nodes = nodes
            .into_iter()
            .enumerate()
            .map(|(pos, node)| node.ok_or(Error::CorruptReference { line: 0, id: pos }))
            .collect::<Result<Vec<_>>>()?;

        let vtree = Vtree::from_parts(nodes, root)?;
        debug!("loaded vtree with {} nodes over {} variables", vtree.num_nodes(), vtree.num_vars());
        Ok(vtree)
    }
}

// ─── SDD I/O ───

impl Circuit {
    /// Loads an SDD over `vtree` from a file in libsdd format.
    pub fn load_sdd<P: AsRef<Path>>(vtree: Vtree, path: P) -> Result<(Self, NodeId)> {
        let content = fs::read_to_string(path)?;
        Self::sdd_from_string(vtree, &content)
    }

    /// Parses an SDD over `vtree` from libsdd format string.
    ///
    /// Returns the new circuit and the node of the last record.
    pub fn sdd_from_string(vtree: Vtree, content: &str) -> Result<(Self, NodeId)> {
        let mut records = records(content);
        let node_count = header(&mut records, "sdd")?;

        let mut circuit = Circuit::new(vtree);
        let mut id_to_node: HashMap<usize, NodeId> = HashMap::new();
        let mut root = None;

        for (line, cols) in records {
            let id: usize = field(&cols, 1, line, "node id")?;
            let node = match cols[0] {
                "F" => circuit.false_node(),
                "T" => circuit.true_node(),
                "L" => {
                    let position: u32 = field(&cols, 2, line, "vtree id")?;
                    let lit: i32 = field(&cols, 3, line, "literal")?;
                    if lit == 0 {
                        return Err(Error::format(line, "literal 0 is not allowed"));
                    }
                    let lit = Lit::from_dimacs(lit);
                    match circuit.vtree().var_leaf(lit.var()) {
                        Some(leaf) if leaf == VtreeId::new(position) => {}
                        Some(leaf) => {
                            return Err(Error::format(
                                line,
                                format!("literal {} belongs to vtree node {}, not {}", lit, leaf, position),
                            ))
                        }
                        None => return Err(Error::format(line, format!("variable {} is not in the vtree", lit.var()))),
                    }
                    circuit.mk_literal(lit)
                }
                "D" => {
                    let position: u32 = field(&cols, 2, line, "vtree id")?;
                    let size: usize = field(&cols, 3, line, "element count")?;
                    if cols.len() != record_len(size, 2, 4, line)? {
                        return Err(Error::format(
                            line,
                            format!("expected {} element ids, got {}", 2 * size, cols.len().saturating_sub(4)),
                        ));
                    }
                    let mut elements = Vec::with_capacity(size);
                    for i in 0..size {
                        let child = |index: usize, what: &str| -> Result<NodeId> {
                            let target: usize = field(&cols, index, line, what)?;
                            id_to_node
                                .get(&target)
                                .copied()
                                .ok_or(Error::CorruptReference { line, id: target })
                        };
                        let prime = child(4 + 2 * i, "prime id")?;
                        let sub = child(5 + 2 * i, "sub id")?;
                        elements.push((prime, sub));
                    }
                    let vtree = VtreeId::new(position);
                    if let Some(violation) = circuit.decision_violation(vtree, &elements) {
                        return Err(Error::format(line, violation));
                    }
                    circuit.mk_decision(vtree, elements)
                }
                other => return Err(Error::format(line, format!("unknown sdd node type '{}'", other))),
            };
            id_to_node.insert(id, node);
            root = Some(node);
        }

        if id_to_node.len() != node_count {
            warn!("sdd header announces {} nodes, found {}", node_count, id_to_node.len());
        }
        let root = root.ok_or_else(|| Error::format(0, "sdd has no nodes"))?;
        debug!("loaded sdd with {} nodes, root {}", id_to_node.len(), root);
        Ok((circuit, root))
    }
}
