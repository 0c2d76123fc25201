//! Single-pass evaluators over serialized circuits.
//!
//! These work directly on the text of an `.nnf`, `.sdd` or `.psdd` file, with
//! no circuit object in between. Records are topological (children precede
//! parents), so one pass filling a table indexed by node id suffices; the
//! value of the last record is the result.
//!
//! | Format | Records | Combination |
//! |--------|---------|-------------|
//! | NNF  | `L lit`, `A c ids...`, `O j c ids...` | product for `A`, sum for `O` |
//! | SDD  | `L id vtree lit`, `T id`, `F id`, `D id vtree k (p s)*` | sum of `p * s` |
//! | PSDD | `L id vtree lit`, `T id vtree var logθ`, `D id vtree k (p s logθ)*` | log-sum-exp of `p + s + logθ` |
//!
//! NNF node ids are implicit: the `i`-th record (comments excluded) is node
//! `i`. The NNF and SDD evaluators are not smoothed: a variable missing from a
//! branch contributes nothing to that branch.
//!
//! A `c weights ...` comment line is ignored here; callers that want those
//! defaults pick them up with [`LiteralWeights::scan`].
//!
//! # Example
//!
//! ```
//! use sdd_wmc::flat::nnf_wmc;
//! use sdd_wmc::weights::LiteralWeights;
//!
//! // x1 ∨ (¬x1 ∧ x2)
//! let nnf = "nnf 5 4 2\nL 1\nL -1\nL 2\nA 2 1 2\nO 1 2 0 3\n";
//! let weights = LiteralWeights::from_array(2, &[0.5, 0.5, 0.5, 0.5]).unwrap();
//! assert_eq!(nnf_wmc(nnf, &weights).unwrap(), 0.75);
//! ```

use std::collections::HashMap;
use std::f64::consts::LN_2;
use std::fs;
use std::path::Path;

use log::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::io::{field, header, record_len, records};
use crate::types::Lit;
use crate::weights::LiteralWeights;

/// Numerically stable `ln(e^a + e^b)`.
///
/// Combining a finite value with `-inf` returns the finite value unchanged,
/// and two `-inf`s give `-inf` rather than NaN.
pub fn log_sum_exp(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if lo == f64::NEG_INFINITY || hi == f64::INFINITY {
        return hi;
    }
    if lo == hi {
        return hi + LN_2;
    }
    hi + (lo - hi).exp().ln_1p()
}

/// Values of the records seen so far, indexed by node id.
///
/// The table grows as records arrive; ids at or above the declared count are
/// corrupt references.
struct Table {
    values: Vec<Option<f64>>,
    declared: usize,
    filled: usize,
}

impl Table {
    fn new(declared: usize) -> Self {
        Self {
            values: Vec::new(),
            declared,
            filled: 0,
        }
    }

    fn get(&self, line: usize, id: usize) -> Result<f64> {
        self.values
            .get(id)
            .copied()
            .flatten()
            .ok_or(Error::CorruptReference { line, id })
    }

    fn set(&mut self, line: usize, id: usize, value: f64) -> Result<()> {
        if id >= self.declared {
            return Err(Error::CorruptReference { line, id });
        }
        if id >= self.values.len() {
            self.values.resize(id + 1, None);
        }
        if self.values[id].replace(value).is_none() {
            self.filled += 1;
        }
        Ok(())
    }
}

/// Drives one pass over `content`: checks the header, then feeds every record
/// to `eval`, which returns the node id and value it defines.
fn evaluate<F>(content: &str, token: &str, mut eval: F) -> Result<f64>
where
    F: FnMut(usize, usize, &[&str], &Table) -> Result<(usize, f64)>,
{
    let mut records = records(content);
    let size = header(&mut records, token)?;
    let mut table = Table::new(size);
    let mut last = None;

    for (index, (line, cols)) in records.enumerate() {
        let (id, value) = eval(line, index, &cols, &table)?;
        trace!("{} line {}: node {} = {}", token, line, id, value);
        table.set(line, id, value)?;
        last = Some(value);
    }

    if table.filled != size {
        warn!("{} header declares {} nodes, {} were defined", token, size, table.filled);
    }
    let result = last.ok_or_else(|| Error::format(0, format!("{} file has no records", token)))?;
    debug!("{} evaluation over {} nodes: {}", token, table.filled, result);
    Ok(result)
}

fn literal(cols: &[&str], index: usize, line: usize) -> Result<Lit> {
    let lit: i32 = field(cols, index, line, "literal")?;
    if lit == 0 {
        return Err(Error::format(line, "literal 0 is not allowed"));
    }
    Ok(Lit::from_dimacs(lit))
}

/// Checks that a record holds exactly `expected` columns.
fn arity(cols: &[&str], expected: usize, line: usize) -> Result<()> {
    if cols.len() != expected {
        return Err(Error::format(
            line,
            format!("'{}' record needs {} fields, got {}", cols[0], expected, cols.len()),
        ));
    }
    Ok(())
}

/// Non-smoothed weighted model count of an NNF (`nnf V E N`) circuit.
pub fn nnf_wmc(content: &str, weights: &LiteralWeights) -> Result<f64> {
    evaluate(content, "nnf", |line, id, cols, table| {
        let value = match cols[0] {
            "L" => weights.get(literal(cols, 1, line)?),
            "A" => {
                let count: usize = field(cols, 1, line, "child count")?;
                arity(cols, record_len(count, 1, 2, line)?, line)?;
                let mut product = 1.0;
                for i in 0..count {
                    product *= table.get(line, field(cols, 2 + i, line, "child id")?)?;
                }
                product
            }
            "O" => {
                // The decision variable in column 1 plays no role in counting.
                let count: usize = field(cols, 2, line, "child count")?;
                arity(cols, record_len(count, 1, 3, line)?, line)?;
                let mut sum = 0.0;
                for i in 0..count {
                    sum += table.get(line, field(cols, 3 + i, line, "child id")?)?;
                }
                sum
            }
            other => return Err(Error::format(line, format!("unknown nnf record '{}'", other))),
        };
        Ok((id, value))
    })
}

/// Non-smoothed weighted model count of an SDD (`sdd N`) circuit.
pub fn sdd_wmc(content: &str, weights: &LiteralWeights) -> Result<f64> {
    evaluate(content, "sdd", |line, _, cols, table| {
        let id: usize = field(cols, 1, line, "node id")?;
        let value = match cols[0] {
            "F" => 0.0,
            "T" => 1.0,
            "L" => weights.get(literal(cols, 3, line)?),
            "D" => {
                let count: usize = field(cols, 3, line, "element count")?;
                arity(cols, record_len(count, 2, 4, line)?, line)?;
                let mut sum = 0.0;
                for i in 0..count {
                    let prime = table.get(line, field(cols, 4 + 2 * i, line, "prime id")?)?;
                    let sub = table.get(line, field(cols, 5 + 2 * i, line, "sub id")?)?;
                    sum += prime * sub;
                }
                sum
            }
            other => return Err(Error::format(line, format!("unknown sdd record '{}'", other))),
        };
        Ok((id, value))
    })
}

/// Log-probability of the evidence under a PSDD (`psdd N`).
///
/// `observations` maps variable ids to observed values; unobserved variables
/// are summed out. With no evidence the result is `0.0` for a normalized PSDD.
pub fn psdd_log_wmc(content: &str, observations: &HashMap<u32, bool>) -> Result<f64> {
    evaluate(content, "psdd", |line, _, cols, table| {
        let id: usize = field(cols, 1, line, "node id")?;
        let value = match cols[0] {
            "L" => {
                let lit = literal(cols, 3, line)?;
                match observations.get(&lit.var().id()) {
                    Some(&observed) if !lit.agrees_with(observed) => f64::NEG_INFINITY,
                    _ => 0.0,
                }
            }
            "T" => {
                arity(cols, 5, line)?;
                let lit = literal(cols, 3, line)?;
                let theta: f64 = field(cols, 4, line, "log-probability")?;
                match observations.get(&lit.var().id()) {
                    None => 0.0,
                    Some(&observed) if lit.agrees_with(observed) => theta,
                    Some(_) => (-theta.exp()).ln_1p(),
                }
            }
            "D" => {
                let count: usize = field(cols, 3, line, "element count")?;
                arity(cols, record_len(count, 3, 4, line)?, line)?;
                let mut acc = f64::NEG_INFINITY;
                for i in 0..count {
                    let prime = table.get(line, field(cols, 4 + 3 * i, line, "prime id")?)?;
                    let sub = table.get(line, field(cols, 5 + 3 * i, line, "sub id")?)?;
                    let theta: f64 = field(cols, 6 + 3 * i, line, "log-probability")?;
                    acc = log_sum_exp(acc, prime + sub + theta);
                }
                acc
            }
            "F" => return Err(Error::format(line, "psdd files cannot contain false nodes")),
            other => return Err(Error::format(line, format!("unknown psdd record '{}'", other))),
        };
        Ok((id, value))
    })
}

pub fn nnf_wmc_file<P: AsRef<Path>>(path: P, weights: &LiteralWeights) -> Result<f64> {
    nnf_wmc(&fs::read_to_string(path)?, weights)
}

pub fn sdd_wmc_file<P: AsRef<Path>>(path: P, weights: &LiteralWeights) -> Result<f64> {
    sdd_wmc(&fs::read_to_string(path)?, weights)
}

pub fn psdd_log_wmc_file<P: AsRef<Path>>(path: P, observations: &HashMap<u32, bool>) -> Result<f64> {
    psdd_log_wmc(&fs::read_to_string(path)?, observations)
}
