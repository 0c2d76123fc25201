//! Literal weights for weighted model counting.
//!
//! Weights are looked up by signed literal; a literal without an entry
//! weighs `1.0`, so an empty [`LiteralWeights`] turns every weighted count
//! into a plain model count.
//!
//! Files produced by some compilers carry default weights in a comment line:
//!
//! ```text
//! c weights PW_1 NW_1 PW_2 NW_2 ... PW_n NW_n
//! ```
//!
//! That line is for the caller to pick up ([`LiteralWeights::scan`]); the
//! flat-file evaluators never read it themselves.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::{Lit, Var};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiteralWeights {
    weights: HashMap<Lit, f64>,
}

impl LiteralWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, lit: impl Into<Lit>, weight: f64) {
        self.weights.insert(lit.into(), weight);
    }

    /// Builder-style [`set`][Self::set].
    pub fn with(mut self, lit: impl Into<Lit>, weight: f64) -> Self {
        self.set(lit, weight);
        self
    }

    /// Explicitly configured weight of `lit`, if any.
    pub fn lookup(&self, lit: Lit) -> Option<f64> {
        self.weights.get(&lit).copied()
    }

    /// Weight of `lit`, defaulting to `1.0`.
    pub fn get(&self, lit: Lit) -> f64 {
        self.lookup(lit).unwrap_or(1.0)
    }

    /// Combined weight of both polarities of `var`; the factor a variable
    /// contributes when a branch leaves it unconstrained.
    pub fn var_weight(&self, var: Var) -> f64 {
        self.get(var.pos()) + self.get(var.neg())
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weights from a flat array ordered `[-n, ..., -1, 1, ..., n]`.
    pub fn from_array(var_count: u32, weights: &[f64]) -> Result<Self> {
        let n = var_count as usize;
        if weights.len() != 2 * n {
            return Err(Error::format(
                0,
                format!("expected {} weights for {} variables, got {}", 2 * n, n, weights.len()),
            ));
        }
        let mut result = Self::new();
        for v in 1..=n {
            result.set(-(v as i32), weights[n - v]);
            result.set(v as i32, weights[n + v - 1]);
        }
        Ok(result)
    }

    /// Parses a `c weights PW_1 NW_1 ...` comment line.
    ///
    /// Returns `Ok(None)` for any other line.
    pub fn from_comment(line: &str) -> Result<Option<Self>> {
        let mut cols = line.split_whitespace();
        if cols.next() != Some("c") || cols.next() != Some("weights") {
            return Ok(None);
        }

        let values = cols
            .map(|col| {
                col.parse::<f64>()
                    .map_err(|_| Error::format(0, format!("invalid weight '{}'", col)))
            })
            .collect::<Result<Vec<_>>>()?;
        if values.len() % 2 != 0 {
            return Err(Error::format(0, "weights come in (positive, negative) pairs"));
        }

        let mut result = Self::new();
        for (i, pair) in values.chunks(2).enumerate() {
            let var = i as i32 + 1;
            result.set(var, pair[0]);
            result.set(-var, pair[1]);
        }
        Ok(Some(result))
    }

    /// Finds and parses the first `c weights` comment in a whole file.
    pub fn scan(content: &str) -> Result<Option<Self>> {
        for (ln, line) in content.lines().enumerate() {
            match Self::from_comment(line) {
                Ok(Some(weights)) => return Ok(Some(weights)),
                Ok(None) => {}
                Err(Error::Format { message, .. }) => return Err(Error::format(ln + 1, message)),
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }
}

impl<L: Into<Lit>> FromIterator<(L, f64)> for LiteralWeights {
    fn from_iter<I: IntoIterator<Item = (L, f64)>>(iter: I) -> Self {
        let mut result = Self::new();
        for (lit, weight) in iter {
            result.set(lit, weight);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_default_weight() {
        let weights = LiteralWeights::new().with(1, 0.25);
        assert_eq!(weights.get(Lit::from(1)), 0.25);
        assert_eq!(weights.get(Lit::from(-1)), 1.0);
        assert_eq!(weights.lookup(Lit::from(-1)), None);
        assert_eq!(weights.var_weight(Var::new(1)), 1.25);
    }

    #[test]
    fn test_from_array() {
        //                          -2   -1   1    2
        let weights = LiteralWeights::from_array(2, &[0.8, 0.7, 0.3, 0.2]).unwrap();
        assert_eq!(weights.get(Lit::from(-2)), 0.8);
        assert_eq!(weights.get(Lit::from(-1)), 0.7);
        assert_eq!(weights.get(Lit::from(1)), 0.3);
        assert_eq!(weights.get(Lit::from(2)), 0.2);
        assert!(LiteralWeights::from_array(2, &[0.5]).is_err());
    }

    #[test]
    fn test_from_comment() {
        let weights = LiteralWeights::from_comment("c weights 0.4 0.6 1 0").unwrap().unwrap();
        assert_eq!(weights.get(Lit::from(1)), 0.4);
        assert_eq!(weights.get(Lit::from(-1)), 0.6);
        assert_eq!(weights.get(Lit::from(2)), 1.0);
        assert_eq!(weights.get(Lit::from(-2)), 0.0);

        assert_eq!(LiteralWeights::from_comment("c just a comment").unwrap(), None);
        assert!(LiteralWeights::from_comment("c weights 0.4").is_err());
        assert!(LiteralWeights::from_comment("c weights 0.4 abc").is_err());
    }

    #[test]
    fn test_scan_reports_line() {
        let content = "c header\nc weights 0.5 x\nnnf 1 0 1\nL 1\n";
        match LiteralWeights::scan(content) {
            Err(Error::Format { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
        let content = "c header\nc weights 0.5 0.5\nnnf 1 0 1\nL 1\n";
        assert_eq!(LiteralWeights::scan(content).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_collect() {
        let weights: LiteralWeights = [(1, 0.5), (-1, 0.5)].into_iter().collect();
        assert_eq!(weights.len(), 2);
    }
}
