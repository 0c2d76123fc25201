//! Type-safe wrappers for circuit variables and literals.
//!
//! Variables are 1-indexed (0 is reserved), literals are signed variable ids
//! in DIMACS convention, so both map directly onto the numbers that appear in
//! NNF, SDD and PSDD files.

use std::fmt;
use std::ops::Neg;

/// A variable identifier (1-indexed).
///
/// # Invariants
///
/// - Variable IDs must be >= 1 (0 is reserved)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Creates a new variable with the given ID.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`. Variables must be 1-indexed.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable IDs must be >= 1");
        Var(id)
    }

    /// Returns the raw variable ID as a `u32`.
    pub fn id(self) -> u32 {
        self.0
    }

    /// Returns the positive literal of this variable.
    pub fn pos(self) -> Lit {
        Lit(self.0 as i32)
    }

    /// Returns the negative literal of this variable.
    pub fn neg(self) -> Lit {
        Lit(-(self.0 as i32))
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A signed literal: `+v` for the variable `v`, `-v` for its negation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit(i32);

impl Lit {
    /// Creates a literal from its DIMACS encoding.
    ///
    /// # Panics
    ///
    /// Panics if `lit == 0`.
    pub fn from_dimacs(lit: i32) -> Self {
        assert_ne!(lit, 0, "Literal 0 is not a valid DIMACS literal");
        Lit(lit)
    }

    /// Returns the DIMACS encoding of this literal.
    pub fn to_dimacs(self) -> i32 {
        self.0
    }

    pub fn var(self) -> Var {
        Var(self.0.unsigned_abs())
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns `true` if this literal is satisfied when its variable takes `value`.
    pub fn agrees_with(self, value: bool) -> bool {
        self.is_positive() == value
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Lit(-self.0)
    }
}

impl From<i32> for Lit {
    fn from(lit: i32) -> Self {
        Lit::from_dimacs(lit)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "~x{}", self.0.unsigned_abs())
        } else {
            write!(f, "x{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.id(), 2);
        assert!(v1 < v2);
    }

    #[test]
    #[should_panic(expected = "Variable IDs must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_lit_polarity() {
        let pos = Lit::from_dimacs(3);
        let neg = -pos;
        assert!(pos.is_positive());
        assert!(neg.is_negative());
        assert_eq!(pos.var(), neg.var());
        assert_eq!(neg.to_dimacs(), -3);
        assert_eq!(Var::new(3).neg(), neg);
    }

    #[test]
    fn test_lit_agrees_with() {
        let pos = Lit::from(2);
        assert!(pos.agrees_with(true));
        assert!(!pos.agrees_with(false));
        assert!((-pos).agrees_with(false));
    }

    #[test]
    fn test_lit_display() {
        assert_eq!(Lit::from(4).to_string(), "x4");
        assert_eq!(Lit::from(-4).to_string(), "~x4");
    }
}
