//! Type-safe wrapper for decision-diagram variables.
//!
//! Variables are dense, 0-indexed and assigned in creation order, so the
//! index of a variable is also its position in the (fixed) variable order.
//! Leaves carry the reserved [`Var::LEAF`] sentinel, which compares greater
//! than every real variable; this lets the apply recursion pick the topmost
//! variable with a plain `min`.
use std::fmt;

/// A variable identifier (0-indexed).
///
/// # Invariants
///
/// - `Var::LEAF` (`u32::MAX`) is reserved for leaf nodes
/// - Along every root-to-leaf path variable indices strictly increase
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Var(u32);

impl Var {
    /// Sentinel "variable" of leaf nodes.
    pub const LEAF: Var = Var(u32::MAX);

    /// Creates a new variable with the given index.
    ///
    /// # Panics
    ///
    /// Panics if `index` collides with the leaf sentinel.
    pub fn new(index: u32) -> Self {
        assert_ne!(index, u32::MAX, "Variable index is reserved for leaves");
        Var(index)
    }

    /// Returns the raw variable index.
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Returns the variable index as a `usize` for array access.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true for the leaf sentinel.
    pub const fn is_leaf(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_leaf() {
            write!(f, "leaf")
        } else {
            write!(f, "x{}", self.0)
        }
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

impl From<u32> for Var {
    fn from(index: u32) -> Self {
        Var::new(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v0 = Var::new(0);
        let v1 = Var::new(1);
        assert_eq!(v0.id(), 0);
        assert_eq!(v1.index(), 1);
        assert!(v0 < v1);
    }

    #[test]
    fn test_leaf_is_below_every_variable() {
        assert!(Var::new(u32::MAX - 1) < Var::LEAF);
        assert!(Var::LEAF.is_leaf());
        assert!(!Var::new(3).is_leaf());
    }

    #[test]
    #[should_panic(expected = "reserved for leaves")]
    fn test_var_sentinel_panics() {
        Var::new(u32::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(Var::new(7).to_string(), "x7");
        assert_eq!(Var::LEAF.to_string(), "leaf");
    }
}
