use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::context::Context;
use crate::error::{DdError, Result};
use crate::node::Node;
use crate::reference::NodeId;
use crate::types::Var;

/// A bijective renaming of variables `0..n`.
///
/// Immutable once built; clones share the same mapping.
#[derive(Clone, PartialEq, Eq)]
pub struct Permutation {
    map: Arc<[Var]>,
}

impl Permutation {
    /// Builds the permutation sending variable `i` to `targets[i]`.
    ///
    /// # Errors
    ///
    /// [`DdError::InvalidPermutation`] if `targets` is not a bijection on
    /// `0..targets.len()`.
    pub fn new(targets: impl Into<Vec<Var>>) -> Result<Self> {
        let targets = targets.into();
        let n = targets.len();
        let mut seen = vec![false; n];
        for (i, &t) in targets.iter().enumerate() {
            if t.index() >= n {
                return Err(DdError::InvalidPermutation(format!(
                    "{} maps to {}, out of range for {} variables",
                    Var::new(i as u32),
                    t,
                    n
                )));
            }
            if std::mem::replace(&mut seen[t.index()], true) {
                return Err(DdError::InvalidPermutation(format!("{} is the image of two variables", t)));
            }
        }
        Ok(Self { map: targets.into() })
    }

    pub fn identity(n: usize) -> Self {
        Self {
            map: (0..n as u32).map(Var::new).collect(),
        }
    }

    /// Permutation of `n` variables exchanging each pair in `pairs`.
    pub fn swaps(n: usize, pairs: &[(Var, Var)]) -> Result<Self> {
        let mut targets: Vec<Var> = (0..n as u32).map(Var::new).collect();
        for &(a, b) in pairs {
            if a.index() >= n || b.index() >= n {
                return Err(DdError::InvalidPermutation(format!(
                    "swap ({}, {}) out of range for {} variables",
                    a, b, n
                )));
            }
            targets.swap(a.index(), b.index());
        }
        Self::new(targets)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Image of `var`.
    pub fn get(&self, var: Var) -> Var {
        self.map[var.index()]
    }

    pub fn inverse(&self) -> Self {
        let mut inv = vec![Var::new(0); self.map.len()];
        for (i, &t) in self.map.iter().enumerate() {
            inv[t.index()] = Var::new(i as u32);
        }
        Self { map: inv.into() }
    }
}

impl fmt::Debug for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.map.iter().enumerate().map(|(i, t)| format!("x{}->{}", i, t)))
            .finish()
    }
}

impl Context {
    /// Renames the variables of `f` by `perm`.
    ///
    /// # Errors
    ///
    /// [`DdError::PermutationSize`] if `perm` is not sized for the current
    /// number of variables; nothing is built in that case.
    pub fn permute(&self, f: NodeId, perm: &Permutation) -> Result<NodeId> {
        debug!("permute({}, {:?})", f, perm);
        let expected = self.num_vars();
        if perm.len() != expected {
            return Err(DdError::PermutationSize {
                expected,
                actual: perm.len(),
            });
        }
        self.maybe_collect();
        self.check_operand(f)?;
        let mut cache = HashMap::new();
        let res = self.permute_rec(f, perm, &mut cache)?;
        Ok(self.handout(res))
    }

    fn permute_rec(&self, f: NodeId, perm: &Permutation, cache: &mut HashMap<NodeId, NodeId>) -> Result<NodeId> {
        let (var, low, high) = match self.node(f) {
            Node::Leaf(_) => return Ok(f),
            Node::Inner { var, low, high } => (var, low, high),
        };
        if let Some(&res) = cache.get(&f) {
            return Ok(res);
        }
        let low = self.permute_rec(low, perm, cache)?;
        let high = self.permute_rec(high, perm, cache)?;
        let target = self.projection(perm.get(var))?;
        let res = self.ite_rec(target, high, low)?;
        cache.insert(f, res);
        Ok(res)
    }
}
