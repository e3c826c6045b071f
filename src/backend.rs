//! Backend-agnostic engine interface.
//!
//! Model-checking code written against [`DdBackend`] does not care whether
//! diagrams live in a [`Context`] or in another engine. Handles returned by
//! the constructing methods carry one reference that the caller gives back
//! with [`DdBackend::release`].

use crate::context::Context;
use crate::error::Result;
use crate::operator::Operator;
use crate::permute::Permutation;
use crate::reference::NodeId;
use crate::types::Var;
use crate::value::{Value, ValueType};

pub trait DdBackend {
    /// Diagram handle.
    type Handle: Copy + Eq + std::hash::Hash + std::fmt::Debug;
    /// Variable renaming, prepared once and reusable across calls.
    type Permutation;

    fn new_variable(&self) -> Result<Var>;
    fn var_node(&self, var: Var) -> Result<Self::Handle>;
    fn new_constant(&self, value: Value) -> Result<Self::Handle>;

    fn apply(&self, op: Operator, result_type: ValueType, operands: &[Self::Handle]) -> Result<Self::Handle>;

    fn cube(&self, vars: &[Var]) -> Result<Self::Handle>;
    fn abstract_sum(&self, f: Self::Handle, cube: Self::Handle) -> Result<Self::Handle>;
    fn abstract_product(&self, f: Self::Handle, cube: Self::Handle) -> Result<Self::Handle>;
    fn abstract_max(&self, f: Self::Handle, cube: Self::Handle) -> Result<Self::Handle>;
    fn abstract_min(&self, f: Self::Handle, cube: Self::Handle) -> Result<Self::Handle>;
    fn abstract_exist(&self, f: Self::Handle, cube: Self::Handle) -> Result<Self::Handle>;
    fn abstract_and_exist(&self, f: Self::Handle, g: Self::Handle, cube: Self::Handle) -> Result<Self::Handle>;

    fn new_permutation(&self, targets: &[Var]) -> Result<Self::Permutation>;
    fn permute(&self, f: Self::Handle, perm: &Self::Permutation) -> Result<Self::Handle>;

    fn is_leaf(&self, f: Self::Handle) -> bool;
    fn leaf_value(&self, f: Self::Handle) -> Option<Value>;
    fn variable_of(&self, f: Self::Handle) -> Option<Var>;
    fn low(&self, f: Self::Handle) -> Option<Self::Handle>;
    fn high(&self, f: Self::Handle) -> Option<Self::Handle>;

    fn retain(&self, f: Self::Handle) -> Result<()>;
    fn release(&self, f: Self::Handle) -> Result<()>;
    fn check_consistent(&self) -> Result<()>;
}

impl DdBackend for Context {
    type Handle = NodeId;
    type Permutation = Permutation;

    fn new_variable(&self) -> Result<Var> {
        Context::new_variable(self)
    }

    fn var_node(&self, var: Var) -> Result<NodeId> {
        Context::var_node(self, var)
    }

    fn new_constant(&self, value: Value) -> Result<NodeId> {
        Context::new_constant(self, value)
    }

    fn apply(&self, op: Operator, result_type: ValueType, operands: &[NodeId]) -> Result<NodeId> {
        Context::apply(self, op, result_type, operands)
    }

    fn cube(&self, vars: &[Var]) -> Result<NodeId> {
        Context::cube(self, vars)
    }

    fn abstract_sum(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        Context::abstract_sum(self, f, cube)
    }

    fn abstract_product(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        Context::abstract_product(self, f, cube)
    }

    fn abstract_max(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        Context::abstract_max(self, f, cube)
    }

    fn abstract_min(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        Context::abstract_min(self, f, cube)
    }

    fn abstract_exist(&self, f: NodeId, cube: NodeId) -> Result<NodeId> {
        Context::abstract_exist(self, f, cube)
    }

    fn abstract_and_exist(&self, f: NodeId, g: NodeId, cube: NodeId) -> Result<NodeId> {
        Context::abstract_and_exist(self, f, g, cube)
    }

    fn new_permutation(&self, targets: &[Var]) -> Result<Permutation> {
        Permutation::new(targets.to_vec())
    }

    fn permute(&self, f: NodeId, perm: &Permutation) -> Result<NodeId> {
        Context::permute(self, f, perm)
    }

    fn is_leaf(&self, f: NodeId) -> bool {
        Context::is_leaf(self, f)
    }

    fn leaf_value(&self, f: NodeId) -> Option<Value> {
        Context::leaf_value(self, f)
    }

    fn variable_of(&self, f: NodeId) -> Option<Var> {
        Context::variable_of(self, f)
    }

    fn low(&self, f: NodeId) -> Option<NodeId> {
        Context::low(self, f)
    }

    fn high(&self, f: NodeId) -> Option<NodeId> {
        Context::high(self, f)
    }

    fn retain(&self, f: NodeId) -> Result<()> {
        Context::retain(self, f)
    }

    fn release(&self, f: NodeId) -> Result<()> {
        Context::release(self, f)
    }

    fn check_consistent(&self) -> Result<()> {
        Context::check_consistent(self)
    }
}
