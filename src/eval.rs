use std::collections::{BTreeSet, HashSet};

use crate::context::Context;
use crate::error::{DdError, Result};
use crate::node::Node;
use crate::reference::NodeId;
use crate::registry::ExpressionToType;
use crate::types::Var;
use crate::value::{Value, ValueType};

impl Context {
    /// Value of `f` under `assignment`, where `assignment[i]` is the value of
    /// variable `i`.
    pub fn evaluate(&self, f: NodeId, assignment: &[bool]) -> Result<Value> {
        self.check_handle(f)?;
        let mut current = f;
        loop {
            match self.node(current) {
                Node::Leaf(code) => return Ok(self.leaves.borrow().value_of(code).clone()),
                Node::Inner { var, low, high } => {
                    let bit = assignment.get(var.index()).copied().ok_or_else(|| {
                        DdError::Misuse(format!(
                            "assignment of {} variables does not cover {}",
                            assignment.len(),
                            var
                        ))
                    })?;
                    current = if bit { high } else { low };
                }
            }
        }
    }

    /// Variables `f` depends on, in order.
    pub fn support(&self, f: NodeId) -> Vec<Var> {
        let mut vars = BTreeSet::new();
        self.visit(f, |node| {
            if let Node::Inner { var, .. } = node {
                vars.insert(var);
            }
        });
        vars.into_iter().collect()
    }

    /// Number of distinct nodes reachable from `f`, leaves included.
    pub fn size(&self, f: NodeId) -> usize {
        let mut count = 0;
        self.visit(f, |_| count += 1);
        count
    }

    /// Distinct leaf values of `f`, in depth-first (low before high) order.
    pub fn leaves(&self, f: NodeId) -> Vec<Value> {
        let mut codes = Vec::new();
        self.visit(f, |node| {
            if let Node::Leaf(code) = node {
                codes.push(code);
            }
        });
        let table = self.leaves.borrow();
        codes.into_iter().map(|code| table.value_of(code).clone()).collect()
    }

    /// Calls `visitor` once per node reachable from `f`, parents first.
    /// Nothing is reachable from an id that is not a node of this context.
    fn visit(&self, f: NodeId, mut visitor: impl FnMut(Node)) {
        let mut seen = HashSet::new();
        let mut stack = vec![f];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let Some(node) = self.try_node(id) else {
                continue;
            };
            visitor(node);
            if let Some((low, high)) = node.children() {
                stack.push(high);
                stack.push(low);
            }
        }
    }
}

impl ExpressionToType<NodeId> for Context {
    /// Least upper bound of the leaf types of a diagram.
    fn type_of(&self, f: &NodeId) -> Option<ValueType> {
        if !self.table.borrow().contains(*f) {
            return None;
        }
        let mut types = self.leaves(*f).into_iter().map(|v| v.value_type());
        let first = types.next()?;
        types.try_fold(first, |acc, ty| acc.join(ty))
    }
}
