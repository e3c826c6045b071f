//! Debug utilities for inspecting diagrams and the context state.
//!
//! Primarily useful in tests and during development.

use std::collections::HashSet;
use std::fmt;

use crate::context::Context;
use crate::reference::NodeId;
use crate::types::Var;
use crate::value::Value;

/// Detailed information about a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: NodeId,
    /// Variable at this node (None for leaves)
    pub variable: Option<Var>,
    pub low: Option<NodeId>,
    pub high: Option<NodeId>,
    /// Leaf value (None for inner nodes)
    pub value: Option<Value>,
    pub ref_count: u32,
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.value, self.variable, self.low, self.high) {
            (Some(value), ..) => write!(f, "{}(leaf={}, rc={})", self.id, value, self.ref_count),
            (None, Some(var), Some(low), Some(high)) => write!(
                f,
                "{}(var={}, low={}, high={}, rc={})",
                self.id, var, low, high, self.ref_count
            ),
            _ => write!(f, "{}(?)", self.id),
        }
    }
}

/// All nodes reachable from a root, inner nodes by variable then leaves.
#[derive(Debug, Clone)]
pub struct DiagramTree {
    pub root: NodeId,
    pub nodes: Vec<NodeInfo>,
}

impl fmt::Display for DiagramTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagram {} (size={}):", self.root, self.nodes.len())?;
        for node in &self.nodes {
            writeln!(f, "  {}", node)?;
        }
        Ok(())
    }
}

impl Context {
    pub fn node_info(&self, id: NodeId) -> NodeInfo {
        NodeInfo {
            id,
            variable: self.variable_of(id),
            low: self.low(id),
            high: self.high(id),
            value: self.leaf_value(id),
            ref_count: self.ref_count(id),
        }
    }

    pub fn debug_tree(&self, root: NodeId) -> DiagramTree {
        let mut nodes = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![root];

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let info = self.node_info(id);
            if let (Some(low), Some(high)) = (info.low, info.high) {
                stack.push(low);
                stack.push(high);
            }
            nodes.push(info);
        }

        nodes.sort_by_key(|n| (n.variable.unwrap_or(Var::LEAF), n.id));
        DiagramTree { root, nodes }
    }

    pub fn debug_string(&self, root: NodeId) -> String {
        self.debug_tree(root).to_string()
    }

    /// Compares `root` against `expected` on every assignment of the first
    /// `num_vars` variables.
    ///
    /// Returns the assignments where they differ, with expected and actual values.
    pub fn verify_truth_table(
        &self,
        root: NodeId,
        num_vars: usize,
        expected: impl Fn(&[bool]) -> Value,
    ) -> Vec<(Vec<bool>, Value, Option<Value>)> {
        let mut failures = Vec::new();
        for bits in 0..(1u64 << num_vars) {
            let assignment: Vec<bool> = (0..num_vars).map(|i| (bits >> i) & 1 == 1).collect();
            let want = expected(&assignment);
            let got = self.evaluate(root, &assignment).ok();
            if got.as_ref() != Some(&want) {
                failures.push((assignment, want, got));
            }
        }
        failures
    }

    /// Dumps every stored node, grouped by variable.
    pub fn dump_state(&self) -> String {
        let stats = self.stats();
        let mut result = String::new();
        result.push_str("=== Context State ===\n");
        result.push_str(&format!(
            "Variables: {}, nodes: {} ({} live, peak {}), leaves: {}\n",
            stats.variables, stats.nodes, stats.live_nodes, stats.peak_nodes, stats.leaves
        ));
        result.push_str(&format!(
            "Cache: {} entries, {} hits, {} misses, {} flushes\n",
            stats.cache_entries, stats.cache_hits, stats.cache_misses, stats.cache_flushes
        ));
        result.push_str(&format!("GC: {} collections, {} reclaimed\n", stats.collections, stats.reclaimed));

        let mut infos: Vec<NodeInfo> = {
            let ids: Vec<NodeId> = self.table.borrow().ids().collect();
            ids.into_iter().map(|id| self.node_info(id)).collect()
        };
        infos.sort_by_key(|n| (n.variable.unwrap_or(Var::LEAF), n.id));
        for info in infos {
            result.push_str(&format!("  {}\n", info));
        }
        result
    }
}
