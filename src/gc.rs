//! Reference-count driven collection.
//!
//! Releasing the last reference only marks a node dead. Dead nodes are
//! reclaimed in batches by [`Context::garbage_collect`], which also purges
//! the operation cache of every entry mentioning a reclaimed id. Public
//! operations call [`Context::maybe_collect`] on entry, never in the middle
//! of a recursion, so intermediate results with zero references are safe
//! until the operation returns.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::context::Context;
use crate::error::{DdError, Result};
use crate::node::Node;
use crate::reference::NodeId;

#[derive(Debug, Clone)]
pub(crate) struct GcState {
    loose_up_to: usize,
    /// Population at which the next automatic collection runs.
    pub threshold: usize,
    pub collections: usize,
    pub reclaimed: usize,
}

impl GcState {
    pub fn new(loose_up_to: usize) -> Self {
        Self {
            loose_up_to,
            threshold: loose_up_to,
            collections: 0,
            reclaimed: 0,
        }
    }
}

impl Context {
    /// Collects if automatic collection is enabled and the policy asks for it.
    pub(crate) fn maybe_collect(&self) {
        if !self.config.garbage_collect {
            return;
        }
        let due = {
            let table = self.table.borrow();
            table.dead() > 0 && table.population() >= self.gc.borrow().threshold
        };
        if due {
            self.garbage_collect();
        }
    }

    /// Reclaims every dead node. Returns the number of reclaimed nodes.
    pub fn garbage_collect(&self) -> usize {
        let mut table = self.table.borrow_mut();
        let before = table.population();

        let mut queue: Vec<NodeId> = table.ids().filter(|&id| table.is_dead(id)).collect();
        let mut reclaimed = 0;
        while let Some(id) = queue.pop() {
            // A node can be queued twice: once as dead, once as an orphan.
            if !table.contains(id) || !table.is_dead(id) {
                continue;
            }
            queue.extend(table.reclaim(id));
            reclaimed += 1;
        }

        let purged = self.cache.borrow_mut().retain_live(|id| table.contains(id));

        let mut gc = self.gc.borrow_mut();
        gc.collections += 1;
        gc.reclaimed += reclaimed;
        gc.threshold = gc.loose_up_to.max(2 * table.live());
        debug!(
            "gc #{}: reclaimed {} of {} nodes, purged {} cache entries, next at {}",
            gc.collections, reclaimed, before, purged, gc.threshold
        );
        reclaimed
    }

    /// Runs a full collection, then verifies the structural invariants of
    /// the whole context.
    ///
    /// # Errors
    ///
    /// [`DdError::Inconsistent`] describing the first violation found.
    pub fn check_consistent(&self) -> Result<()> {
        self.garbage_collect();
        let table = self.table.borrow();
        table.check_chains().map_err(DdError::Inconsistent)?;

        let ids: Vec<NodeId> = table.ids().collect();
        let mut parents: HashMap<NodeId, u32> = HashMap::new();
        for &id in &ids {
            if table.is_dead(id) {
                return Err(DdError::Inconsistent(format!("dead node {} survived collection", id)));
            }
            let Node::Inner { var, low, high } = table.node(id) else {
                continue;
            };
            if low == high {
                return Err(DdError::Inconsistent(format!("redundant node {} ({} == {})", id, low, high)));
            }
            for child in [low, high] {
                if !table.contains(child) {
                    return Err(DdError::Inconsistent(format!("{} has dangling child {}", id, child)));
                }
                if table.node(child).var() <= var {
                    return Err(DdError::Inconsistent(format!(
                        "{} at {} has child {} at {}",
                        id,
                        var,
                        child,
                        table.node(child).var()
                    )));
                }
                *parents.entry(child).or_default() += 1;
            }
        }

        for &id in &ids {
            let expected = parents.get(&id).copied().unwrap_or(0);
            if table.parents(id) != expected {
                return Err(DdError::Inconsistent(format!(
                    "{} records {} parent references, found {}",
                    id,
                    table.parents(id),
                    expected
                )));
            }
        }

        let mut reachable = HashSet::new();
        let mut stack: Vec<NodeId> = ids.iter().copied().filter(|&id| table.external(id) > 0).collect();
        while let Some(id) = stack.pop() {
            if !reachable.insert(id) {
                continue;
            }
            if let Some((low, high)) = table.node(id).children() {
                stack.push(low);
                stack.push(high);
            }
        }
        if reachable.len() != table.live() || table.live() != ids.len() {
            return Err(DdError::Inconsistent(format!(
                "{} nodes reachable from roots, {} live, {} stored",
                reachable.len(),
                table.live(),
                ids.len()
            )));
        }

        for (key, &res) in self.cache.borrow().entries() {
            if !table.contains(res) || key.nodes().any(|id| !table.contains(id)) {
                return Err(DdError::Inconsistent(format!("cache entry {:?} -> {} is stale", key, res)));
            }
        }

        let leaves = self.leaves.borrow();
        for &id in &ids {
            if let Node::Leaf(code) = table.node(id) {
                if code.index() >= leaves.len() {
                    return Err(DdError::Inconsistent(format!("{} carries unknown leaf {}", id, code)));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContextConfig;
    use crate::operator::Operator;
    use crate::value::ValueType;
    use test_log::test;

    #[test]
    fn test_collect_reclaims_released_diagram() {
        let ctx = Context::default();
        let x0 = ctx.new_variable().unwrap();
        let x1 = ctx.new_variable().unwrap();
        let v0 = ctx.var_node(x0).unwrap();
        let v1 = ctx.var_node(x1).unwrap();
        let c5 = ctx.new_constant(5).unwrap();
        let c7 = ctx.new_constant(7).unwrap();
        ctx.check_consistent().unwrap();
        let baseline = ctx.stats().live_nodes;

        let f = ctx.apply(Operator::Ite, ValueType::Integer, &[v1, c5, c7]).unwrap();
        let g = ctx.apply(Operator::Ite, ValueType::Integer, &[v0, c5, f]).unwrap();
        ctx.release(f).unwrap();
        ctx.check_consistent().unwrap();
        assert_eq!(ctx.stats().live_nodes, baseline + 2);

        ctx.release(g).unwrap();
        ctx.check_consistent().unwrap();
        assert_eq!(ctx.stats().live_nodes, baseline);
    }

    #[test]
    fn test_collect_purges_cache() {
        let ctx = Context::default();
        let x = ctx.new_variable().unwrap();
        let v = ctx.var_node(x).unwrap();
        let a = ctx.new_constant(1).unwrap();
        let b = ctx.new_constant(2).unwrap();
        let f = ctx.apply(Operator::Ite, ValueType::Integer, &[v, a, b]).unwrap();
        let g = ctx.apply(Operator::Add, ValueType::Integer, &[f, f]).unwrap();
        assert!(ctx.stats().cache_entries > 0);

        ctx.release(f).unwrap();
        ctx.release(g).unwrap();
        ctx.check_consistent().unwrap();
        let g2 = ctx.apply(Operator::Ite, ValueType::Integer, &[v, a, b]).unwrap();
        let h = ctx.apply(Operator::Add, ValueType::Integer, &[g2, g2]).unwrap();
        assert_eq!(ctx.leaf_value(ctx.low(h).unwrap()), Some(crate::value::Value::integer(4)));
        ctx.check_consistent().unwrap();
    }

    #[test]
    fn test_dead_node_is_revived_by_lookup() {
        let ctx = Context::with_config(ContextConfig::default().with_garbage_collect(false));
        let a = ctx.new_constant(9).unwrap();
        ctx.release(a).unwrap();
        assert_eq!(ctx.ref_count(a), 0);
        let b = ctx.new_constant(9).unwrap();
        assert_eq!(a, b);
        assert_eq!(ctx.ref_count(b), 1);
        ctx.check_consistent().unwrap();
    }

    #[test]
    fn test_automatic_collection_respects_threshold() {
        let ctx = Context::with_config(ContextConfig::default().with_loose_up_to(4));
        for i in 0..16 {
            let c = ctx.new_constant(i).unwrap();
            ctx.release(c).unwrap();
        }
        let stats = ctx.stats();
        assert!(stats.collections > 0);
        assert!(stats.nodes <= 4);
    }

    #[test]
    fn test_disabled_collection_keeps_dead_nodes() {
        let ctx = Context::with_config(ContextConfig::default().with_garbage_collect(false).with_loose_up_to(1));
        for i in 0..8 {
            let c = ctx.new_constant(i).unwrap();
            ctx.release(c).unwrap();
        }
        assert_eq!(ctx.stats().collections, 0);
        assert_eq!(ctx.stats().nodes, 8);
    }
}
