//! Operation cache.
//!
//! A `HashMap` from [`OpKey`] to result [`NodeId`]. Entries carry no
//! reference counts; the collector drops every entry that mentions a
//! reclaimed id (see [`OpCache::retain_live`]).
//!
//! # Sizing
//!
//! The cache starts with a soft limit. When the soft limit is reached, the
//! cache doubles it if the hit ratio since the last resize is at least
//! `min_hit` percent, and flushes itself otherwise. Reaching the hard limit
//! always flushes.

use std::collections::HashMap;

use log::{debug, warn};

use crate::operator::Operator;
use crate::reference::NodeId;
use crate::value::ValueType;

/// Memoisation key of a recursive operation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum OpKey {
    /// Unused operand positions are [`NodeId::INVALID`].
    Apply {
        op: Operator,
        result: ValueType,
        operands: [NodeId; 3],
    },
    /// Structural if-then-else; the result does not depend on a type.
    Ite {
        f: NodeId,
        g: NodeId,
        h: NodeId,
    },
    Abstract {
        op: Operator,
        result: ValueType,
        f: NodeId,
        cube: NodeId,
    },
    AndExist {
        f: NodeId,
        g: NodeId,
        cube: NodeId,
    },
}

impl OpKey {
    pub fn apply(op: Operator, result: ValueType, operands: &[NodeId]) -> Self {
        let mut ids = [NodeId::INVALID; 3];
        ids[..operands.len()].copy_from_slice(operands);
        OpKey::Apply {
            op,
            result,
            operands: ids,
        }
    }

    /// Node ids mentioned by this key.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> {
        let ids = match *self {
            OpKey::Apply { operands, .. } => operands,
            OpKey::Ite { f, g, h } => [f, g, h],
            OpKey::Abstract { f, cube, .. } => [f, cube, NodeId::INVALID],
            OpKey::AndExist { f, g, cube } => [f, g, cube],
        };
        ids.into_iter().filter(|id| id.is_valid())
    }
}

#[derive(Debug, Clone)]
pub struct OpCache {
    map: HashMap<OpKey, NodeId>,
    enabled: bool,
    soft_limit: usize,
    hard_limit: usize,
    min_hit: u32,
    hits: usize,
    misses: usize,
    /// Counters since the last resize or flush; drive the growth decision.
    recent_hits: usize,
    recent_misses: usize,
    flushes: usize,
}

impl OpCache {
    pub fn new(soft_limit: usize, hard_limit: usize, min_hit: u32, enabled: bool) -> Self {
        let hard_limit = hard_limit.max(1);
        let soft_limit = soft_limit.clamp(1, hard_limit);
        Self {
            map: HashMap::with_capacity(if enabled { soft_limit.min(1 << 16) } else { 0 }),
            enabled,
            soft_limit,
            hard_limit,
            min_hit,
            hits: 0,
            misses: 0,
            recent_hits: 0,
            recent_misses: 0,
            flushes: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn soft_limit(&self) -> usize {
        self.soft_limit
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn get(&mut self, key: &OpKey) -> Option<NodeId> {
        let found = if self.enabled { self.map.get(key).copied() } else { None };
        if found.is_some() {
            self.hits += 1;
            self.recent_hits += 1;
        } else {
            self.misses += 1;
            self.recent_misses += 1;
        }
        found
    }

    pub fn insert(&mut self, key: OpKey, value: NodeId) {
        if !self.enabled {
            return;
        }
        if self.map.len() >= self.soft_limit && !self.map.contains_key(&key) {
            self.make_room();
        }
        self.map.insert(key, value);
    }

    fn make_room(&mut self) {
        let lookups = self.recent_hits + self.recent_misses;
        let ratio = if lookups == 0 {
            0
        } else {
            (100 * self.recent_hits / lookups) as u32
        };
        if self.soft_limit >= self.hard_limit {
            warn!(
                "Operation cache reached hard limit of {} entries, flushing",
                self.hard_limit
            );
            self.flush();
        } else if ratio >= self.min_hit {
            self.soft_limit = (self.soft_limit * 2).min(self.hard_limit);
            debug!("Operation cache hit ratio {}%, growing to {}", ratio, self.soft_limit);
        } else {
            debug!("Operation cache hit ratio {}% below {}%, flushing", ratio, self.min_hit);
            self.flush();
        }
        self.recent_hits = 0;
        self.recent_misses = 0;
    }

    fn flush(&mut self) {
        self.map.clear();
        self.flushes += 1;
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Drops every entry whose key or result fails `is_live`.
    pub fn retain_live(&mut self, is_live: impl Fn(NodeId) -> bool) -> usize {
        let before = self.map.len();
        self.map
            .retain(|key, value| is_live(*value) && key.nodes().all(|id| is_live(id)));
        before - self.map.len()
    }

    /// All `(key, result)` pairs, for consistency checks.
    pub fn entries(&self) -> impl Iterator<Item = (&OpKey, &NodeId)> {
        self.map.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn key(a: u32, b: u32) -> OpKey {
        OpKey::apply(
            Operator::Add,
            ValueType::Integer,
            &[NodeId::new(a), NodeId::new(b)],
        )
    }

    #[test]
    fn test_get_insert_counts() {
        let mut cache = OpCache::new(16, 64, 30, true);
        cache.insert(key(1, 2), NodeId::new(3));
        assert_eq!(cache.get(&key(1, 2)), Some(NodeId::new(3)));
        assert_eq!(cache.get(&key(2, 1)), None);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_disabled_always_misses() {
        let mut cache = OpCache::new(16, 64, 30, false);
        cache.insert(key(1, 2), NodeId::new(3));
        assert_eq!(cache.get(&key(1, 2)), None);
        assert!(cache.is_empty());
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_grows_on_good_hit_ratio() {
        let mut cache = OpCache::new(2, 64, 30, true);
        cache.insert(key(0, 0), NodeId::new(0));
        cache.insert(key(0, 1), NodeId::new(0));
        cache.get(&key(0, 0));
        cache.insert(key(0, 2), NodeId::new(0));
        assert_eq!(cache.soft_limit(), 4);
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.flushes(), 0);
    }

    #[test]
    fn test_flushes_on_poor_hit_ratio() {
        let mut cache = OpCache::new(2, 64, 30, true);
        cache.insert(key(0, 0), NodeId::new(0));
        cache.insert(key(0, 1), NodeId::new(0));
        cache.get(&key(9, 9));
        cache.insert(key(0, 2), NodeId::new(0));
        assert_eq!(cache.soft_limit(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.flushes(), 1);
    }

    #[test]
    fn test_hard_limit_flushes() {
        let mut cache = OpCache::new(2, 2, 0, true);
        cache.insert(key(0, 0), NodeId::new(0));
        cache.insert(key(0, 1), NodeId::new(0));
        cache.insert(key(0, 2), NodeId::new(0));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.flushes(), 1);
    }

    #[test]
    fn test_retain_live() {
        let mut cache = OpCache::new(16, 64, 30, true);
        cache.insert(key(1, 2), NodeId::new(3));
        cache.insert(key(1, 4), NodeId::new(5));
        cache.insert(key(6, 6), NodeId::new(2));
        let dropped = cache.retain_live(|id| id != NodeId::new(2));
        assert_eq!(dropped, 2);
        assert_eq!(cache.get(&key(1, 4)), Some(NodeId::new(5)));
    }

    #[test]
    fn test_key_nodes_skip_unused() {
        let k = OpKey::apply(Operator::Not, ValueType::Boolean, &[NodeId::new(7)]);
        assert_eq!(k.nodes().collect::<Vec<_>>(), vec![NodeId::new(7)]);
    }
}
