use std::mem::size_of;

use log::debug;

use crate::error::{DdError, Resource};
use crate::node::Node;
use crate::reference::NodeId;
use crate::utils::MyHash;

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    /// References from outside the table (client handles, pinned constants).
    external: u32,
    /// References from live parent nodes.
    parents: u32,
    next: NodeId,
    occupied: bool,
}

impl Slot {
    fn vacant() -> Self {
        Self {
            node: Node::Inner {
                var: crate::types::Var::LEAF,
                low: NodeId::INVALID,
                high: NodeId::INVALID,
            },
            external: 0,
            parents: 0,
            next: NodeId::INVALID,
            occupied: false,
        }
    }

    fn rc(&self) -> u32 {
        self.external + self.parents
    }
}

/// Hash-consing node arena.
///
/// Nodes live in a flat `Vec` addressed by [`NodeId`]; buckets hold the head
/// of a chain threaded through the `next` field of each slot. A node whose
/// reference count drops to zero stays in its chain (dead) until
/// [`reclaim`](Self::reclaim) unlinks it; finding a dead node again simply
/// revives it.
pub struct UniqueTable {
    slots: Vec<Slot>,
    buckets: Vec<NodeId>,
    bitmask: u64,
    free: Vec<NodeId>,
    /// Number of occupied slots.
    population: usize,
    /// Number of occupied slots with zero references.
    dead: usize,
    peak: usize,
    max_nodes: usize,
}

impl UniqueTable {
    /// Creates a table with `buckets` initial chains (rounded up to a power
    /// of two) that refuses to grow past `max_nodes` nodes.
    pub fn new(buckets: usize, max_nodes: usize) -> Self {
        let buckets = buckets.max(1).next_power_of_two();
        Self {
            slots: Vec::new(),
            buckets: vec![NodeId::INVALID; buckets],
            bitmask: (buckets - 1) as u64,
            free: Vec::new(),
            population: 0,
            dead: 0,
            peak: 0,
            max_nodes: max_nodes.min(u32::MAX as usize - 1),
        }
    }

    /// Node limit derived from a memory bound in bytes.
    pub fn nodes_for_memory(bytes: usize) -> usize {
        bytes / size_of::<Slot>()
    }

    pub fn population(&self) -> usize {
        self.population
    }

    pub fn dead(&self) -> usize {
        self.dead
    }

    pub fn live(&self) -> usize {
        self.population - self.dead
    }

    pub fn peak(&self) -> usize {
        self.peak
    }

    pub fn max_nodes(&self) -> usize {
        self.max_nodes
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true if `id` denotes an occupied slot (live or dead).
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    /// # Panics
    ///
    /// Panics if `id` is not occupied.
    pub fn node(&self, id: NodeId) -> Node {
        let slot = &self.slots[id.index()];
        assert!(slot.occupied, "Node {} is not in the table", id);
        slot.node
    }

    /// Node stored at `id`, or `None` for free slots and foreign ids.
    pub fn get(&self, id: NodeId) -> Option<Node> {
        self.slot(id).map(|slot| slot.node)
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.index()).filter(|slot| slot.occupied)
    }

    /// Reference count of `id`; zero for ids not in the table.
    pub fn rc(&self, id: NodeId) -> u32 {
        self.slot(id).map_or(0, Slot::rc)
    }

    pub fn external(&self, id: NodeId) -> u32 {
        self.slot(id).map_or(0, |slot| slot.external)
    }

    pub fn parents(&self, id: NodeId) -> u32 {
        self.slot(id).map_or(0, |slot| slot.parents)
    }

    pub fn is_dead(&self, id: NodeId) -> bool {
        self.rc(id) == 0
    }

    /// Occupied ids in arena order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.occupied)
            .map(|(i, _)| NodeId::new(i as u32))
    }

    fn bucket_index(&self, node: &Node) -> usize {
        (node.hash() & self.bitmask) as usize
    }

    pub fn lookup(&self, node: &Node) -> Option<NodeId> {
        let mut index = self.buckets[self.bucket_index(node)];
        while index.is_valid() {
            let slot = &self.slots[index.index()];
            if slot.node == *node {
                return Some(index);
            }
            index = slot.next;
        }
        None
    }

    /// Returns the canonical id for `node`, inserting it if absent.
    ///
    /// A new inner node starts with no references and holds one parent
    /// reference on each child.
    pub fn put(&mut self, node: Node) -> Result<NodeId, DdError> {
        if let Some(id) = self.lookup(&node) {
            return Ok(id);
        }
        if self.population >= self.max_nodes {
            return Err(DdError::ResourceExhausted {
                resource: Resource::Nodes,
                limit: self.max_nodes,
            });
        }
        if self.population >= 2 * self.buckets.len() {
            self.grow_buckets();
        }

        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.slots.push(Slot::vacant());
                NodeId::new((self.slots.len() - 1) as u32)
            }
        };
        let bucket = self.bucket_index(&node);
        self.slots[id.index()] = Slot {
            node,
            external: 0,
            parents: 0,
            next: self.buckets[bucket],
            occupied: true,
        };
        self.buckets[bucket] = id;
        self.population += 1;
        self.dead += 1;
        self.peak = self.peak.max(self.population);

        if let Some((low, high)) = node.children() {
            self.inc_parents(low);
            self.inc_parents(high);
        }
        Ok(id)
    }

    fn grow_buckets(&mut self) {
        let size = self.buckets.len() * 2;
        debug!("Growing unique table to {} buckets", size);
        self.buckets = vec![NodeId::INVALID; size];
        self.bitmask = (size - 1) as u64;
        for i in 0..self.slots.len() {
            if !self.slots[i].occupied {
                continue;
            }
            let bucket = self.bucket_index(&self.slots[i].node);
            self.slots[i].next = self.buckets[bucket];
            self.buckets[bucket] = NodeId::new(i as u32);
        }
    }

    fn inc_parents(&mut self, id: NodeId) {
        let slot = &mut self.slots[id.index()];
        if slot.rc() == 0 {
            self.dead -= 1;
        }
        slot.parents += 1;
    }

    fn dec_parents(&mut self, id: NodeId) {
        let slot = &mut self.slots[id.index()];
        assert!(slot.parents > 0, "Parent count underflow at {}", id);
        slot.parents -= 1;
        if slot.rc() == 0 {
            self.dead += 1;
        }
    }

    pub fn retain(&mut self, id: NodeId) {
        let slot = &mut self.slots[id.index()];
        assert!(slot.occupied, "Node {} is not in the table", id);
        if slot.rc() == 0 {
            self.dead -= 1;
        }
        slot.external += 1;
    }

    /// Drops one external reference. Returns false if there was none.
    pub fn release(&mut self, id: NodeId) -> bool {
        let Some(slot) = self.slots.get_mut(id.index()) else {
            return false;
        };
        if !slot.occupied || slot.external == 0 {
            return false;
        }
        slot.external -= 1;
        if slot.rc() == 0 {
            self.dead += 1;
        }
        true
    }

    /// Unlinks a dead node and frees its slot, dropping its parent
    /// references on the children. Returns the children that became dead.
    ///
    /// # Panics
    ///
    /// Panics if `id` still has references.
    pub fn reclaim(&mut self, id: NodeId) -> Vec<NodeId> {
        let node = self.node(id);
        assert_eq!(self.rc(id), 0, "Reclaiming referenced node {}", id);

        let bucket = self.bucket_index(&node);
        let next = self.slots[id.index()].next;
        if self.buckets[bucket] == id {
            self.buckets[bucket] = next;
        } else {
            let mut prev = self.buckets[bucket];
            while self.slots[prev.index()].next != id {
                prev = self.slots[prev.index()].next;
                assert!(prev.is_valid(), "Node {} missing from its chain", id);
            }
            self.slots[prev.index()].next = next;
        }

        self.slots[id.index()] = Slot::vacant();
        self.free.push(id);
        self.population -= 1;
        self.dead -= 1;

        let mut orphans = Vec::new();
        if let Some((low, high)) = node.children() {
            for child in [low, high] {
                self.dec_parents(child);
                if self.rc(child) == 0 {
                    orphans.push(child);
                }
            }
        }
        orphans
    }

    /// Walks every chain and reports the first canonicality violation.
    pub fn check_chains(&self) -> Result<(), String> {
        let mut seen = 0;
        for (b, &head) in self.buckets.iter().enumerate() {
            let mut index = head;
            while index.is_valid() {
                let slot = &self.slots[index.index()];
                if !slot.occupied {
                    return Err(format!("free slot {} linked in bucket {}", index, b));
                }
                if self.bucket_index(&slot.node) != b {
                    return Err(format!("node {} hashed into wrong bucket {}", index, b));
                }
                if self.lookup(&slot.node) != Some(index) {
                    return Err(format!("node {} is a duplicate of {:?}", index, self.lookup(&slot.node)));
                }
                seen += 1;
                index = slot.next;
            }
        }
        if seen != self.population {
            return Err(format!("{} nodes in chains, but population is {}", seen, self.population));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaf::LeafCode;
    use crate::types::Var;
    use test_log::test;

    fn inner(var: u32, low: NodeId, high: NodeId) -> Node {
        Node::Inner {
            var: Var::new(var),
            low,
            high,
        }
    }

    #[test]
    fn test_put_is_canonical() {
        let mut table = UniqueTable::new(4, 1024);
        let a = table.put(Node::Leaf(LeafCode::new(0))).unwrap();
        let b = table.put(Node::Leaf(LeafCode::new(1))).unwrap();
        let x = table.put(inner(0, a, b)).unwrap();
        let y = table.put(inner(0, a, b)).unwrap();
        assert_eq!(x, y);
        assert_eq!(table.population(), 3);
        assert_eq!(table.parents(a), 1);
        assert_eq!(table.parents(b), 1);
        assert_eq!(table.dead(), 1);
    }

    #[test]
    fn test_foreign_ids_are_absent() {
        let mut table = UniqueTable::new(4, 1024);
        let a = table.put(Node::Leaf(LeafCode::new(0))).unwrap();
        for id in [NodeId::new(999), NodeId::INVALID] {
            assert!(!table.contains(id));
            assert_eq!(table.get(id), None);
            assert_eq!(table.rc(id), 0);
            assert!(!table.release(id));
        }
        assert_eq!(table.get(a), Some(Node::Leaf(LeafCode::new(0))));
    }

    #[test]
    fn test_retain_release_tracks_dead() {
        let mut table = UniqueTable::new(4, 1024);
        let a = table.put(Node::Leaf(LeafCode::new(0))).unwrap();
        assert!(table.is_dead(a));
        table.retain(a);
        assert_eq!(table.dead(), 0);
        assert!(table.release(a));
        assert_eq!(table.dead(), 1);
        assert!(!table.release(a));
    }

    #[test]
    fn test_reclaim_frees_and_reuses() {
        let mut table = UniqueTable::new(1, 1024);
        let a = table.put(Node::Leaf(LeafCode::new(0))).unwrap();
        let b = table.put(Node::Leaf(LeafCode::new(1))).unwrap();
        let x = table.put(inner(0, a, b)).unwrap();
        table.retain(a);

        let orphans = table.reclaim(x);
        assert_eq!(orphans, vec![b]);
        assert!(!table.contains(x));
        assert_eq!(table.lookup(&inner(0, a, b)), None);
        assert_eq!(table.population(), 2);
        assert!(table.check_chains().is_ok());

        let c = table.put(Node::Leaf(LeafCode::new(2))).unwrap();
        assert_eq!(c, x);
    }

    #[test]
    fn test_grow_keeps_nodes_findable() {
        let mut table = UniqueTable::new(2, 1024);
        let ids: Vec<_> = (0..100).map(|i| table.put(Node::Leaf(LeafCode::new(i))).unwrap()).collect();
        assert!(table.bucket_count() >= 64);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(table.lookup(&Node::Leaf(LeafCode::new(i as u32))), Some(*id));
        }
        assert!(table.check_chains().is_ok());
    }

    #[test]
    fn test_exhaustion() {
        let mut table = UniqueTable::new(4, 2);
        table.put(Node::Leaf(LeafCode::new(0))).unwrap();
        table.put(Node::Leaf(LeafCode::new(1))).unwrap();
        table.put(Node::Leaf(LeafCode::new(1))).unwrap();
        let err = table.put(Node::Leaf(LeafCode::new(2))).unwrap_err();
        assert!(err.is_fatal());
    }
}
