use crate::leaf::LeafCode;
use crate::reference::NodeId;
use crate::types::Var;
use crate::utils::{mix64, pairing2, pairing3, MyHash};

/// A node of a multi-terminal decision diagram.
///
/// Inner nodes are `(var, low, high)` triples; leaves carry an interned
/// [`LeafCode`]. The node itself is immutable once it is in the unique table.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Node {
    Leaf(LeafCode),
    Inner { var: Var, low: NodeId, high: NodeId },
}

impl Node {
    pub fn var(&self) -> Var {
        match *self {
            Node::Leaf(_) => Var::LEAF,
            Node::Inner { var, .. } => var,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// Children of an inner node, `None` for leaves.
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match *self {
            Node::Leaf(_) => None,
            Node::Inner { low, high, .. } => Some((low, high)),
        }
    }
}

impl MyHash for Node {
    fn hash(&self) -> u64 {
        let raw = match *self {
            // Leaf codes live in their own half of the key space.
            Node::Leaf(code) => pairing2(u32::MAX as u64 + 1, code.raw() as u64),
            Node::Inner { var, low, high } => pairing3(var.id() as u64, low.raw() as u64, high.raw() as u64),
        };
        mix64(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_accessors() {
        let leaf = Node::Leaf(LeafCode::new(3));
        assert!(leaf.is_leaf());
        assert_eq!(leaf.var(), Var::LEAF);
        assert_eq!(leaf.children(), None);

        let inner = Node::Inner {
            var: Var::new(2),
            low: NodeId::new(0),
            high: NodeId::new(1),
        };
        assert!(!inner.is_leaf());
        assert_eq!(inner.var(), Var::new(2));
        assert_eq!(inner.children(), Some((NodeId::new(0), NodeId::new(1))));
    }

    #[test]
    fn test_node_hash_distinguishes_children_order() {
        let a = Node::Inner {
            var: Var::new(0),
            low: NodeId::new(1),
            high: NodeId::new(2),
        };
        let b = Node::Inner {
            var: Var::new(0),
            low: NodeId::new(2),
            high: NodeId::new(1),
        };
        assert_ne!(MyHash::hash(&a), MyHash::hash(&b));
        assert_ne!(MyHash::hash(&Node::Leaf(LeafCode::new(0))), MyHash::hash(&Node::Leaf(LeafCode::new(1))));
    }
}
