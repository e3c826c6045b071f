use std::fmt::{Display, Formatter};

/// A handle to a node in the unique table.
///
/// Edges are uncomplemented, so a `NodeId` is just an arena index. Two
/// handles are equal iff they denote the same function (canonicity).
/// Holding a `NodeId` does not keep the node alive: callers must
/// [`retain`](crate::context::Context::retain) what they keep.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Sentinel for "no node" (end of bucket chains, empty free list).
    pub const INVALID: NodeId = NodeId(u32::MAX);

    pub const fn new(index: u32) -> Self {
        NodeId(index)
    }

    /// Returns the raw index value.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the index for array access.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn is_valid(self) -> bool {
        self.0 != u32::MAX
    }
}

impl Default for NodeId {
    fn default() -> Self {
        NodeId::INVALID
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_valid() {
            write!(f, "@{}", self.0)
        } else {
            write!(f, "@-")
        }
    }
}

impl From<u32> for NodeId {
    fn from(index: u32) -> Self {
        NodeId::new(index)
    }
}

impl From<NodeId> for u32 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid() {
        let id = NodeId::new(42);
        assert!(id.is_valid());
        assert_eq!(id.raw(), 42);
        assert_eq!(id.index(), 42);
        assert!(!NodeId::INVALID.is_valid());
        assert_eq!(NodeId::default(), NodeId::INVALID);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", NodeId::new(5)), "@5");
        assert_eq!(format!("{}", NodeId::INVALID), "@-");
    }
}
