//! Identity-only membership of visited nodes.

use std::collections::HashSet;
use std::hash::BuildHasherDefault;

use twox_hash::XxHash64;

use crate::dom::NodeId;

type NodeHasher = BuildHasherDefault<XxHash64>;

/// Nodes visited during the current scan epoch.
///
/// Stores generational handles only: membership never keeps a node alive,
/// and a released node's handle can never match a newer node. There is no
/// per-entry removal; an epoch ends by replacing the whole set.
#[derive(Debug, Default, Clone)]
pub struct ProcessedSet {
    members: HashSet<NodeId, NodeHasher>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `node`. Returns `false` if it was already a member.
    #[inline]
    pub fn insert(&mut self, node: NodeId) -> bool {
        self.members.insert(node)
    }

    #[inline]
    pub fn contains(&self, node: NodeId) -> bool {
        self.members.contains(&node)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
