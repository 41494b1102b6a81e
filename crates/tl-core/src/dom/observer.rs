//! Mutation observation for the arena document.
//!
//! Mirrors the browser's MutationObserver contract: a registration targets
//! one node, structural edits under it queue `MutationRecord`s, and the
//! owner drains them with `Document::take_records`. Disconnecting drops
//! whatever is still queued.

use super::NodeId;

bitflags::bitflags! {
    /// What a registration listens to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ObserveOptions: u8 {
        /// Child insertions and removals on the target
        const CHILD_LIST = 1 << 0;
        /// Extend to every descendant of the target
        const SUBTREE = 1 << 1;
    }
}

/// Handle returned by `Document::observe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub(crate) u32);

/// One structural edit: children added to and removed from `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord {
    pub target: NodeId,
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

#[derive(Debug)]
pub(crate) struct Registration {
    pub id: ObserverId,
    pub target: NodeId,
    pub options: ObserveOptions,
    pub queue: Vec<MutationRecord>,
}
