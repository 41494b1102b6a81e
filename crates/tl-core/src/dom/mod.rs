//! Arena-based document tree.
//!
//! All nodes live in a flat slot vector and are referenced by generational
//! `NodeId` handles. Children form a doubly linked sibling list, so
//! inserting, removing or replacing one child costs the same no matter how
//! many siblings it has. Structural edits go through a small set of
//! primitives (`insert_before`, `remove`, `replace_with`) which also feed
//! the mutation observer queues, so every edit a caller makes is visible to
//! observers exactly once.

mod node;
mod observer;

pub use node::{Element, Namespace, NodeData, NodeId};
pub use observer::{MutationRecord, ObserveOptions, ObserverId};

use std::collections::HashSet;

use observer::Registration;

/// Error type for document operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Stale node handle {0}")]
    StaleNode(NodeId),
    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),
    #[error("Node {0} is not a text node")]
    NotText(NodeId),
    #[error("Node {0} belongs to another browsing context")]
    CrossOrigin(NodeId),
    #[error("Node {0} has no parent")]
    NotAttached(NodeId),
    #[error("Node {0} is still attached to a parent")]
    StillAttached(NodeId),
    #[error("Cannot insert {child} under {parent}")]
    HierarchyRequest { parent: NodeId, child: NodeId },
}

// =============================================================================
// Selectors
// =============================================================================

/// Minimal selector: a tag name or a single class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    Tag(&'a str),
    Class(&'a str),
}

impl<'a> Selector<'a> {
    /// Parse a comma-separated list such as `"pre, code, .code"`.
    pub fn parse_list(list: &'a str) -> Vec<Selector<'a>> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('.') {
                Some(class) => Selector::Class(class),
                None => Selector::Tag(s),
            })
            .collect()
    }

    pub fn matches(&self, element: &Element) -> bool {
        match self {
            Selector::Tag(tag) => element.name().eq_ignore_ascii_case(tag),
            Selector::Class(class) => element.has_class(class),
        }
    }
}

// =============================================================================
// Document
// =============================================================================

#[derive(Debug)]
struct NodeRecord {
    data: NodeData,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    record: Option<NodeRecord>,
}

/// Arena document with mutation observation.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
    registrations: Vec<Registration>,
    next_observer: u32,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the document node.
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::new(0, 0),
            registrations: Vec::new(),
            next_observer: 0,
        };
        doc.root = doc.alloc(NodeData::Document);
        doc
    }

    /// Create `<html><head></head><body></body></html>`.
    pub fn new_html() -> Self {
        let mut doc = Self::new();
        let html = doc.create_element("html");
        let head = doc.create_element("head");
        let body = doc.create_element("body");
        let root = doc.root;
        // Fresh nodes under a fresh root cannot violate the hierarchy.
        let _ = doc.append_child(root, html);
        let _ = doc.append_child(html, head);
        let _ = doc.append_child(html, body);
        doc
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let record = NodeRecord {
            data,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        };
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.record = Some(record);
                NodeId::new(index, slot.generation)
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                NodeId::new(index, 0)
            }
        }
    }

    fn record(&self, id: NodeId) -> Result<&NodeRecord, DomError> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.record.as_ref())
            .ok_or(DomError::StaleNode(id))
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, DomError> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.record.as_mut())
            .ok_or(DomError::StaleNode(id))
    }

    #[inline]
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.record(id).is_ok()
    }

    // -------------------------------------------------------------------------
    // Node creation
    // -------------------------------------------------------------------------

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeData::Element(Element::new(name)))
    }

    pub fn create_element_ns(&mut self, name: &str, namespace: Namespace) -> NodeId {
        self.alloc(NodeData::Element(Element::with_namespace(name, namespace)))
    }

    /// Adopt a fully built element payload.
    pub fn adopt_element(&mut self, element: Element) -> NodeId {
        self.alloc(NodeData::Element(element))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeData::Comment(text.into()))
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    pub fn data(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.record(id).map(|r| &r.data)
    }

    /// Element payload. Fails for non-elements and for nodes owned by
    /// another browsing context.
    pub fn element(&self, id: NodeId) -> Result<&Element, DomError> {
        match &self.record(id)?.data {
            NodeData::Element(el) if el.cross_origin => Err(DomError::CrossOrigin(id)),
            NodeData::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Result<&mut Element, DomError> {
        match &mut self.record_mut(id)?.data {
            NodeData::Element(el) if el.cross_origin => Err(DomError::CrossOrigin(id)),
            NodeData::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    /// Mark an element as belonging to another browsing context.
    pub fn seal_cross_origin(&mut self, id: NodeId) -> Result<(), DomError> {
        match &mut self.record_mut(id)?.data {
            NodeData::Element(el) => {
                el.cross_origin = true;
                Ok(())
            }
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.data(id).ok().and_then(NodeData::as_text)
    }

    /// Replace a text node's character data. Not a structural edit, so no
    /// mutation record is queued.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        match &mut self.record_mut(id)?.data {
            NodeData::Text(t) => {
                *t = text.into();
                Ok(())
            }
            _ => Err(DomError::NotText(id)),
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        self.data(id).map(NodeData::is_text).unwrap_or(false)
    }

    /// True for elements, including cross-context ones.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.data(id).map(NodeData::is_element).unwrap_or(false)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).ok().and_then(|r| r.parent)
    }

    /// Children in order. Stale handles have none.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        let (front, back) = match self.record(id) {
            Ok(r) => (r.first_child, r.last_child),
            Err(_) => (None, None),
        };
        Children {
            doc: self,
            front,
            back,
        }
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).ok().and_then(|r| r.first_child)
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).ok().and_then(|r| r.last_child)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).ok().and_then(|r| r.next_sibling)
    }

    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.record(id).ok().and_then(|r| r.prev_sibling)
    }

    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(id),
        }
    }

    /// Inclusive containment: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.is_alive(node) {
            return false;
        }
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Pre-order walk of `root` and its descendants.
    pub fn descendants(&self, root: NodeId) -> Descendants<'_> {
        let stack = if self.is_alive(root) { vec![root] } else { Vec::new() };
        Descendants { doc: self, stack }
    }

    /// Concatenated text of every text node under `id` (inclusive).
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(text) = self.text(node) {
                out.push_str(text);
            }
        }
        out
    }

    /// First element with the given local name, in document order.
    pub fn first_element(&self, name: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .find(|&n| self.element(n).map(|el| el.is(name)).unwrap_or(false))
    }

    pub fn body(&self) -> Option<NodeId> {
        self.first_element("body")
    }

    pub fn head(&self) -> Option<NodeId> {
        self.first_element("head")
    }

    /// Trimmed `<title>` text, if present and non-empty.
    pub fn title(&self) -> Option<String> {
        let title = self.first_element("title")?;
        let text = self.text_content(title);
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub fn element_by_id(&self, id_attr: &str) -> Option<NodeId> {
        self.descendants(self.root).find(|&n| {
            self.element(n)
                .map(|el| el.attr("id") == Some(id_attr))
                .unwrap_or(false)
        })
    }

    /// Elements strictly below `scope` matching any selector, in document
    /// order. Cross-context elements never match.
    pub fn select(&self, scope: NodeId, selectors: &[Selector<'_>]) -> Vec<NodeId> {
        self.descendants(scope)
            .skip(1)
            .filter(|&n| match self.element(n) {
                Ok(el) => selectors.iter().any(|s| s.matches(el)),
                Err(_) => false,
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Structural edits
    // -------------------------------------------------------------------------

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent` before `reference` (or last). A child
    /// that is attached elsewhere is moved, producing a removal record first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        let parent_data = &self.record(parent)?.data;
        if !matches!(parent_data, NodeData::Element(_) | NodeData::Document) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        self.record(child)?;
        if child == self.root || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest { parent, child });
        }
        if let Some(reference) = reference {
            if self.parent(reference) != Some(parent) || reference == child {
                return Err(DomError::HierarchyRequest { parent, child: reference });
            }
        }

        if self.parent(child).is_some() {
            self.detach(child)?;
        }
        self.link(parent, child, reference)?;

        self.notify(parent, vec![child], Vec::new());
        Ok(())
    }

    /// Detach a node from its parent. The node stays alive until released.
    pub fn remove(&mut self, id: NodeId) -> Result<(), DomError> {
        self.detach(id).map(|_| ())
    }

    fn detach(&mut self, id: NodeId) -> Result<NodeId, DomError> {
        let (parent, _) = self.unlink(id)?;
        self.notify(parent, Vec::new(), vec![id]);
        Ok(parent)
    }

    /// Splice a detached `child` into `parent`'s list before `next`, or
    /// last when `next` is `None`.
    fn link(&mut self, parent: NodeId, child: NodeId, next: Option<NodeId>) -> Result<(), DomError> {
        let prev = match next {
            Some(next) => self.record(next)?.prev_sibling,
            None => self.record(parent)?.last_child,
        };
        {
            let record = self.record_mut(child)?;
            record.parent = Some(parent);
            record.prev_sibling = prev;
            record.next_sibling = next;
        }
        match prev {
            Some(prev) => self.record_mut(prev)?.next_sibling = Some(child),
            None => self.record_mut(parent)?.first_child = Some(child),
        }
        match next {
            Some(next) => self.record_mut(next)?.prev_sibling = Some(child),
            None => self.record_mut(parent)?.last_child = Some(child),
        }
        Ok(())
    }

    /// Take `id` out of its parent's list. Returns the parent and the
    /// sibling that followed it.
    fn unlink(&mut self, id: NodeId) -> Result<(NodeId, Option<NodeId>), DomError> {
        let (parent, prev, next) = {
            let record = self.record_mut(id)?;
            let parent = record.parent.take().ok_or(DomError::NotAttached(id))?;
            (parent, record.prev_sibling.take(), record.next_sibling.take())
        };
        match prev {
            Some(prev) => self.record_mut(prev)?.next_sibling = next,
            None => self.record_mut(parent)?.first_child = next,
        }
        match next {
            Some(next) => self.record_mut(next)?.prev_sibling = prev,
            None => self.record_mut(parent)?.last_child = prev,
        }
        Ok((parent, next))
    }

    /// Replace `old` with `replacements` as a single structural edit.
    ///
    /// Every replacement must be detached. Observers receive exactly one
    /// record carrying all added nodes and the removed one.
    pub fn replace_with(&mut self, old: NodeId, replacements: &[NodeId]) -> Result<(), DomError> {
        let parent = self.record(old)?.parent.ok_or(DomError::NotAttached(old))?;
        let mut seen = HashSet::with_capacity(replacements.len());
        for &node in replacements {
            if self.record(node)?.parent.is_some() || !seen.insert(node) {
                return Err(DomError::StillAttached(node));
            }
            if node == self.root || node == old || self.contains(node, parent) {
                return Err(DomError::HierarchyRequest { parent, child: node });
            }
        }

        let (parent, next) = self.unlink(old)?;
        for &node in replacements {
            self.link(parent, node, next)?;
        }

        self.notify(parent, replacements.to_vec(), vec![old]);
        Ok(())
    }

    /// Free a detached node and its whole subtree. Handles to released
    /// nodes become stale.
    pub fn release(&mut self, id: NodeId) -> Result<(), DomError> {
        if self.record(id)?.parent.is_some() {
            return Err(DomError::StillAttached(id));
        }
        if id == self.root {
            return Err(DomError::HierarchyRequest { parent: id, child: id });
        }

        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            stack.extend(self.children(node));
            let slot = &mut self.slots[node.index()];
            if slot.record.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(node.index() as u32);
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Observation
    // -------------------------------------------------------------------------

    /// Start queueing mutation records for edits under `target`.
    pub fn observe(&mut self, target: NodeId, options: ObserveOptions) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer = self.next_observer.wrapping_add(1);
        self.registrations.push(Registration {
            id,
            target,
            options,
            queue: Vec::new(),
        });
        id
    }

    /// Drop a registration together with its undelivered records.
    pub fn disconnect(&mut self, observer: ObserverId) {
        self.registrations.retain(|r| r.id != observer);
    }

    pub fn is_observing(&self, observer: ObserverId) -> bool {
        self.registrations.iter().any(|r| r.id == observer)
    }

    /// Drain the records queued for `observer`.
    pub fn take_records(&mut self, observer: ObserverId) -> Vec<MutationRecord> {
        self.registrations
            .iter_mut()
            .find(|r| r.id == observer)
            .map(|r| std::mem::take(&mut r.queue))
            .unwrap_or_default()
    }

    fn notify(&mut self, target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) {
        if self.registrations.is_empty() {
            return;
        }

        let interested: Vec<usize> = self
            .registrations
            .iter()
            .enumerate()
            .filter(|(_, reg)| {
                reg.options.contains(ObserveOptions::CHILD_LIST)
                    && (reg.target == target
                        || (reg.options.contains(ObserveOptions::SUBTREE)
                            && self.contains(reg.target, target)))
            })
            .map(|(i, _)| i)
            .collect();

        for i in interested {
            self.registrations[i].queue.push(MutationRecord {
                target,
                added: added.clone(),
                removed: removed.clone(),
            });
        }
    }
}

// =============================================================================
// Iterators
// =============================================================================

/// Sibling-list cursor from both ends.
pub struct Children<'a> {
    doc: &'a Document,
    front: Option<NodeId>,
    back: Option<NodeId>,
}

impl Children<'_> {
    fn finish_if_met(&mut self, current: NodeId) -> bool {
        if self.back == Some(current) && self.front == Some(current) {
            self.front = None;
            self.back = None;
            true
        } else {
            false
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.front?;
        if !self.finish_if_met(current) {
            self.front = self.doc.next_sibling(current);
        }
        Some(current)
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        let current = self.back?;
        if !self.finish_if_met(current) {
            self.back = self.doc.prev_sibling(current);
        }
        Some(current)
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}

/// Pre-order traversal driven by an explicit stack, so depth is bounded
/// only by memory.
pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.stack.extend(self.doc.children(node).rev());
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(doc: &mut Document, text: &str) -> (NodeId, NodeId) {
        let body = doc.body().expect("body");
        let p = doc.create_element("p");
        let t = doc.create_text(text);
        doc.append_child(p, t).unwrap();
        doc.append_child(body, p).unwrap();
        (p, t)
    }

    #[test]
    fn test_new_html_skeleton() {
        let doc = Document::new_html();
        assert!(doc.head().is_some());
        assert!(doc.body().is_some());
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_replace_with_preserves_position() {
        let mut doc = Document::new_html();
        let (p, t) = paragraph(&mut doc, "b");
        let a = doc.create_text("a");
        doc.insert_before(p, a, Some(t)).unwrap();

        let x = doc.create_text("x");
        let y = doc.create_text("y");
        doc.replace_with(t, &[x, y]).unwrap();

        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![a, x, y]);
        assert_eq!(doc.children(p).rev().collect::<Vec<_>>(), vec![y, x, a]);
        assert_eq!(doc.parent(t), None);
        assert_eq!(doc.text_content(p), "axy");
    }

    #[test]
    fn test_sibling_links_survive_edits_at_both_ends() {
        let mut doc = Document::new_html();
        let body = doc.body().unwrap();
        let nodes: Vec<NodeId> = (0..5).map(|i| doc.create_text(i.to_string())).collect();
        for &n in &nodes {
            doc.append_child(body, n).unwrap();
        }

        doc.remove(nodes[0]).unwrap();
        doc.remove(nodes[4]).unwrap();
        doc.remove(nodes[2]).unwrap();
        assert_eq!(doc.first_child(body), Some(nodes[1]));
        assert_eq!(doc.last_child(body), Some(nodes[3]));
        assert_eq!(doc.next_sibling(nodes[1]), Some(nodes[3]));
        assert_eq!(doc.prev_sibling(nodes[0]), None);

        doc.insert_before(body, nodes[4], Some(nodes[1])).unwrap();
        doc.replace_with(nodes[3], &[nodes[0], nodes[2]]).unwrap();
        assert_eq!(doc.text_content(body), "4102");
        assert_eq!(doc.children(body).rev().collect::<Vec<_>>(), vec![nodes[2], nodes[0], nodes[1], nodes[4]]);

        let mut both_ends = doc.children(body);
        assert_eq!(both_ends.next(), Some(nodes[4]));
        assert_eq!(both_ends.next_back(), Some(nodes[2]));
        assert_eq!(both_ends.next_back(), Some(nodes[0]));
        assert_eq!(both_ends.next(), Some(nodes[1]));
        assert_eq!(both_ends.next(), None);
        assert_eq!(both_ends.next_back(), None);
    }

    #[test]
    fn test_replace_with_rejects_duplicate_replacement() {
        let mut doc = Document::new_html();
        let (p, t) = paragraph(&mut doc, "x");
        let a = doc.create_text("a");
        assert_eq!(doc.replace_with(t, &[a, a]), Err(DomError::StillAttached(a)));
        assert_eq!(doc.children(p).collect::<Vec<_>>(), vec![t]);
    }

    #[test]
    fn test_replace_with_rejects_attached_replacement() {
        let mut doc = Document::new_html();
        let (_, t) = paragraph(&mut doc, "one");
        let (_, other) = paragraph(&mut doc, "two");
        assert_eq!(doc.replace_with(t, &[other]), Err(DomError::StillAttached(other)));
    }

    #[test]
    fn test_released_handles_go_stale() {
        let mut doc = Document::new_html();
        let (p, t) = paragraph(&mut doc, "gone");
        doc.remove(p).unwrap();
        doc.release(p).unwrap();

        assert!(!doc.is_alive(p));
        assert!(!doc.is_alive(t));

        // Slot reuse must not resurrect the old handle.
        let fresh = doc.create_text("new");
        assert!(doc.is_alive(fresh));
        assert!(!doc.is_alive(p));
        assert!(!doc.is_alive(t));
    }

    #[test]
    fn test_release_requires_detached() {
        let mut doc = Document::new_html();
        let (p, _) = paragraph(&mut doc, "x");
        assert_eq!(doc.release(p), Err(DomError::StillAttached(p)));
    }

    #[test]
    fn test_insert_rejects_cycles() {
        let mut doc = Document::new_html();
        let (p, t) = paragraph(&mut doc, "x");
        let body = doc.body().unwrap();
        assert!(matches!(doc.append_child(p, body), Err(DomError::HierarchyRequest { .. })));
        assert!(matches!(doc.append_child(t, p), Err(DomError::HierarchyRequest { .. })));
    }

    #[test]
    fn test_append_moves_attached_node() {
        let mut doc = Document::new_html();
        let (p1, t) = paragraph(&mut doc, "move me");
        let (p2, _) = paragraph(&mut doc, "");
        doc.append_child(p2, t).unwrap();
        assert_eq!(doc.children(p1).next(), None);
        assert_eq!(doc.parent(t), Some(p2));
    }

    #[test]
    fn test_cross_origin_element_refuses_introspection() {
        let mut doc = Document::new_html();
        let (p, _) = paragraph(&mut doc, "x");
        doc.seal_cross_origin(p).unwrap();
        assert_eq!(doc.element(p), Err(DomError::CrossOrigin(p)));
        assert!(doc.is_element(p));
    }

    #[test]
    fn test_select_matches_tags_and_classes() {
        let mut doc = Document::new_html();
        let body = doc.body().unwrap();
        let pre = doc.create_element("pre");
        let div = doc.create_element("div");
        doc.element_mut(div).unwrap().add_class("code");
        let span = doc.create_element("span");
        doc.append_child(body, pre).unwrap();
        doc.append_child(body, div).unwrap();
        doc.append_child(div, span).unwrap();

        let selectors = Selector::parse_list("pre, .code");
        assert_eq!(doc.select(doc.root(), &selectors), vec![pre, div]);
    }

    #[test]
    fn test_subtree_observer_sees_nested_inserts() {
        let mut doc = Document::new_html();
        let body = doc.body().unwrap();
        let observer = doc.observe(body, ObserveOptions::CHILD_LIST | ObserveOptions::SUBTREE);

        let (p, t) = paragraph(&mut doc, "hello");
        let records = doc.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].target, body);
        assert_eq!(records[0].added, vec![p]);

        let x = doc.create_text("x");
        doc.replace_with(t, &[x]).unwrap();
        let records = doc.take_records(observer);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].added, vec![x]);
        assert_eq!(records[0].removed, vec![t]);
    }

    #[test]
    fn test_disconnect_drops_pending_records() {
        let mut doc = Document::new_html();
        let body = doc.body().unwrap();
        let observer = doc.observe(body, ObserveOptions::CHILD_LIST);
        paragraph(&mut doc, "x");
        doc.disconnect(observer);
        assert!(!doc.is_observing(observer));
        assert!(doc.take_records(observer).is_empty());
    }

    #[test]
    fn test_descendants_handles_deep_trees() {
        let mut doc = Document::new_html();
        let mut parent = doc.body().unwrap();
        for _ in 0..5_000 {
            let div = doc.create_element("div");
            doc.append_child(parent, div).unwrap();
            parent = div;
        }
        let leaf = doc.create_text("deep");
        doc.append_child(parent, leaf).unwrap();
        assert_eq!(doc.text_content(doc.root()), "deep");
    }
}
