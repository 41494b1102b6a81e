//! Mutation tracking: feeds subtrees inserted by the page back to the
//! scanner.

use crate::dom::{Document, MutationRecord, NodeId, ObserveOptions, ObserverId};

/// Observation lifecycle over a fixed root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Stopped,
    Observing(ObserverId),
    Paused,
}

/// Child-list observer with an explicit pause/resume bracket.
///
/// Records queued before a pause are kept in a backlog and delivered with
/// the next batch. Edits made while paused are never seen.
#[derive(Debug)]
pub struct MutationTracker {
    root: NodeId,
    state: State,
    backlog: Vec<MutationRecord>,
}

impl MutationTracker {
    pub fn new(root: NodeId) -> Self {
        Self {
            root,
            state: State::Stopped,
            backlog: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// True while started, paused or not.
    pub fn is_active(&self) -> bool {
        self.state != State::Stopped
    }

    pub fn is_observing(&self) -> bool {
        matches!(self.state, State::Observing(_))
    }

    /// Begin observing. Has no effect if already started.
    pub fn start(&mut self, doc: &mut Document) {
        if self.state == State::Stopped {
            self.state = State::Observing(observe(doc, self.root));
        }
    }

    /// Dispose of the observer and forget anything undelivered.
    pub fn stop(&mut self, doc: &mut Document) {
        if let State::Observing(observer) = self.state {
            doc.disconnect(observer);
        }
        self.state = State::Stopped;
        self.backlog.clear();
    }

    /// Stop seeing edits until `resume`. Returns whether this call paused
    /// an observing tracker, so brackets can nest.
    pub fn pause(&mut self, doc: &mut Document) -> bool {
        let State::Observing(observer) = self.state else {
            return false;
        };
        self.backlog.extend(doc.take_records(observer));
        doc.disconnect(observer);
        self.state = State::Paused;
        true
    }

    pub fn resume(&mut self, doc: &mut Document) {
        if self.state == State::Paused {
            self.state = State::Observing(observe(doc, self.root));
        }
    }

    /// Inserted element nodes that still need a subtree scan, in record
    /// order. Nodes detached since insertion are dropped.
    pub fn take_batch(&mut self, doc: &mut Document) -> Vec<NodeId> {
        let mut records = std::mem::take(&mut self.backlog);
        if let State::Observing(observer) = self.state {
            records.extend(doc.take_records(observer));
        }

        records
            .into_iter()
            .flat_map(|record| record.added)
            .filter(|&node| doc.is_element(node) && doc.is_connected(node))
            .collect()
    }
}

fn observe(doc: &mut Document, root: NodeId) -> ObserverId {
    doc.observe(root, ObserveOptions::CHILD_LIST | ObserveOptions::SUBTREE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Document, MutationTracker, NodeId) {
        let doc = Document::new_html();
        let body = doc.body().unwrap();
        (doc, MutationTracker::new(body), body)
    }

    #[test]
    fn test_batch_contains_inserted_elements_only() {
        let (mut doc, mut tracker, body) = setup();
        tracker.start(&mut doc);

        let div = doc.create_element("div");
        let text = doc.create_text("loose");
        doc.append_child(body, div).unwrap();
        doc.append_child(body, text).unwrap();

        assert_eq!(tracker.take_batch(&mut doc), vec![div]);
        assert!(tracker.take_batch(&mut doc).is_empty());
    }

    #[test]
    fn test_detached_insertions_are_dropped() {
        let (mut doc, mut tracker, body) = setup();
        tracker.start(&mut doc);

        let div = doc.create_element("div");
        doc.append_child(body, div).unwrap();
        doc.remove(div).unwrap();
        assert!(tracker.take_batch(&mut doc).is_empty());
    }

    #[test]
    fn test_pause_hides_edits_but_keeps_backlog() {
        let (mut doc, mut tracker, body) = setup();
        tracker.start(&mut doc);

        let before = doc.create_element("p");
        doc.append_child(body, before).unwrap();

        assert!(tracker.pause(&mut doc));
        assert!(!tracker.pause(&mut doc));
        let during = doc.create_element("span");
        doc.append_child(body, during).unwrap();
        tracker.resume(&mut doc);

        assert!(tracker.is_observing());
        assert_eq!(tracker.take_batch(&mut doc), vec![before]);
    }

    #[test]
    fn test_stop_drops_backlog() {
        let (mut doc, mut tracker, body) = setup();
        tracker.start(&mut doc);
        let p = doc.create_element("p");
        doc.append_child(body, p).unwrap();
        tracker.pause(&mut doc);
        tracker.stop(&mut doc);

        assert!(!tracker.is_active());
        assert!(tracker.take_batch(&mut doc).is_empty());

        // Restarting sees only new edits.
        tracker.start(&mut doc);
        let q = doc.create_element("p");
        doc.append_child(body, q).unwrap();
        assert_eq!(tracker.take_batch(&mut doc), vec![q]);
    }

    #[test]
    fn test_resume_without_pause_is_noop() {
        let (mut doc, mut tracker, _) = setup();
        tracker.resume(&mut doc);
        assert!(!tracker.is_active());
    }
}
