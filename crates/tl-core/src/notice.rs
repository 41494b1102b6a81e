//! Transient notifications shown after a toggle or site opt-out.

use crate::actions::remove_and_release;
use crate::dom::{Document, DomError, NodeId};
use crate::marker::{create_marked, NOTIFICATION_CLASS};
use crate::timer::{Timer, Timestamp};

/// Class added when a notice starts its exit animation.
pub const LEAVING_CLASS: &str = "leaving";

#[derive(Debug, Clone, Copy)]
struct Notice {
    node: NodeId,
    timer: Timer,
    leaving: bool,
}

/// Visible notices with their display and exit timers.
#[derive(Debug, Default)]
pub struct Notices {
    visible: Vec<Notice>,
    display_ms: u64,
    exit_ms: u64,
}

impl Notices {
    pub fn new(display_ms: u64, exit_ms: u64) -> Self {
        Self {
            visible: Vec::new(),
            display_ms,
            exit_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.visible.iter().map(|n| n.node)
    }

    /// Append a notice to the body.
    pub fn show(
        &mut self,
        doc: &mut Document,
        message: &str,
        now: Timestamp,
    ) -> Result<NodeId, DomError> {
        let node = create_marked(doc, "div", NOTIFICATION_CLASS)?;
        let text = doc.create_text(message);
        doc.append_child(node, text)?;
        let parent = doc.body().unwrap_or_else(|| doc.root());
        doc.append_child(parent, node)?;

        self.visible.push(Notice {
            node,
            timer: Timer::armed(now, self.display_ms),
            leaving: false,
        });
        Ok(node)
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.visible.iter().filter_map(|n| n.timer.deadline()).min()
    }

    /// Advance timers: visible notices start leaving, leaving ones are
    /// removed. The exit phase is timed from the end of the display phase,
    /// so a tick late enough for both runs both. Returns how many were
    /// removed.
    pub fn tick(&mut self, doc: &mut Document, now: Timestamp) -> usize {
        let mut removed = 0;
        let mut kept = Vec::with_capacity(self.visible.len());

        for mut notice in std::mem::take(&mut self.visible) {
            if !notice.leaving && notice.timer.fire_and_chain(now, self.exit_ms) {
                if let Ok(el) = doc.element_mut(notice.node) {
                    el.add_class(LEAVING_CLASS);
                }
                notice.leaving = true;
            }

            if notice.leaving && notice.timer.fire(now) {
                if let Err(e) = remove_and_release(doc, notice.node) {
                    log::warn!("failed to remove notification {}: {e}", notice.node);
                }
                removed += 1;
            } else {
                kept.push(notice);
            }
        }

        self.visible = kept;
        removed
    }
}
