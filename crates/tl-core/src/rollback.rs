//! Undo every rewrite and remove all engine UI.

use crate::actions::{remove_and_release, ActionController};
use crate::dom::{Document, Selector};
use crate::marker::HIGHLIGHT_CLASS;
use crate::scan::ScanEpoch;
use crate::tracker::MutationTracker;

/// Outcome of a rollback.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RollbackReport {
    pub controls_removed: usize,
    pub highlights_restored: usize,
    /// Per-node failures that were logged and skipped
    pub failed: usize,
}

/// Restore the document's original text.
///
/// The tracker is stopped for the whole operation and started again only
/// when `keep_tracking` is set. Controls come from the controller's
/// registry; highlights are found by their marker class. Failures on
/// individual nodes are logged and do not stop the rollback. The epoch is
/// replaced at the end, so a later scan starts from scratch.
pub fn rollback(
    doc: &mut Document,
    tracker: &mut MutationTracker,
    actions: &mut ActionController,
    epoch: &mut ScanEpoch,
    keep_tracking: bool,
) -> RollbackReport {
    let mut report = RollbackReport::default();
    tracker.stop(doc);

    if let Err(e) = actions.dismiss_all(doc) {
        log::warn!("rollback: failed to dismiss menus and previews: {e}");
        report.failed += 1;
    }

    for control in actions.drain() {
        match remove_and_release(doc, control) {
            Ok(()) => report.controls_removed += 1,
            Err(e) => {
                log::warn!("rollback: failed to remove control {control}: {e}");
                report.failed += 1;
            }
        }
    }

    let highlights = doc.select(doc.root(), &[Selector::Class(HIGHLIGHT_CLASS)]);
    for highlight in highlights {
        let text = doc.text_content(highlight);
        let plain = doc.create_text(text);
        let restored = doc
            .replace_with(highlight, &[plain])
            .and_then(|()| doc.release(highlight));
        match restored {
            Ok(()) => report.highlights_restored += 1,
            Err(e) => {
                log::warn!("rollback: failed to restore highlight {highlight}: {e}");
                let _ = doc.release(plain);
                report.failed += 1;
            }
        }
    }

    epoch.reset();
    if keep_tracking {
        tracker.start(doc);
    }

    log::debug!(
        "rollback: removed {} control(s), restored {} highlight(s)",
        report.controls_removed,
        report.highlights_restored
    );
    report
}
