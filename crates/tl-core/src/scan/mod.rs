//! Document-order walk that finds URL-bearing text and rewrites it.

pub mod code;

use crate::actions::ActionController;
use crate::classify::{classify, Classification};
use crate::dom::{Document, NodeId};
use crate::matcher;
use crate::processed::ProcessedSet;
use crate::rewrite::{rewrite, RewriteReport};

/// Visited-node state for one enable/disable cycle.
///
/// `processed` covers the generic walk, `code_blocks` the containers the
/// code pass has handled. Both are replaced together when an epoch ends.
#[derive(Debug, Default)]
pub struct ScanEpoch {
    pub processed: ProcessedSet,
    pub code_blocks: ProcessedSet,
}

impl ScanEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh epoch, forgetting every visited node.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Counters for one scan.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Nodes taken off the worklist and classified
    pub visited: usize,
    /// Text nodes replaced by a rewrite
    pub rewritten: usize,
    pub highlights: usize,
    pub controls: usize,
    /// Rewrites that failed and were skipped
    pub failed: usize,
}

impl ScanReport {
    pub fn merge(&mut self, other: ScanReport) {
        self.visited += other.visited;
        self.rewritten += other.rewritten;
        self.highlights += other.highlights;
        self.controls += other.controls;
        self.failed += other.failed;
    }

    pub(crate) fn record_rewrite(&mut self, report: &RewriteReport) {
        self.rewritten += 1;
        self.highlights += report.highlights.len();
        self.controls += report.controls.len();
    }
}

/// Walk `root` and its descendants in document order, rewriting every text
/// node that contains a URL.
///
/// A node already in `processed` is skipped together with its subtree;
/// otherwise it is recorded before anything else happens to it. The walk
/// uses an explicit worklist, so deeply nested documents cannot exhaust
/// the call stack.
pub fn scan(
    doc: &mut Document,
    root: NodeId,
    processed: &mut ProcessedSet,
    controls: &mut ActionController,
) -> ScanReport {
    let mut report = ScanReport::default();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if !processed.insert(node) {
            continue;
        }
        report.visited += 1;

        match classify(doc, node) {
            Classification::Recurse => {
                stack.extend(doc.children(node).rev());
            }
            Classification::LeafText => {
                let Some(text) = doc.text(node) else { continue };
                let matches = matcher::find(text);
                if matches.is_empty() {
                    continue;
                }
                match rewrite(doc, node, &matches, processed, controls) {
                    Ok(rewritten) => report.record_rewrite(&rewritten),
                    Err(e) => {
                        log::warn!("scan: skipping text node {node}: {e}");
                        report.failed += 1;
                    }
                }
            }
            Classification::SkipEngineUi
            | Classification::SkipAnchor
            | Classification::SkipOpaque => {}
        }
    }

    log::debug!(
        "scan from {root}: visited {}, rewrote {} text node(s)",
        report.visited,
        report.rewritten
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineOptions;
    use crate::marker::{count_marked, CONTROL_CLASS, HIGHLIGHT_CLASS};

    struct Fixture {
        doc: Document,
        processed: ProcessedSet,
        actions: ActionController,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                doc: Document::new_html(),
                processed: ProcessedSet::new(),
                actions: ActionController::new(EngineOptions::default()),
            }
        }

        fn element_with_text(&mut self, parent: NodeId, tag: &str, text: &str) -> NodeId {
            let el = self.doc.create_element(tag);
            let t = self.doc.create_text(text);
            self.doc.append_child(el, t).unwrap();
            self.doc.append_child(parent, el).unwrap();
            el
        }

        fn scan_all(&mut self) -> ScanReport {
            let root = self.doc.root();
            scan(&mut self.doc, root, &mut self.processed, &mut self.actions)
        }
    }

    #[test]
    fn test_scan_rewrites_plain_text() {
        let mut f = Fixture::new();
        let body = f.doc.body().unwrap();
        f.element_with_text(body, "p", "go to https://example.com now");

        let report = f.scan_all();
        assert_eq!(report.rewritten, 1);
        assert_eq!(report.controls, 1);
        assert_eq!(count_marked(&f.doc, HIGHLIGHT_CLASS), 1);
        assert_eq!(count_marked(&f.doc, CONTROL_CLASS), 1);
    }

    #[test]
    fn test_scan_is_idempotent() {
        let mut f = Fixture::new();
        let body = f.doc.body().unwrap();
        f.element_with_text(body, "p", "https://a.com and https://b.com");

        f.scan_all();
        let second = f.scan_all();
        assert_eq!(second.rewritten, 0);
        assert_eq!(count_marked(&f.doc, HIGHLIGHT_CLASS), 2);

        // Subtree scans of already processed content are no-ops too.
        let third = scan(&mut f.doc, body, &mut f.processed, &mut f.actions);
        assert_eq!(third.visited, 0);
    }

    #[test]
    fn test_scan_skips_anchors_and_opaque_content() {
        let mut f = Fixture::new();
        let body = f.doc.body().unwrap();
        let a = f.element_with_text(body, "a", "https://linked.com");
        f.doc.element_mut(a).unwrap().set_attr("href", "https://linked.com");
        f.element_with_text(body, "script", "var u = 'https://x.com';");
        f.element_with_text(body, "style", "a { background: url(https://y.com/i.png) }");
        f.element_with_text(body, "textarea", "https://z.com");
        let comment = f.doc.create_comment("https://hidden.com");
        f.doc.append_child(body, comment).unwrap();

        let report = f.scan_all();
        assert_eq!(report.rewritten, 0);
        assert_eq!(count_marked(&f.doc, HIGHLIGHT_CLASS), 0);
    }

    #[test]
    fn test_scan_recurses_through_cross_origin_elements() {
        let mut f = Fixture::new();
        let body = f.doc.body().unwrap();
        let frame = f.element_with_text(body, "div", "https://framed.com");
        f.doc.seal_cross_origin(frame).unwrap();

        let report = f.scan_all();
        assert_eq!(report.rewritten, 1);
    }

    #[test]
    fn test_scan_handles_deep_nesting() {
        let mut f = Fixture::new();
        let mut parent = f.doc.body().unwrap();
        for _ in 0..5_000 {
            let div = f.doc.create_element("div");
            f.doc.append_child(parent, div).unwrap();
            parent = div;
        }
        f.element_with_text(parent, "span", "deep https://deep.org link");

        let report = f.scan_all();
        assert_eq!(report.rewritten, 1);
    }
}
