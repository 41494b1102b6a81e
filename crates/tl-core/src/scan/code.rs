//! Targeted pass over code-like containers.

use crate::actions::ActionController;
use crate::classify::{classify, excluded_by_ancestor, Classification};
use crate::dom::{Document, NodeId, Selector};
use crate::matcher;
use crate::processed::ProcessedSet;
use crate::rewrite::rewrite;

use super::ScanReport;

/// Preformatted text, inline code and common highlighter containers.
pub const CODE_SELECTORS: &str = "pre, code, .code, .syntaxhighlighter";

// =============================================================================
// Text Walker
// =============================================================================

/// Text-only pre-order walk below a container.
///
/// Anchor, opaque and engine subtrees are not entered. The walker holds its
/// own position, so `reset` restarts it from the container.
pub struct TextWalker<'a> {
    doc: &'a Document,
    root: NodeId,
    stack: Vec<NodeId>,
}

impl<'a> TextWalker<'a> {
    pub fn new(doc: &'a Document, root: NodeId) -> Self {
        let mut walker = Self {
            doc,
            root,
            stack: Vec::new(),
        };
        walker.reset();
        walker
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.extend(self.doc.children(self.root).rev());
    }
}

impl Iterator for TextWalker<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(node) = self.stack.pop() {
            match classify(self.doc, node) {
                Classification::LeafText => return Some(node),
                Classification::Recurse => {
                    self.stack.extend(self.doc.children(node).rev());
                }
                _ => {}
            }
        }
        None
    }
}

// =============================================================================
// Pass
// =============================================================================

/// Rewrite URL-bearing text inside every code container below `root`.
///
/// `containers` remembers which containers this pass has already handled;
/// text nodes already in `processed` are left alone. Candidates are
/// collected per container before any rewrite so the walk never observes
/// its own edits.
pub fn scan_code(
    doc: &mut Document,
    root: NodeId,
    processed: &mut ProcessedSet,
    containers: &mut ProcessedSet,
    controls: &mut ActionController,
) -> ScanReport {
    let selectors = Selector::parse_list(CODE_SELECTORS);
    let mut report = ScanReport::default();

    for container in doc.select(root, &selectors) {
        if !containers.insert(container) {
            continue;
        }
        if classify(doc, container).is_skip() || excluded_by_ancestor(doc, container) {
            continue;
        }

        let candidates: Vec<NodeId> = TextWalker::new(doc, container)
            .filter(|&node| !processed.contains(node))
            .filter(|&node| doc.text(node).is_some_and(matcher::contains_url))
            .collect();

        for node in candidates {
            if !processed.insert(node) {
                continue;
            }
            report.visited += 1;
            let Some(text) = doc.text(node) else { continue };
            let matches = matcher::find(text);
            match rewrite(doc, node, &matches, processed, controls) {
                Ok(rewritten) => report.record_rewrite(&rewritten),
                Err(e) => {
                    log::warn!("code pass: skipping text node {node}: {e}");
                    report.failed += 1;
                }
            }
        }
    }

    if report.rewritten > 0 {
        log::debug!("code pass rewrote {} text node(s)", report.rewritten);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineOptions;
    use crate::marker::HIGHLIGHT_CLASS;

    fn code_block(doc: &mut Document, tag: &str, text: &str) -> (NodeId, NodeId) {
        let body = doc.body().unwrap();
        let el = doc.create_element(tag);
        let t = doc.create_text(text);
        doc.append_child(el, t).unwrap();
        doc.append_child(body, el).unwrap();
        (el, t)
    }

    #[test]
    fn test_pre_block_keeps_whitespace() {
        let mut doc = Document::new_html();
        let mut processed = ProcessedSet::new();
        let mut containers = ProcessedSet::new();
        let mut actions = ActionController::new(EngineOptions::default());
        let source = "  $ curl https://api.example.com/v1\n    # done\n";
        let (pre, _) = code_block(&mut doc, "pre", source);

        let root = doc.root();
        let report = scan_code(&mut doc, root, &mut processed, &mut containers, &mut actions);
        assert_eq!(report.rewritten, 1);

        let children = doc.children(pre).collect::<Vec<_>>();
        assert_eq!(children.len(), 4);
        assert_eq!(doc.text(children[0]), Some("  $ curl "));
        assert!(doc.element(children[1]).unwrap().has_class(HIGHLIGHT_CLASS));
        assert_eq!(doc.text_content(children[1]), "https://api.example.com/v1");
        assert_eq!(doc.text(children[3]), Some("\n    # done\n"));
    }

    #[test]
    fn test_containers_are_handled_once() {
        let mut doc = Document::new_html();
        let mut processed = ProcessedSet::new();
        let mut containers = ProcessedSet::new();
        let mut actions = ActionController::new(EngineOptions::default());
        let (code, _) = code_block(&mut doc, "code", "https://one.com");

        let root = doc.root();
        scan_code(&mut doc, root, &mut processed, &mut containers, &mut actions);
        assert!(containers.contains(code));

        // New text added afterwards is not picked up by this pass.
        let extra = doc.create_text(" https://two.com");
        doc.append_child(code, extra).unwrap();
        let again = scan_code(&mut doc, root, &mut processed, &mut containers, &mut actions);
        assert_eq!(again.rewritten, 0);
    }

    #[test]
    fn test_text_already_processed_is_left_alone() {
        let mut doc = Document::new_html();
        let mut processed = ProcessedSet::new();
        let mut containers = ProcessedSet::new();
        let mut actions = ActionController::new(EngineOptions::default());
        let (_, t) = code_block(&mut doc, "pre", "https://seen.com");
        processed.insert(t);

        let root = doc.root();
        let report = scan_code(&mut doc, root, &mut processed, &mut containers, &mut actions);
        assert_eq!(report.rewritten, 0);
        assert!(doc.is_connected(t));
    }

    #[test]
    fn test_walker_skips_links_inside_code() {
        let mut doc = Document::new_html();
        let (pre, _) = code_block(&mut doc, "pre", "see ");
        let a = doc.create_element("a");
        let linked = doc.create_text("https://linked.com");
        doc.append_child(a, linked).unwrap();
        doc.append_child(pre, a).unwrap();
        let tail = doc.create_text(" tail");
        doc.append_child(pre, tail).unwrap();

        let mut walker = TextWalker::new(&doc, pre);
        let first: Vec<NodeId> = walker.by_ref().collect();
        assert_eq!(first.len(), 2);
        assert!(!first.contains(&linked));

        walker.reset();
        assert_eq!(walker.count(), 2);
    }

    #[test]
    fn test_class_selectors_qualify() {
        let mut doc = Document::new_html();
        let mut processed = ProcessedSet::new();
        let mut containers = ProcessedSet::new();
        let mut actions = ActionController::new(EngineOptions::default());
        let (div, _) = code_block(&mut doc, "div", "https://hl.example.org/x");
        doc.element_mut(div).unwrap().add_class("syntaxhighlighter");

        let root = doc.root();
        let report = scan_code(&mut doc, root, &mut processed, &mut containers, &mut actions);
        assert_eq!(report.rewritten, 1);
    }
}
