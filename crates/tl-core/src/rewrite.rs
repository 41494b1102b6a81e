//! Text node rewrite: split a run of text around its URL matches.

use crate::actions::ActionController;
use crate::dom::{Document, DomError, NodeId};
use crate::marker::{create_marked, HIGHLIGHT_CLASS};
use crate::matcher::MatchSpan;
use crate::processed::ProcessedSet;

/// Nodes produced by one rewrite.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RewriteReport {
    pub highlights: Vec<NodeId>,
    pub controls: Vec<NodeId>,
    /// Gap and remainder text runs
    pub texts: Vec<NodeId>,
}

/// Replace `text_node` with
/// `[gap, highlight, control]* remainder` in a single structural edit.
///
/// `matches` must be non-empty, ordered and non-overlapping, with offsets
/// into the node's current text. New text runs are added to `processed`
/// so later scans in the same epoch skip them.
pub fn rewrite(
    doc: &mut Document,
    text_node: NodeId,
    matches: &[MatchSpan],
    processed: &mut ProcessedSet,
    controls: &mut ActionController,
) -> Result<RewriteReport, DomError> {
    debug_assert!(!matches.is_empty(), "rewrite called without matches");

    let source = doc
        .text(text_node)
        .ok_or(DomError::NotText(text_node))?
        .to_owned();
    if doc.parent(text_node).is_none() {
        return Err(DomError::NotAttached(text_node));
    }

    let mut report = RewriteReport::default();
    let mut fragment = Vec::with_capacity(matches.len() * 3 + 1);
    let mut cursor = 0;

    for span in matches {
        if span.start > cursor {
            let gap = doc.create_text(&source[cursor..span.start]);
            processed.insert(gap);
            report.texts.push(gap);
            fragment.push(gap);
        }

        let highlight = create_marked(doc, "span", HIGHLIGHT_CLASS)?;
        let url = doc.create_text(span.text.as_str());
        doc.append_child(highlight, url)?;
        processed.insert(url);
        report.highlights.push(highlight);
        fragment.push(highlight);

        let control = controls.create_control(doc, &span.text)?;
        report.controls.push(control);
        fragment.push(control);

        cursor = span.end;
    }

    if cursor < source.len() {
        let rest = doc.create_text(&source[cursor..]);
        processed.insert(rest);
        report.texts.push(rest);
        fragment.push(rest);
    }

    if let Err(e) = doc.replace_with(text_node, &fragment) {
        // Nothing was attached; free the orphans before reporting.
        for node in fragment {
            controls.forget(node);
            let _ = doc.release(node);
        }
        return Err(e);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineOptions;
    use crate::marker::CONTROL_CLASS;
    use crate::matcher::find;

    fn paragraph(doc: &mut Document, text: &str) -> (NodeId, NodeId) {
        let body = doc.body().unwrap();
        let p = doc.create_element("p");
        let t = doc.create_text(text);
        doc.append_child(p, t).unwrap();
        doc.append_child(body, p).unwrap();
        (p, t)
    }

    #[test]
    fn test_rewrite_layout() {
        let mut doc = Document::new_html();
        let mut processed = ProcessedSet::new();
        let mut actions = ActionController::new(EngineOptions::default());
        let source = "see https://arxiv.org/abs/1 and https://github.com/x done";
        let (p, t) = paragraph(&mut doc, source);

        let matches = find(source);
        let report = rewrite(&mut doc, t, &matches, &mut processed, &mut actions).unwrap();

        assert_eq!(report.highlights.len(), 2);
        assert_eq!(report.controls.len(), 2);
        assert_eq!(report.texts.len(), 3);
        assert_eq!(doc.children(p).count(), 7);
        assert!(!doc.is_connected(t));

        let labels: Vec<String> = report.controls.iter().map(|&c| doc.text_content(c)).collect();
        assert_eq!(labels, vec!["arXiv", "GitHub"]);
        assert_eq!(doc.text_content(report.highlights[0]), "https://arxiv.org/abs/1");

        // Text without controls reproduces the source.
        let mut text = String::new();
        for child in doc.children(p) {
            if !doc.element(child).map(|el| el.has_class(CONTROL_CLASS)).unwrap_or(false) {
                text.push_str(&doc.text_content(child));
            }
        }
        assert_eq!(text, source);

        for &run in &report.texts {
            assert!(processed.contains(run));
        }
    }

    #[test]
    fn test_url_filling_whole_node_has_no_gap_runs() {
        let mut doc = Document::new_html();
        let mut processed = ProcessedSet::new();
        let mut actions = ActionController::new(EngineOptions::default());
        let (p, t) = paragraph(&mut doc, "https://doi.org/10.1/x");

        let matches = find("https://doi.org/10.1/x");
        let report = rewrite(&mut doc, t, &matches, &mut processed, &mut actions).unwrap();
        assert!(report.texts.is_empty());
        assert_eq!(
            doc.children(p).collect::<Vec<_>>(),
            vec![report.highlights[0], report.controls[0]]
        );
        assert_eq!(doc.text_content(report.controls[0]), "DOI");
    }

    #[test]
    fn test_detached_node_is_rejected() {
        let mut doc = Document::new_html();
        let mut processed = ProcessedSet::new();
        let mut actions = ActionController::new(EngineOptions::default());
        let t = doc.create_text("https://example.com");
        let matches = find("https://example.com");
        assert_eq!(
            rewrite(&mut doc, t, &matches, &mut processed, &mut actions),
            Err(DomError::NotAttached(t))
        );
    }
}
