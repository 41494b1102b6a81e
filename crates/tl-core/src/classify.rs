//! Node classification for the scanner.

use crate::dom::{Document, DomError, NodeData, NodeId};
use crate::marker::is_engine_element;

/// Elements whose content is executable, styling, or an interactive
/// widget. Never descended into.
const OPAQUE_TAGS: &[&str] = &["script", "style", "button", "input", "textarea", "select"];

/// What the scanner should do with a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Engine-authored node (highlight, control, tooltip, menu, notice)
    SkipEngineUi,
    /// Existing hyperlink
    SkipAnchor,
    /// Script, style, form control, comment
    SkipOpaque,
    /// Generic container: visit children
    Recurse,
    /// Text node: URL candidate
    LeafText,
}

impl Classification {
    #[inline]
    pub fn is_skip(self) -> bool {
        matches!(self, Self::SkipEngineUi | Self::SkipAnchor | Self::SkipOpaque)
    }
}

/// Classify a node.
///
/// Elements whose introspection fails (cross-context content) are treated
/// as plain containers. A stale handle is opaque: there is nothing left to
/// visit.
pub fn classify(doc: &Document, node: NodeId) -> Classification {
    match doc.data(node) {
        Ok(NodeData::Text(_)) => Classification::LeafText,
        Ok(NodeData::Document) => Classification::Recurse,
        Ok(NodeData::Comment(_)) => Classification::SkipOpaque,
        Ok(NodeData::Element(_)) => classify_element(doc, node),
        Err(_) => Classification::SkipOpaque,
    }
}

fn classify_element(doc: &Document, node: NodeId) -> Classification {
    let element = match doc.element(node) {
        Ok(element) => element,
        Err(e @ DomError::CrossOrigin(_)) => {
            log::debug!("classify: {e}, recursing best-effort");
            return Classification::Recurse;
        }
        Err(_) => return Classification::Recurse,
    };

    if is_engine_element(element) {
        Classification::SkipEngineUi
    } else if element.is("a") {
        Classification::SkipAnchor
    } else if OPAQUE_TAGS.contains(&element.name()) {
        Classification::SkipOpaque
    } else {
        Classification::Recurse
    }
}

/// Would any ancestor of `node` have stopped the scanner from reaching it?
///
/// Subtree scans that start below the document root (inserted nodes, code
/// containers) use this so content under an existing link, widget or
/// engine node is never wrapped.
pub fn excluded_by_ancestor(doc: &Document, node: NodeId) -> bool {
    doc.ancestors(node).any(|a| classify(doc, a).is_skip())
}
