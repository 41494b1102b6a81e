//! Engine markers and the injected stylesheet.
//!
//! Every node the engine authors carries one of these classes. The
//! classifier uses them to skip engine output, rollback and statistics use
//! them to find it again.

use crate::dom::{Document, DomError, Element, NodeId};

/// Highlight wrapper around a matched URL.
pub const HIGHLIGHT_CLASS: &str = "highlighted-url";
/// Action control placed after each highlight.
pub const CONTROL_CLASS: &str = "text-link-button";
/// Hover preview.
pub const TOOLTIP_CLASS: &str = "text-link-tooltip";
/// Context menu.
pub const MENU_CLASS: &str = "text-link-menu";
/// Transient toggle notice.
pub const NOTIFICATION_CLASS: &str = "text-link-notification";

pub const ENGINE_CLASSES: [&str; 5] = [
    HIGHLIGHT_CLASS,
    CONTROL_CLASS,
    TOOLTIP_CLASS,
    MENU_CLASS,
    NOTIFICATION_CLASS,
];

/// Attribute carrying the control's URL.
pub const URL_ATTR: &str = "data-url";
/// Attribute carrying a menu item's action.
pub const MENU_ACTION_ATTR: &str = "data-menu-action";
/// Attribute toggled while a control shows activation feedback.
pub const STATE_ATTR: &str = "data-state";

/// Class toggled on a visible tooltip.
pub const SHOW_CLASS: &str = "show";

/// Id of the injected `<style>` element.
pub const STYLE_ELEMENT_ID: &str = "text-link-styles";

pub const STYLESHEET: &str = "\
.highlighted-url { background: rgba(102, 126, 234, 0.12); border-radius: 3px; }
.text-link-button { display: inline-block; margin-left: 4px; padding: 0 6px; font-size: 11px; line-height: 16px; border: none; border-radius: 8px; color: #fff; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); cursor: pointer; }
.text-link-button[data-state=\"activated\"] { background: linear-gradient(135deg, #4CAF50 0%, #2E7D32 100%); opacity: 0.9; }
.text-link-tooltip { position: fixed; padding: 4px 8px; font-size: 12px; color: #fff; background: rgba(0, 0, 0, 0.8); border-radius: 4px; z-index: 10001; opacity: 0; transition: opacity 0.2s; pointer-events: none; }
.text-link-tooltip.show { opacity: 1; }
.text-link-menu { position: fixed; background: white; border: 1px solid #ddd; border-radius: 6px; box-shadow: 0 4px 12px rgba(0,0,0,0.15); z-index: 10002; min-width: 180px; }
.text-link-notification { position: fixed; top: 20px; right: 20px; color: white; padding: 12px 20px; border-radius: 8px; background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); z-index: 10000; animation: slideInRight 0.3s ease; }
.text-link-notification.leaving { animation: slideOutRight 0.3s ease; }
@keyframes slideInRight { from { transform: translateX(100%); opacity: 0; } to { transform: translateX(0); opacity: 1; } }
@keyframes slideOutRight { from { transform: translateX(0); opacity: 1; } to { transform: translateX(100%); opacity: 0; } }
";

/// Does this element carry any engine marker?
#[inline]
pub fn is_engine_element(element: &Element) -> bool {
    element.classes().any(|c| ENGINE_CLASSES.contains(&c))
}

/// Create an element tagged with an engine marker class.
pub fn create_marked(doc: &mut Document, tag: &str, class: &str) -> Result<NodeId, DomError> {
    let node = doc.create_element(tag);
    doc.element_mut(node)?.add_class(class);
    Ok(node)
}

/// Insert the stylesheet into `<head>` once. Returns whether it was added.
pub fn inject_styles(doc: &mut Document) -> Result<bool, DomError> {
    if doc.element_by_id(STYLE_ELEMENT_ID).is_some() {
        return Ok(false);
    }
    let parent = doc.head().or_else(|| doc.body()).unwrap_or_else(|| doc.root());
    let style = doc.create_element("style");
    doc.element_mut(style)?.set_attr("id", STYLE_ELEMENT_ID);
    let css = doc.create_text(STYLESHEET);
    doc.append_child(style, css)?;
    doc.append_child(parent, style)?;
    Ok(true)
}

/// Count elements carrying `class` anywhere in the document.
pub fn count_marked(doc: &Document, class: &str) -> usize {
    doc.descendants(doc.root())
        .filter(|&n| doc.element(n).map(|el| el.has_class(class)).unwrap_or(false))
        .count()
}
