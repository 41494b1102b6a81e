//! TextLinks HTML adapter
//!
//! Converts HTML text into the `tl-core` document arena and back. Parsing
//! is delegated to `scraper` (html5ever); serialization is a small
//! iterative writer over the arena.

use scraper::{Html, Node};
use tl_core::dom::{Document, DomError, Element, Namespace, NodeData, NodeId};

/// Elements with no end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text is written without escaping.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "xmp", "iframe", "noembed", "noframes"];

// =============================================================================
// Parsing
// =============================================================================

/// Parse a full HTML document. Doctype and processing instructions are
/// dropped; everything else is kept, whitespace-only text included.
pub fn parse_document(html: &str) -> Document {
    let parsed = Html::parse_document(html);
    let mut doc = Document::new();
    let root = doc.root();
    let imported = import(&mut doc, root, &parsed, false);
    if let Err(e) = imported {
        // Building under a fresh root only fails on malformed trees.
        log::warn!("html import stopped early: {e}");
    }
    doc
}

/// Parse an HTML fragment into detached nodes owned by `doc`.
///
/// The returned top-level nodes are not attached anywhere, so building them
/// produces no mutation records.
pub fn parse_fragment(doc: &mut Document, html: &str) -> Result<Vec<NodeId>, DomError> {
    let parsed = Html::parse_fragment(html);
    let container = doc.create_element("template");
    import(doc, container, &parsed, true)?;

    let nodes: Vec<NodeId> = doc.children(container).collect();
    for &node in &nodes {
        doc.remove(node)?;
    }
    doc.release(container)?;
    Ok(nodes)
}

/// Parse `html` and append the resulting nodes to `parent`, one insertion
/// per top-level node.
pub fn append_fragment(
    doc: &mut Document,
    parent: NodeId,
    html: &str,
) -> Result<Vec<NodeId>, DomError> {
    let nodes = parse_fragment(doc, html)?;
    for &node in &nodes {
        doc.append_child(parent, node)?;
    }
    Ok(nodes)
}

/// Copy parsed nodes below `parent`. A fragment is imported from inside its
/// synthetic `<html>` wrapper.
fn import(doc: &mut Document, parent: NodeId, parsed: &Html, fragment: bool) -> Result<(), DomError> {
    let source = if fragment {
        *parsed.root_element()
    } else {
        parsed.tree.root()
    };

    let mut stack = Vec::new();
    let children: Vec<_> = source.children().collect();
    stack.extend(children.into_iter().rev().map(|child| (child, parent)));

    while let Some((node, parent)) = stack.pop() {
        let created = match node.value() {
            Node::Element(el) => {
                let mut element = Element::with_namespace(el.name(), Namespace::from_uri(&el.name.ns));
                for (name, value) in el.attrs() {
                    element.set_attr(name, value);
                }
                doc.adopt_element(element)
            }
            Node::Text(text) => doc.create_text(text.text.to_string()),
            Node::Comment(comment) => doc.create_comment(comment.comment.to_string()),
            _ => continue,
        };

        doc.append_child(parent, created)?;
        if node.value().is_element() {
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, created)));
        }
    }
    Ok(())
}

// =============================================================================
// Serialization
// =============================================================================

enum Step {
    Open(NodeId),
    Close(NodeId),
}

/// Serialize the whole document, with an HTML5 doctype.
pub fn serialize(doc: &Document) -> String {
    let mut out = String::from("<!DOCTYPE html>");
    out.push_str(&inner_html(doc, doc.root()));
    out
}

/// Markup of `node` including its own tags.
pub fn outer_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_nodes(doc, std::iter::once(node), &mut out);
    out
}

/// Markup of `node`'s children.
pub fn inner_html(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_nodes(doc, doc.children(node), &mut out);
    out
}

fn write_nodes(doc: &Document, nodes: impl DoubleEndedIterator<Item = NodeId>, out: &mut String) {
    let mut stack: Vec<Step> = nodes.rev().map(Step::Open).collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Close(node) => {
                if let Ok(NodeData::Element(el)) = doc.data(node) {
                    out.push_str("</");
                    out.push_str(el.name());
                    out.push('>');
                }
            }
            Step::Open(node) => match doc.data(node) {
                Ok(NodeData::Element(el)) => {
                    out.push('<');
                    out.push_str(el.name());
                    for (name, value) in el.attrs() {
                        out.push(' ');
                        out.push_str(name);
                        out.push_str("=\"");
                        escape_into(value, true, out);
                        out.push('"');
                    }
                    out.push('>');
                    if VOID_ELEMENTS.contains(&el.name()) {
                        continue;
                    }
                    stack.push(Step::Close(node));
                    stack.extend(doc.children(node).rev().map(Step::Open));
                }
                Ok(NodeData::Text(text)) => {
                    if in_raw_text(doc, node) {
                        out.push_str(text);
                    } else {
                        escape_into(text, false, out);
                    }
                }
                Ok(NodeData::Comment(text)) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                Ok(NodeData::Document) => {
                    stack.extend(doc.children(node).rev().map(Step::Open));
                }
                Err(_) => {}
            },
        }
    }
}

fn in_raw_text(doc: &Document, text: NodeId) -> bool {
    match doc.parent(text).map(|p| doc.data(p)) {
        Some(Ok(NodeData::Element(el))) => RAW_TEXT_ELEMENTS.contains(&el.name()),
        _ => false,
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tl_core::marker::{count_marked, CONTROL_CLASS, HIGHLIGHT_CLASS};
    use tl_core::{EngineOptions, Engine, MemoryHost, Timestamp};

    fn engine_for(html: &str) -> Engine<MemoryHost> {
        let doc = parse_document(html);
        let mut engine = Engine::new(doc, MemoryHost::new(), EngineOptions::default()).unwrap();
        engine.start().unwrap();
        engine
    }

    fn body_html(engine: &Engine<MemoryHost>) -> String {
        let doc = engine.document();
        inner_html(doc, doc.body().unwrap())
    }

    #[test]
    fn test_parse_and_serialize() {
        let doc = parse_document(
            "<!doctype html><html><head><title>T</title></head>\
             <body><p class=\"x\">a &amp; b<br>c</p><!-- note --></body></html>",
        );
        assert_eq!(doc.title().as_deref(), Some("T"));
        assert_eq!(
            serialize(&doc),
            "<!DOCTYPE html><html><head><title>T</title></head>\
             <body><p class=\"x\">a &amp; b<br>c</p><!-- note --></body></html>"
        );
    }

    #[test]
    fn test_raw_text_is_not_escaped() {
        let doc = parse_document("<body><script>if (a < b && c) {}</script></body>");
        let body = doc.body().unwrap();
        assert_eq!(inner_html(&doc, body), "<script>if (a < b && c) {}</script>");
    }

    #[test]
    fn test_fragment_nodes_start_detached() {
        let mut doc = parse_document("<body></body>");
        let nodes = parse_fragment(&mut doc, "<p>one</p>two<b>three</b>").unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(nodes.iter().all(|&n| doc.parent(n).is_none()));

        let body = doc.body().unwrap();
        append_fragment(&mut doc, body, "<i>x</i>").unwrap();
        assert_eq!(inner_html(&doc, body), "<i>x</i>");
    }

    #[test]
    fn test_svg_namespace_is_kept() {
        let doc = parse_document("<body><svg><text>https://a.com</text></svg></body>");
        let svg = doc.first_element("svg").unwrap();
        assert_eq!(doc.element(svg).unwrap().namespace(), Namespace::Svg);
    }

    #[test]
    fn test_code_block_markup() {
        let engine = engine_for("<body><pre>  curl https://api.example.com/v1\n  done</pre></body>");
        assert_eq!(
            body_html(&engine),
            "<pre>  curl <span class=\"highlighted-url\">https://api.example.com/v1</span>\
             <button class=\"text-link-button\" type=\"button\" \
             title=\"Open: https://api.example.com/v1\" \
             data-url=\"https://api.example.com/v1\">open</button>\n  done</pre>"
        );
    }

    #[test]
    fn test_labels_from_markup() {
        let engine = engine_for(
            "<body><p>ref https://doi.org/10.1/x</p><p>https://github.com/o/r</p>\
             <p>https://arxiv.org/abs/1</p><p>https://www.youtube.com/watch?v=1</p>\
             <p>https://example.net</p></body>",
        );
        let doc = engine.document();
        let labels: Vec<String> = engine
            .actions()
            .controls()
            .map(|c| doc.text_content(c))
            .collect();
        let mut sorted = labels.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["DOI", "GitHub", "arXiv", "open", "video"]);
    }

    #[test]
    fn test_anchor_and_form_content_untouched() {
        let source = "<body><a href=\"https://a.com\">https://a.com</a>\
                      <button>https://b.com</button><textarea>https://c.com</textarea>\
                      <style>.x { background: url(https://d.com/i.png) }</style></body>";
        let engine = engine_for(source);
        assert_eq!(count_marked(engine.document(), HIGHLIGHT_CLASS), 0);
    }

    #[test]
    fn test_toggle_off_restores_markup_text() {
        let mut engine = engine_for(
            "<body><p>one https://a.com</p><div><span>two https://b.com three https://c.com</span></div></body>",
        );
        assert_eq!(count_marked(engine.document(), CONTROL_CLASS), 3);

        engine.toggle(Timestamp::from_millis(0)).unwrap();
        assert_eq!(count_marked(engine.document(), HIGHLIGHT_CLASS), 0);
        assert_eq!(count_marked(engine.document(), CONTROL_CLASS), 0);

        // Drop the notice before comparing text.
        engine.tick(Timestamp::from_millis(2_000)).unwrap();
        engine.tick(Timestamp::from_millis(2_300)).unwrap();
        let doc = engine.document();
        assert_eq!(
            doc.text_content(doc.body().unwrap()),
            "one https://a.comtwo https://b.com three https://c.com"
        );
    }

    #[test]
    fn test_inserted_fragment_is_processed() {
        let mut engine = engine_for("<body><main></main></body>");
        let doc = engine.document_mut();
        let main = doc.first_element("main").unwrap();
        append_fragment(doc, main, "<div><p>see https://example.com/a for details</p></div>").unwrap();

        let report = engine.flush_mutations();
        assert_eq!(report.highlights, 1);
        let doc = engine.document();
        assert_eq!(
            inner_html(doc, main),
            "<div><p>see <span class=\"highlighted-url\">https://example.com/a</span>\
             <button class=\"text-link-button\" type=\"button\" title=\"Open: https://example.com/a\" \
             data-url=\"https://example.com/a\">open</button> for details</p></div>"
        );
    }
}
