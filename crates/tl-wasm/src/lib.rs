//! WebAssembly bindings for TextLinks
//!
//! The content-script glue builds a [`TextLinkSession`] from the page's
//! markup, forwards popup messages, key presses, pointer events and a
//! millisecond clock, and applies the queued effects it gets back.

mod host;
mod logger;

use std::collections::BTreeMap;

use serde_json::Value;
use tl_core::dom::NodeId;
use tl_core::marker::MENU_ACTION_ATTR;
use tl_core::protocol::KeyEvent;
use tl_core::{Engine, EngineOptions, Point, Timestamp};
use wasm_bindgen::prelude::*;

use crate::host::JsHost;

pub use logger::init_logging;

fn js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn timestamp(now: f64) -> Timestamp {
    Timestamp::from_millis(now.max(0.0) as u64)
}

/// URL matches in `text` as `{ text, start, end }` objects.
#[wasm_bindgen]
pub fn find_urls(text: &str) -> js_sys::Array {
    let out = js_sys::Array::new();
    for span in tl_core::find(text) {
        let obj = js_sys::Object::new();
        let _ = js_sys::Reflect::set(&obj, &"text".into(), &JsValue::from_str(&span.text));
        let _ = js_sys::Reflect::set(&obj, &"start".into(), &JsValue::from(span.start as u32));
        let _ = js_sys::Reflect::set(&obj, &"end".into(), &JsValue::from(span.end as u32));
        out.push(&obj);
    }
    out
}

/// Short control label for a URL.
#[wasm_bindgen]
pub fn label_for_url(url: &str) -> String {
    tl_core::label_for(url).to_string()
}

// =============================================================================
// Session
// =============================================================================

/// One engine bound to one page.
#[wasm_bindgen]
pub struct TextLinkSession {
    engine: Engine<JsHost>,
}

#[wasm_bindgen]
impl TextLinkSession {
    /// `settings_json` is the object read from storage (may be absent);
    /// `options_json` overrides engine timings.
    #[wasm_bindgen(constructor)]
    pub fn new(
        html: &str,
        page_host: Option<String>,
        settings_json: Option<String>,
        options_json: Option<String>,
    ) -> Result<TextLinkSession, JsValue> {
        let settings: BTreeMap<String, Value> = match settings_json {
            Some(json) => serde_json::from_str(&json)
                .map_err(|e| js_error(format!("Invalid settings: {e}")))?,
            None => BTreeMap::new(),
        };
        let options = match options_json {
            Some(json) => EngineOptions::from_json(&json)
                .map_err(|e| js_error(format!("Invalid options: {e}")))?,
            None => EngineOptions::default(),
        };

        let doc = tl_html::parse_document(html);
        let host = JsHost::new(page_host, settings);
        let engine = Engine::new(doc, host, options).map_err(js_error)?;
        Ok(Self { engine })
    }

    /// Function called with the `openUrl` request JSON; must return the ack
    /// JSON. Without one every open falls back to a direct open.
    #[wasm_bindgen(js_name = setOpenHandler)]
    pub fn set_open_handler(&mut self, handler: js_sys::Function) {
        self.engine.host_mut().set_open_handler(handler);
    }

    /// Returns whether the page was scanned.
    pub fn start(&mut self) -> Result<bool, JsValue> {
        Ok(self.engine.start().map_err(js_error)?.is_some())
    }

    #[wasm_bindgen(js_name = handleMessage)]
    pub fn handle_message(&mut self, json: &str, now: f64) -> Result<String, JsValue> {
        self.engine
            .handle_message_json(json, timestamp(now))
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = handleKey)]
    pub fn handle_key(
        &mut self,
        key: &str,
        alt: bool,
        shift: bool,
        ctrl: bool,
        meta: bool,
        now: f64,
    ) -> Result<bool, JsValue> {
        let event = KeyEvent {
            key: key.to_string(),
            alt,
            shift,
            ctrl,
            meta,
        };
        self.engine.handle_key(&event, timestamp(now)).map_err(js_error)
    }

    /// Page-side insertion of markup at the end of `<body>`.
    #[wasm_bindgen(js_name = appendToBody)]
    pub fn append_to_body(&mut self, html: &str) -> Result<(), JsValue> {
        let doc = self.engine.document_mut();
        let body = doc.body().unwrap_or_else(|| doc.root());
        tl_html::append_fragment(doc, body, html).map_err(js_error)?;
        Ok(())
    }

    /// Deliver pending mutations. Returns how many text nodes were rewritten.
    #[wasm_bindgen(js_name = flushMutations)]
    pub fn flush_mutations(&mut self) -> u32 {
        self.engine.flush_mutations().rewritten as u32
    }

    pub fn rollback(&mut self) {
        self.engine.rollback();
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    #[wasm_bindgen(js_name = controlHandles)]
    pub fn control_handles(&self) -> Vec<u64> {
        self.engine.actions().controls().map(NodeId::to_bits).collect()
    }

    #[wasm_bindgen(js_name = controlUrl)]
    pub fn control_url(&self, handle: u64) -> Option<String> {
        self.engine
            .actions()
            .url(NodeId::from_bits(handle))
            .map(str::to_string)
    }

    pub fn activate(&mut self, handle: u64, now: f64) -> Result<bool, JsValue> {
        self.engine
            .activate_control(NodeId::from_bits(handle), timestamp(now))
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = openMenu)]
    pub fn open_menu(&mut self, handle: u64, x: i32, y: i32) -> Result<Option<u64>, JsValue> {
        let menu = self
            .engine
            .open_context_menu(NodeId::from_bits(handle), Point::new(x, y))
            .map_err(js_error)?;
        Ok(menu.map(NodeId::to_bits))
    }

    /// Handle of the open menu's row for `action` (e.g. `"copy-url"`).
    #[wasm_bindgen(js_name = menuRow)]
    pub fn menu_row(&self, action: &str) -> Option<u64> {
        let (menu, _) = self.engine.actions().menu()?;
        let doc = self.engine.document();
        doc.children(menu)
            .find(|&row| {
                doc.element(row)
                    .map(|el| el.attr(MENU_ACTION_ATTR) == Some(action))
                    .unwrap_or(false)
            })
            .map(NodeId::to_bits)
    }

    /// Click on `target`: runs a menu item if it is inside the open menu,
    /// otherwise dismisses the menu. Returns the item run, if any.
    pub fn click(&mut self, target: u64, now: f64) -> Result<Option<String>, JsValue> {
        let target = NodeId::from_bits(target);
        let item = self
            .engine
            .choose_menu_item(target, timestamp(now))
            .map_err(js_error)?;
        if item.is_none() {
            self.engine.pointer_down(target).map_err(js_error)?;
        }
        Ok(item.map(|i| i.as_str().to_string()))
    }

    #[wasm_bindgen(js_name = pointerEnter)]
    pub fn pointer_enter(&mut self, handle: u64, x: i32, y: i32, now: f64) -> Result<(), JsValue> {
        self.engine
            .pointer_enter(NodeId::from_bits(handle), Point::new(x, y), timestamp(now))
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = pointerLeave)]
    pub fn pointer_leave(&mut self, handle: u64, now: f64) -> Result<(), JsValue> {
        self.engine
            .pointer_leave(NodeId::from_bits(handle), timestamp(now))
            .map_err(js_error)
    }

    // -------------------------------------------------------------------------
    // Time and output
    // -------------------------------------------------------------------------

    pub fn tick(&mut self, now: f64) -> Result<(), JsValue> {
        self.engine.tick(timestamp(now)).map_err(js_error)?;
        Ok(())
    }

    #[wasm_bindgen(js_name = nextDeadline)]
    pub fn next_deadline(&self) -> Option<f64> {
        self.engine.next_deadline().map(|t| t.as_millis() as f64)
    }

    #[wasm_bindgen(js_name = isEnabled)]
    pub fn is_enabled(&self) -> bool {
        self.engine.is_enabled()
    }

    /// Serialized document.
    pub fn html(&self) -> String {
        tl_html::serialize(self.engine.document())
    }

    #[wasm_bindgen(js_name = takeEffects)]
    pub fn take_effects(&mut self) -> js_sys::Array {
        self.engine
            .host_mut()
            .take_effects()
            .iter()
            .map(|effect| effect.to_js())
            .collect()
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn session(html: &str) -> TextLinkSession {
        let mut session = TextLinkSession::new(html, Some("example.com".into()), None, None).unwrap();
        assert!(session.start().unwrap());
        session
    }

    #[wasm_bindgen_test]
    fn test_find_urls_shape() {
        let matches = find_urls("a https://x.com b");
        assert_eq!(matches.length(), 1);
        let first = matches.get(0);
        let start = js_sys::Reflect::get(&first, &"start".into()).unwrap();
        assert_eq!(start.as_f64(), Some(2.0));
    }

    #[wasm_bindgen_test]
    fn test_session_scans_and_reports_stats() {
        let mut session = session("<body><p>https://github.com/o/r</p></body>");
        assert_eq!(
            session.handle_message(r#"{"action":"getStats"}"#, 0.0).unwrap(),
            r#"{"buttons":1,"urls":1}"#
        );
        assert_eq!(label_for_url("https://github.com/o/r"), "GitHub");
    }

    #[wasm_bindgen_test]
    fn test_activation_without_handler_falls_back() {
        let mut session = session("<body><p>https://a.com</p></body>");
        let handle = session.control_handles()[0];
        assert!(session.activate(handle, 0.0).unwrap());
        let effects = session.take_effects();
        assert_eq!(effects.length(), 1);
        let kind = js_sys::Reflect::get(&effects.get(0), &"kind".into()).unwrap();
        assert_eq!(kind.as_string().as_deref(), Some("openDirect"));
    }

    #[wasm_bindgen_test]
    fn test_menu_copy_url() {
        let mut session = session("<body><p>https://a.com</p></body>");
        let handle = session.control_handles()[0];
        session.open_menu(handle, 1, 1).unwrap();
        let row = session.menu_row("copy-url").unwrap();
        assert_eq!(session.click(row, 0.0).unwrap().as_deref(), Some("copy-url"));
        let effects = session.take_effects();
        let text = js_sys::Reflect::get(&effects.get(0), &"text".into()).unwrap();
        assert_eq!(text.as_string().as_deref(), Some("https://a.com"));
    }

    #[wasm_bindgen_test]
    fn test_toggle_shortcut_round_trip() {
        let mut session = session("<body><p>see https://a.com</p></body>");
        assert!(session.handle_key("L", true, true, false, false, 0.0).unwrap());
        assert!(!session.is_enabled());
        assert_eq!(
            session.handle_message(r#"{"action":"getStats"}"#, 0.0).unwrap(),
            r#"{"buttons":0,"urls":0}"#
        );
        assert!(session.html().contains("<p>see https://a.com</p>"));
    }
}
