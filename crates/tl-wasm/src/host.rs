//! Host implementation backed by the extension's JavaScript glue.
//!
//! Settings live in memory (seeded by the glue from `chrome.storage`).
//! Open requests go through an optional JS callback; every other side
//! effect is queued and drained by the glue with `takeEffects`.

use std::collections::BTreeMap;

use serde_json::Value;
use tl_core::host::{Host, HostError, OpenTarget};
use tl_core::protocol::{BackgroundRequest, OpenAck};
use wasm_bindgen::prelude::*;

/// Side effect the glue must carry out.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Effect {
    StoreSetting { key: String, value: Value },
    OpenDirect { url: String, target: OpenTarget },
    Clipboard { text: String },
}

impl Effect {
    pub(crate) fn to_js(&self) -> JsValue {
        let obj = js_sys::Object::new();
        let set = |key: &str, value: JsValue| {
            let _ = js_sys::Reflect::set(&obj, &key.into(), &value);
        };
        match self {
            Effect::StoreSetting { key, value } => {
                set("kind", "storeSetting".into());
                set("key", key.as_str().into());
                set("value", value.to_string().into());
            }
            Effect::OpenDirect { url, target } => {
                set("kind", "openDirect".into());
                set("url", url.as_str().into());
                match *target {
                    OpenTarget::NewTab => set("features", JsValue::NULL),
                    OpenTarget::NewWindow { width, height } => {
                        set("features", format!("width={width},height={height}").into())
                    }
                }
            }
            Effect::Clipboard { text } => {
                set("kind", "clipboard".into());
                set("text", text.as_str().into());
            }
        }
        obj.into()
    }
}

pub(crate) struct JsHost {
    settings: BTreeMap<String, Value>,
    page_host: Option<String>,
    open_handler: Option<js_sys::Function>,
    effects: Vec<Effect>,
}

impl JsHost {
    pub(crate) fn new(page_host: Option<String>, settings: BTreeMap<String, Value>) -> Self {
        Self {
            settings,
            page_host,
            open_handler: None,
            effects: Vec::new(),
        }
    }

    pub(crate) fn set_open_handler(&mut self, handler: js_sys::Function) {
        self.open_handler = Some(handler);
    }

    pub(crate) fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }
}

impl Host for JsHost {
    fn load_setting(&self, key: &str) -> Result<Option<Value>, HostError> {
        Ok(self.settings.get(key).cloned())
    }

    fn store_setting(&mut self, key: &str, value: Value) -> Result<(), HostError> {
        self.settings.insert(key.to_string(), value.clone());
        self.effects.push(Effect::StoreSetting {
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    /// Calls the handler with the request JSON. It must return the ack as a
    /// JSON string; a throw or a missing handler is a transport failure.
    fn send_open_request(&mut self, request: &BackgroundRequest) -> Result<OpenAck, HostError> {
        let handler = self
            .open_handler
            .as_ref()
            .ok_or_else(|| HostError::Transport("no background handler".to_string()))?;
        let payload =
            serde_json::to_string(request).map_err(|e| HostError::Transport(e.to_string()))?;

        let reply = handler
            .call1(&JsValue::NULL, &JsValue::from_str(&payload))
            .map_err(|e| HostError::Transport(format!("{e:?}")))?;
        let reply = reply
            .as_string()
            .ok_or_else(|| HostError::Transport("ack is not a string".to_string()))?;
        serde_json::from_str(&reply).map_err(|e| HostError::Transport(e.to_string()))
    }

    fn open_direct(&mut self, url: &str, target: OpenTarget) {
        self.effects.push(Effect::OpenDirect {
            url: url.to_string(),
            target,
        });
    }

    fn write_clipboard(&mut self, text: &str) -> Result<(), HostError> {
        self.effects.push(Effect::Clipboard {
            text: text.to_string(),
        });
        Ok(())
    }

    fn current_host(&self) -> Option<String> {
        self.page_host.clone()
    }
}
