//! Boundary to the surrounding extension: settings storage, privileged
//! navigation, clipboard and page location.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::protocol::{BackgroundRequest, OpenAck};

/// Failures reported by a host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Where a direct (same-process) open should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenTarget {
    NewTab,
    NewWindow { width: u32, height: u32 },
}

/// Popup-sized window used by the "open in new window" menu item.
pub const NEW_WINDOW: OpenTarget = OpenTarget::NewWindow {
    width: 1200,
    height: 800,
};

/// Services the engine consumes but does not own.
pub trait Host {
    /// Read one key from the persistent settings store.
    fn load_setting(&self, key: &str) -> Result<Option<Value>, HostError>;

    /// Write one key to the persistent settings store.
    fn store_setting(&mut self, key: &str, value: Value) -> Result<(), HostError>;

    /// Ask the privileged side to open a URL. An `Err` means the request
    /// never reached it.
    fn send_open_request(&mut self, request: &BackgroundRequest) -> Result<OpenAck, HostError>;

    /// Open a URL from the page itself.
    fn open_direct(&mut self, url: &str, target: OpenTarget);

    fn write_clipboard(&mut self, text: &str) -> Result<(), HostError>;

    /// Hostname of the current page, if it has one.
    fn current_host(&self) -> Option<String>;
}

// =============================================================================
// In-memory host
// =============================================================================

/// Host backed by plain collections. Records every side effect so callers
/// can inspect what the engine asked for.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    pub settings: BTreeMap<String, Value>,
    pub page_host: Option<String>,
    /// When false, `send_open_request` fails as if the background were gone.
    pub transport_available: bool,
    /// When set, the background answers open requests with this refusal.
    pub refuse_opens: Option<String>,
    /// URLs accepted by the privileged side.
    pub background_opens: Vec<String>,
    /// URLs opened through the same-process fallback.
    pub direct_opens: Vec<(String, OpenTarget)>,
    pub clipboard: Vec<String>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self {
            settings: BTreeMap::new(),
            page_host: None,
            transport_available: true,
            refuse_opens: None,
            background_opens: Vec::new(),
            direct_opens: Vec::new(),
            clipboard: Vec::new(),
        }
    }

    pub fn with_page_host(mut self, host: &str) -> Self {
        self.page_host = Some(host.to_string());
        self
    }

    pub fn insert_setting(&mut self, key: &str, value: Value) {
        self.settings.insert(key.to_string(), value);
    }
}

impl Host for MemoryHost {
    fn load_setting(&self, key: &str) -> Result<Option<Value>, HostError> {
        Ok(self.settings.get(key).cloned())
    }

    fn store_setting(&mut self, key: &str, value: Value) -> Result<(), HostError> {
        self.settings.insert(key.to_string(), value);
        Ok(())
    }

    fn send_open_request(&mut self, request: &BackgroundRequest) -> Result<OpenAck, HostError> {
        if !self.transport_available {
            return Err(HostError::Transport("receiving end does not exist".to_string()));
        }
        if let Some(reason) = &self.refuse_opens {
            return Ok(OpenAck::failed(reason.clone()));
        }
        match request {
            BackgroundRequest::OpenUrl { url } => {
                self.background_opens.push(url.clone());
                Ok(OpenAck::opened())
            }
        }
    }

    fn open_direct(&mut self, url: &str, target: OpenTarget) {
        self.direct_opens.push((url.to_string(), target));
    }

    fn write_clipboard(&mut self, text: &str) -> Result<(), HostError> {
        self.clipboard.push(text.to_string());
        Ok(())
    }

    fn current_host(&self) -> Option<String> {
        self.page_host.clone()
    }
}
