//! Wire types exchanged with the extension's popup and background sides.
//!
//! Field and tag names match the JSON the JavaScript glue sends. TypeScript
//! definitions are generated from these types by `ts-rs`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Control messages (popup / shortcut -> engine)
// =============================================================================

/// Requests the engine answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "camelCase")]
#[ts(export)]
pub enum ControlMessage {
    /// Flip the enabled state; answers with the new state
    ToggleTextLinks,
    /// Current enabled state
    GetStatus,
    /// Counts of controls and highlights currently in the document
    GetStats,
    /// Fresh full scan without touching the enabled state
    ProcessPage,
}

impl ControlMessage {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusResponse {
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatsResponse {
    /// Action controls in the document
    pub buttons: usize,
    /// Highlighted URL spans in the document
    pub urls: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProcessedResponse {
    pub processed: bool,
}

/// Reply to a `ControlMessage`, serialized without a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum ControlResponse {
    Status(StatusResponse),
    Stats(StatsResponse),
    Processed(ProcessedResponse),
}

impl ControlResponse {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// =============================================================================
// Background requests (engine -> privileged side)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "action", rename_all = "camelCase")]
#[ts(export)]
pub enum BackgroundRequest {
    /// Open `url` in a new tab from the privileged side
    OpenUrl { url: String },
}

/// Acknowledgment of an `openUrl` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OpenAck {
    pub opened: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl OpenAck {
    pub fn opened() -> Self {
        Self {
            opened: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            opened: false,
            error: Some(error.into()),
        }
    }
}

// =============================================================================
// Keyboard
// =============================================================================

/// A key press delivered while focus is inside the document.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyEvent {
    pub key: String,
    pub alt: bool,
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyEvent {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    /// Alt+Shift+L.
    pub fn is_toggle_chord(&self) -> bool {
        self.alt && self.shift && self.key == "L"
    }
}
