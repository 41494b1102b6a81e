//! Persisted settings and engine tuning.

use serde::{Deserialize, Serialize};

use crate::host::Host;

/// Storage key for the toggle state.
pub const ENABLED_KEY: &str = "textLinksEnabled";
/// Storage key for the per-host opt-out list.
pub const DISABLED_SITES_KEY: &str = "disabledSites";

// =============================================================================
// Settings
// =============================================================================

/// Values persisted in the host's settings store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_enabled")]
    pub text_links_enabled: bool,
    #[serde(default)]
    pub disabled_sites: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            text_links_enabled: default_enabled(),
            disabled_sites: Vec::new(),
        }
    }
}

impl Settings {
    /// Read both keys from the host. Missing keys, undecodable values and
    /// storage failures all fall back to defaults.
    pub fn load<H: Host + ?Sized>(host: &H) -> Self {
        let mut settings = Self::default();

        match host.load_setting(ENABLED_KEY) {
            Ok(Some(value)) => match serde_json::from_value::<bool>(value) {
                Ok(enabled) => settings.text_links_enabled = enabled,
                Err(e) => log::warn!("ignoring malformed {ENABLED_KEY}: {e}"),
            },
            Ok(None) => {}
            Err(e) => log::warn!("failed to read {ENABLED_KEY}: {e}"),
        }

        settings.disabled_sites = load_disabled_sites(host);
        settings
    }

    pub fn is_site_disabled(&self, host: &str) -> bool {
        self.disabled_sites.iter().any(|h| h == host)
    }
}

/// Read `disabledSites`, treating any failure as an empty list.
pub fn load_disabled_sites<H: Host + ?Sized>(host: &H) -> Vec<String> {
    match host.load_setting(DISABLED_SITES_KEY) {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|e| {
            log::warn!("ignoring malformed {DISABLED_SITES_KEY}: {e}");
            Vec::new()
        }),
        Ok(None) => Vec::new(),
        Err(e) => {
            log::warn!("failed to read {DISABLED_SITES_KEY}: {e}");
            Vec::new()
        }
    }
}

// =============================================================================
// Engine Options
// =============================================================================

/// Timing and layout constants for the interactive affordances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// How long a control shows its confirmation label after opening
    pub feedback_ms: u64,
    /// Hover time before the preview appears
    pub hover_delay_ms: u64,
    /// Preview fade-out after the pointer leaves
    pub tooltip_fade_ms: u64,
    /// Preview distance above the control
    pub tooltip_offset_px: i32,
    /// Notification display time
    pub notification_ms: u64,
    /// Notification exit animation
    pub notification_exit_ms: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            feedback_ms: 1_500,
            hover_delay_ms: 300,
            tooltip_fade_ms: 200,
            tooltip_offset_px: 35,
            notification_ms: 2_000,
            notification_exit_ms: 300,
        }
    }
}

impl EngineOptions {
    /// Parse options from JSON; absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use serde_json::json;

    #[test]
    fn test_settings_default_enabled_when_absent() {
        let host = MemoryHost::new();
        let settings = Settings::load(&host);
        assert!(settings.text_links_enabled);
        assert!(settings.disabled_sites.is_empty());
    }

    #[test]
    fn test_settings_read_stored_values() {
        let mut host = MemoryHost::new();
        host.insert_setting(ENABLED_KEY, json!(false));
        host.insert_setting(DISABLED_SITES_KEY, json!(["example.com"]));

        let settings = Settings::load(&host);
        assert!(!settings.text_links_enabled);
        assert!(settings.is_site_disabled("example.com"));
        assert!(!settings.is_site_disabled("other.org"));
    }

    #[test]
    fn test_settings_malformed_values_fall_back() {
        let mut host = MemoryHost::new();
        host.insert_setting(ENABLED_KEY, json!("yes"));
        host.insert_setting(DISABLED_SITES_KEY, json!(42));

        assert_eq!(Settings::load(&host), Settings::default());
    }

    #[test]
    fn test_settings_wire_names() {
        let settings: Settings = serde_json::from_str(r#"{"textLinksEnabled":false}"#).unwrap();
        assert!(!settings.text_links_enabled);
    }

    #[test]
    fn test_options_partial_json() {
        let options = EngineOptions::from_json(r#"{"hoverDelayMs": 50}"#).unwrap();
        assert_eq!(options.hover_delay_ms, 50);
        assert_eq!(options.feedback_ms, 1_500);
    }
}
