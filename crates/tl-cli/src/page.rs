use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::Value;
use tl_core::{Engine, EngineOptions, MemoryHost};

/// Inputs for building an engine over an HTML file.
pub struct PageOptions<'a> {
    pub input: &'a str,
    pub page_host: Option<&'a str>,
    pub settings_path: Option<&'a str>,
    pub options_json: Option<&'a str>,
}

pub fn read_text(path: &str) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))
}

/// Settings file: a JSON object of storage keys, e.g.
/// `{"textLinksEnabled": false, "disabledSites": ["example.com"]}`.
pub fn read_settings(path: &str) -> Result<BTreeMap<String, Value>, String> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|e| format!("Invalid settings in '{}': {}", path, e))
}

pub fn parse_options(json: Option<&str>) -> Result<EngineOptions, String> {
    match json {
        Some(json) => EngineOptions::from_json(json).map_err(|e| format!("Invalid options: {}", e)),
        None => Ok(EngineOptions::default()),
    }
}

/// Parse the input file into an engine that has not been started yet.
pub fn load_engine(opts: &PageOptions<'_>) -> Result<Engine<MemoryHost>, String> {
    let html = read_text(opts.input)?;
    let options = parse_options(opts.options_json)?;

    let mut host = MemoryHost::new();
    if let Some(page_host) = opts.page_host {
        host = host.with_page_host(page_host);
    }
    if let Some(path) = opts.settings_path {
        host.settings = read_settings(path)?;
    }

    let doc = tl_html::parse_document(&html);
    log::debug!("parsed '{}' into {} nodes", opts.input, doc.len());
    Engine::new(doc, host, options).map_err(|e| format!("Failed to prepare '{}': {}", opts.input, e))
}

pub fn write_text(path: &Path, text: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
        }
    }
    fs::write(path, text).map_err(|e| format!("Failed to write '{}': {}", path.display(), e))
}

/// Body text of the engine's document, or the whole document's text when
/// there is no body.
pub fn body_text(engine: &Engine<MemoryHost>) -> String {
    let doc = engine.document();
    doc.text_content(doc.body().unwrap_or_else(|| doc.root()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_defaults() {
        assert_eq!(parse_options(None).unwrap(), EngineOptions::default());
        let opts = parse_options(Some(r#"{"hoverDelayMs": 50}"#)).unwrap();
        assert_eq!(opts.hover_delay_ms, 50);
        assert_eq!(opts.feedback_ms, 1_500);
        assert!(parse_options(Some("{")).is_err());
    }

    #[test]
    fn test_missing_file_message() {
        let err = read_text("/definitely/not/here.html").unwrap_err();
        assert!(err.starts_with("Failed to read '/definitely/not/here.html'"));
    }
}
