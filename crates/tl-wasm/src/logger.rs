//! Console logging for the content script.

use std::sync::Once;

use log::Level;
use wasm_bindgen::prelude::*;

static INSTALL: Once = Once::new();

/// Install the console logger and panic hook. `level` is a `log` level
/// name such as `"debug"`; unknown or missing values mean `info`.
///
/// The first call fixes the most verbose level the console will show;
/// later calls can only narrow it.
#[wasm_bindgen]
pub fn init_logging(level: Option<String>) {
    let level = parse_level(level.as_deref());
    INSTALL.call_once(|| {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(level));
    });
    log::set_max_level(level.to_level_filter());
}

fn parse_level(level: Option<&str>) -> Level {
    level.and_then(|l| l.parse().ok()).unwrap_or(Level::Info)
}
