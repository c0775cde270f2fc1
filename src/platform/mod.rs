//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Logging setup
//! - Wall-clock time for the tick source
//! - The JS-facing session wrapper (web only)

#[cfg(target_arch = "wasm32")]
pub mod web;

use std::sync::Once;

use crate::Millis;

static LOGGING: Once = Once::new();

/// Set up logging once; later calls are no-ops
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    LOGGING.call_once(|| {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already installed".into());
        }
    });
}

/// Set up logging once; `RUST_LOG` picks the level (info by default)
#[cfg(not(target_arch = "wasm32"))]
pub fn init_logging() {
    LOGGING.call_once(|| {
        let env = env_logger::Env::default().default_filter_or("info");
        // A test harness may have installed its own logger first
        let _ = env_logger::Builder::from_env(env).try_init();
    });
}

/// Current time in milliseconds
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> Millis {
    js_sys::Date::now().max(0.0) as Millis
}

/// Current time in milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> Millis {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as Millis)
}
