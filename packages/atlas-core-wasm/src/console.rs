// Log sink behind the console_log! and console_warn! macros.
// In the browser this is the JS console; natively it becomes tracing events
// with one target per category.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    // Loading and decoding GeoJSON
    MapData,
    // Turning features into records
    ContentGeneration,
    // Timing summaries
    Performance,
}

pub fn log(s: &str) {
    log_to(Category::ContentGeneration, s);
}

pub fn warn(s: &str) {
    warn_to(Category::ContentGeneration, s);
}

pub fn log_to(category: Category, s: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = category;
        web_sys::console::log_1(&JsValue::from_str(s));
    }

    // tracing needs a literal target
    #[cfg(not(target_arch = "wasm32"))]
    match category {
        Category::MapData => tracing::info!(target: "atlas_core::map_data", "{}", s),
        Category::ContentGeneration => tracing::info!(target: "atlas_core::content_generation", "{}", s),
        Category::Performance => tracing::info!(target: "atlas_core::performance", "{}", s),
    };
}

pub fn warn_to(category: Category, s: &str) {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = category;
        web_sys::console::warn_1(&JsValue::from_str(s));
    }

    #[cfg(not(target_arch = "wasm32"))]
    match category {
        Category::MapData => tracing::warn!(target: "atlas_core::map_data", "{}", s),
        Category::ContentGeneration => tracing::warn!(target: "atlas_core::content_generation", "{}", s),
        Category::Performance => tracing::warn!(target: "atlas_core::performance", "{}", s),
    };
}

// Note: The console_log and console_warn macros are defined in lib.rs
