//! Anchor-driven tabs for the browser.
//!
//! A container of `<a href="#panel">` anchors toggles which panel is shown.
//! The active key can follow the URL fragment, and on small screens the
//! anchor row can collapse into a `<select>`.
//!
//! Two ways in: [`js::attach`] for plain pages (exported to JS), and the
//! [`component::AnchorTabs`] Leptos component.

pub mod component;
pub mod config;
pub mod controller;
pub mod dom;
pub mod dropdown;
pub mod error;
pub mod js;
pub mod registry;
pub mod screen;
pub mod subscription;

pub use config::TabsConfig;
pub use controller::{OnChange, TabController, Tabs, TabsBuilder, WeakTabs};
pub use error::TabsError;
pub use screen::{ScreenSize, ScreenSource};

use wasm_bindgen::prelude::wasm_bindgen;

#[wasm_bindgen(start)]
pub fn start() {
    // initializes logging using the `log` crate
    _ = console_log::init_with_level(log::Level::Debug);
    console_error_panic_hook::set_once();
}
