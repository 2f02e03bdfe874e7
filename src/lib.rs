/// Pin Keeper - Browser extension that remembers the home URL of pinned tabs
/// Built with Rust + WASM + Yew

pub mod background;
pub mod browser;
pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod operations;
pub mod storage;
pub mod tab_data;
pub mod ui;

use wasm_bindgen::prelude::*;

use crate::config::Config;

// Set up panic hook, logging and the `browser` namespace before anything else runs
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(Config::default().level()));
    browser::install_browser_polyfill();
}

// Start the Yew app for the popup
#[wasm_bindgen]
pub fn start_popup() {
    yew::Renderer::<ui::popup::App>::new().render();
}
