// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Glance WebAssembly Bindings
//!
//! Browser entry points for the viewer. The page calls [`start`] once; it
//! wires the DOM, starts loading the default model and hands back the
//! [`IfcViewer`] the render loop draws from.

use wasm_bindgen::prelude::*;

mod api;
pub mod dom;
mod error;
mod logging;

pub use api::IfcViewer;
pub use error::BindingError;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    logging::init(tracing::Level::INFO);
}

/// Build the viewer, attach it to the page and load the default model
#[wasm_bindgen]
pub fn start(config: JsValue) -> Result<IfcViewer, JsValue> {
    let viewer = IfcViewer::new(config)?;
    let document = dom::document()?;
    dom::install(&document, viewer.shared())?;
    dom::load_default_model(viewer.shared(), document);
    tracing::info!("viewer started");
    Ok(viewer)
}

/// Get the version of IFC-Glance
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
