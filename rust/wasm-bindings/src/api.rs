// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JavaScript API for the viewer
//!
//! ```javascript
//! const viewer = new IfcViewer({ background: 0xffffff });
//! await viewer.loadUrl('./models/building.ifc');
//! function frame() {
//!   viewer.tick();
//!   draw(viewer.viewMatrix(), viewer.projectionMatrix(), viewer.renderBatches());
//!   requestAnimationFrame(frame);
//! }
//! ```

use crate::error::{BindingError, Result};
use ifc_glance_viewer::{BatchKind, LoadReport, RenderBatch, Viewer, ViewerConfig, ViewerError, Viewport};
use js_sys::{Array, Float32Array, Object, Promise, Uint32Array, Uint8Array};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};

/// Browser handle to one viewer; clones share the same state
#[wasm_bindgen]
#[derive(Clone)]
pub struct IfcViewer {
    inner: Rc<RefCell<Viewer>>,
}

#[wasm_bindgen]
impl IfcViewer {
    /// Create a viewer; `config` may be omitted or partial
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> std::result::Result<IfcViewer, JsValue> {
        let config: ViewerConfig = if config.is_undefined() || config.is_null() {
            ViewerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        Ok(Self {
            inner: Rc::new(RefCell::new(Viewer::new(config))),
        })
    }

    /// Replace the loaded model with one parsed from bytes
    #[wasm_bindgen(js_name = loadModel)]
    pub fn load_model(&self, bytes: &[u8]) -> std::result::Result<JsValue, JsValue> {
        let report = load_bytes(&self.inner, bytes)?;
        Ok(serde_wasm_bindgen::to_value(&report)?)
    }

    /// Fetch an IFC file and load it; resolves to the load report
    #[wasm_bindgen(js_name = loadUrl)]
    pub fn load_url(&self, url: String) -> Promise {
        let inner = self.inner.clone();
        future_to_promise(async move {
            let bytes = fetch_bytes(&url).await?;
            let report = load_bytes(&inner, &bytes)?;
            Ok(serde_wasm_bindgen::to_value(&report)?)
        })
    }

    /// Canvas rectangle in client pixels
    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&self, left: f64, top: f64, width: f64, height: f64) {
        self.inner
            .borrow_mut()
            .set_viewport(Viewport::new(left, top, width, height));
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.inner.borrow_mut().resize(width, height);
    }

    /// Hover; returns the preselected express id
    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, client_x: f64, client_y: f64) -> Option<u32> {
        self.inner
            .borrow_mut()
            .pointer_move(client_x, client_y)
            .map(|hit| hit.express_id)
    }

    /// Select; resolves to the panel content or `null` on a miss
    pub fn click(&self, client_x: f64, client_y: f64) -> std::result::Result<JsValue, JsValue> {
        let mut viewer = self.inner.borrow_mut();
        let panel = viewer.click(client_x, client_y).map_err(BindingError::from)?;
        Ok(match panel {
            Some(panel) => serde_wasm_bindgen::to_value(panel)?,
            None => JsValue::NULL,
        })
    }

    /// Content of the open panel, or `null`
    pub fn panel(&self) -> std::result::Result<JsValue, JsValue> {
        Ok(match self.inner.borrow().panel() {
            Some(panel) => serde_wasm_bindgen::to_value(panel)?,
            None => JsValue::NULL,
        })
    }

    #[wasm_bindgen(js_name = closePanel)]
    pub fn close_panel(&self) {
        self.inner.borrow_mut().close_panel();
    }

    pub fn orbit(&self, dx: f64, dy: f64) {
        self.inner.borrow_mut().orbit(dx, dy);
    }

    pub fn pan(&self, dx: f64, dy: f64) {
        self.inner.borrow_mut().pan(dx, dy);
    }

    pub fn zoom(&self, delta: f64) {
        self.inner.borrow_mut().zoom(delta);
    }

    /// Advance damping; true when the camera moved
    pub fn tick(&self) -> bool {
        self.inner.borrow_mut().tick()
    }

    /// Column-major 4x4 view matrix
    #[wasm_bindgen(js_name = viewMatrix)]
    pub fn view_matrix(&self) -> Vec<f32> {
        self.inner.borrow().camera().view_matrix().iter().map(|&v| v as f32).collect()
    }

    /// Column-major 4x4 projection matrix
    #[wasm_bindgen(js_name = projectionMatrix)]
    pub fn projection_matrix(&self) -> Vec<f32> {
        self.inner
            .borrow()
            .camera()
            .projection_matrix()
            .iter()
            .map(|&v| v as f32)
            .collect()
    }

    /// Draw list for the current frame, elements first, overlays last
    ///
    /// Each entry: `{ kind, modelId, expressId, positions, normals, indices,
    /// color, depthTest }`.
    #[wasm_bindgen(js_name = renderBatches)]
    pub fn render_batches(&self) -> Array {
        let viewer = self.inner.borrow();
        viewer.render_frame().batches.iter().map(batch_to_js).collect()
    }

    /// Clear colour as `[r, g, b, a]`
    pub fn background(&self) -> Vec<f32> {
        self.inner.borrow().scene().background.to_array().to_vec()
    }

    /// Ground grid line segments, xyz per vertex
    #[wasm_bindgen(js_name = gridLines)]
    pub fn grid_lines(&self) -> Vec<f32> {
        self.inner.borrow().scene().grid.line_positions()
    }

    /// Device pixel ratio capped by the configuration
    #[wasm_bindgen(js_name = pixelRatio)]
    pub fn pixel_ratio(&self, device_pixel_ratio: f64) -> f64 {
        self.inner.borrow().config().pixel_ratio(device_pixel_ratio)
    }

    #[wasm_bindgen(js_name = modelIds)]
    pub fn model_ids(&self) -> Vec<u32> {
        self.inner.borrow().model_ids()
    }
}

impl IfcViewer {
    /// Shared state for DOM handlers
    pub fn shared(&self) -> Rc<RefCell<Viewer>> {
        self.inner.clone()
    }
}

/// Load while timing with `performance.now()`
pub(crate) fn load_bytes(viewer: &RefCell<Viewer>, bytes: &[u8]) -> Result<LoadReport> {
    let start = now();
    let report = viewer.borrow_mut().load_model(bytes)?;
    tracing::info!(
        model_id = report.model_id,
        elements = report.elements,
        triangles = report.triangles,
        elapsed_ms = now() - start,
        "IFC model loaded"
    );
    Ok(report)
}

/// GET a URL into memory
pub(crate) async fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let window = web_sys::window().ok_or(BindingError::NoWindow)?;
    let fetch_error = |e: JsValue| ViewerError::Fetch(BindingError::from(e).to_string());

    let response = JsFuture::from(window.fetch_with_str(url)).await.map_err(fetch_error)?;
    let response: web_sys::Response = response.dyn_into().map_err(fetch_error)?;
    if !response.ok() {
        return Err(ViewerError::Fetch(format!("{} returned HTTP {}", url, response.status())).into());
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(fetch_error)?)
        .await
        .map_err(fetch_error)?;
    Ok(Uint8Array::new(&buffer).to_vec())
}

fn now() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or(0.0)
}

/// Set a property without panicking on odd objects
#[inline]
fn set_js_prop(obj: &Object, key: &str, value: &JsValue) -> bool {
    js_sys::Reflect::set(obj, &JsValue::from_str(key), value).unwrap_or(false)
}

fn batch_to_js(batch: &RenderBatch<'_>) -> JsValue {
    let obj = Object::new();
    let kind = match batch.kind {
        BatchKind::Element => "element",
        BatchKind::Overlay => "overlay",
    };
    set_js_prop(&obj, "kind", &JsValue::from_str(kind));
    set_js_prop(&obj, "modelId", &JsValue::from(batch.model_id));
    set_js_prop(
        &obj,
        "expressId",
        &batch.express_id.map(JsValue::from).unwrap_or(JsValue::NULL),
    );
    set_js_prop(&obj, "positions", &Float32Array::from(&batch.mesh.positions[..]));
    set_js_prop(&obj, "normals", &Float32Array::from(&batch.mesh.normals[..]));
    set_js_prop(&obj, "indices", &Uint32Array::from(&batch.mesh.indices[..]));
    set_js_prop(&obj, "color", &Float32Array::from(&batch.color.to_array()[..]));
    set_js_prop(&obj, "depthTest", &JsValue::from_bool(batch.depth_test));
    obj.into()
}
