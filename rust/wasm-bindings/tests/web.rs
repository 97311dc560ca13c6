// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Browser tests, run with `wasm-pack test --headless --firefox`
#![cfg(target_arch = "wasm32")]

use ifc_glance_viewer::{PropertyGroup, PropertyPanel, PropertyRow};
use ifc_glance_wasm::{dom, IfcViewer};
use wasm_bindgen::prelude::*;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

const HOUSE: &str = include_str!("../../../fixtures/house.ifc");

#[wasm_bindgen_test]
fn loads_house_and_lists_batches() {
    let viewer = IfcViewer::new(JsValue::UNDEFINED).unwrap();
    viewer.set_viewport(0.0, 0.0, 800.0, 600.0);
    viewer.load_model(HOUSE.as_bytes()).unwrap();

    assert_eq!(viewer.model_ids(), vec![0]);
    assert_eq!(viewer.render_batches().length(), 3);
    assert_eq!(viewer.view_matrix().len(), 16);
    assert_eq!(viewer.projection_matrix().len(), 16);
    assert!(viewer.panel().unwrap().is_null());
}

#[wasm_bindgen_test]
fn rejects_garbage() {
    let viewer = IfcViewer::new(JsValue::NULL).unwrap();
    assert!(viewer.load_model(b"not an ifc file").is_err());
    assert!(viewer.model_ids().is_empty());
}

#[wasm_bindgen_test]
fn renders_panel_and_error_banner() {
    let document = dom::document().unwrap();
    let body = document.body().unwrap();
    body.set_inner_html(
        r#"<div id="property-menu" style="display:none">
             <h2 id="element-id"></h2>
             <div id="properties-container"></div>
           </div>"#,
    );

    let view = dom::PanelView::from_document(&document).unwrap();
    let panel = PropertyPanel {
        express_id: 60,
        title: "IFCWALL #60".into(),
        groups: vec![PropertyGroup {
            title: "Basic Properties".into(),
            rows: vec![PropertyRow {
                name: "Name".into(),
                value: "Wall North".into(),
            }],
        }],
    };
    view.render(&panel).unwrap();

    let title = document.get_element_by_id("element-id").unwrap();
    assert_eq!(title.text_content().unwrap(), "IFCWALL #60");
    let container = document.get_element_by_id("properties-container").unwrap();
    assert_eq!(container.query_selector_all(".property-item").unwrap().length(), 1);

    dom::show_error(&document, "Please select a valid IFC file (.ifc)").unwrap();
    let banner = document.get_element_by_id("error-message").unwrap();
    assert_eq!(banner.text_content().unwrap(), "Please select a valid IFC file (.ifc)");
}

#[wasm_bindgen_test]
async fn missing_model_url_shows_banner() {
    let document = dom::document().unwrap();
    document.body().unwrap().set_inner_html("");

    let viewer = IfcViewer::new(JsValue::UNDEFINED).unwrap();
    let shared = viewer.shared();
    let result = dom::load_model_url(&shared, &document, "./no-such-model.ifc").await;
    assert!(result.is_err());
    assert!(viewer.model_ids().is_empty());

    let banner = document.get_element_by_id("error-message").unwrap();
    assert!(banner
        .text_content()
        .unwrap()
        .starts_with("Failed to load IFC model"));
}
