// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Page wiring: property panel, error banner, upload and pointer events.
//!
//! Expected markup:
//!
//! ```html
//! <canvas id="canvas"></canvas>
//! <button id="upload-button">Open</button>
//! <input id="file-input" type="file" accept=".ifc" hidden>
//! <div id="property-menu">
//!   <span class="close-button">x</span>
//!   <h2 id="element-id"></h2>
//!   <div id="properties-container"></div>
//! </div>
//! ```

use crate::api::{fetch_bytes, load_bytes};
use crate::error::{BindingError, Result};
use ifc_glance_viewer::{is_ifc_file_name, PropertyPanel, Viewer, ViewerError, Viewport};
use js_sys::Uint8Array;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, File, HtmlElement, HtmlInputElement, MouseEvent, WheelEvent};

pub const CANVAS_ID: &str = "canvas";
pub const PROPERTY_MENU_ID: &str = "property-menu";
pub const PROPERTIES_CONTAINER_ID: &str = "properties-container";
pub const ELEMENT_ID_ID: &str = "element-id";
pub const ERROR_BANNER_ID: &str = "error-message";
pub const UPLOAD_BUTTON_ID: &str = "upload-button";
pub const FILE_INPUT_ID: &str = "file-input";

pub fn document() -> Result<Document> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or(BindingError::NoWindow)
}

fn element(document: &Document, id: &'static str) -> Result<Element> {
    document
        .get_element_by_id(id)
        .ok_or(BindingError::MissingElement(id))
}

fn html_element(document: &Document, id: &'static str) -> Result<HtmlElement> {
    element(document, id)?
        .dyn_into::<HtmlElement>()
        .map_err(|_| BindingError::MissingElement(id))
}

/// The side panel showing one element's properties
#[derive(Clone)]
pub struct PanelView {
    document: Document,
    menu: HtmlElement,
    container: Element,
    title: Element,
}

impl PanelView {
    pub fn from_document(document: &Document) -> Result<Self> {
        Ok(Self {
            document: document.clone(),
            menu: html_element(document, PROPERTY_MENU_ID)?,
            container: element(document, PROPERTIES_CONTAINER_ID)?,
            title: element(document, ELEMENT_ID_ID)?,
        })
    }

    /// Show the panel with fresh content
    pub fn render(&self, panel: &PropertyPanel) -> Result<()> {
        self.menu.style().set_property("display", "block")?;
        self.container.set_inner_html("");
        self.title.set_text_content(Some(&panel.title));

        for group in &panel.groups {
            let group_div = self.document.create_element("div")?;
            group_div.set_class_name("property-group");

            let heading = self.document.create_element("h3")?;
            heading.set_class_name("property-title");
            heading.set_text_content(Some(&group.title));
            group_div.append_child(&heading)?;

            for row in &group.rows {
                let item = self.document.create_element("div")?;
                item.set_class_name("property-item");
                let name = self.document.create_element("span")?;
                name.set_text_content(Some(&row.name));
                let value = self.document.create_element("span")?;
                value.set_text_content(Some(&row.value));
                item.append_child(&name)?;
                item.append_child(&value)?;
                group_div.append_child(&item)?;
            }
            self.container.append_child(&group_div)?;
        }
        Ok(())
    }

    pub fn hide(&self) -> Result<()> {
        self.menu.style().set_property("display", "none")?;
        Ok(())
    }
}

/// Show a message in the error banner, creating the banner on first use
pub fn show_error(document: &Document, message: &str) -> Result<()> {
    tracing::error!("{}", message);
    let banner = match document.get_element_by_id(ERROR_BANNER_ID) {
        Some(banner) => banner,
        None => {
            let banner = document.create_element("div")?;
            banner.set_id(ERROR_BANNER_ID);
            banner.set_class_name("error-message");
            document
                .body()
                .ok_or(BindingError::MissingElement("body"))?
                .append_child(&banner)?;
            banner
        }
    };
    banner.set_text_content(Some(message));
    if let Some(banner) = banner.dyn_ref::<HtmlElement>() {
        banner.style().set_property("display", "block")?;
    }
    Ok(())
}

fn report(document: &Document, error: &BindingError) {
    if let Err(e) = show_error(document, &error.user_message()) {
        tracing::warn!("could not show error banner: {}", e);
    }
}

/// Canvas rectangle as the viewer's viewport
fn sync_viewport(canvas: &Element, viewer: &RefCell<Viewer>) {
    let rect = canvas.get_bounding_client_rect();
    viewer
        .borrow_mut()
        .set_viewport(Viewport::new(rect.left(), rect.top(), rect.width(), rect.height()));
}

/// Register every page handler against a shared viewer
///
/// Handlers live for the lifetime of the page.
pub fn install(document: &Document, viewer: Rc<RefCell<Viewer>>) -> Result<PanelView> {
    let canvas = element(document, CANVAS_ID)?;
    let panel = PanelView::from_document(document)?;
    sync_viewport(&canvas, &viewer);

    install_pointer(&canvas, &viewer, &panel)?;
    install_close_button(document, &viewer, &panel)?;
    install_upload(document, &viewer, &panel)?;

    let window = web_sys::window().ok_or(BindingError::NoWindow)?;
    let on_resize = {
        let canvas = canvas.clone();
        let viewer = viewer.clone();
        Closure::wrap(Box::new(move |_: web_sys::Event| sync_viewport(&canvas, &viewer)) as Box<dyn FnMut(_)>)
    };
    window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;
    on_resize.forget();

    tracing::debug!("page handlers installed");
    Ok(panel)
}

fn install_pointer(canvas: &Element, viewer: &Rc<RefCell<Viewer>>, panel: &PanelView) -> Result<()> {
    // drag with the primary button orbits, any other button pans
    let on_move = {
        let canvas = canvas.clone();
        let viewer = viewer.clone();
        Closure::wrap(Box::new(move |event: MouseEvent| {
            let buttons = event.buttons();
            let (dx, dy) = (event.movement_x() as f64, event.movement_y() as f64);
            if buttons & 1 != 0 {
                viewer.borrow_mut().orbit(dx, dy);
            } else if buttons & 6 != 0 {
                viewer.borrow_mut().pan(dx, dy);
            } else {
                sync_viewport(&canvas, &viewer);
                viewer
                    .borrow_mut()
                    .pointer_move(event.client_x() as f64, event.client_y() as f64);
            }
        }) as Box<dyn FnMut(_)>)
    };
    canvas.add_event_listener_with_callback("mousemove", on_move.as_ref().unchecked_ref())?;
    on_move.forget();

    let on_click = {
        let canvas = canvas.clone();
        let viewer = viewer.clone();
        let panel = panel.clone();
        Closure::wrap(Box::new(move |event: MouseEvent| {
            sync_viewport(&canvas, &viewer);
            let mut viewer = viewer.borrow_mut();
            let result = match viewer.click(event.client_x() as f64, event.client_y() as f64) {
                Ok(Some(content)) => panel.render(content),
                Ok(None) => Ok(()),
                Err(e) => Err(BindingError::from(e)),
            };
            if let Err(e) = result {
                report(&panel.document, &e);
            }
        }) as Box<dyn FnMut(_)>)
    };
    canvas.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let on_wheel = {
        let viewer = viewer.clone();
        Closure::wrap(Box::new(move |event: WheelEvent| {
            event.prevent_default();
            viewer.borrow_mut().zoom(event.delta_y());
        }) as Box<dyn FnMut(_)>)
    };
    canvas.add_event_listener_with_callback("wheel", on_wheel.as_ref().unchecked_ref())?;
    on_wheel.forget();

    Ok(())
}

fn install_close_button(document: &Document, viewer: &Rc<RefCell<Viewer>>, panel: &PanelView) -> Result<()> {
    let Some(button) = document.query_selector(".close-button")? else {
        tracing::warn!("no close button, the property panel stays open");
        return Ok(());
    };
    let on_close = {
        let viewer = viewer.clone();
        let panel = panel.clone();
        Closure::wrap(Box::new(move |_: web_sys::Event| {
            viewer.borrow_mut().close_panel();
            if let Err(e) = panel.hide() {
                report(&panel.document, &e);
            }
        }) as Box<dyn FnMut(_)>)
    };
    button.add_event_listener_with_callback("click", on_close.as_ref().unchecked_ref())?;
    on_close.forget();
    Ok(())
}

fn install_upload(document: &Document, viewer: &Rc<RefCell<Viewer>>, panel: &PanelView) -> Result<()> {
    let button = element(document, UPLOAD_BUTTON_ID)?;
    let input = element(document, FILE_INPUT_ID)?
        .dyn_into::<HtmlInputElement>()
        .map_err(|_| BindingError::MissingElement(FILE_INPUT_ID))?;

    let on_button = {
        let input = input.clone();
        Closure::wrap(Box::new(move |_: web_sys::Event| input.click()) as Box<dyn FnMut(_)>)
    };
    button.add_event_listener_with_callback("click", on_button.as_ref().unchecked_ref())?;
    on_button.forget();

    let on_change = {
        let input = input.clone();
        let viewer = viewer.clone();
        let panel = panel.clone();
        Closure::wrap(Box::new(move |_: web_sys::Event| {
            let file = input.files().and_then(|files| files.get(0));
            let file = match file {
                Some(file) if is_ifc_file_name(&file.name()) => file,
                other => {
                    let name = other.map(|f| f.name()).unwrap_or_default();
                    report(&panel.document, &ViewerError::NotAnIfcFile(name).into());
                    return;
                }
            };

            let viewer = viewer.clone();
            let panel = panel.clone();
            spawn_local(async move {
                if let Err(e) = load_file(file, &viewer, &panel).await {
                    report(&panel.document, &e);
                }
            });
        }) as Box<dyn FnMut(_)>)
    };
    input.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())?;
    on_change.forget();
    Ok(())
}

async fn load_file(file: File, viewer: &RefCell<Viewer>, panel: &PanelView) -> Result<()> {
    tracing::info!(name = %file.name(), size = file.size(), "reading upload");
    let buffer = JsFuture::from(file.array_buffer()).await?;
    let bytes = Uint8Array::new(&buffer).to_vec();
    load_bytes(viewer, &bytes)?;
    panel.hide()
}

/// Fetch and load a model; fetch and parse failures both go to the banner
pub async fn load_model_url(viewer: &RefCell<Viewer>, document: &Document, url: &str) -> Result<()> {
    let result = fetch_bytes(url)
        .await
        .and_then(|bytes| load_bytes(viewer, &bytes).map(|_| ()));
    if let Err(e) = &result {
        report(document, e);
    }
    result
}

/// Load the configured default model in the background
pub fn load_default_model(viewer: Rc<RefCell<Viewer>>, document: Document) {
    let Some(path) = viewer.borrow().config().default_model_path.clone() else {
        return;
    };
    spawn_local(async move {
        if load_model_url(&viewer, &document, &path).await.is_err() {
            tracing::debug!(%path, "default model not loaded");
        }
    });
}
