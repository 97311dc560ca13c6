// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ifc_glance_viewer::ViewerError;
use thiserror::Error;
use wasm_bindgen::JsValue;

pub type Result<T> = std::result::Result<T, BindingError>;

/// Errors raised while talking to the browser
#[derive(Error, Debug)]
pub enum BindingError {
    #[error(transparent)]
    Viewer(#[from] ViewerError),

    #[error("No element #{0} in the document")]
    MissingElement(&'static str),

    #[error("No browser window")]
    NoWindow,

    #[error("JavaScript error: {0}")]
    Js(String),
}

impl BindingError {
    /// Text for the error banner
    pub fn user_message(&self) -> String {
        match self {
            BindingError::Viewer(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<JsValue> for BindingError {
    fn from(value: JsValue) -> Self {
        let message = value
            .as_string()
            .or_else(|| {
                js_sys::Reflect::get(&value, &JsValue::from_str("message"))
                    .ok()
                    .and_then(|m| m.as_string())
            })
            .unwrap_or_else(|| format!("{:?}", value));
        BindingError::Js(message)
    }
}

impl From<BindingError> for JsValue {
    fn from(error: BindingError) -> Self {
        js_sys::Error::new(&error.user_message()).into()
    }
}
