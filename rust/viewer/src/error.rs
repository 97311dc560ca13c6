// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for viewer operations
pub type Result<T> = std::result::Result<T, ViewerError>;

/// Errors surfaced by viewer operations
#[derive(Error, Debug)]
pub enum ViewerError {
    #[error("{0}")]
    Parse(#[from] ifc_glance_core::Error),

    #[error("{0}")]
    Geometry(#[from] ifc_glance_geometry::Error),

    #[error("Please select a valid IFC file (.ifc)")]
    NotAnIfcFile(String),

    #[error("Model {0} is not loaded")]
    UnknownModel(u32),

    #[error("Element #{0} not found")]
    UnknownElement(u32),

    #[error("Fetch failed: {0}")]
    Fetch(String),
}

impl ViewerError {
    /// Message for the error banner
    pub fn user_message(&self) -> String {
        match self {
            ViewerError::NotAnIfcFile(_) => self.to_string(),
            ViewerError::UnknownElement(_) => "Could not load IFC element properties.".to_string(),
            _ => format!("Failed to load IFC model: {}", self),
        }
    }
}
