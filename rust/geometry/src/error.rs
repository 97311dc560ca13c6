// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for geometry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during geometry processing
#[derive(Error, Debug)]
pub enum Error {
    #[error("Triangulation failed: {0}")]
    TriangulationError(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Invalid extrusion parameters: {0}")]
    InvalidExtrusion(String),

    #[error("Geometry error: {0}")]
    GeometryError(String),

    #[error("Unsupported representation item: {0}")]
    Unsupported(String),

    #[error("Core parser error: {0}")]
    CoreError(#[from] ifc_glance_core::Error),
}

impl Error {
    /// Shorthand for a generic geometry error
    pub fn geometry(message: impl Into<String>) -> Self {
        Error::GeometryError(message.into())
    }
}
