// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the STEP/IFC reader

use thiserror::Error;

/// Result type for reader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading an IFC file
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error at byte {position}: {message}")]
    Parse { position: usize, message: String },

    #[error("Entity #{0} not found")]
    EntityNotFound(u32),

    #[error("Unexpected entity type for #{id}: expected {expected}, found {found}")]
    UnexpectedType {
        id: u32,
        expected: &'static str,
        found: String,
    },

    #[error("Content is not valid text: {0}")]
    Encoding(String),

    #[error("No DATA section or entities found")]
    EmptyModel,
}

impl Error {
    /// Build a parse error at a byte position
    pub fn parse(position: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            position,
            message: message.into(),
        }
    }
}
