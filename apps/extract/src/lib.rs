// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Glance Extract - dump element properties of an IFC file to JSON.
//!
//! Reads one IFC file and writes `{ "elements": [...] }` with, for every
//! record, its express id, type, basic attributes, the selected property
//! sets and the raw record. Paths and the property set list come from
//! environment variables, see [`Config`].

pub mod config;
pub mod docs;
pub mod error;
pub mod extract;

pub use config::{Config, DEFAULT_TARGET_PSETS};
pub use docs::{documents, Document};
pub use error::{ExtractError, Result};
pub use extract::{extract, write_json, ElementRecord, Export};

use ifc_glance_core::IfcModel;
use std::time::Instant;

/// What a run produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub elements: usize,
    pub with_property_sets: usize,
    pub documents: Option<usize>,
}

/// Read, extract and write everything the configuration asks for
pub fn run(config: &Config) -> Result<Summary> {
    let start = Instant::now();
    let bytes = std::fs::read(&config.input).map_err(|source| ExtractError::Read {
        path: config.input.clone(),
        source,
    })?;
    let model = IfcModel::open(&bytes)?;
    tracing::info!(
        input = %config.input.display(),
        schema = model.header().schema().unwrap_or("unknown"),
        entities = model.entity_count(),
        "opened model"
    );

    let export = extract(&model, &config.target_psets);
    write_json(&config.output, &export)?;
    tracing::info!("Full IFC data exported to: {}", config.output.display());

    let documents = match &config.docs_output {
        Some(path) => {
            let docs = documents(&export.elements)?;
            write_json(path, &docs)?;
            tracing::info!(count = docs.len(), "Documents exported to: {}", path.display());
            Some(docs.len())
        }
        None => None,
    };

    let summary = Summary {
        elements: export.elements.len(),
        with_property_sets: export
            .elements
            .iter()
            .filter(|e| !e.property_sets.is_empty())
            .count(),
        documents,
    };
    tracing::debug!(elapsed_ms = start.elapsed().as_millis() as u64, ?summary, "run finished");
    Ok(summary)
}
