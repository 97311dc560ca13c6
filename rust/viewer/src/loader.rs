// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model loading: parse, mesh, index for picking.

use crate::error::Result;
use ifc_glance_core::IfcModel;
use ifc_glance_geometry::{Aabb, Bvh, ModelGeometry};
use nalgebra::Matrix4;
use std::time::Duration;

/// IFC is Z up; the scene is Y up
pub fn z_up_to_y_up() -> Matrix4<f64> {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0, //
        0.0, -1.0, 0.0, 0.0, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// A parsed model with its scene geometry
#[derive(Debug)]
pub struct LoadedModel {
    /// Viewer-assigned, unique for the viewer's lifetime
    pub id: u32,
    pub model: IfcModel,
    /// Meshes in scene coordinates
    pub geometry: ModelGeometry,
    pub bvh: Bvh,
    pub bounds: Aabb,
}

/// Whether a file name looks like an IFC file
pub fn is_ifc_file_name(name: &str) -> bool {
    name.to_ascii_lowercase().ends_with(".ifc")
}

/// Builds [`LoadedModel`]s and hands out model ids
#[derive(Debug, Default)]
pub struct ModelLoader {
    next_id: u32,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next successful load will get
    pub fn peek_next_id(&self) -> u32 {
        self.next_id
    }

    /// Parse and mesh a file, reporting progress in percent
    ///
    /// An id is only consumed by a successful load.
    pub fn load(&mut self, bytes: &[u8], mut progress: impl FnMut(u32)) -> Result<LoadedModel> {
        let started = instant_now();
        progress(0);

        let mut model = IfcModel::open(bytes)?;
        tracing::debug!(
            schema = model.header().schema().unwrap_or("unknown"),
            entities = model.entity_count(),
            "parsed IFC content"
        );
        progress(30);

        let mut geometry = ModelGeometry::build(&mut model)?;
        geometry.transform(&z_up_to_y_up());
        progress(80);

        let bvh = geometry.build_bvh();
        let bounds = geometry.bounds();
        progress(100);

        let id = self.next_id;
        self.next_id += 1;
        tracing::info!(
            model_id = id,
            elements = geometry.elements().len(),
            triangles = geometry.triangle_count(),
            elapsed_ms = elapsed(started).as_millis() as u64,
            "model loaded"
        );

        Ok(LoadedModel {
            id,
            model,
            geometry,
            bvh,
            bounds,
        })
    }
}

// std::time::Instant panics on wasm32-unknown-unknown
#[cfg(not(target_arch = "wasm32"))]
fn instant_now() -> Option<std::time::Instant> {
    Some(std::time::Instant::now())
}

#[cfg(target_arch = "wasm32")]
fn instant_now() -> Option<std::time::Instant> {
    None
}

fn elapsed(started: Option<std::time::Instant>) -> Duration {
    started.map(|s| s.elapsed()).unwrap_or_default()
}
