// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Renderable geometry of a whole model
//!
//! Every element that can carry geometry is meshed once. The element meshes
//! are also concatenated into one merged mesh whose triangles remember
//! their owning express id, so a ray hit on the merged mesh maps straight
//! back to an element.

use crate::bounds::Aabb;
use crate::bvh::Bvh;
use crate::router::GeometryRouter;
use crate::style::{Color, StyleIndex};
use crate::{Mesh, Result};
use ifc_glance_core::{IfcModel, IfcType};
use nalgebra::Matrix4;
use rustc_hash::FxHashMap;

/// Mesh and display colour of one element
#[derive(Debug, Clone)]
pub struct ElementMesh {
    pub express_id: u32,
    pub ifc_type: IfcType,
    pub mesh: Mesh,
    pub color: Color,
    pub bounds: Aabb,
    /// First triangle in the merged mesh
    pub first_face: usize,
}

impl ElementMesh {
    pub fn face_range(&self) -> std::ops::Range<usize> {
        self.first_face..self.first_face + self.mesh.triangle_count()
    }
}

/// Element meshes plus a merged, pickable mesh
#[derive(Debug, Clone, Default)]
pub struct ModelGeometry {
    elements: Vec<ElementMesh>,
    by_id: FxHashMap<u32, usize>,
    merged: Mesh,
    /// Owning express id per merged triangle
    face_owners: Vec<u32>,
    bounds: Aabb,
    /// Elements whose geometry failed to process
    failed: Vec<u32>,
}

impl ModelGeometry {
    /// Mesh every geometry-bearing element of the model
    ///
    /// Openings and spaces are never meshed. Elements that fail are logged
    /// and skipped so one bad element does not hide the rest of the model.
    pub fn build(model: &mut IfcModel) -> Result<Self> {
        let router = GeometryRouter::with_unit_scale(model.length_unit_scale());
        let styled_items = model.all_items_of_type(IfcType::IfcStyledItem).to_vec();
        let element_ids = model.geometry_element_ids();

        let decoder = model.decoder_mut();
        let styles = StyleIndex::build(decoder, &styled_items);
        tracing::debug!(
            elements = element_ids.len(),
            styled_items = styles.len(),
            "building model geometry"
        );

        let mut geometry = Self::default();
        for id in element_ids {
            let element = decoder.decode_by_id(id)?;
            let mesh = match router.process_element(&element, decoder) {
                Ok(mesh) => mesh,
                Err(e) => {
                    tracing::warn!(express_id = id, ifc_type = %element.ifc_type, "geometry failed: {}", e);
                    geometry.failed.push(id);
                    continue;
                }
            };
            if mesh.is_empty() {
                continue;
            }

            let color = styles
                .element_color(&element, decoder)
                .unwrap_or_else(|| Color::default_for_type(element.ifc_type));
            geometry.push(id, element.ifc_type, mesh, color);
        }

        model.clear_cache();
        tracing::info!(
            elements = geometry.elements.len(),
            triangles = geometry.triangle_count(),
            failed = geometry.failed.len(),
            "model geometry ready"
        );
        Ok(geometry)
    }

    /// Append an element mesh; its triangles join the merged mesh
    pub fn push(&mut self, express_id: u32, ifc_type: IfcType, mesh: Mesh, color: Color) {
        let bounds = mesh.bounds();
        let first_face = self.merged.triangle_count();

        self.merged.merge(&mesh);
        self.face_owners
            .extend(std::iter::repeat(express_id).take(mesh.triangle_count()));
        self.bounds = self.bounds.union(&bounds);
        self.by_id.insert(express_id, self.elements.len());
        self.elements.push(ElementMesh {
            express_id,
            ifc_type,
            mesh,
            color,
            bounds,
            first_face,
        });
    }

    pub fn elements(&self) -> &[ElementMesh] {
        &self.elements
    }

    pub fn element(&self, express_id: u32) -> Option<&ElementMesh> {
        self.by_id.get(&express_id).map(|&i| &self.elements[i])
    }

    pub fn merged(&self) -> &Mesh {
        &self.merged
    }

    pub fn failed(&self) -> &[u32] {
        &self.failed
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub fn triangle_count(&self) -> usize {
        self.merged.triangle_count()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element owning a face of the merged mesh
    pub fn express_id_at(&self, face: usize) -> Option<u32> {
        self.face_owners.get(face).copied()
    }

    /// One mesh holding the given elements; unknown ids are ignored
    pub fn subset(&self, express_ids: &[u32]) -> Mesh {
        let mut mesh = Mesh::new();
        for id in express_ids {
            if let Some(element) = self.element(*id) {
                mesh.merge(&element.mesh);
            }
        }
        mesh
    }

    /// Picking structure over the merged mesh
    pub fn build_bvh(&self) -> Bvh {
        Bvh::build(&self.merged)
    }

    /// Move every mesh, e.g. into a display frame; bounds are recomputed
    pub fn transform(&mut self, transform: &Matrix4<f64>) {
        self.merged.transform(transform);
        self.bounds = self.merged.bounds();
        for element in &mut self.elements {
            element.mesh.transform(transform);
            element.bounds = element.mesh.bounds();
        }
    }
}
