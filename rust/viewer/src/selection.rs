// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hover and click highlight overlays.
//!
//! Each kind holds at most one overlay; creating a new one replaces the
//! previous overlay of the same kind.

use crate::config::HighlightConfig;
use ifc_glance_geometry::{Color, Mesh, ModelGeometry};

/// Which overlay slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightKind {
    /// Element under the pointer
    Preselect,
    /// Clicked element
    Select,
}

/// Flat, optionally see-through material
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightMaterial {
    pub color: Color,
    pub depth_test: bool,
}

impl From<&HighlightConfig> for HighlightMaterial {
    fn from(config: &HighlightConfig) -> Self {
        Self {
            color: Color::from_hex(config.color, config.opacity as f32),
            depth_test: config.depth_test,
        }
    }
}

/// Geometry subset of one model drawn with a highlight material
#[derive(Debug, Clone)]
pub struct Highlight {
    pub model_id: u32,
    pub express_ids: Vec<u32>,
    pub mesh: Mesh,
    pub material: HighlightMaterial,
}

#[derive(Debug, Clone)]
pub struct Highlighter {
    preselect_material: HighlightMaterial,
    select_material: HighlightMaterial,
    preselection: Option<Highlight>,
    selection: Option<Highlight>,
}

impl Highlighter {
    pub fn new(preselect: &HighlightConfig, select: &HighlightConfig) -> Self {
        Self {
            preselect_material: preselect.into(),
            select_material: select.into(),
            preselection: None,
            selection: None,
        }
    }

    /// Replace the overlay of `kind` with the given elements of a model
    ///
    /// Returns false, leaving the slot empty, when none of the ids has geometry.
    pub fn highlight(
        &mut self,
        kind: HighlightKind,
        model_id: u32,
        geometry: &ModelGeometry,
        express_ids: &[u32],
    ) -> bool {
        let mesh = geometry.subset(express_ids);
        let material = match kind {
            HighlightKind::Preselect => self.preselect_material,
            HighlightKind::Select => self.select_material,
        };
        let overlay = (!mesh.is_empty()).then(|| Highlight {
            model_id,
            express_ids: express_ids.to_vec(),
            mesh,
            material,
        });
        let created = overlay.is_some();
        *self.slot(kind) = overlay;
        created
    }

    pub fn clear(&mut self, kind: HighlightKind) {
        *self.slot(kind) = None;
    }

    /// Drop every overlay
    pub fn clear_all(&mut self) {
        self.preselection = None;
        self.selection = None;
    }

    pub fn get(&self, kind: HighlightKind) -> Option<&Highlight> {
        match kind {
            HighlightKind::Preselect => self.preselection.as_ref(),
            HighlightKind::Select => self.selection.as_ref(),
        }
    }

    /// Overlays in draw order, selection on top
    pub fn overlays(&self) -> impl Iterator<Item = &Highlight> {
        self.preselection.iter().chain(self.selection.iter())
    }

    fn slot(&mut self, kind: HighlightKind) -> &mut Option<Highlight> {
        match kind {
            HighlightKind::Preselect => &mut self.preselection,
            HighlightKind::Select => &mut self.selection,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use ifc_glance_core::IfcType;
    use nalgebra::{Point3, Vector3};

    fn geometry() -> ModelGeometry {
        let mut geometry = ModelGeometry::default();
        for (id, x) in [(5, 0.0), (6, 2.0)] {
            let mut mesh = Mesh::new();
            mesh.add_vertex(Point3::new(x, 0.0, 0.0), Vector3::z());
            mesh.add_vertex(Point3::new(x + 1.0, 0.0, 0.0), Vector3::z());
            mesh.add_vertex(Point3::new(x, 1.0, 0.0), Vector3::z());
            mesh.add_triangle(0, 1, 2);
            geometry.push(id, IfcType::IfcWall, mesh, Color::rgba(1.0, 1.0, 1.0, 1.0));
        }
        geometry
    }

    #[test]
    fn test_replaces_previous_overlay() {
        let config = ViewerConfig::default();
        let mut highlighter = Highlighter::new(&config.preselect, &config.select);
        let geometry = geometry();

        assert!(highlighter.highlight(HighlightKind::Preselect, 0, &geometry, &[5]));
        assert!(highlighter.highlight(HighlightKind::Preselect, 0, &geometry, &[6]));
        let overlay = highlighter.get(HighlightKind::Preselect).unwrap();
        assert_eq!(overlay.express_ids, vec![6]);
        assert_eq!(overlay.mesh.triangle_count(), 1);
        assert!(!overlay.material.depth_test);
        assert_eq!(overlay.material.color.to_array(), [1.0, 136.0 / 255.0, 1.0, 0.6]);

        assert!(highlighter.get(HighlightKind::Select).is_none());
        assert_eq!(highlighter.overlays().count(), 1);
    }

    #[test]
    fn test_unknown_element_clears_slot() {
        let config = ViewerConfig::default();
        let mut highlighter = Highlighter::new(&config.preselect, &config.select);
        let geometry = geometry();

        highlighter.highlight(HighlightKind::Select, 0, &geometry, &[5]);
        assert!(!highlighter.highlight(HighlightKind::Select, 0, &geometry, &[42]));
        assert!(highlighter.get(HighlightKind::Select).is_none());

        highlighter.highlight(HighlightKind::Select, 0, &geometry, &[5]);
        highlighter.clear_all();
        assert_eq!(highlighter.overlays().count(), 0);
    }
}
