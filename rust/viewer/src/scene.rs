// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Scene state: lights, grid, loaded models and highlight overlays.
//!
//! Nothing here touches the GPU. [`Scene::render_frame`] lists what to
//! draw and the host submits it.

use crate::camera::PerspectiveCamera;
use crate::config::{GridConfig, ViewerConfig};
use crate::controls::OrbitControls;
use crate::loader::LoadedModel;
use crate::selection::{HighlightKind, Highlighter};
use ifc_glance_geometry::{Aabb, Color, Mesh};
use nalgebra::{Point3, Vector3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmbientLight {
    pub color: Color,
    pub intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub color: Color,
    pub intensity: f64,
    pub position: Point3<f64>,
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
}

/// Square line grid on the XZ plane, centred on the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub size: f64,
    pub divisions: u32,
}

impl Grid {
    /// Line segment endpoints, xyz per vertex, two vertices per line
    pub fn line_positions(&self) -> Vec<f32> {
        let half = self.size / 2.0;
        let step = self.size / self.divisions.max(1) as f64;
        let mut positions = Vec::with_capacity((self.divisions as usize + 1) * 12);
        for i in 0..=self.divisions {
            let k = (-half + step * i as f64) as f32;
            let h = half as f32;
            positions.extend_from_slice(&[-h, 0.0, k, h, 0.0, k]);
            positions.extend_from_slice(&[k, 0.0, -h, k, 0.0, h]);
        }
        positions
    }
}

impl From<&GridConfig> for Grid {
    fn from(config: &GridConfig) -> Self {
        Self {
            size: config.size,
            divisions: config.divisions,
        }
    }
}

/// What a draw call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Element,
    Overlay,
}

/// One mesh with a flat material
#[derive(Debug, Clone, Copy)]
pub struct RenderBatch<'a> {
    pub kind: BatchKind,
    pub model_id: u32,
    /// Set for element batches
    pub express_id: Option<u32>,
    pub mesh: &'a Mesh,
    pub color: Color,
    pub depth_test: bool,
}

/// Draw list for one frame
#[derive(Debug, Clone)]
pub struct RenderFrame<'a> {
    pub background: Color,
    pub batches: Vec<RenderBatch<'a>>,
}

#[derive(Debug)]
pub struct Scene {
    pub background: Color,
    pub ambient: AmbientLight,
    pub directional: DirectionalLight,
    pub grid: Grid,
    pub highlights: Highlighter,
    models: Vec<LoadedModel>,
}

impl Scene {
    pub fn new(config: &ViewerConfig) -> Self {
        let lights = &config.lights;
        let [x, y, z] = lights.directional_position;
        Self {
            background: Color::from_hex(config.background, 1.0),
            ambient: AmbientLight {
                color: Color::from_hex(lights.ambient_color, 1.0),
                intensity: lights.ambient_intensity,
            },
            directional: DirectionalLight {
                color: Color::from_hex(lights.directional_color, 1.0),
                intensity: lights.directional_intensity,
                position: Point3::new(x, y, z),
                cast_shadow: lights.cast_shadow,
                shadow_map_size: lights.shadow_map_size,
            },
            grid: (&config.grid).into(),
            highlights: Highlighter::new(&config.preselect, &config.select),
            models: Vec::new(),
        }
    }

    pub fn add_model(&mut self, model: LoadedModel) {
        self.models.push(model);
    }

    /// Remove every model together with its overlays; returns their ids
    pub fn dispose_models(&mut self) -> Vec<u32> {
        self.highlights.clear_all();
        let ids: Vec<u32> = self.models.drain(..).map(|m| m.id).collect();
        if !ids.is_empty() {
            tracing::debug!(?ids, "disposed models");
        }
        ids
    }

    pub fn models(&self) -> &[LoadedModel] {
        &self.models
    }

    pub fn model(&self, id: u32) -> Option<&LoadedModel> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn model_mut(&mut self, id: u32) -> Option<&mut LoadedModel> {
        self.models.iter_mut().find(|m| m.id == id)
    }

    pub fn has_models(&self) -> bool {
        !self.models.is_empty()
    }

    /// Highlight elements of a loaded model, replacing the overlay of `kind`
    pub fn highlight(&mut self, kind: HighlightKind, model_id: u32, express_ids: &[u32]) -> bool {
        let Some(model) = self.models.iter().find(|m| m.id == model_id) else {
            self.highlights.clear(kind);
            return false;
        };
        self.highlights.highlight(kind, model_id, &model.geometry, express_ids)
    }

    /// Union of all model bounds
    pub fn bounds(&self) -> Aabb {
        self.models
            .iter()
            .fold(Aabb::empty(), |acc, m| acc.union(&m.bounds))
    }

    /// Point the camera at a box from the (1, 1, 1) diagonal
    ///
    /// The camera ends up twice the largest box dimension from the centre.
    /// Empty boxes leave the view unchanged.
    pub fn frame(&self, bounds: &Aabb, camera: &mut PerspectiveCamera, controls: &mut OrbitControls) {
        if bounds.is_empty() {
            tracing::debug!("nothing to frame");
            return;
        }
        let center = bounds.center();
        let distance = bounds.max_dimension() * 2.0;
        let direction = Vector3::new(1.0, 1.0, 1.0).normalize();

        controls.target = center;
        camera.position = center + direction * distance;
        camera.look_at(center);
        controls.update(camera);
    }

    /// Elements of every model, then overlays on top
    pub fn render_frame(&self) -> RenderFrame<'_> {
        let mut batches = Vec::new();
        for model in &self.models {
            for element in model.geometry.elements() {
                batches.push(RenderBatch {
                    kind: BatchKind::Element,
                    model_id: model.id,
                    express_id: Some(element.express_id),
                    mesh: &element.mesh,
                    color: element.color,
                    depth_test: true,
                });
            }
        }
        for overlay in self.highlights.overlays() {
            batches.push(RenderBatch {
                kind: BatchKind::Overlay,
                model_id: overlay.model_id,
                express_id: None,
                mesh: &overlay.mesh,
                color: overlay.material.color,
                depth_test: overlay.material.depth_test,
            });
        }
        RenderFrame {
            background: self.background,
            batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frame_box() {
        let config = ViewerConfig::default();
        let scene = Scene::new(&config);
        let mut camera = PerspectiveCamera::new(&config.camera, 1.0);
        let mut controls = OrbitControls::new(&config.controls);

        let bounds = Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 2.0));
        scene.frame(&bounds, &mut camera, &mut controls);

        let center = Point3::new(1.0, 2.0, 1.0);
        let offset = 8.0 / 3.0_f64.sqrt();
        assert_eq!(controls.target, center);
        assert_eq!(camera.target, center);
        assert_relative_eq!(
            camera.position,
            Point3::new(1.0 + offset, 2.0 + offset, 1.0 + offset),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_frame_empty_is_noop() {
        let config = ViewerConfig::default();
        let scene = Scene::new(&config);
        let mut camera = PerspectiveCamera::new(&config.camera, 1.0);
        let before = camera.clone();
        let mut controls = OrbitControls::new(&config.controls);
        scene.frame(&Aabb::empty(), &mut camera, &mut controls);
        assert_eq!(camera, before);
    }

    #[test]
    fn test_defaults_and_grid() {
        let scene = Scene::new(&ViewerConfig::default());
        assert_eq!(scene.background, Color::from_hex(0xb0b0b0, 1.0));
        assert_eq!(scene.directional.position, Point3::new(5.0, 10.0, 5.0));
        assert_eq!(scene.directional.shadow_map_size, 1024);

        let lines = scene.grid.line_positions();
        // 51 lines per direction, 2 vertices each
        assert_eq!(lines.len(), 51 * 2 * 2 * 3);
        assert_eq!(&lines[..6], &[-25.0, 0.0, -25.0, 25.0, 0.0, -25.0]);
        assert!(scene.render_frame().batches.is_empty());
    }
}
