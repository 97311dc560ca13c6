// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer - ties scene, camera, picking and the property panel together
//!
//! Every public operation is a complete user action. Failures are logged
//! here and returned as [`ViewerError`]; the host shows
//! [`ViewerError::user_message`] and carries on.

use crate::camera::PerspectiveCamera;
use crate::config::ViewerConfig;
use crate::controls::OrbitControls;
use crate::error::{Result, ViewerError};
use crate::loader::ModelLoader;
use crate::panel::PropertyPanel;
use crate::picking::{pick, PickHit, Viewport};
use crate::scene::{RenderFrame, Scene};
use crate::selection::HighlightKind;
use ifc_glance_core::{IfcModel, IfcType};
use serde::Serialize;

/// Summary of a finished load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub model_id: u32,
    pub elements: usize,
    pub triangles: usize,
    /// Elements whose geometry could not be built
    pub failed: usize,
    pub spatial_nodes: usize,
    pub walls: Vec<u32>,
    pub slabs: Vec<u32>,
    pub doors: Vec<u32>,
}

pub struct Viewer {
    config: ViewerConfig,
    scene: Scene,
    camera: PerspectiveCamera,
    controls: OrbitControls,
    loader: ModelLoader,
    viewport: Viewport,
    panel: Option<PropertyPanel>,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        let scene = Scene::new(&config);
        let camera = PerspectiveCamera::new(&config.camera, 1.0);
        let controls = OrbitControls::new(&config.controls);
        Self {
            config,
            scene,
            camera,
            controls,
            loader: ModelLoader::new(),
            viewport: Viewport::default(),
            panel: None,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    /// Open panel content, if any
    pub fn panel(&self) -> Option<&PropertyPanel> {
        self.panel.as_ref()
    }

    pub fn model_ids(&self) -> Vec<u32> {
        self.scene.models().iter().map(|m| m.id).collect()
    }

    /// Replace whatever is loaded with a new model and frame it
    pub fn load_model(&mut self, bytes: &[u8]) -> Result<LoadReport> {
        self.load_model_with_progress(bytes, |percent| tracing::info!("Loading: {}%", percent))
    }

    pub fn load_model_with_progress(&mut self, bytes: &[u8], progress: impl FnMut(u32)) -> Result<LoadReport> {
        // previous models go first, even if the new one fails to load
        self.scene.dispose_models();
        self.panel = None;

        let mut loaded = match self.loader.load(bytes, progress) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::error!("Error loading IFC model: {}", e);
                return Err(e);
            }
        };

        self.scene.frame(&loaded.bounds, &mut self.camera, &mut self.controls);

        let spatial_nodes = log_spatial_structure(&mut loaded.model, loaded.id);
        let report = LoadReport {
            model_id: loaded.id,
            elements: loaded.geometry.elements().len(),
            triangles: loaded.geometry.triangle_count(),
            failed: loaded.geometry.failed().len(),
            spatial_nodes,
            walls: loaded.model.all_items_of_type(IfcType::IfcWallStandardCase).to_vec(),
            slabs: loaded.model.all_items_of_type(IfcType::IfcSlab).to_vec(),
            doors: loaded.model.all_items_of_type(IfcType::IfcDoor).to_vec(),
        };
        tracing::info!(walls = ?report.walls, slabs = ?report.slabs, doors = ?report.doors, "element types");

        self.scene.add_model(loaded);
        Ok(report)
    }

    /// Canvas position and size in client pixels
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.camera.resize(viewport.width, viewport.height);
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.set_viewport(Viewport {
            width,
            height,
            ..self.viewport
        });
    }

    /// Element under a client position, if any
    pub fn pick(&self, client_x: f64, client_y: f64) -> Option<PickHit> {
        if !self.scene.has_models() {
            return None;
        }
        let ndc = self.viewport.to_ndc(client_x, client_y)?;
        pick(self.scene.models(), &self.camera, ndc)
    }

    /// Hover: the previous preselection always goes, a hit gets a new one
    pub fn pointer_move(&mut self, client_x: f64, client_y: f64) -> Option<PickHit> {
        if !self.scene.has_models() {
            return None;
        }
        self.scene.highlights.clear(HighlightKind::Preselect);

        let hit = self.pick(client_x, client_y)?;
        self.highlight(HighlightKind::Preselect, &hit);
        Some(hit)
    }

    /// Click: select the element under the cursor and open its panel
    ///
    /// `Ok(None)` when nothing was hit; the panel stays as it was.
    pub fn click(&mut self, client_x: f64, client_y: f64) -> Result<Option<&PropertyPanel>> {
        let Some(hit) = self.pick(client_x, client_y) else {
            return Ok(None);
        };
        tracing::debug!(model_id = hit.model_id, express_id = hit.express_id, "selected element");

        let panel = self.element_panel(hit.model_id, hit.express_id).map_err(|e| {
            tracing::error!("Error while accessing IFC data for selected element: {}", e);
            e
        })?;
        self.highlight(HighlightKind::Select, &hit);
        self.panel = Some(panel);
        Ok(self.panel.as_ref())
    }

    /// Panel content for any element of a loaded model
    pub fn element_panel(&mut self, model_id: u32, express_id: u32) -> Result<PropertyPanel> {
        let loaded = self
            .scene
            .model_mut(model_id)
            .ok_or(ViewerError::UnknownModel(model_id))?;
        PropertyPanel::build(&mut loaded.model, express_id)
    }

    pub fn close_panel(&mut self) {
        self.panel = None;
        self.scene.highlights.clear(HighlightKind::Select);
    }

    /// Orbit by a pointer drag in pixels
    pub fn orbit(&mut self, dx: f64, dy: f64) {
        self.controls.rotate(dx, dy, self.viewport.height);
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.controls.pan(dx, dy, &self.camera, self.viewport.height);
    }

    pub fn zoom(&mut self, delta: f64) {
        self.controls.zoom(delta);
    }

    /// Per-frame update; true when the camera moved
    pub fn tick(&mut self) -> bool {
        self.controls.update(&mut self.camera)
    }

    pub fn render_frame(&self) -> RenderFrame<'_> {
        self.scene.render_frame()
    }

    fn highlight(&mut self, kind: HighlightKind, hit: &PickHit) {
        self.scene.highlight(kind, hit.model_id, &[hit.express_id]);
    }
}

/// Log the spatial tree with each node's attributes; returns the node count
fn log_spatial_structure(model: &mut IfcModel, model_id: u32) -> usize {
    let Some(root) = model.spatial_structure() else {
        tracing::warn!(model_id, "no spatial structure");
        return 0;
    };

    let mut nodes = Vec::new();
    root.walk(&mut |node, depth| nodes.push((node.express_id, node.name.clone(), depth)));

    for (express_id, name, depth) in &nodes {
        let indent = " ".repeat(depth * 2);
        match model.item_properties(*express_id) {
            Ok(props) => tracing::debug!(
                "{}Element ID: {}, Name: {}, {:?}",
                indent,
                express_id,
                name.as_deref().unwrap_or("N/A"),
                props
            ),
            Err(e) => tracing::warn!("{}Error fetching properties for Element ID: {}: {}", indent, express_id, e),
        }
    }
    tracing::info!(model_id, nodes = nodes.len(), "logged spatial structure");
    nodes.len()
}
