// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Screen-space picking against loaded models.

use crate::camera::PerspectiveCamera;
use crate::loader::LoadedModel;
use nalgebra::Point3;

/// Canvas rectangle in client (CSS pixel) coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Client coordinates to normalized device coordinates, y up
    ///
    /// `None` for a zero-sized canvas.
    pub fn to_ndc(&self, client_x: f64, client_y: f64) -> Option<(f64, f64)> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        let x = (client_x - self.left) / self.width * 2.0 - 1.0;
        let y = -(client_y - self.top) / self.height * 2.0 + 1.0;
        Some((x, y))
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

/// Element under the cursor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub model_id: u32,
    pub express_id: u32,
    /// Face of the model's merged mesh
    pub face: usize,
    pub distance: f64,
    pub point: Point3<f64>,
}

/// Nearest element along the camera ray through `ndc`
///
/// Only the closest surface over all models counts. A hit whose face has no
/// owning element is reported as a miss.
pub fn pick(models: &[LoadedModel], camera: &PerspectiveCamera, ndc: (f64, f64)) -> Option<PickHit> {
    let ray = camera.ray_from_ndc(ndc.0, ndc.1);

    let (model, hit) = models
        .iter()
        .filter_map(|model| model.bvh.first_hit(&ray).map(|hit| (model, hit)))
        .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))?;

    let Some(express_id) = model.geometry.express_id_at(hit.face) else {
        tracing::warn!(model_id = model.id, face = hit.face, "skipping pick: incomplete intersection data");
        return None;
    };

    Some(PickHit {
        model_id: model.id,
        express_id,
        face: hit.face,
        distance: hit.distance,
        point: hit.point,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ndc() {
        let viewport = Viewport::new(10.0, 20.0, 200.0, 100.0);
        assert_eq!(viewport.to_ndc(110.0, 70.0), Some((0.0, 0.0)));
        assert_eq!(viewport.to_ndc(10.0, 20.0), Some((-1.0, 1.0)));

        let (x, y) = viewport.to_ndc(210.0, 120.0).unwrap();
        assert_relative_eq!(x, 1.0);
        assert_relative_eq!(y, -1.0);

        assert!(Viewport::new(0.0, 0.0, 0.0, 100.0).to_ndc(1.0, 1.0).is_none());
    }
}
