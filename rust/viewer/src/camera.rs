// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Perspective camera, Y up, right-handed.

use crate::config::CameraConfig;
use ifc_glance_geometry::Ray;
use nalgebra::{Isometry3, Matrix4, Perspective3, Point3, Vector3};

#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Point3<f64>,
    /// Point the camera looks at
    pub target: Point3<f64>,
    pub up: Vector3<f64>,
    /// Vertical field of view in degrees
    pub fov: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f64) -> Self {
        let [x, y, z] = config.position;
        Self {
            position: Point3::new(x, y, z),
            target: Point3::origin(),
            up: Vector3::y(),
            fov: config.fov,
            aspect: sanitize_aspect(aspect),
            near: config.near,
            far: config.far,
        }
    }

    pub fn set_aspect(&mut self, aspect: f64) {
        self.aspect = sanitize_aspect(aspect);
    }

    /// Aspect ratio from a canvas size in CSS pixels
    pub fn resize(&mut self, width: f64, height: f64) {
        if height > 0.0 {
            self.set_aspect(width / height);
        }
    }

    pub fn look_at(&mut self, target: Point3<f64>) {
        self.target = target;
    }

    /// Unit vector from the camera towards its target
    pub fn forward(&self) -> Vector3<f64> {
        (self.target - self.position)
            .try_normalize(1e-12)
            .unwrap_or(-Vector3::z())
    }

    fn view(&self) -> Isometry3<f64> {
        let target = if (self.target - self.position).norm() < 1e-12 {
            self.position - Vector3::z()
        } else {
            self.target
        };
        let up = if self.forward().cross(&self.up).norm() < 1e-9 {
            // looking straight along `up`
            Vector3::z()
        } else {
            self.up
        };
        Isometry3::look_at_rh(&self.position, &target, &up)
    }

    fn projection(&self) -> Perspective3<f64> {
        Perspective3::new(self.aspect, self.fov.to_radians(), self.near, self.far)
    }

    /// World to camera
    pub fn view_matrix(&self) -> Matrix4<f64> {
        self.view().to_homogeneous()
    }

    /// Camera to clip space (OpenGL depth range)
    pub fn projection_matrix(&self) -> Matrix4<f64> {
        self.projection().to_homogeneous()
    }

    /// Camera right and up axes in world space
    pub fn screen_axes(&self) -> (Vector3<f64>, Vector3<f64>) {
        let inverse = self.view().inverse();
        (
            inverse.transform_vector(&Vector3::x()),
            inverse.transform_vector(&Vector3::y()),
        )
    }

    /// Ray through a point in normalized device coordinates
    pub fn ray_from_ndc(&self, x: f64, y: f64) -> Ray {
        let in_camera = self.projection().unproject_point(&Point3::new(x, y, 0.5));
        let in_world = self.view().inverse_transform_point(&in_camera);
        Ray::new(self.position, in_world - self.position)
    }
}

fn sanitize_aspect(aspect: f64) -> f64 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> PerspectiveCamera {
        let config = CameraConfig {
            fov: 90.0,
            position: [0.0, 0.0, 10.0],
            ..CameraConfig::default()
        };
        PerspectiveCamera::new(&config, 1.0)
    }

    #[test]
    fn test_center_ray() {
        let ray = camera().ray_from_ndc(0.0, 0.0);
        assert_relative_eq!(ray.origin, Point3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(ray.direction, -Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn test_edge_rays() {
        let cam = camera();
        let s = std::f64::consts::FRAC_1_SQRT_2;

        let right = cam.ray_from_ndc(1.0, 0.0);
        assert_relative_eq!(right.direction, Vector3::new(s, 0.0, -s), epsilon = 1e-9);

        let top = cam.ray_from_ndc(0.0, 1.0);
        assert_relative_eq!(top.direction, Vector3::new(0.0, s, -s), epsilon = 1e-9);
    }

    #[test]
    fn test_view_matrix_moves_target_onto_axis() {
        let mut cam = camera();
        cam.position = Point3::new(3.0, 4.0, 5.0);
        cam.look_at(Point3::new(1.0, 1.0, 1.0));
        let target = cam.view_matrix().transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(target.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(target.y, 0.0, epsilon = 1e-9);
        assert!(target.z < 0.0);
    }

    #[test]
    fn test_resize() {
        let mut cam = camera();
        cam.resize(1920.0, 1080.0);
        assert_relative_eq!(cam.aspect, 16.0 / 9.0);
        cam.resize(100.0, 0.0);
        assert_relative_eq!(cam.aspect, 16.0 / 9.0);
    }
}
