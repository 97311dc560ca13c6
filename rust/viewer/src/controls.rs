// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Orbit controls.
//!
//! The camera orbits `target` on a sphere. Input only accumulates deltas;
//! [`OrbitControls::update`] applies them once per frame, bleeding them off
//! gradually when damping is on.

use crate::camera::PerspectiveCamera;
use crate::config::ControlsConfig;
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

/// Keeps the polar angle off the poles
const POLE_EPSILON: f64 = 1e-6;

/// Per-notch zoom step before `zoom_speed`
const ZOOM_STEP: f64 = 0.95;

#[derive(Debug, Clone, PartialEq)]
pub struct OrbitControls {
    pub target: Point3<f64>,
    pub enable_damping: bool,
    pub damping_factor: f64,
    pub screen_space_panning: bool,
    pub min_distance: f64,
    pub max_distance: f64,
    pub min_polar_angle: f64,
    pub max_polar_angle: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,

    // pending input
    delta_theta: f64,
    delta_phi: f64,
    scale: f64,
    pan_offset: Vector3<f64>,
}

impl OrbitControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            target: Point3::origin(),
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            screen_space_panning: config.screen_space_panning,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            min_polar_angle: config.min_polar_angle,
            max_polar_angle: config.max_polar_angle,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            pan_offset: Vector3::zeros(),
        }
    }

    /// Rotate around the vertical axis
    pub fn rotate_left(&mut self, angle: f64) {
        self.delta_theta -= angle;
    }

    /// Tilt towards or away from the pole
    pub fn rotate_up(&mut self, angle: f64) {
        self.delta_phi -= angle;
    }

    /// Pointer drag in pixels; a drag across the full height is one turn
    pub fn rotate(&mut self, dx: f64, dy: f64, viewport_height: f64) {
        if viewport_height <= 0.0 {
            return;
        }
        self.rotate_left(2.0 * PI * dx / viewport_height * self.rotate_speed);
        self.rotate_up(2.0 * PI * dy / viewport_height * self.rotate_speed);
    }

    /// Pointer drag in pixels; the point under the cursor follows it at target depth
    pub fn pan(&mut self, dx: f64, dy: f64, camera: &PerspectiveCamera, viewport_height: f64) {
        if viewport_height <= 0.0 {
            return;
        }
        let distance = (camera.position - self.target).norm() * (camera.fov.to_radians() / 2.0).tan();
        let (right, up) = camera.screen_axes();

        self.pan_offset -= right * (2.0 * dx * distance / viewport_height);

        let up = if self.screen_space_panning {
            up
        } else {
            // along the ground
            camera.up.cross(&right)
        };
        self.pan_offset += up * (2.0 * dy * distance / viewport_height);
    }

    /// Wheel input; negative moves closer
    pub fn zoom(&mut self, delta: f64) {
        let step = ZOOM_STEP.powf(self.zoom_speed);
        if delta < 0.0 {
            self.scale *= step;
        } else if delta > 0.0 {
            self.scale /= step;
        }
    }

    /// Apply pending input to the camera; true when the camera moved
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let offset = camera.position - self.target;

        let mut radius = offset.norm();
        let (mut theta, mut phi) = if radius > 0.0 {
            (offset.x.atan2(offset.z), (offset.y / radius).clamp(-1.0, 1.0).acos())
        } else {
            (0.0, 0.0)
        };

        let factor = if self.enable_damping { self.damping_factor } else { 1.0 };
        theta += self.delta_theta * factor;
        phi += self.delta_phi * factor;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(POLE_EPSILON, PI - POLE_EPSILON);

        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * factor;

        let offset = Vector3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );
        camera.position = self.target + offset;
        camera.look_at(self.target);

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.delta_theta *= keep;
            self.delta_phi *= keep;
            self.pan_offset *= keep;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vector3::zeros();
        }
        self.scale = 1.0;

        (camera.position - before).norm_squared() > 1e-12
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use approx::assert_relative_eq;

    fn setup(damping: bool, position: [f64; 3]) -> (OrbitControls, PerspectiveCamera) {
        let config = ControlsConfig {
            enable_damping: damping,
            ..ControlsConfig::default()
        };
        let camera = CameraConfig {
            position,
            ..CameraConfig::default()
        };
        (OrbitControls::new(&config), PerspectiveCamera::new(&camera, 1.0))
    }

    #[test]
    fn test_rotate_without_damping() {
        let (mut controls, mut camera) = setup(false, [0.0, 0.0, 10.0]);
        controls.rotate_left(PI / 2.0);
        assert!(controls.update(&mut camera));
        assert_relative_eq!(camera.position, Point3::new(-10.0, 0.0, 0.0), epsilon = 1e-9);
        assert_eq!(camera.target, Point3::origin());

        // nothing pending
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn test_damping_converges() {
        let (mut controls, mut camera) = setup(true, [0.0, 0.0, 10.0]);
        controls.rotate_left(-1.0);
        controls.update(&mut camera);
        let theta = camera.position.x.atan2(camera.position.z);
        assert_relative_eq!(theta, 0.05, epsilon = 1e-9);

        for _ in 0..400 {
            controls.update(&mut camera);
        }
        let theta = camera.position.x.atan2(camera.position.z);
        assert_relative_eq!(theta, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_limits() {
        // below the ground: polar angle clamps to the configured maximum
        let (mut controls, mut camera) = setup(false, [0.0, -10.0, 0.001]);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.y, 10.0 * (PI / 1.5).cos(), epsilon = 1e-6);

        let (mut controls, mut camera) = setup(false, [0.0, 0.0, 1000.0]);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.z, 500.0, epsilon = 1e-9);

        controls.zoom(-1.0);
        controls.update(&mut camera);
        assert_relative_eq!(camera.position.z, 475.0, epsilon = 1e-9);
    }

    #[test]
    fn test_screen_space_pan_moves_target() {
        let (mut controls, mut camera) = setup(false, [0.0, 0.0, 10.0]);
        controls.pan(100.0, 0.0, &camera, 500.0);
        controls.update(&mut camera);
        // dragging right moves the scene right, so the target moves left
        assert!(controls.target.x < 0.0);
        assert_relative_eq!(controls.target.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(camera.position.x, controls.target.x, epsilon = 1e-9);
    }
}
