// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Viewer configuration.
//!
//! Every field has a default, so hosts only pass what they want to change:
//!
//! ```json
//! { "background": 16777215, "camera": { "fov": 60 } }
//! ```

use serde::{Deserialize, Serialize};

/// Top-level viewer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    /// Clear colour, `0xRRGGBB`.
    pub background: u32,
    pub camera: CameraConfig,
    pub controls: ControlsConfig,
    pub lights: LightsConfig,
    pub grid: GridConfig,
    /// Hover highlight.
    pub preselect: HighlightConfig,
    /// Click highlight.
    pub select: HighlightConfig,
    /// Upper bound for the device pixel ratio.
    pub max_pixel_ratio: f64,
    /// Model loaded at startup; a missing file is not an error.
    pub default_model_path: Option<String>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            background: 0xb0b0b0,
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            lights: LightsConfig::default(),
            grid: GridConfig::default(),
            preselect: HighlightConfig {
                color: 0xff88ff,
                opacity: 0.6,
                depth_test: false,
            },
            select: HighlightConfig {
                color: 0xff00ff,
                opacity: 0.6,
                depth_test: false,
            },
            max_pixel_ratio: 2.0,
            default_model_path: Some("./models/building.ifc".into()),
        }
    }
}

impl ViewerConfig {
    /// Device pixel ratio after applying the cap.
    pub fn pixel_ratio(&self, device_pixel_ratio: f64) -> f64 {
        device_pixel_ratio.min(self.max_pixel_ratio).max(f64::EPSILON)
    }
}

/// Perspective camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f64,
    pub near: f64,
    pub far: f64,
    /// Start position (Y up).
    pub position: [f64; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 45.0,
            near: 0.1,
            far: 1000.0,
            position: [8.0, 13.0, 15.0],
        }
    }
}

/// Orbit controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ControlsConfig {
    pub enable_damping: bool,
    pub damping_factor: f64,
    /// Pan in the screen plane instead of the ground plane.
    pub screen_space_panning: bool,
    pub min_distance: f64,
    pub max_distance: f64,
    /// Radians from the +Y axis.
    pub min_polar_angle: f64,
    pub max_polar_angle: f64,
    pub rotate_speed: f64,
    pub zoom_speed: f64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            screen_space_panning: true,
            min_distance: 1.0,
            max_distance: 500.0,
            min_polar_angle: 0.0,
            max_polar_angle: std::f64::consts::PI / 1.5,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
        }
    }
}

/// Ambient plus one shadow-casting directional light.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LightsConfig {
    pub ambient_color: u32,
    pub ambient_intensity: f64,
    pub directional_color: u32,
    pub directional_intensity: f64,
    pub directional_position: [f64; 3],
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
}

impl Default for LightsConfig {
    fn default() -> Self {
        Self {
            ambient_color: 0xffffff,
            ambient_intensity: 0.5,
            directional_color: 0xffffff,
            directional_intensity: 1.0,
            directional_position: [5.0, 10.0, 5.0],
            cast_shadow: true,
            shadow_map_size: 1024,
        }
    }
}

/// Ground grid on the XZ plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    pub size: f64,
    pub divisions: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 50.0,
            divisions: 50,
        }
    }
}

/// Flat overlay material for highlighted elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HighlightConfig {
    pub color: u32,
    pub opacity: f64,
    pub depth_test: bool,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            color: 0xff00ff,
            opacity: 0.6,
            depth_test: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ViewerConfig::default();
        assert_eq!(config.background, 0xb0b0b0);
        assert_eq!(config.camera.position, [8.0, 13.0, 15.0]);
        assert_eq!(config.preselect.color, 0xff88ff);
        assert!(!config.select.depth_test);
        assert_eq!(config.pixel_ratio(3.0), 2.0);
        assert_eq!(config.pixel_ratio(1.5), 1.5);
    }

    #[test]
    fn test_partial_json() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"background": 0, "camera": {"fov": 60}, "defaultModelPath": null}"#).unwrap();
        assert_eq!(config.background, 0);
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.near, 0.1);
        assert_eq!(config.controls.max_distance, 500.0);
        assert!(config.default_model_path.is_none());
    }
}
