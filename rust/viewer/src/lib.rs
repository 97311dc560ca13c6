// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Glance Viewer
//!
//! Everything the browser viewer does apart from talking to the GPU and the
//! DOM: scene and camera state, orbit controls, model loading, ray picking,
//! highlight overlays and property panel content. The browser bindings
//! drive a [`Viewer`] from DOM events and draw its [`RenderFrame`]s.

pub mod camera;
pub mod config;
pub mod controls;
pub mod error;
pub mod loader;
pub mod panel;
pub mod picking;
pub mod scene;
pub mod selection;
pub mod viewer;

pub use camera::PerspectiveCamera;
pub use config::ViewerConfig;
pub use controls::OrbitControls;
pub use error::{Result, ViewerError};
pub use loader::{is_ifc_file_name, LoadedModel, ModelLoader};
pub use panel::{PropertyGroup, PropertyPanel, PropertyRow};
pub use picking::{PickHit, Viewport};
pub use scene::{BatchKind, RenderBatch, RenderFrame, Scene};
pub use selection::{HighlightKind, Highlighter};
pub use viewer::{LoadReport, Viewer};
