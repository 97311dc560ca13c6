// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IFC-Glance Geometry Processing
//!
//! Turns IFC representation items into triangle meshes in world
//! coordinates (meters), using earcutr triangulation and nalgebra for
//! transformations. Also carries the picking side: bounding boxes, rays
//! and a triangle BVH over the merged model mesh.
//!
//! ```no_run
//! use ifc_glance_core::IfcModel;
//! use ifc_glance_geometry::ModelGeometry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = IfcModel::open(&std::fs::read("building.ifc")?)?;
//! let geometry = ModelGeometry::build(&mut model)?;
//! let bvh = geometry.build_bvh();
//! println!("{} triangles, {} nodes", geometry.triangle_count(), bvh.len());
//! # Ok(())
//! # }
//! ```

pub mod bounds;
pub mod bvh;
pub mod error;
pub mod extrusion;
pub mod mesh;
pub mod model_geometry;
pub mod placement;
pub mod processors;
pub mod profile;
pub mod profiles;
pub mod ray;
pub mod router;
pub mod style;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

pub use bounds::Aabb;
pub use bvh::{Bvh, BvhHit};
pub use error::{Error, Result};
pub use extrusion::extrude_profile;
pub use mesh::Mesh;
pub use model_geometry::{ElementMesh, ModelGeometry};
pub use processors::{
    ExtrudedAreaSolidProcessor, FacetedBrepProcessor, PolygonalFaceSetProcessor,
    ShellBasedSurfaceModelProcessor, TriangulatedFaceSetProcessor,
};
pub use profile::Profile2D;
pub use profiles::ProfileProcessor;
pub use ray::{Ray, TriangleHit};
pub use router::{GeometryProcessor, GeometryRouter};
pub use style::{Color, StyleIndex};
pub use triangulation::triangulate_polygon;
