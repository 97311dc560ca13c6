// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use crate::bounds::Aabb;
use nalgebra::{Matrix4, Point3, Vector3};

/// Triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f32>,
    /// Vertex normals (nx, ny, nz); may be empty until [`Mesh::ensure_normals`]
    pub normals: Vec<f32>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x as f32);
        self.positions.push(position.y as f32);
        self.positions.push(position.z as f32);

        self.normals.push(normal.x as f32);
        self.normals.push(normal.y as f32);
        self.normals.push(normal.z as f32);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Merge another mesh into this one
    pub fn merge(&mut self, other: &Mesh) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            self.positions.clear();
            self.normals.clear();
            self.indices.clear();
        }

        let vertex_offset = self.vertex_count() as u32;

        self.positions.reserve(other.positions.len());
        self.normals.reserve(other.normals.len());
        self.indices.reserve(other.indices.len());

        self.positions.extend_from_slice(&other.positions);
        if other.normals.len() == other.positions.len() {
            self.normals.extend_from_slice(&other.normals);
        } else {
            self.normals.resize(self.positions.len(), 0.0);
        }
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.indices.is_empty()
    }

    /// Position of a vertex
    #[inline]
    pub fn vertex(&self, index: u32) -> Option<Point3<f64>> {
        let base = index as usize * 3;
        let p = self.positions.get(base..base + 3)?;
        Some(Point3::new(p[0] as f64, p[1] as f64, p[2] as f64))
    }

    /// Corner positions of a triangle
    pub fn triangle(&self, face: usize) -> Option<[Point3<f64>; 3]> {
        let idx = self.indices.get(face * 3..face * 3 + 3)?;
        Some([
            self.vertex(idx[0])?,
            self.vertex(idx[1])?,
            self.vertex(idx[2])?,
        ])
    }

    /// Axis-aligned bounds of all positions
    pub fn bounds(&self) -> Aabb {
        let mut bounds = Aabb::empty();
        for chunk in self.positions.chunks_exact(3) {
            bounds.expand(&Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64));
        }
        bounds
    }

    /// Apply a transformation matrix to positions and normals
    pub fn transform(&mut self, transform: &Matrix4<f64>) {
        self.positions.chunks_exact_mut(3).for_each(|chunk| {
            let point = Point3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let t = transform.transform_point(&point);
            chunk[0] = t.x as f32;
            chunk[1] = t.y as f32;
            chunk[2] = t.z as f32;
        });

        // Inverse transpose keeps normals perpendicular under non-uniform scale
        let normal_matrix = transform.try_inverse().unwrap_or(*transform).transpose();
        self.normals.chunks_exact_mut(3).for_each(|chunk| {
            let normal = Vector3::new(chunk[0] as f64, chunk[1] as f64, chunk[2] as f64);
            let t = (normal_matrix * normal.to_homogeneous()).xyz();
            let t = t.try_normalize(1e-12).unwrap_or(t);
            chunk[0] = t.x as f32;
            chunk[1] = t.y as f32;
            chunk[2] = t.z as f32;
        });
    }

    /// Uniformly scale positions (file units to meters)
    pub fn scale(&mut self, factor: f64) {
        if factor != 1.0 {
            let factor = factor as f32;
            for p in self.positions.iter_mut() {
                *p *= factor;
            }
        }
    }

    /// Compute smooth vertex normals when none were supplied
    pub fn ensure_normals(&mut self) {
        if self.normals.len() == self.positions.len() && !self.normals.iter().all(|&n| n == 0.0) {
            return;
        }

        let mut accum = vec![Vector3::<f64>::zeros(); self.vertex_count()];
        for tri in self.indices.chunks_exact(3) {
            let (Some(a), Some(b), Some(c)) = (self.vertex(tri[0]), self.vertex(tri[1]), self.vertex(tri[2])) else {
                continue;
            };
            let face_normal = (b - a).cross(&(c - a));
            for &i in tri {
                if let Some(n) = accum.get_mut(i as usize) {
                    *n += face_normal;
                }
            }
        }

        self.normals = accum
            .into_iter()
            .flat_map(|n| {
                let n = n.try_normalize(1e-12).unwrap_or_else(Vector3::z);
                [n.x as f32, n.y as f32, n.z as f32]
            })
            .collect();
    }

    /// Drop triangles that reference missing vertices
    pub fn retain_valid_triangles(&mut self) {
        let count = self.vertex_count() as u32;
        let mut kept = Vec::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            if tri.iter().all(|&i| i < count) {
                kept.extend_from_slice(tri);
            }
        }
        self.indices = kept;
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
