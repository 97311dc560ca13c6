// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rays and ray/triangle intersection

use nalgebra::{Point3, Vector3};

const EPSILON: f64 = 1e-12;

/// Half-line with a unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Point3<f64>,
    pub direction: Vector3<f64>,
}

/// Intersection of a ray with one triangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance from the ray origin
    pub distance: f64,
    /// Barycentric weight of the second corner
    pub u: f64,
    /// Barycentric weight of the third corner
    pub v: f64,
}

impl Ray {
    /// Create a ray; the direction is normalized
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self {
            origin,
            direction: direction.try_normalize(EPSILON).unwrap_or_else(Vector3::z),
        }
    }

    /// Point at distance `t`
    #[inline]
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }

    /// Möller–Trumbore test against both faces of a triangle
    pub fn intersect_triangle(
        &self,
        a: &Point3<f64>,
        b: &Point3<f64>,
        c: &Point3<f64>,
    ) -> Option<TriangleHit> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(&edge2);
        let det = edge1.dot(&p);

        // parallel or degenerate
        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = self.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let distance = edge2.dot(&q) * inv_det;
        if distance <= EPSILON {
            return None;
        }

        Some(TriangleHit { distance, u, v })
    }
}
