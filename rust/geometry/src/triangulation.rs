// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation
//!
//! Small convex polygons are fanned; everything else goes through earcutr.
//! Planar 3D faces are projected onto their own plane first.

use crate::{Error, Point2, Point3, Result, Vector3};

/// Twice the signed area; positive for counter-clockwise winding
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let a = &points[i];
            let b = &points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum()
}

fn is_convex(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }

    let mut sign = 0.0_f64;
    for i in 0..n {
        let p0 = &points[i];
        let p1 = &points[(i + 1) % n];
        let p2 = &points[(i + 2) % n];
        let cross = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);
        if cross.abs() <= 1e-10 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if sign != cross.signum() {
            return false;
        }
    }
    true
}

fn fan(n: usize) -> Vec<usize> {
    (1..n - 1).flat_map(|i| [0, i, i + 1]).collect()
}

fn earcut(outer: &[Point2<f64>], holes: &[&[Point2<f64>]]) -> Result<Vec<usize>> {
    let total = outer.len() + holes.iter().map(|h| h.len()).sum::<usize>();
    let mut flat = Vec::with_capacity(total * 2);
    flat.extend(outer.iter().flat_map(|p| [p.x, p.y]));

    let mut hole_starts = Vec::with_capacity(holes.len());
    for hole in holes {
        hole_starts.push(flat.len() / 2);
        flat.extend(hole.iter().flat_map(|p| [p.x, p.y]));
    }

    earcutr::earcut(&flat, &hole_starts, 2)
        .map_err(|e| Error::TriangulationError(format!("{:?}", e)))
}

/// Triangulate a simple polygon; indices refer to `points`
pub fn triangulate_polygon(points: &[Point2<f64>]) -> Result<Vec<usize>> {
    match points.len() {
        0..=2 => Err(Error::TriangulationError(format!(
            "polygon needs at least 3 points, got {}",
            points.len()
        ))),
        3 => Ok(vec![0, 1, 2]),
        n if n <= 8 && is_convex(points) => Ok(fan(n)),
        _ => earcut(points, &[]),
    }
}

/// Triangulate a polygon with holes
///
/// Indices refer to the concatenation of `outer` and every hole with at
/// least three points, in order.
pub fn triangulate_polygon_with_holes(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
) -> Result<Vec<usize>> {
    let holes: Vec<&[Point2<f64>]> = holes
        .iter()
        .filter(|h| h.len() >= 3)
        .map(Vec::as_slice)
        .collect();

    if holes.is_empty() {
        return triangulate_polygon(outer);
    }
    if outer.len() < 3 {
        return Err(Error::TriangulationError(
            "outer boundary needs at least 3 points".to_string(),
        ));
    }
    earcut(outer, &holes)
}

/// Newell normal of a planar polygon, `None` when degenerate
pub fn polygon_normal(points: &[Point3<f64>]) -> Option<Vector3<f64>> {
    let n = points.len();
    if n < 3 {
        return None;
    }

    let mut normal = Vector3::zeros();
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        normal.x += (a.y - b.y) * (a.z + b.z);
        normal.y += (a.z - b.z) * (a.x + b.x);
        normal.z += (a.x - b.x) * (a.y + b.y);
    }
    normal.try_normalize(1e-12)
}

/// Orthonormal frame on a plane used to flatten 3D polygons
#[derive(Debug, Clone, Copy)]
pub struct PlaneBasis {
    pub origin: Point3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
    pub normal: Vector3<f64>,
}

impl PlaneBasis {
    /// Build a frame whose `u × v` equals `normal`
    pub fn new(origin: Point3<f64>, normal: Vector3<f64>) -> Self {
        // axis least aligned with the normal
        let reference = if normal.x.abs() <= normal.y.abs() && normal.x.abs() <= normal.z.abs() {
            Vector3::x()
        } else if normal.y.abs() <= normal.z.abs() {
            Vector3::y()
        } else {
            Vector3::z()
        };
        let u = reference.cross(&normal).normalize();
        let v = normal.cross(&u);
        Self { origin, u, v, normal }
    }

    #[inline]
    pub fn project(&self, p: &Point3<f64>) -> Point2<f64> {
        let d = p - self.origin;
        Point2::new(d.dot(&self.u), d.dot(&self.v))
    }
}

/// Triangulate a planar 3D face with optional inner loops
///
/// Returns the vertices (outer then holes) and triangle indices wound to
/// match the outer loop's orientation, plus the face normal.
pub fn triangulate_face(
    outer: &[Point3<f64>],
    holes: &[Vec<Point3<f64>>],
) -> Result<(Vec<Point3<f64>>, Vec<usize>, Vector3<f64>)> {
    let normal = polygon_normal(outer)
        .ok_or_else(|| Error::TriangulationError("degenerate face".to_string()))?;

    if outer.len() == 3 && holes.is_empty() {
        return Ok((outer.to_vec(), vec![0, 1, 2], normal));
    }

    let basis = PlaneBasis::new(outer[0], normal);
    let outer_2d: Vec<Point2<f64>> = outer.iter().map(|p| basis.project(p)).collect();
    let holes: Vec<&Vec<Point3<f64>>> = holes.iter().filter(|h| h.len() >= 3).collect();
    let holes_2d: Vec<Vec<Point2<f64>>> = holes
        .iter()
        .map(|h| h.iter().map(|p| basis.project(p)).collect())
        .collect();

    let mut indices = triangulate_polygon_with_holes(&outer_2d, &holes_2d)?;

    // earcut output follows the 2D winding; the basis keeps the outer loop CCW
    if signed_area(&outer_2d) < 0.0 {
        for tri in indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    let mut vertices = outer.to_vec();
    for hole in holes {
        vertices.extend_from_slice(hole);
    }
    Ok((vertices, indices, normal))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: f64, offset: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(offset, offset),
            Point2::new(offset + size, offset),
            Point2::new(offset + size, offset + size),
            Point2::new(offset, offset + size),
        ]
    }

    #[test]
    fn test_fast_paths() {
        assert_eq!(triangulate_polygon(&square(1.0, 0.0)[..3]).unwrap(), vec![0, 1, 2]);
        assert_eq!(
            triangulate_polygon(&square(1.0, 0.0)).unwrap(),
            vec![0, 1, 2, 0, 2, 3]
        );
        assert!(triangulate_polygon(&square(1.0, 0.0)[..2]).is_err());
    }

    #[test]
    fn test_concave_polygon() {
        // L shape
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
            Point2::new(1.0, 2.0),
            Point2::new(0.0, 2.0),
        ];
        let indices = triangulate_polygon(&points).unwrap();
        assert_eq!(indices.len(), 4 * 3);
    }

    #[test]
    fn test_polygon_with_hole() {
        let outer = square(10.0, 0.0);
        let mut hole = square(4.0, 3.0);
        hole.reverse();
        let indices = triangulate_polygon_with_holes(&outer, &[hole]).unwrap();
        // 8 vertices, 1 hole: n + 2h - 2 triangles
        assert_eq!(indices.len(), 8 * 3);
        assert!(indices.iter().all(|&i| i < 8));
    }

    #[test]
    fn test_signed_area() {
        assert_relative_eq!(signed_area(&square(2.0, 0.0)), 8.0);
        let mut cw = square(2.0, 0.0);
        cw.reverse();
        assert_relative_eq!(signed_area(&cw), -8.0);
    }

    #[test]
    fn test_face_in_vertical_plane() {
        let face = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, 0.5),
        ];
        let (vertices, indices, normal) = triangulate_face(&face, &[]).unwrap();
        assert_eq!(vertices.len(), 5);
        assert_eq!(indices.len(), 3 * 3);
        assert_relative_eq!(normal, Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-12);

        // every triangle faces the same way as the loop
        for tri in indices.chunks_exact(3) {
            let (a, b, c) = (vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]);
            let n = (b - a).cross(&(c - a));
            assert!(n.dot(&normal) >= 0.0);
        }
    }
}
