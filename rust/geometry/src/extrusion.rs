// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Linear extrusion of 2D profiles into closed meshes

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::profile::{Profile2D, Triangulation};
use nalgebra::{Matrix4, Point2, Point3, Vector3};

/// Extrude a profile from z = 0 to z = `depth`
///
/// The profile must be normalized (outer counter-clockwise, holes
/// clockwise). `transform` is applied to the finished mesh.
pub fn extrude_profile(
    profile: &Profile2D,
    depth: f64,
    transform: Option<&Matrix4<f64>>,
) -> Result<Mesh> {
    if depth.is_nan() || depth <= 0.0 {
        return Err(Error::InvalidExtrusion(format!(
            "depth must be positive, got {}",
            depth
        )));
    }

    let triangulation = profile.triangulate()?;
    let wall_points = profile.outer.len() + profile.holes.iter().map(Vec::len).sum::<usize>();
    let mut mesh = Mesh::with_capacity(
        triangulation.points.len() * 2 + wall_points * 4,
        triangulation.indices.len() * 2 + wall_points * 6,
    );

    add_cap(&triangulation, 0.0, false, &mut mesh);
    add_cap(&triangulation, depth, true, &mut mesh);

    add_side_walls(&profile.outer, depth, &mut mesh);
    for hole in &profile.holes {
        add_side_walls(hole, depth, &mut mesh);
    }

    if let Some(m) = transform {
        mesh.transform(m);
    }
    Ok(mesh)
}

/// Local transform for an extrusion direction
///
/// Directions along +Z need nothing, -Z shifts the solid below the profile
/// plane, anything else shears the solid so the profile plane is kept.
pub fn direction_transform(direction: &Vector3<f64>, depth: f64) -> Option<Matrix4<f64>> {
    let dir = direction.try_normalize(1e-12)?;
    if dir.x.abs() < 1e-9 && dir.y.abs() < 1e-9 {
        return (dir.z < 0.0).then(|| Matrix4::new_translation(&Vector3::new(0.0, 0.0, -depth)));
    }

    let mut shear = Matrix4::identity();
    shear[(0, 2)] = dir.x;
    shear[(1, 2)] = dir.y;
    shear[(2, 2)] = dir.z;
    Some(shear)
}

fn cross2(a: &Point2<f64>, b: &Point2<f64>, c: &Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn add_cap(tri: &Triangulation, z: f64, top: bool, mesh: &mut Mesh) {
    let base = mesh.vertex_count() as u32;
    let normal = if top { Vector3::z() } else { -Vector3::z() };

    for p in &tri.points {
        mesh.add_vertex(Point3::new(p.x, p.y, z), normal);
    }

    for t in tri.indices.chunks_exact(3) {
        let ccw = cross2(&tri.points[t[0]], &tri.points[t[1]], &tri.points[t[2]]) >= 0.0;
        let (a, b, c) = (base + t[0] as u32, base + t[1] as u32, base + t[2] as u32);
        // top faces +Z (counter-clockwise seen from above), bottom faces -Z
        if ccw == top {
            mesh.add_triangle(a, b, c);
        } else {
            mesh.add_triangle(a, c, b);
        }
    }
}

fn add_side_walls(boundary: &[Point2<f64>], depth: f64, mesh: &mut Mesh) {
    let n = boundary.len();
    for i in 0..n {
        let p0 = boundary[i];
        let p1 = boundary[(i + 1) % n];

        // outward for a counter-clockwise loop
        let Some(normal) = Vector3::new(p1.y - p0.y, p0.x - p1.x, 0.0).try_normalize(1e-10) else {
            continue;
        };

        let idx = mesh.vertex_count() as u32;
        mesh.add_vertex(Point3::new(p0.x, p0.y, 0.0), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, 0.0), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, depth), normal);
        mesh.add_vertex(Point3::new(p0.x, p0.y, depth), normal);
        mesh.add_triangle(idx, idx + 1, idx + 2);
        mesh.add_triangle(idx, idx + 2, idx + 3);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{create_circle, create_rectangle};
    use approx::assert_relative_eq;

    #[test]
    fn test_extrude_rectangle() {
        let mesh = extrude_profile(&create_rectangle(10.0, 5.0), 20.0, None).unwrap();
        assert_eq!(mesh.triangle_count(), 12);

        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min, Point3::new(-5.0, -2.5, 0.0));
        assert_relative_eq!(bounds.max, Point3::new(5.0, 2.5, 20.0));
    }

    #[test]
    fn test_faces_point_outward() {
        let mesh = extrude_profile(&create_rectangle(2.0, 2.0), 2.0, None).unwrap();
        let center = Point3::new(0.0, 0.0, 1.0);
        for face in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(face).unwrap();
            let n = (b - a).cross(&(c - a));
            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            assert!(n.dot(&(centroid - center)) > 0.0, "face {} points inward", face);
        }
    }

    #[test]
    fn test_extrude_with_transform() {
        let m = Matrix4::new_translation(&Vector3::new(100.0, 200.0, 300.0));
        let mesh = extrude_profile(&create_rectangle(10.0, 5.0), 20.0, Some(&m)).unwrap();
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min, Point3::new(95.0, 197.5, 300.0));
        assert_relative_eq!(bounds.max, Point3::new(105.0, 202.5, 320.0));
    }

    #[test]
    fn test_hollow_circle_walls() {
        let profile = create_circle(10.0, Some(5.0));
        let mesh = extrude_profile(&profile, 15.0, None).unwrap();
        let rim = profile.outer.len() + profile.holes[0].len();
        // caps: (n + 2h - 2) each, walls: two per edge
        assert_eq!(mesh.triangle_count(), 2 * rim + 2 * rim);
    }

    #[test]
    fn test_direction_transform() {
        assert!(direction_transform(&Vector3::z(), 5.0).is_none());

        let down = direction_transform(&-Vector3::z(), 5.0).unwrap();
        assert_relative_eq!(down.transform_point(&Point3::new(0.0, 0.0, 5.0)).z, 0.0);

        let slanted = direction_transform(&Vector3::new(1.0, 0.0, 1.0), 1.0).unwrap();
        let top = slanted.transform_point(&Point3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(top.x, std::f64::consts::FRAC_1_SQRT_2, epsilon = 1e-12);
        assert_relative_eq!(
            slanted.transform_point(&Point3::new(3.0, 4.0, 0.0)),
            Point3::new(3.0, 4.0, 0.0)
        );
    }

    #[test]
    fn test_invalid_depth() {
        let profile = create_rectangle(10.0, 5.0);
        assert!(extrude_profile(&profile, 0.0, None).is_err());
        assert!(extrude_profile(&profile, f64::NAN, None).is_err());
    }
}
