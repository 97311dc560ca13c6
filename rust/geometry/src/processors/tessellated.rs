// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pre-tessellated meshes: IfcTriangulatedFaceSet and IfcPolygonalFaceSet

use super::{index_loop, pn_index, point_list_3d};
use crate::router::GeometryProcessor;
use crate::triangulation::triangulate_face;
use crate::{Error, Mesh, Point3, Result, Vector3};
use ifc_glance_core::{DecodedEntity, EntityDecoder, IfcType};

/// Explicit triangle lists; normals are left for smoothing
#[derive(Debug, Default, Clone, Copy)]
pub struct TriangulatedFaceSetProcessor;

impl TriangulatedFaceSetProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProcessor for TriangulatedFaceSetProcessor {
    fn process(&self, entity: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Mesh> {
        // Coordinates, Normals, Closed, CoordIndex, PnIndex
        let points = point_list_3d(entity, 0, decoder)?;
        let faces = entity
            .get_list(3)
            .ok_or_else(|| Error::geometry(format!("#{} has no CoordIndex", entity.id)))?;
        let remap = pn_index(entity, 4);

        let mut mesh = Mesh::with_capacity(points.len(), faces.len() * 3);
        for p in &points {
            mesh.positions.extend([p.x as f32, p.y as f32, p.z as f32]);
        }
        for face in faces {
            let corners = index_loop(face.as_list().unwrap_or(&[]), remap.as_deref());
            if let [a, b, c] = corners[..] {
                mesh.add_triangle(a as u32, b as u32, c as u32);
            }
        }
        mesh.retain_valid_triangles();
        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcTriangulatedFaceSet]
    }
}

/// Indexed polygons, possibly with inner loops, triangulated per face
#[derive(Debug, Default, Clone, Copy)]
pub struct PolygonalFaceSetProcessor;

impl PolygonalFaceSetProcessor {
    pub fn new() -> Self {
        Self
    }
}

fn lookup(points: &[Point3<f64>], indices: &[usize]) -> Option<Vec<Point3<f64>>> {
    indices.iter().map(|&i| points.get(i).copied()).collect()
}

/// Append one flat-shaded polygon
pub(crate) fn add_polygon(
    outer: &[Point3<f64>],
    holes: &[Vec<Point3<f64>>],
    mesh: &mut Mesh,
) -> Result<()> {
    let (vertices, indices, normal) = triangulate_face(outer, holes)?;
    add_flat(&vertices, &indices, normal, mesh);
    Ok(())
}

fn add_flat(vertices: &[Point3<f64>], indices: &[usize], normal: Vector3<f64>, mesh: &mut Mesh) {
    let base = mesh.vertex_count() as u32;
    for v in vertices {
        mesh.add_vertex(*v, normal);
    }
    for t in indices.chunks_exact(3) {
        mesh.add_triangle(base + t[0] as u32, base + t[1] as u32, base + t[2] as u32);
    }
}

impl GeometryProcessor for PolygonalFaceSetProcessor {
    fn process(&self, entity: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Mesh> {
        // Coordinates, Closed, Faces, PnIndex
        let points = point_list_3d(entity, 0, decoder)?;
        let remap = pn_index(entity, 3);
        let faces = entity.get_refs(2);

        let mut mesh = Mesh::new();
        for face_id in faces {
            let face = decoder.decode_by_id(face_id)?;
            let outer = index_loop(face.get_list(0).unwrap_or(&[]), remap.as_deref());
            let Some(outer) = lookup(&points, &outer) else {
                continue;
            };

            let holes: Vec<Vec<Point3<f64>>> = if face.ifc_type == IfcType::IfcIndexedPolygonalFaceWithVoids {
                face.get_list(1)
                    .unwrap_or(&[])
                    .iter()
                    .filter_map(|inner| {
                        let idx = index_loop(inner.as_list()?, remap.as_deref());
                        lookup(&points, &idx)
                    })
                    .collect()
            } else {
                Vec::new()
            };

            // degenerate faces are dropped, the rest of the set still renders
            let _ = add_polygon(&outer, &holes, &mut mesh);
        }
        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcPolygonalFaceSet]
    }
}
