// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounding volume hierarchy over mesh triangles
//!
//! Flat node array, median split on the longest axis of the triangle
//! centroids. Used for click and hover picking, so only the nearest hit
//! is ever reported.

use crate::bounds::Aabb;
use crate::mesh::Mesh;
use crate::ray::Ray;
use nalgebra::Point3;

/// Triangles per leaf
const MAX_LEAF_SIZE: usize = 4;

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    /// Range into `Bvh::order`
    Leaf { start: u32, count: u32 },
    Inner { left: u32, right: u32 },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    bounds: Aabb,
    kind: NodeKind,
}

/// Nearest triangle hit along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BvhHit {
    /// Face index in the source mesh
    pub face: usize,
    pub distance: f64,
    pub point: Point3<f64>,
}

/// Static BVH; rebuild when the mesh changes
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<Node>,
    /// Leaf order of face indices
    order: Vec<u32>,
    triangles: Vec<[Point3<f64>; 3]>,
}

impl Bvh {
    pub fn build(mesh: &Mesh) -> Self {
        let triangles: Vec<[Point3<f64>; 3]> = (0..mesh.triangle_count())
            .map(|face| mesh.triangle(face).unwrap_or([Point3::origin(); 3]))
            .collect();
        let centroids: Vec<Point3<f64>> = triangles
            .iter()
            .map(|[a, b, c]| Point3::from((a.coords + b.coords + c.coords) / 3.0))
            .collect();

        let mut bvh = Self {
            nodes: Vec::with_capacity(triangles.len().max(1) * 2 / MAX_LEAF_SIZE + 1),
            order: (0..triangles.len() as u32).collect(),
            triangles,
        };
        if !bvh.triangles.is_empty() {
            let len = bvh.order.len();
            bvh.build_node(&centroids, 0, len);
        }
        bvh
    }

    /// Number of triangles indexed
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map(|n| n.bounds).unwrap_or_default()
    }

    /// Recursively builds the subtree for `order[start..end]`, returns its node index
    fn build_node(&mut self, centroids: &[Point3<f64>], start: usize, end: usize) -> u32 {
        let mut bounds = Aabb::empty();
        for &face in &self.order[start..end] {
            for p in &self.triangles[face as usize] {
                bounds.expand(p);
            }
        }

        let index = self.nodes.len() as u32;
        let count = end - start;
        self.nodes.push(Node {
            bounds,
            kind: NodeKind::Leaf {
                start: start as u32,
                count: count as u32,
            },
        });
        if count <= MAX_LEAF_SIZE {
            return index;
        }

        let centroid_bounds = Aabb::from_points(self.order[start..end].iter().map(|&f| &centroids[f as usize]));
        let mid = count / 2;
        // coincident centroids keep their order and split by index
        if centroid_bounds.max_dimension() > 0.0 {
            let axis = centroid_bounds.longest_axis();
            self.order[start..end].select_nth_unstable_by(mid, |&a, &b| {
                centroids[a as usize][axis].total_cmp(&centroids[b as usize][axis])
            });
        }

        let left = self.build_node(centroids, start, start + mid);
        let right = self.build_node(centroids, start + mid, end);
        self.nodes[index as usize].kind = NodeKind::Inner { left, right };
        index
    }

    /// Closest triangle hit by the ray
    pub fn first_hit(&self, ray: &Ray) -> Option<BvhHit> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut best: Option<BvhHit> = None;
        let mut stack = vec![0u32];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index as usize];
            let Some((t_enter, _)) = node.bounds.intersect_ray(ray) else {
                continue;
            };
            if best.is_some_and(|hit| t_enter > hit.distance) {
                continue;
            }

            match node.kind {
                NodeKind::Leaf { start, count } => {
                    for &face in &self.order[start as usize..(start + count) as usize] {
                        let [a, b, c] = &self.triangles[face as usize];
                        let Some(hit) = ray.intersect_triangle(a, b, c) else {
                            continue;
                        };
                        if best.map_or(true, |b| hit.distance < b.distance) {
                            best = Some(BvhHit {
                                face: face as usize,
                                distance: hit.distance,
                                point: ray.at(hit.distance),
                            });
                        }
                    }
                }
                NodeKind::Inner { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        best
    }
}
