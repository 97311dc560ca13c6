// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D profiles for swept solids

use crate::error::{Error, Result};
use crate::triangulation::{signed_area, triangulate_polygon_with_holes};
use nalgebra::{Matrix3, Point2};

/// Closed 2D outline with optional holes
#[derive(Debug, Clone, PartialEq)]
pub struct Profile2D {
    /// Outer boundary, counter-clockwise after [`Profile2D::normalize`]
    pub outer: Vec<Point2<f64>>,
    /// Inner boundaries, clockwise after [`Profile2D::normalize`]
    pub holes: Vec<Vec<Point2<f64>>>,
}

/// Triangulated profile
#[derive(Debug, Clone)]
pub struct Triangulation {
    /// Outer boundary points followed by hole points
    pub points: Vec<Point2<f64>>,
    /// Triangle indices into `points`
    pub indices: Vec<usize>,
}

impl Profile2D {
    pub fn new(outer: Vec<Point2<f64>>) -> Self {
        Self {
            outer,
            holes: Vec::new(),
        }
    }

    pub fn add_hole(&mut self, hole: Vec<Point2<f64>>) {
        self.holes.push(hole);
    }

    /// Drop closing duplicates and fix winding order
    pub fn normalize(&mut self) {
        strip_closing_point(&mut self.outer);
        if signed_area(&self.outer) < 0.0 {
            self.outer.reverse();
        }
        for hole in &mut self.holes {
            strip_closing_point(hole);
            if signed_area(hole) > 0.0 {
                hole.reverse();
            }
        }
        self.holes.retain(|h| h.len() >= 3);
    }

    /// Apply a 2D homogeneous transform to every point
    pub fn transform(&mut self, m: &Matrix3<f64>) {
        let apply = |p: &mut Point2<f64>| *p = m.transform_point(p);
        self.outer.iter_mut().for_each(apply);
        for hole in &mut self.holes {
            hole.iter_mut().for_each(apply);
        }
    }

    /// Triangulate with earcutr (fan for small convex outlines)
    pub fn triangulate(&self) -> Result<Triangulation> {
        if self.outer.len() < 3 {
            return Err(Error::InvalidProfile(format!(
                "profile has {} points, need at least 3",
                self.outer.len()
            )));
        }

        let indices = triangulate_polygon_with_holes(&self.outer, &self.holes)?;

        let mut points = self.outer.clone();
        for hole in self.holes.iter().filter(|h| h.len() >= 3) {
            points.extend_from_slice(hole);
        }
        Ok(Triangulation { points, indices })
    }
}

/// Remove a trailing point equal to the first one
fn strip_closing_point(points: &mut Vec<Point2<f64>>) {
    while points.len() > 1 {
        let (first, last) = (points[0], points[points.len() - 1]);
        if (first - last).norm() > 1e-9 {
            break;
        }
        points.pop();
    }
}

/// Axis-aligned rectangle centred on the origin
#[inline]
pub fn create_rectangle(width: f64, height: f64) -> Profile2D {
    let (hw, hh) = (width / 2.0, height / 2.0);
    Profile2D::new(vec![
        Point2::new(-hw, -hh),
        Point2::new(hw, -hh),
        Point2::new(hw, hh),
        Point2::new(-hw, hh),
    ])
}

/// Circle centred on the origin, optionally hollow
pub fn create_circle(radius: f64, hole_radius: Option<f64>) -> Profile2D {
    let mut profile = Profile2D::new(circle_points(radius));
    if let Some(inner) = hole_radius.filter(|r| *r > 0.0 && *r < radius) {
        let mut hole = circle_points(inner);
        hole.reverse();
        profile.add_hole(hole);
    }
    profile
}

fn circle_points(radius: f64) -> Vec<Point2<f64>> {
    let segments = calculate_circle_segments(radius);
    (0..segments)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / segments as f64;
            Point2::new(radius * angle.cos(), radius * angle.sin())
        })
        .collect()
}

/// Segment count for a circle of the given radius, between 8 and 32
#[inline]
pub fn calculate_circle_segments(radius: f64) -> usize {
    ((radius.sqrt() * 8.0).ceil() as usize).clamp(8, 32)
}
