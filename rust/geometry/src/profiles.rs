// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Profile definitions to [`Profile2D`]
//!
//! Supported: IfcRectangleProfileDef, IfcCircleProfileDef,
//! IfcArbitraryClosedProfileDef and IfcArbitraryProfileDefWithVoids with
//! IfcPolyline or IfcIndexedPolyCurve boundaries.

use crate::placement::parse_axis2_placement_2d;
use crate::profile::{create_circle, create_rectangle, Profile2D};
use crate::{Error, Point2, Result};
use ifc_glance_core::{AttributeValue, DecodedEntity, EntityDecoder, IfcType};

/// Segments used to approximate one IfcArcIndex
const ARC_SEGMENTS: usize = 12;

/// Converts IFC profile definitions into normalized 2D outlines
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileProcessor;

impl ProfileProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Build the outline of a profile definition, with its Position applied
    pub fn process(&self, profile: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Profile2D> {
        let mut result = match profile.ifc_type {
            IfcType::IfcRectangleProfileDef => {
                let x = positive(profile, 3, "XDim")?;
                let y = positive(profile, 4, "YDim")?;
                self.apply_position(create_rectangle(x, y), profile, decoder)?
            }
            IfcType::IfcCircleProfileDef => {
                let r = positive(profile, 3, "Radius")?;
                self.apply_position(create_circle(r, None), profile, decoder)?
            }
            IfcType::IfcArbitraryClosedProfileDef => {
                let outer = self.curve_points(profile, 2, decoder)?;
                Profile2D::new(outer)
            }
            IfcType::IfcArbitraryProfileDefWithVoids => {
                let mut result = Profile2D::new(self.curve_points(profile, 2, decoder)?);
                if let Some(inner) = profile.get(3) {
                    for curve in decoder.resolve_ref_list(inner)? {
                        result.add_hole(self.curve(&curve, decoder)?);
                    }
                }
                result
            }
            _ => {
                return Err(Error::Unsupported(format!(
                    "#{} profile {}",
                    profile.id, profile.type_name
                )))
            }
        };

        result.normalize();
        if result.outer.len() < 3 {
            return Err(Error::InvalidProfile(format!(
                "#{} outline has fewer than 3 distinct points",
                profile.id
            )));
        }
        Ok(result)
    }

    fn apply_position(
        &self,
        mut profile: Profile2D,
        def: &DecodedEntity,
        decoder: &mut EntityDecoder,
    ) -> Result<Profile2D> {
        if let Some(position) = def.get(2) {
            if let Some(placement) = decoder.resolve_ref(position)? {
                let m = parse_axis2_placement_2d(&placement, decoder)?;
                profile.transform(&m);
            }
        }
        Ok(profile)
    }

    fn curve_points(
        &self,
        def: &DecodedEntity,
        index: usize,
        decoder: &mut EntityDecoder,
    ) -> Result<Vec<Point2<f64>>> {
        let attr = def
            .get(index)
            .ok_or_else(|| Error::InvalidProfile(format!("#{} has no outer curve", def.id)))?;
        let curve = decoder
            .resolve_ref(attr)?
            .ok_or_else(|| Error::InvalidProfile(format!("#{} outer curve is not set", def.id)))?;
        self.curve(&curve, decoder)
    }

    /// Points of a bounded 2D curve
    pub fn curve(&self, curve: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Vec<Point2<f64>>> {
        match curve.ifc_type {
            IfcType::IfcPolyline => {
                let refs = curve.get_refs(0);
                let mut points = Vec::with_capacity(refs.len());
                for id in refs {
                    let point = decoder.decode_by_id(id)?;
                    let coords = point.get_list(0).unwrap_or(&[]);
                    points.push(point2(coords));
                }
                Ok(points)
            }
            IfcType::IfcIndexedPolyCurve => self.indexed_poly_curve(curve, decoder),
            _ => Err(Error::Unsupported(format!(
                "#{} curve {}",
                curve.id, curve.type_name
            ))),
        }
    }

    fn indexed_poly_curve(
        &self,
        curve: &DecodedEntity,
        decoder: &mut EntityDecoder,
    ) -> Result<Vec<Point2<f64>>> {
        let list_attr = curve
            .get(0)
            .ok_or_else(|| Error::InvalidProfile(format!("#{} has no points", curve.id)))?;
        let list = decoder
            .resolve_ref(list_attr)?
            .ok_or_else(|| Error::InvalidProfile(format!("#{} has no points", curve.id)))?;
        let coords: Vec<Point2<f64>> = list
            .get_list(0)
            .unwrap_or(&[])
            .iter()
            .filter_map(|c| c.as_list().map(point2))
            .collect();

        let segments = match curve.get_list(1) {
            Some(segments) if !segments.is_empty() => segments,
            _ => return Ok(coords),
        };

        let lookup = |i: i64| -> Result<Point2<f64>> {
            usize::try_from(i - 1)
                .ok()
                .and_then(|i| coords.get(i).copied())
                .ok_or_else(|| Error::InvalidProfile(format!("#{} index {} out of range", curve.id, i)))
        };

        let mut points: Vec<Point2<f64>> = Vec::new();
        for segment in segments {
            let indices: Vec<i64> = segment
                .as_list()
                .unwrap_or(&[])
                .iter()
                .filter_map(AttributeValue::as_int)
                .collect();
            let is_arc = segment
                .type_name()
                .is_some_and(|t| t.eq_ignore_ascii_case("IFCARCINDEX"));

            let segment_points = if is_arc && indices.len() == 3 {
                arc_through(lookup(indices[0])?, lookup(indices[1])?, lookup(indices[2])?)
            } else {
                indices.iter().map(|&i| lookup(i)).collect::<Result<Vec<_>>>()?
            };

            // consecutive segments share their joint point
            let skip = usize::from(!points.is_empty());
            points.extend(segment_points.into_iter().skip(skip));
        }
        Ok(points)
    }
}

fn positive(def: &DecodedEntity, index: usize, name: &str) -> Result<f64> {
    match def.get_float(index) {
        Some(v) if v > 0.0 => Ok(v),
        other => Err(Error::InvalidProfile(format!(
            "#{} {} must be positive, got {:?}",
            def.id, name, other
        ))),
    }
}

fn point2(coords: &[AttributeValue]) -> Point2<f64> {
    let at = |i: usize| coords.get(i).and_then(|v| v.as_float()).unwrap_or(0.0);
    Point2::new(at(0), at(1))
}

/// Sample the circular arc through three points, endpoints included
fn arc_through(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> Vec<Point2<f64>> {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < 1e-12 {
        // collinear
        return vec![a, c];
    }

    let sq = |p: Point2<f64>| p.x * p.x + p.y * p.y;
    let center = Point2::new(
        (sq(a) * (b.y - c.y) + sq(b) * (c.y - a.y) + sq(c) * (a.y - b.y)) / d,
        (sq(a) * (c.x - b.x) + sq(b) * (a.x - c.x) + sq(c) * (b.x - a.x)) / d,
    );
    let radius = (a - center).norm();
    let angle = |p: Point2<f64>| (p.y - center.y).atan2(p.x - center.x);

    let tau = std::f64::consts::TAU;
    let start = angle(a);
    let ccw_span = |p: Point2<f64>| (angle(p) - start).rem_euclid(tau);
    // sweep direction is the one that passes through the middle point
    let sweep = if ccw_span(b) <= ccw_span(c) {
        ccw_span(c)
    } else {
        ccw_span(c) - tau
    };

    (0..=ARC_SEGMENTS)
        .map(|i| {
            let t = start + sweep * i as f64 / ARC_SEGMENTS as f64;
            Point2::new(center.x + radius * t.cos(), center.y + radius * t.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triangulation::signed_area;
    use approx::assert_relative_eq;

    const CONTENT: &str = r#"
DATA;
#1=IFCCARTESIANPOINT((100.,50.));
#2=IFCAXIS2PLACEMENT2D(#1,$);
#3=IFCRECTANGLEPROFILEDEF(.AREA.,$,#2,400.,200.);
#4=IFCCIRCLEPROFILEDEF(.AREA.,$,$,4.);
#10=IFCCARTESIANPOINT((0.,0.));
#11=IFCCARTESIANPOINT((0.,10.));
#12=IFCCARTESIANPOINT((10.,10.));
#13=IFCCARTESIANPOINT((10.,0.));
#14=IFCPOLYLINE((#10,#11,#12,#13,#10));
#15=IFCARBITRARYCLOSEDPROFILEDEF(.AREA.,'outline',#14);
#20=IFCCARTESIANPOINT((2.,2.));
#21=IFCCARTESIANPOINT((4.,2.));
#22=IFCCARTESIANPOINT((4.,4.));
#23=IFCPOLYLINE((#20,#21,#22,#20));
#24=IFCARBITRARYPROFILEDEFWITHVOIDS(.AREA.,$,#14,(#23));
#30=IFCCARTESIANPOINTLIST2D(((0.,0.),(4.,0.),(6.,2.),(4.,4.),(0.,4.)));
#31=IFCINDEXEDPOLYCURVE(#30,(IFCLINEINDEX((1,2)),IFCARCINDEX((2,3,4)),IFCLINEINDEX((4,5,1))),.F.);
#32=IFCARBITRARYCLOSEDPROFILEDEF(.AREA.,$,#31);
#33=IFCINDEXEDPOLYCURVE(#30,$,.F.);
#40=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,0.,200.);
ENDSEC;
"#;

    fn process(id: u32) -> Result<Profile2D> {
        let mut decoder = EntityDecoder::new(CONTENT);
        let def = decoder.decode_by_id(id)?;
        ProfileProcessor::new().process(&def, &mut decoder)
    }

    #[test]
    fn test_rectangle_with_position() {
        let profile = process(3).unwrap();
        assert_eq!(profile.outer.len(), 4);
        let xs: Vec<f64> = profile.outer.iter().map(|p| p.x).collect();
        assert_relative_eq!(xs.iter().cloned().fold(f64::INFINITY, f64::min), -100.0);
        assert_relative_eq!(xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max), 300.0);
    }

    #[test]
    fn test_circle() {
        let profile = process(4).unwrap();
        assert_eq!(profile.outer.len(), 16);
    }

    #[test]
    fn test_polyline_is_closed_and_ccw() {
        // written clockwise with a closing duplicate
        let profile = process(15).unwrap();
        assert_eq!(profile.outer.len(), 4);
        assert!(signed_area(&profile.outer) > 0.0);
    }

    #[test]
    fn test_profile_with_voids() {
        let profile = process(24).unwrap();
        assert_eq!(profile.holes.len(), 1);
        assert_eq!(profile.holes[0].len(), 3);
        assert!(signed_area(&profile.holes[0]) < 0.0);
        let tri = profile.triangulate().unwrap();
        assert_eq!(tri.points.len(), 7);
    }

    #[test]
    fn test_indexed_poly_curve_with_arc() {
        let profile = process(32).unwrap();
        // line (2) + arc (13, sharing one) + line (3, sharing one, closing dropped)
        assert_eq!(profile.outer.len(), 2 + ARC_SEGMENTS + 1);
        let max_x = profile.outer.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(max_x, 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_indexed_poly_curve_without_segments() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let curve = decoder.decode_by_id(33).unwrap();
        let points = ProfileProcessor::new().curve(&curve, &mut decoder).unwrap();
        assert_eq!(points.len(), 5);
    }

    #[test]
    fn test_invalid_dimension() {
        assert!(matches!(process(40), Err(Error::InvalidProfile(_))));
    }

    #[test]
    fn test_arc_through_half_circle() {
        let pts = arc_through(
            Point2::new(1.0, 0.0),
            Point2::new(0.0, -1.0),
            Point2::new(-1.0, 0.0),
        );
        assert_eq!(pts.len(), ARC_SEGMENTS + 1);
        // clockwise through the bottom
        assert!(pts[ARC_SEGMENTS / 2].y < -0.99);
        assert_relative_eq!(pts[ARC_SEGMENTS].x, -1.0, epsilon = 1e-9);
    }
}
