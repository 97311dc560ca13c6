// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Placement parsing
//!
//! Axis placements, local placement chains and Cartesian transformation
//! operators, all producing column-major `Matrix4` transforms in file units.

use crate::{Error, Point3, Result, Vector3};
use ifc_glance_core::{AttributeValue, DecodedEntity, EntityDecoder, IfcType};
use nalgebra::{Matrix3, Matrix4};

/// Deepest IfcLocalPlacement chain that is followed
pub const MAX_PLACEMENT_DEPTH: usize = 100;

fn float_triplet(values: &[AttributeValue], default_z: f64) -> (f64, f64, f64) {
    let at = |i: usize, default: f64| values.get(i).and_then(|v| v.as_float()).unwrap_or(default);
    (at(0, 0.0), at(1, 0.0), at(2, default_z))
}

/// Coordinates of an IfcCartesianPoint (missing z is 0)
pub fn parse_cartesian_point(point: &DecodedEntity) -> Result<Point3<f64>> {
    if point.ifc_type != IfcType::IfcCartesianPoint {
        return Err(Error::geometry(format!(
            "#{}: expected IfcCartesianPoint, got {}",
            point.id, point.type_name
        )));
    }
    let coords = point
        .get_list(0)
        .ok_or_else(|| Error::geometry(format!("#{}: point has no coordinates", point.id)))?;
    let (x, y, z) = float_triplet(coords, 0.0);
    Ok(Point3::new(x, y, z))
}

/// Direction ratios of an IfcDirection (not normalized)
pub fn parse_direction(direction: &DecodedEntity) -> Result<Vector3<f64>> {
    if direction.ifc_type != IfcType::IfcDirection {
        return Err(Error::geometry(format!(
            "#{}: expected IfcDirection, got {}",
            direction.id, direction.type_name
        )));
    }
    let ratios = direction
        .get_list(0)
        .ok_or_else(|| Error::geometry(format!("#{}: direction has no ratios", direction.id)))?;
    let (x, y, z) = float_triplet(ratios, 0.0);
    Ok(Vector3::new(x, y, z))
}

/// Resolve an optional point reference at `index`
fn optional_point(
    entity: &DecodedEntity,
    index: usize,
    decoder: &mut EntityDecoder,
) -> Result<Option<Point3<f64>>> {
    match entity.get(index) {
        Some(attr) => match decoder.resolve_ref(attr)? {
            Some(point) => parse_cartesian_point(&point).map(Some),
            None => Ok(None),
        },
        None => Ok(None),
    }
}

/// Resolve an optional direction reference at `index`
fn optional_direction(
    entity: &DecodedEntity,
    index: usize,
    decoder: &mut EntityDecoder,
) -> Result<Option<Vector3<f64>>> {
    match entity.get(index) {
        Some(attr) => match decoder.resolve_ref(attr)? {
            Some(dir) => parse_direction(&dir).map(Some),
            None => Ok(None),
        },
        None => Ok(None),
    }
}

/// Orthonormal x/y/z axes from an optional Z axis and X reference
///
/// The reference direction is projected onto the plane normal to Z; when it
/// is missing or parallel to Z a perpendicular fallback is used.
pub fn orthonormal_axes(
    axis: Option<Vector3<f64>>,
    ref_direction: Option<Vector3<f64>>,
) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let z = axis
        .and_then(|a| a.try_normalize(1e-12))
        .unwrap_or_else(Vector3::z);
    let x_ref = ref_direction
        .and_then(|r| r.try_normalize(1e-12))
        .unwrap_or_else(Vector3::x);

    let projected = x_ref - z * x_ref.dot(&z);
    let x = projected.try_normalize(1e-6).unwrap_or_else(|| {
        let helper = if z.z.abs() < 0.9 { Vector3::z() } else { Vector3::x() };
        helper.cross(&z).normalize()
    });
    let y = z.cross(&x);
    (x, y, z)
}

fn frame(x: Vector3<f64>, y: Vector3<f64>, z: Vector3<f64>, origin: Point3<f64>) -> Matrix4<f64> {
    Matrix4::new(
        x.x, y.x, z.x, origin.x,
        x.y, y.y, z.y, origin.y,
        x.z, y.z, z.z, origin.z,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// IfcAxis2Placement3D (Location, Axis, RefDirection) as a rigid transform
pub fn parse_axis2_placement_3d(
    placement: &DecodedEntity,
    decoder: &mut EntityDecoder,
) -> Result<Matrix4<f64>> {
    let location = optional_point(placement, 0, decoder)?.unwrap_or_else(Point3::origin);
    let axis = optional_direction(placement, 1, decoder)?;
    let ref_direction = optional_direction(placement, 2, decoder)?;
    let (x, y, z) = orthonormal_axes(axis, ref_direction);
    Ok(frame(x, y, z, location))
}

/// IfcAxis2Placement2D (Location, RefDirection) as a 2D homogeneous transform
pub fn parse_axis2_placement_2d(
    placement: &DecodedEntity,
    decoder: &mut EntityDecoder,
) -> Result<Matrix3<f64>> {
    let location = optional_point(placement, 0, decoder)?.unwrap_or_else(Point3::origin);
    let x = optional_direction(placement, 1, decoder)?
        .map(|d| Vector3::new(d.x, d.y, 0.0))
        .and_then(|d| d.try_normalize(1e-12))
        .unwrap_or_else(Vector3::x);
    Ok(Matrix3::new(
        x.x, -x.y, location.x,
        x.y, x.x, location.y,
        0.0, 0.0, 1.0,
    ))
}

/// Any supported axis placement as a 3D transform
pub fn parse_placement(placement: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Matrix4<f64>> {
    match placement.ifc_type {
        IfcType::IfcAxis2Placement3D => parse_axis2_placement_3d(placement, decoder),
        IfcType::IfcAxis2Placement2D => {
            let m = parse_axis2_placement_2d(placement, decoder)?;
            Ok(Matrix4::new(
                m[(0, 0)], m[(0, 1)], 0.0, m[(0, 2)],
                m[(1, 0)], m[(1, 1)], 0.0, m[(1, 2)],
                0.0, 0.0, 1.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ))
        }
        _ => Ok(Matrix4::identity()),
    }
}

/// World transform of an IfcLocalPlacement chain (parent * local)
pub fn resolve_local_placement(
    placement: &DecodedEntity,
    decoder: &mut EntityDecoder,
) -> Result<Matrix4<f64>> {
    resolve_with_depth(placement, decoder, 0)
}

fn resolve_with_depth(
    placement: &DecodedEntity,
    decoder: &mut EntityDecoder,
    depth: usize,
) -> Result<Matrix4<f64>> {
    if depth > MAX_PLACEMENT_DEPTH || placement.ifc_type != IfcType::IfcLocalPlacement {
        return Ok(Matrix4::identity());
    }

    let parent = match placement.get(0) {
        Some(attr) => match decoder.resolve_ref(attr)? {
            Some(rel_to) => resolve_with_depth(&rel_to, decoder, depth + 1)?,
            None => Matrix4::identity(),
        },
        None => Matrix4::identity(),
    };

    let local = match placement.get(1) {
        Some(attr) => match decoder.resolve_ref(attr)? {
            Some(relative) => parse_placement(&relative, decoder)?,
            None => Matrix4::identity(),
        },
        None => Matrix4::identity(),
    };

    Ok(parent * local)
}

/// Transform of a product's ObjectPlacement (attribute 5)
pub fn resolve_object_placement(
    element: &DecodedEntity,
    decoder: &mut EntityDecoder,
) -> Result<Matrix4<f64>> {
    match element.get(5) {
        Some(attr) => match decoder.resolve_ref(attr)? {
            Some(placement) => resolve_local_placement(&placement, decoder),
            None => Ok(Matrix4::identity()),
        },
        None => Ok(Matrix4::identity()),
    }
}

/// IfcCartesianTransformationOperator3D(nonUniform) as a transform
///
/// Attributes: Axis1, Axis2, LocalOrigin, Scale, Axis3, then Scale2 and
/// Scale3 for the non-uniform variant.
pub fn parse_cartesian_transformation_operator(
    operator: &DecodedEntity,
    decoder: &mut EntityDecoder,
) -> Result<Matrix4<f64>> {
    let axis1 = optional_direction(operator, 0, decoder)?;
    let axis2 = optional_direction(operator, 1, decoder)?;
    let origin = optional_point(operator, 2, decoder)?.unwrap_or_else(Point3::origin);
    let scale = operator.get_float(3).unwrap_or(1.0);
    let axis3 = optional_direction(operator, 4, decoder)?;

    let (scale2, scale3) = if operator.ifc_type == IfcType::IfcCartesianTransformationOperator3DnonUniform {
        (
            operator.get_float(5).unwrap_or(scale),
            operator.get_float(6).unwrap_or(scale),
        )
    } else {
        (scale, scale)
    };

    let (x, _, z) = orthonormal_axes(axis3, axis1);
    // Axis2 only matters for its handedness
    let y = match axis2 {
        Some(a2) if a2.dot(&z.cross(&x)) < 0.0 => -z.cross(&x),
        _ => z.cross(&x),
    };

    Ok(frame(x * scale, y * scale2, z * scale3, origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const CONTENT: &str = r#"
ISO-10303-21;
DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCCARTESIANPOINT((100.,0.,50.));
#3=IFCDIRECTION((0.,0.,1.));
#4=IFCDIRECTION((0.,1.,0.));
#5=IFCAXIS2PLACEMENT3D(#1,$,$);
#6=IFCLOCALPLACEMENT($,#5);
#7=IFCAXIS2PLACEMENT3D(#2,#3,#4);
#8=IFCLOCALPLACEMENT(#6,#7);
#9=IFCLOCALPLACEMENT(#8,#7);
#10=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#2,2.,$);
#11=IFCCARTESIANPOINT((5.,5.));
#12=IFCAXIS2PLACEMENT2D(#11,#4);
#20=IFCWALL('guid',$,$,$,$,#9,$,$,$);
ENDSEC;
END-ISO-10303-21;
"#;

    #[test]
    fn test_axis_placement_rotation() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let placement = decoder.decode_by_id(7).unwrap();
        let m = parse_axis2_placement_3d(&placement, &mut decoder).unwrap();
        // RefDirection +Y: local x maps to world y
        let p = m.transform_point(&Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p, Point3::new(100.0, 1.0, 50.0), epsilon = 1e-12);
    }

    #[test]
    fn test_placement_chain() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let wall = decoder.decode_by_id(20).unwrap();
        let m = resolve_object_placement(&wall, &mut decoder).unwrap();
        // two nested 90° turns and offsets
        let origin = m.transform_point(&Point3::origin());
        assert_relative_eq!(origin, Point3::new(100.0, 100.0, 100.0), epsilon = 1e-9);
        let x = m.transform_vector(&Vector3::x());
        assert_relative_eq!(x, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_transformation_operator_scale() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let op = decoder.decode_by_id(10).unwrap();
        let m = parse_cartesian_transformation_operator(&op, &mut decoder).unwrap();
        let p = m.transform_point(&Point3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(p, Point3::new(102.0, 2.0, 52.0), epsilon = 1e-12);
    }

    #[test]
    fn test_axis2_placement_2d() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let placement = decoder.decode_by_id(12).unwrap();
        let m = parse_axis2_placement_2d(&placement, &mut decoder).unwrap();
        let p = m.transform_point(&nalgebra::Point2::new(1.0, 0.0));
        assert_relative_eq!(p, nalgebra::Point2::new(5.0, 6.0), epsilon = 1e-12);
    }

    #[test]
    fn test_orthonormal_fallback() {
        let (x, y, z) = orthonormal_axes(Some(Vector3::x()), Some(Vector3::x()));
        assert_relative_eq!(z, Vector3::x());
        assert_relative_eq!(x.dot(&z), 0.0, epsilon = 1e-12);
        assert_relative_eq!(x.cross(&y), z, epsilon = 1e-12);
    }
}
