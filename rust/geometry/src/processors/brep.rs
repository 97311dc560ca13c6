// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary representations built from poly loops
//!
//! IfcFacetedBrep, IfcFacetedBrepWithVoids and IfcShellBasedSurfaceModel all
//! bottom out in shells of IfcFace → IfcFaceBound → IfcPolyLoop.

use super::tessellated::add_polygon;
use crate::placement::parse_cartesian_point;
use crate::router::GeometryProcessor;
use crate::{Mesh, Point3, Result};
use ifc_glance_core::{DecodedEntity, EntityDecoder, IfcType};

/// Triangulate every face of a closed or open shell into `mesh`
fn process_shell(shell_id: u32, decoder: &mut EntityDecoder, mesh: &mut Mesh) -> Result<()> {
    let shell = decoder.decode_by_id(shell_id)?;
    for face_id in shell.get_refs(0) {
        let face = decoder.decode_by_id(face_id)?;

        let mut outer: Option<Vec<Point3<f64>>> = None;
        let mut holes = Vec::new();
        for bound_id in face.get_refs(0) {
            let bound = decoder.decode_by_id(bound_id)?;
            let Some(points) = bound_points(&bound, decoder)? else {
                continue;
            };
            if bound.ifc_type == IfcType::IfcFaceOuterBound {
                if let Some(previous) = outer.replace(points) {
                    holes.push(previous);
                }
            } else if outer.is_none() {
                outer = Some(points);
            } else {
                holes.push(points);
            }
        }

        if let Some(outer) = outer {
            // degenerate faces are skipped
            let _ = add_polygon(&outer, &holes, mesh);
        }
    }
    Ok(())
}

/// Loop points of an IfcFaceBound, reversed when Orientation is false
fn bound_points(bound: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Option<Vec<Point3<f64>>>> {
    let Some(loop_attr) = bound.get(0) else {
        return Ok(None);
    };
    let Some(poly_loop) = decoder.resolve_ref(loop_attr)? else {
        return Ok(None);
    };
    if poly_loop.ifc_type != IfcType::IfcPolyLoop {
        return Ok(None);
    }

    let mut points = Vec::new();
    for id in poly_loop.get_refs(0) {
        points.push(parse_cartesian_point(&*decoder.decode_by_id(id)?)?);
    }
    if bound.get(1).and_then(|v| v.as_bool()) == Some(false) {
        points.reverse();
    }
    Ok((points.len() >= 3).then_some(points))
}

/// IfcFacetedBrep and IfcFacetedBrepWithVoids
#[derive(Debug, Default, Clone, Copy)]
pub struct FacetedBrepProcessor;

impl FacetedBrepProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProcessor for FacetedBrepProcessor {
    fn process(&self, entity: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Mesh> {
        let mut mesh = Mesh::new();
        // Outer, then Voids for the WithVoids variant
        let mut shells = entity.get_refs(0);
        if entity.ifc_type == IfcType::IfcFacetedBrepWithVoids {
            shells.extend(entity.get_refs(1));
        }
        for shell in shells {
            process_shell(shell, decoder, &mut mesh)?;
        }
        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcFacetedBrep, IfcType::IfcFacetedBrepWithVoids]
    }
}

/// IfcShellBasedSurfaceModel
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellBasedSurfaceModelProcessor;

impl ShellBasedSurfaceModelProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProcessor for ShellBasedSurfaceModelProcessor {
    fn process(&self, entity: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Mesh> {
        let mut mesh = Mesh::new();
        for shell in entity.get_refs(0) {
            process_shell(shell, decoder, &mut mesh)?;
        }
        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcShellBasedSurfaceModel]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // unit cube, bottom face written with a reversed bound
    const CONTENT: &str = r#"
DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCCARTESIANPOINT((1.,0.,0.));
#3=IFCCARTESIANPOINT((1.,1.,0.));
#4=IFCCARTESIANPOINT((0.,1.,0.));
#5=IFCCARTESIANPOINT((0.,0.,1.));
#6=IFCCARTESIANPOINT((1.,0.,1.));
#7=IFCCARTESIANPOINT((1.,1.,1.));
#8=IFCCARTESIANPOINT((0.,1.,1.));
#10=IFCPOLYLOOP((#1,#2,#3,#4));
#11=IFCPOLYLOOP((#5,#6,#7,#8));
#12=IFCPOLYLOOP((#1,#2,#6,#5));
#13=IFCPOLYLOOP((#2,#3,#7,#6));
#14=IFCPOLYLOOP((#3,#4,#8,#7));
#15=IFCPOLYLOOP((#4,#1,#5,#8));
#20=IFCFACEOUTERBOUND(#10,.F.);
#21=IFCFACEOUTERBOUND(#11,.T.);
#22=IFCFACEOUTERBOUND(#12,.T.);
#23=IFCFACEOUTERBOUND(#13,.T.);
#24=IFCFACEOUTERBOUND(#14,.T.);
#25=IFCFACEOUTERBOUND(#15,.T.);
#30=IFCFACE((#20));
#31=IFCFACE((#21));
#32=IFCFACE((#22));
#33=IFCFACE((#23));
#34=IFCFACE((#24));
#35=IFCFACE((#25));
#40=IFCCLOSEDSHELL((#30,#31,#32,#33,#34,#35));
#41=IFCFACETEDBREP(#40);
#42=IFCOPENSHELL((#31));
#43=IFCSHELLBASEDSURFACEMODEL((#42));
ENDSEC;
"#;

    #[test]
    fn test_faceted_brep_cube() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let brep = decoder.decode_by_id(41).unwrap();
        let mesh = FacetedBrepProcessor.process(&brep, &mut decoder).unwrap();
        assert_eq!(mesh.triangle_count(), 12);

        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.max_dimension(), 1.0);

        // every face points away from the cube centre
        let center = Point3::new(0.5, 0.5, 0.5);
        for face in 0..mesh.triangle_count() {
            let [a, b, c] = mesh.triangle(face).unwrap();
            let n = (b - a).cross(&(c - a));
            assert!(n.dot(&(a - center)) > 0.0);
        }
    }

    #[test]
    fn test_shell_based_surface_model() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let model = decoder.decode_by_id(43).unwrap();
        let mesh = ShellBasedSurfaceModelProcessor
            .process(&model, &mut decoder)
            .unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.normals[2], 1.0);
    }
}
