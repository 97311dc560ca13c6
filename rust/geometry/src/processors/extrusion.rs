// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! IfcExtrudedAreaSolid

use crate::extrusion::{direction_transform, extrude_profile};
use crate::placement::{parse_axis2_placement_3d, parse_direction};
use crate::profiles::ProfileProcessor;
use crate::router::GeometryProcessor;
use crate::{Error, Mesh, Result, Vector3};
use ifc_glance_core::{DecodedEntity, EntityDecoder, IfcType};

/// Extrudes the swept area along ExtrudedDirection by Depth
#[derive(Debug, Default)]
pub struct ExtrudedAreaSolidProcessor {
    profiles: ProfileProcessor,
}

impl ExtrudedAreaSolidProcessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeometryProcessor for ExtrudedAreaSolidProcessor {
    fn process(&self, entity: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Mesh> {
        // SweptArea, Position, ExtrudedDirection, Depth
        let swept_area = match entity.get(0) {
            Some(attr) => decoder.resolve_ref(attr)?,
            None => None,
        }
        .ok_or_else(|| Error::geometry(format!("#{} has no SweptArea", entity.id)))?;
        let profile = self.profiles.process(&swept_area, decoder)?;

        let direction = match entity.get(2) {
            Some(attr) => match decoder.resolve_ref(attr)? {
                Some(dir) => parse_direction(&dir)?,
                None => Vector3::z(),
            },
            None => Vector3::z(),
        };

        let depth = entity
            .get_float(3)
            .ok_or_else(|| Error::InvalidExtrusion(format!("#{} has no Depth", entity.id)))?;

        let local = direction_transform(&direction, depth);
        let mut mesh = extrude_profile(&profile, depth, local.as_ref())?;

        if let Some(attr) = entity.get(1) {
            if let Some(position) = decoder.resolve_ref(attr)? {
                mesh.transform(&parse_axis2_placement_3d(&position, decoder)?);
            }
        }

        Ok(mesh)
    }

    fn supported_types(&self) -> Vec<IfcType> {
        vec![IfcType::IfcExtrudedAreaSolid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    const CONTENT: &str = r#"
DATA;
#1=IFCCARTESIANPOINT((0.,0.,0.));
#2=IFCDIRECTION((0.,0.,-1.));
#3=IFCAXIS2PLACEMENT3D(#1,$,$);
#4=IFCCARTESIANPOINT((10.,0.,5.));
#5=IFCAXIS2PLACEMENT3D(#4,$,$);
#6=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,2.,4.);
#7=IFCEXTRUDEDAREASOLID(#6,#5,#2,3.);
#8=IFCEXTRUDEDAREASOLID(#6,$,$,3.);
#9=IFCEXTRUDEDAREASOLID(#6,#3,#2,-1.);
ENDSEC;
"#;

    fn run(id: u32) -> Result<Mesh> {
        let mut decoder = EntityDecoder::new(CONTENT);
        let solid = decoder.decode_by_id(id)?;
        ExtrudedAreaSolidProcessor::new().process(&solid, &mut decoder)
    }

    #[test]
    fn test_downward_extrusion_with_position() {
        let mesh = run(7).unwrap();
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min, Point3::new(9.0, -2.0, 2.0));
        assert_relative_eq!(bounds.max, Point3::new(11.0, 2.0, 5.0));
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_defaults() {
        let bounds = run(8).unwrap().bounds();
        assert_relative_eq!(bounds.min.z, 0.0);
        assert_relative_eq!(bounds.max.z, 3.0);
    }

    #[test]
    fn test_negative_depth() {
        assert!(matches!(run(9), Err(Error::InvalidExtrusion(_))));
    }
}
