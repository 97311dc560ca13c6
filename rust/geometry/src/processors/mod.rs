// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry processors
//!
//! One processor per family of representation items. Each produces a mesh
//! in the item's own coordinate system, in file units:
//!
//! - `extrusion`: IfcExtrudedAreaSolid
//! - `tessellated`: IfcTriangulatedFaceSet, IfcPolygonalFaceSet
//! - `brep`: IfcFacetedBrep(WithVoids), IfcShellBasedSurfaceModel
//!
//! Mapped items and boolean results recurse into other items and are
//! handled by the router.

mod brep;
mod extrusion;
mod tessellated;

pub use brep::{FacetedBrepProcessor, ShellBasedSurfaceModelProcessor};
pub use extrusion::ExtrudedAreaSolidProcessor;
pub use tessellated::{PolygonalFaceSetProcessor, TriangulatedFaceSetProcessor};

use crate::{Error, Point3, Result};
use ifc_glance_core::{AttributeValue, DecodedEntity, EntityDecoder};

/// Points of an IfcCartesianPointList3D referenced at `index`
pub(crate) fn point_list_3d(
    entity: &DecodedEntity,
    index: usize,
    decoder: &mut EntityDecoder,
) -> Result<Vec<Point3<f64>>> {
    let attr = entity
        .get(index)
        .ok_or_else(|| Error::geometry(format!("#{} has no coordinates", entity.id)))?;
    let list = decoder
        .resolve_ref(attr)?
        .ok_or_else(|| Error::geometry(format!("#{} coordinates are not set", entity.id)))?;
    let coords = list.get_list(0).unwrap_or(&[]);
    Ok(AttributeValue::parse_coordinate_list_3d(coords)
        .into_iter()
        .map(|(x, y, z)| Point3::new(x, y, z))
        .collect())
}

/// 1-based index list, optionally remapped through a PnIndex list
pub(crate) fn index_loop(values: &[AttributeValue], pn_index: Option<&[usize]>) -> Vec<usize> {
    values
        .iter()
        .filter_map(|v| {
            let i = usize::try_from(v.as_int()?).ok()?.checked_sub(1)?;
            match pn_index {
                Some(map) => map.get(i)?.checked_sub(1),
                None => Some(i),
            }
        })
        .collect()
}

/// Optional PnIndex attribute as plain 1-based integers
pub(crate) fn pn_index(entity: &DecodedEntity, index: usize) -> Option<Vec<usize>> {
    let list = entity.get_list(index)?;
    Some(
        list.iter()
            .filter_map(|v| usize::try_from(v.as_int()?).ok())
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_loop() {
        let values = vec![
            AttributeValue::Integer(1),
            AttributeValue::Integer(3),
            AttributeValue::Integer(0),
            AttributeValue::Integer(2),
        ];
        assert_eq!(index_loop(&values, None), vec![0, 2, 1]);
        assert_eq!(index_loop(&values, Some(&[5, 6, 7][..])), vec![4, 6, 5]);
    }
}
