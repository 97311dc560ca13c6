// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry Router - dispatch of representation items to processors
//!
//! Element → IfcProductDefinitionShape → IfcShapeRepresentation → items.
//! Items are turned into meshes by the registered [`GeometryProcessor`]s,
//! then moved by the element's placement and scaled to meters.

use crate::placement::{parse_cartesian_transformation_operator, parse_placement, resolve_object_placement};
use crate::processors::{
    ExtrudedAreaSolidProcessor, FacetedBrepProcessor, PolygonalFaceSetProcessor,
    ShellBasedSurfaceModelProcessor, TriangulatedFaceSetProcessor,
};
use crate::{Error, Mesh, Result};
use ifc_glance_core::{DecodedEntity, EntityDecoder, IfcType};
use nalgebra::Matrix4;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::sync::Arc;

/// Geometry processor trait
/// Each processor handles one family of representation items
pub trait GeometryProcessor {
    /// Mesh of one item in its own coordinate system, file units
    fn process(&self, entity: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Mesh>;

    /// IFC types this processor accepts
    fn supported_types(&self) -> Vec<IfcType>;
}

/// Representation types that describe a 3D body
const BODY_TYPES: &[&str] = &[
    "Body",
    "SweptSolid",
    "Brep",
    "CSG",
    "Clipping",
    "SurfaceModel",
    "Tessellation",
    "MappedRepresentation",
    "AdvancedSweptSolid",
];

/// Nested mapped items / boolean operands followed at most this deep
const MAX_ITEM_DEPTH: usize = 16;

/// Geometry router - routes items to processors
pub struct GeometryRouter {
    processors: FxHashMap<IfcType, Arc<dyn GeometryProcessor>>,
    /// File length unit in meters
    unit_scale: f64,
    /// IfcRepresentationMap id → mesh in the map's parent frame
    mapped_cache: RefCell<FxHashMap<u32, Arc<Mesh>>>,
}

impl GeometryRouter {
    /// Router for a file in meters
    pub fn new() -> Self {
        Self::with_unit_scale(1.0)
    }

    /// Router with the default processors and a length unit scale
    pub fn with_unit_scale(unit_scale: f64) -> Self {
        let mut router = Self {
            processors: FxHashMap::default(),
            unit_scale,
            mapped_cache: RefCell::new(FxHashMap::default()),
        };
        router.register(Box::new(ExtrudedAreaSolidProcessor::new()));
        router.register(Box::new(TriangulatedFaceSetProcessor::new()));
        router.register(Box::new(PolygonalFaceSetProcessor::new()));
        router.register(Box::new(FacetedBrepProcessor::new()));
        router.register(Box::new(ShellBasedSurfaceModelProcessor::new()));
        router
    }

    /// Register a geometry processor for all of its types
    pub fn register(&mut self, processor: Box<dyn GeometryProcessor>) {
        let processor: Arc<dyn GeometryProcessor> = Arc::from(processor);
        for ifc_type in processor.supported_types() {
            self.processors.insert(ifc_type, Arc::clone(&processor));
        }
    }

    pub fn unit_scale(&self) -> f64 {
        self.unit_scale
    }

    /// Whether an item type can be turned into a mesh
    pub fn supports(&self, ifc_type: IfcType) -> bool {
        self.processors.contains_key(&ifc_type)
            || matches!(
                ifc_type,
                IfcType::IfcMappedItem | IfcType::IfcBooleanResult | IfcType::IfcBooleanClippingResult
            )
    }

    /// Mesh of a product in world coordinates, meters
    ///
    /// Elements without a representation give an empty mesh. Items no
    /// processor understands are skipped.
    pub fn process_element(&self, element: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Mesh> {
        let mut mesh = self.process_element_local(element, decoder)?;
        if mesh.is_empty() {
            return Ok(mesh);
        }

        let placement = resolve_object_placement(element, decoder)?;
        mesh.transform(&placement);
        mesh.scale(self.unit_scale);
        mesh.ensure_normals();
        Ok(mesh)
    }

    /// Merged item meshes before placement, file units
    pub fn process_element_local(&self, element: &DecodedEntity, decoder: &mut EntityDecoder) -> Result<Mesh> {
        let shape = match element.get(6) {
            Some(attr) => decoder.resolve_ref(attr)?,
            None => None,
        };
        let Some(shape) = shape else {
            return Ok(Mesh::new());
        };
        if shape.ifc_type != IfcType::IfcProductDefinitionShape {
            return Err(Error::geometry(format!(
                "#{}: expected IfcProductDefinitionShape, got {}",
                element.id, shape.type_name
            )));
        }

        let mut representations = Vec::new();
        for rep_id in shape.get_refs(2) {
            let rep = decoder.decode_by_id(rep_id)?;
            if rep.ifc_type == IfcType::IfcShapeRepresentation {
                representations.push(rep);
            }
        }

        // a 'Body' representation wins; otherwise any body-like type
        let has_body = representations
            .iter()
            .any(|rep| rep.get_string(1) == Some("Body"));
        let selected = representations.iter().filter(|rep| {
            if has_body {
                rep.get_string(1) == Some("Body")
            } else {
                rep.get_string(2).is_some_and(|t| BODY_TYPES.contains(&t))
            }
        });

        let mut mesh = Mesh::new();
        for rep in selected {
            for item_id in rep.get_refs(3) {
                let item = decoder.decode_by_id(item_id)?;
                match self.process_item(&item, decoder, 0) {
                    Ok(item_mesh) => mesh.merge(&item_mesh),
                    Err(Error::Unsupported(what)) => {
                        tracing::debug!(element = element.id, item = item.id, "skipping {}", what);
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(mesh)
    }

    /// Mesh of one representation item in its own frame, file units
    pub fn process_item(&self, item: &DecodedEntity, decoder: &mut EntityDecoder, depth: usize) -> Result<Mesh> {
        if depth > MAX_ITEM_DEPTH {
            return Err(Error::geometry(format!("#{}: items nested too deeply", item.id)));
        }

        match item.ifc_type {
            IfcType::IfcMappedItem => self.process_mapped_item(item, decoder, depth),
            IfcType::IfcBooleanResult | IfcType::IfcBooleanClippingResult => {
                // openings are not subtracted; the first operand stands in
                let operand = match item.get(1) {
                    Some(attr) => decoder.resolve_ref(attr)?,
                    None => None,
                }
                .ok_or_else(|| Error::geometry(format!("#{} has no FirstOperand", item.id)))?;
                self.process_item(&operand, decoder, depth + 1)
            }
            _ => match self.processors.get(&item.ifc_type) {
                Some(processor) => processor.process(item, decoder),
                None => Err(Error::Unsupported(item.type_name.clone())),
            },
        }
    }

    /// IfcMappedItem: shared source geometry under a per-instance operator
    fn process_mapped_item(&self, item: &DecodedEntity, decoder: &mut EntityDecoder, depth: usize) -> Result<Mesh> {
        let source_id = item
            .get_ref(0)
            .ok_or_else(|| Error::geometry(format!("#{} has no MappingSource", item.id)))?;

        let cached = self.mapped_cache.borrow().get(&source_id).cloned();
        let source = match cached {
            Some(mesh) => mesh,
            None => {
                let mesh = Arc::new(self.process_representation_map(source_id, decoder, depth)?);
                self.mapped_cache.borrow_mut().insert(source_id, Arc::clone(&mesh));
                mesh
            }
        };

        let target = match item.get(1) {
            Some(attr) => match decoder.resolve_ref(attr)? {
                Some(op) => parse_cartesian_transformation_operator(&op, decoder)?,
                None => Matrix4::identity(),
            },
            None => Matrix4::identity(),
        };

        let mut mesh = (*source).clone();
        mesh.transform(&target);
        Ok(mesh)
    }

    /// IfcRepresentationMap (MappingOrigin, MappedRepresentation)
    fn process_representation_map(&self, map_id: u32, decoder: &mut EntityDecoder, depth: usize) -> Result<Mesh> {
        let map = decoder.decode_by_id(map_id)?;

        let origin = match map.get(0) {
            Some(attr) => match decoder.resolve_ref(attr)? {
                Some(placement) => parse_placement(&placement, decoder)?,
                None => Matrix4::identity(),
            },
            None => Matrix4::identity(),
        };

        let mut mesh = Mesh::new();
        if let Some(rep) = match map.get(1) {
            Some(attr) => decoder.resolve_ref(attr)?,
            None => None,
        } {
            for item_id in rep.get_refs(3) {
                let item = decoder.decode_by_id(item_id)?;
                match self.process_item(&item, decoder, depth + 1) {
                    Ok(item_mesh) => mesh.merge(&item_mesh),
                    Err(Error::Unsupported(what)) => {
                        tracing::debug!(map = map_id, item = item.id, "skipping {}", what);
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        mesh.transform(&origin);
        Ok(mesh)
    }

    /// Drop cached mapped geometry
    pub fn clear_cache(&self) {
        self.mapped_cache.borrow_mut().clear();
    }
}

impl Default for GeometryRouter {
    fn default() -> Self {
        Self::new()
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
#2=IFCAXIS2PLACEMENT3D(#1,$,$);
#3=IFCLOCALPLACEMENT($,#2);
#4=IFCRECTANGLEPROFILEDEF(.AREA.,$,$,1000.,1000.);
#5=IFCEXTRUDEDAREASOLID(#4,#2,$,1000.);
#6=IFCSHAPEREPRESENTATION($,'Body','SweptSolid',(#5));
#7=IFCREPRESENTATIONMAP(#2,#6);
#8=IFCCARTESIANPOINT((5000.,0.,0.));
#9=IFCCARTESIANTRANSFORMATIONOPERATOR3D($,$,#8,$,$);
#10=IFCMAPPEDITEM(#7,#9);
#11=IFCSHAPEREPRESENTATION($,'Body','MappedRepresentation',(#10));
#12=IFCPRODUCTDEFINITIONSHAPE($,$,(#11));
#13=IFCFURNITURE('a',$,'Chair',$,$,#3,#12,$,$);
#20=IFCBOOLEANCLIPPINGRESULT(.DIFFERENCE.,#5,#30);
#21=IFCSHAPEREPRESENTATION($,'Body','Clipping',(#20,#22));
#22=IFCSPHERE(#2,10.);
#23=IFCPRODUCTDEFINITIONSHAPE($,$,(#21));
#24=IFCBEAM('b',$,'Beam',$,$,#3,#23,$,$);
#25=IFCPOLYLINE((#1,#8));
#26=IFCSHAPEREPRESENTATION($,'Axis','Curve2D',(#25));
#27=IFCPRODUCTDEFINITIONSHAPE($,$,(#26));
#28=IFCCOLUMN('c',$,'Column',$,$,#3,#27,$,$);
#29=IFCCOLUMN('d',$,'Column',$,$,#3,$,$,$);
#30=IFCHALFSPACESOLID(#2,.F.);
ENDSEC;
"#;

    fn element(id: u32, scale: f64) -> Result<Mesh> {
        let mut decoder = EntityDecoder::new(CONTENT);
        let entity = decoder.decode_by_id(id)?;
        GeometryRouter::with_unit_scale(scale).process_element(&entity, &mut decoder)
    }

    #[test]
    fn test_mapped_item_instancing() {
        let mesh = element(13, 0.001).unwrap();
        let bounds = mesh.bounds();
        assert_relative_eq!(bounds.min, Point3::new(4.5, -0.5, 0.0), epsilon = 1e-6);
        assert_relative_eq!(bounds.max, Point3::new(5.5, 0.5, 1.0), epsilon = 1e-6);
        assert_eq!(mesh.normals.len(), mesh.positions.len());
    }

    #[test]
    fn test_boolean_uses_first_operand_and_skips_unknown_items() {
        let mesh = element(24, 1.0).unwrap();
        assert_eq!(mesh.triangle_count(), 12);
    }

    #[test]
    fn test_no_body_geometry() {
        assert!(element(28, 1.0).unwrap().is_empty());
        assert!(element(29, 1.0).unwrap().is_empty());
    }

    #[test]
    fn test_mapped_cache_is_reused() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let router = GeometryRouter::new();
        let item = decoder.decode_by_id(10).unwrap();
        let first = router.process_item(&item, &mut decoder, 0).unwrap();
        assert_eq!(router.mapped_cache.borrow().len(), 1);
        let second = router.process_item(&item, &mut decoder, 0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_supports() {
        let router = GeometryRouter::new();
        assert!(router.supports(IfcType::IfcExtrudedAreaSolid));
        assert!(router.supports(IfcType::IfcMappedItem));
        assert!(!router.supports(IfcType::IfcPolyline));
    }
}
