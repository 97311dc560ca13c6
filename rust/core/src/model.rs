// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Opened IFC model: one scan, then lookups by express id
//!
//! ```rust,ignore
//! let mut model = IfcModel::open(&bytes)?;
//! for &wall in model.all_items_of_type(IfcType::IfcWallStandardCase) {
//!     let attrs = model.item_properties(wall)?;
//!     let psets = model.property_sets(wall)?;
//! }
//! ```

use crate::decoder::{EntityDecoder, EntityIndex};
use crate::error::{Error, Result};
use crate::header::{parse_header, FileHeader};
use crate::parser::EntityScanner;
use crate::properties::{ElementAttributes, PropertyIndex, PropertySet};
use crate::schema::IfcType;
use crate::spatial::{SpatialNode, SpatialRelations};
use crate::units::extract_length_unit_scale;
use crate::value::DecodedEntity;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Parsed entity store with the indexes the viewer and extractor need
pub struct IfcModel {
    decoder: EntityDecoder,
    header: FileHeader,
    /// Ids per interpreted type, ascending
    by_type: FxHashMap<IfcType, Vec<u32>>,
    max_express_id: u32,
    length_unit_scale: f64,
    property_index: PropertyIndex,
    spatial: SpatialRelations,
}

impl IfcModel {
    /// Open a model from raw file bytes
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let content = std::str::from_utf8(bytes).map_err(|e| Error::Encoding(e.to_string()))?;
        Self::from_content(content)
    }

    /// Open a model from text content
    pub fn from_content(content: impl Into<Arc<str>>) -> Result<Self> {
        let content: Arc<str> = content.into();
        if !content.contains("DATA") {
            return Err(Error::EmptyModel);
        }

        let mut index = EntityIndex::with_capacity_and_hasher(content.len() / 50, Default::default());
        let mut by_type: FxHashMap<IfcType, Vec<u32>> = FxHashMap::default();
        let mut max_express_id = 0;

        let mut scanner = EntityScanner::new(&content);
        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            index.insert(id, (start, end));
            max_express_id = max_express_id.max(id);

            let ifc_type = IfcType::from_str(type_name);
            if ifc_type != IfcType::Unknown {
                by_type.entry(ifc_type).or_default().push(id);
            }
        }

        if index.is_empty() {
            return Err(Error::EmptyModel);
        }
        for ids in by_type.values_mut() {
            ids.sort_unstable();
        }

        let header = parse_header(&content);
        let mut decoder = EntityDecoder::with_arc_index(Arc::clone(&content), Arc::new(index));

        let ids_of = |t: IfcType| by_type.get(&t).map(Vec::as_slice).unwrap_or(&[]);

        let length_unit_scale = match ids_of(IfcType::IfcProject).first() {
            Some(&project) => extract_length_unit_scale(&mut decoder, project).unwrap_or(1.0),
            None => 1.0,
        };

        let property_index = PropertyIndex::build(&mut decoder, ids_of(IfcType::IfcRelDefinesByProperties));
        let spatial = SpatialRelations::collect(
            &mut decoder,
            ids_of(IfcType::IfcRelAggregates),
            ids_of(IfcType::IfcRelContainedInSpatialStructure),
        );

        // relationship records are not needed again
        decoder.clear_cache();

        Ok(Self {
            decoder,
            header,
            by_type,
            max_express_id,
            length_unit_scale,
            property_index,
            spatial,
        })
    }

    /// Largest express id in the DATA section
    pub fn max_express_id(&self) -> u32 {
        self.max_express_id
    }

    /// Number of entity records
    pub fn entity_count(&self) -> usize {
        self.decoder.index().len()
    }

    /// Whether an express id has a record
    pub fn contains(&self, express_id: u32) -> bool {
        self.decoder.contains(express_id)
    }

    /// Decoded entity, or `None` when the id has no record
    pub fn line(&mut self, express_id: u32) -> Result<Option<Arc<DecodedEntity>>> {
        if !self.decoder.contains(express_id) {
            return Ok(None);
        }
        self.decoder.decode_by_id(express_id).map(Some)
    }

    /// STEP type name as written, e.g. "IFCWALL"
    pub fn type_name(&self, express_id: u32) -> Option<&str> {
        self.decoder.type_name_of(express_id)
    }

    /// Interpreted type of a record
    pub fn ifc_type(&self, express_id: u32) -> IfcType {
        self.type_name(express_id)
            .map(IfcType::from_str)
            .unwrap_or(IfcType::Unknown)
    }

    /// Schema-cased type name ("IfcWall"); falls back to the STEP name
    pub fn readable_type_name(&self, express_id: u32) -> Option<String> {
        let step = self.type_name(express_id)?;
        Some(match IfcType::from_str(step) {
            IfcType::Unknown => step.to_ascii_uppercase(),
            known => known.name().to_string(),
        })
    }

    /// All ids of one type, ascending (exact type, subtypes not included)
    pub fn all_items_of_type(&self, ifc_type: IfcType) -> &[u32] {
        self.by_type.get(&ifc_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of every interpreted type that can carry a shape, ascending
    pub fn geometry_element_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .by_type
            .iter()
            .filter(|(t, _)| t.has_geometry())
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// GlobalId, Name, Description and ObjectType of an element
    pub fn item_properties(&mut self, express_id: u32) -> Result<Option<ElementAttributes>> {
        Ok(self
            .line(express_id)?
            .map(|entity| ElementAttributes::from_entity(&entity)))
    }

    /// Property and quantity sets attached through IfcRelDefinesByProperties
    pub fn property_sets(&mut self, express_id: u32) -> Result<Vec<PropertySet>> {
        self.property_index.property_sets(&mut self.decoder, express_id)
    }

    /// Spatial tree rooted at the first IfcProject
    pub fn spatial_structure(&mut self) -> Option<SpatialNode> {
        let root = *self.all_items_of_type(IfcType::IfcProject).first()?;
        Some(self.spatial.build_tree(&mut self.decoder, root))
    }

    /// Parsed HEADER section
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Multiplier from file length units to meters
    pub fn length_unit_scale(&self) -> f64 {
        self.length_unit_scale
    }

    /// Inverse property index, shareable across worker threads
    pub fn property_index(&self) -> &PropertyIndex {
        &self.property_index
    }

    pub fn decoder(&self) -> &EntityDecoder {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut EntityDecoder {
        &mut self.decoder
    }

    /// Drop decoded entities held in the cache
    pub fn clear_cache(&mut self) {
        self.decoder.clear_cache();
    }
}

impl std::fmt::Debug for IfcModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IfcModel")
            .field("schema", &self.header.schema())
            .field("entities", &self.entity_count())
            .field("max_express_id", &self.max_express_id)
            .field("length_unit_scale", &self.length_unit_scale)
            .finish()
    }
}
