// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reshape every record of a model into an exportable element.

use crate::error::{ExtractError, Result};
use ifc_glance_core::{
    AttributeValue, DecodedEntity, ElementAttributes, EntityDecoder, IfcModel, PropertyIndex,
    PropertySetKind, PropertyValue,
};
use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// GlobalId, Name and ObjectType; empty strings when missing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BasicProperties {
    pub global_id: String,
    pub name: String,
    pub object_type: String,
}

impl From<ElementAttributes> for BasicProperties {
    fn from(attributes: ElementAttributes) -> Self {
        Self {
            global_id: attributes.global_id.unwrap_or_default(),
            name: attributes.name.unwrap_or_default(),
            object_type: attributes.object_type.unwrap_or_default(),
        }
    }
}

/// One exported property set; serialized as `{ name: value, ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedSet {
    pub name: String,
    pub properties: Vec<(String, PropertyValue)>,
}

impl ExportedSet {
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl Serialize for ExportedSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.properties.iter().map(|(k, v)| (k, v)))
    }
}

/// Property sets keyed by name, in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySets(pub Vec<ExportedSet>);

impl PropertySets {
    pub fn get(&self, name: &str) -> Option<&ExportedSet> {
        self.0.iter().find(|s| s.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Add a set; a later set with the same name replaces the earlier one
    fn insert(&mut self, set: ExportedSet) {
        match self.0.iter_mut().find(|s| s.name == set.name) {
            Some(existing) => *existing = set,
            None => self.0.push(set),
        }
    }
}

impl Serialize for PropertySets {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for set in &self.0 {
            map.serialize_entry(&set.name, set)?;
        }
        map.end()
    }
}

/// The record as written in the file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    #[serde(rename = "expressID")]
    pub express_id: u32,
    #[serde(rename = "type")]
    pub type_name: String,
    pub arguments: Vec<AttributeValue>,
}

/// One exported element
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementRecord {
    #[serde(rename = "expressID")]
    pub express_id: u32,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(rename = "BasicProperties")]
    pub basic_properties: BasicProperties,
    #[serde(rename = "PropertySets")]
    pub property_sets: PropertySets,
    #[serde(rename = "RawIFC")]
    pub raw: RawRecord,
}

/// Top-level document `{ "elements": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Export {
    pub elements: Vec<ElementRecord>,
}

/// Whether a record is an IfcRoot subtype: a 22 character GlobalId
/// followed by an owner history reference or `$`
pub fn is_rooted(entity: &DecodedEntity) -> bool {
    let global_id = matches!(entity.get(0), Some(AttributeValue::String(g)) if g.len() == 22);
    global_id
        && matches!(
            entity.get(1),
            Some(AttributeValue::EntityRef(_)) | Some(AttributeValue::Null)
        )
}

/// Reshape every record from id 1 to the highest id, in ascending order
///
/// Work is spread over the current rayon pool; each worker decodes with its
/// own cache over the shared content and index.
pub fn extract(model: &IfcModel, target_psets: &[String]) -> Export {
    let decoder = model.decoder();
    let index = model.property_index();

    let elements: Vec<ElementRecord> = (1..=model.max_express_id())
        .into_par_iter()
        .map_init(
            || decoder.fork(),
            |decoder, id| element_record(decoder, index, id, target_psets),
        )
        .flatten()
        .collect();

    tracing::info!(
        elements = elements.len(),
        max_express_id = model.max_express_id(),
        "extracted elements"
    );
    Export { elements }
}

/// Reshape one record; `None` when the id has no record
pub fn element_record(
    decoder: &mut EntityDecoder,
    index: &PropertyIndex,
    express_id: u32,
    target_psets: &[String],
) -> Option<ElementRecord> {
    if !decoder.contains(express_id) {
        return None;
    }
    let entity = match decoder.decode_by_id(express_id) {
        Ok(entity) => entity,
        Err(e) => {
            tracing::warn!(express_id, "skipping undecodable record: {}", e);
            return None;
        }
    };

    let basic_properties = if is_rooted(&entity) {
        ElementAttributes::from_entity(&entity).into()
    } else {
        BasicProperties::default()
    };

    let sets = index.property_sets(decoder, express_id).unwrap_or_else(|e| {
        tracing::warn!(express_id, "cannot read property sets: {}", e);
        Vec::new()
    });
    let mut property_sets = PropertySets::default();
    for set in sets {
        // quantity sets carry no HasProperties
        if set.kind != PropertySetKind::PropertySet {
            continue;
        }
        let Some(name) = set.name.filter(|n| target_psets.contains(n)) else {
            continue;
        };
        let properties: Vec<(String, PropertyValue)> = set
            .properties
            .into_iter()
            .filter_map(|p| Some((p.name, p.value?)))
            .filter(|(name, _)| !name.is_empty())
            .collect();
        if !properties.is_empty() {
            property_sets.insert(ExportedSet { name, properties });
        }
    }

    Some(ElementRecord {
        express_id,
        type_name: entity.type_name.clone(),
        basic_properties,
        property_sets,
        raw: RawRecord {
            express_id,
            type_name: entity.type_name.clone(),
            arguments: entity.attributes.clone(),
        },
    })
}

/// Write a value as 2-space indented JSON
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let write_error = |source| ExtractError::Write {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(write_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC4'));
ENDSEC;
DATA;
#1=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Wall',$,$,$,$,$,$);
#2=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#3=IFCPROPERTYSINGLEVALUE('Status',$,$,$);
#4=IFCPROPERTYSET('1a8kVn3wH0Qe9xPz5s2Lr4',$,'Pset_WallCommon',$,(#2,#3));
#5=IFCRELDEFINESBYPROPERTIES('1a8kVn3wH0Qe9xPz5s2Lr9',$,$,$,(#1),#4);
#6=IFCPROPERTYSINGLEVALUE('Colour',$,IFCLABEL('Red'),$);
#7=IFCPROPERTYSET('1a8kVn3wH0Qe9xPz5s2LrA',$,'Custom',$,(#6));
#8=IFCRELDEFINESBYPROPERTIES('1a8kVn3wH0Qe9xPz5s2LrB',$,$,$,(#1),#7);
#10=IFCCARTESIANPOINT((0.,1.,2.));
ENDSEC;
END-ISO-10303-21;
"#;

    fn targets() -> Vec<String> {
        vec!["Pset_WallCommon".to_string()]
    }

    #[test]
    fn test_extract_skips_gaps_and_filters_sets() {
        let model = IfcModel::from_content(MODEL).unwrap();
        let export = extract(&model, &targets());

        let ids: Vec<u32> = export.elements.iter().map(|e| e.express_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8, 10]);

        let wall = &export.elements[0];
        assert_eq!(wall.type_name, "IFCWALL");
        assert_eq!(wall.basic_properties.name, "Wall");
        assert_eq!(wall.basic_properties.object_type, "");
        assert_eq!(wall.property_sets.len(), 1);
        let pset = wall.property_sets.get("Pset_WallCommon").unwrap();
        assert_eq!(pset.properties.len(), 1);
        assert_eq!(pset.get("IsExternal"), Some(&PropertyValue::Boolean(true)));
    }

    #[test]
    fn test_non_rooted_records_have_empty_basics() {
        let model = IfcModel::from_content(MODEL).unwrap();
        let export = extract(&model, &targets());

        let value = export.elements.iter().find(|e| e.express_id == 2).unwrap();
        assert_eq!(value.basic_properties, BasicProperties::default());
        let point = export.elements.last().unwrap();
        assert_eq!(point.type_name, "IFCCARTESIANPOINT");
        assert!(point.property_sets.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let model = IfcModel::from_content(MODEL).unwrap();
        let export = extract(&model, &targets());
        let json = serde_json::to_value(&export.elements[0]).unwrap();

        assert_eq!(json["expressID"], 1);
        assert_eq!(json["type"], "IFCWALL");
        assert_eq!(json["BasicProperties"]["GlobalId"], "2O2Fr$t4X7Zf8NOew3FLOH");
        assert_eq!(json["BasicProperties"]["ObjectType"], "");
        assert_eq!(json["PropertySets"]["Pset_WallCommon"]["IsExternal"], true);
        assert!(json["PropertySets"].get("Custom").is_none());
        assert_eq!(json["RawIFC"]["type"], "IFCWALL");
        assert_eq!(json["RawIFC"]["arguments"][2], "Wall");
        assert!(json["RawIFC"]["arguments"][1].is_null());

        let value = serde_json::to_value(&export.elements[1].raw).unwrap();
        assert_eq!(value["arguments"][2]["type"], "IFCBOOLEAN");
        assert_eq!(value["arguments"][2]["value"]["enum"], "T");
    }
}
