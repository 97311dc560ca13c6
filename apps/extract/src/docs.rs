// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plain-text documents per element, for search indexing.

use crate::error::Result;
use crate::extract::ElementRecord;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentMetadata {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(rename = "expressID")]
    pub express_id: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    pub fn from_record(record: &ElementRecord) -> Result<Self> {
        let basic = &record.basic_properties;
        let content = format!(
            "Element type: {}. ExpressID: {}. GlobalId: {}. Name: {}. ObjectType: {}. PropertySets: {}",
            record.type_name,
            record.express_id,
            basic.global_id,
            basic.name,
            basic.object_type,
            serde_json::to_string(&record.property_sets)?
        );
        Ok(Self {
            content,
            metadata: DocumentMetadata {
                type_name: record.type_name.clone(),
                express_id: record.express_id,
                name: basic.name.clone(),
            },
        })
    }
}

/// One document per element, same order
pub fn documents(elements: &[ElementRecord]) -> Result<Vec<Document>> {
    elements.iter().map(Document::from_record).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{BasicProperties, ExportedSet, PropertySets, RawRecord};
    use ifc_glance_core::PropertyValue;

    #[test]
    fn test_document_content() {
        let record = ElementRecord {
            express_id: 60,
            type_name: "IFCWALLSTANDARDCASE".into(),
            basic_properties: BasicProperties {
                global_id: "2O2Fr$t4X7Zf8NOew3FLOH".into(),
                name: "Wall North".into(),
                object_type: String::new(),
            },
            property_sets: PropertySets(vec![ExportedSet {
                name: "Pset_WallCommon".into(),
                properties: vec![("IsExternal".into(), PropertyValue::Boolean(true))],
            }]),
            raw: RawRecord {
                express_id: 60,
                type_name: "IFCWALLSTANDARDCASE".into(),
                arguments: Vec::new(),
            },
        };

        let doc = Document::from_record(&record).unwrap();
        assert_eq!(
            doc.content,
            "Element type: IFCWALLSTANDARDCASE. ExpressID: 60. GlobalId: 2O2Fr$t4X7Zf8NOew3FLOH. \
             Name: Wall North. ObjectType: . PropertySets: {\"Pset_WallCommon\":{\"IsExternal\":true}}"
        );
        assert_eq!(doc.metadata.name, "Wall North");

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["metadata"]["expressID"], 60);
        assert_eq!(json["metadata"]["type"], "IFCWALLSTANDARDCASE");
    }
}
