// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property panel content for one element.
//!
//! Pure data; the browser bindings turn it into DOM nodes.

use crate::error::{Result, ViewerError};
use ifc_glance_core::{ElementAttributes, IfcModel, PropertySet};
use serde::Serialize;

pub const BASIC_PROPERTIES_TITLE: &str = "Basic Properties";
pub const UNNAMED_SET_TITLE: &str = "Property Set";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyRow {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyGroup {
    pub title: String,
    pub rows: Vec<PropertyRow>,
}

/// Everything the panel shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyPanel {
    pub express_id: u32,
    /// `"{TYPE} #{id}"`
    pub title: String,
    pub groups: Vec<PropertyGroup>,
}

impl PropertyPanel {
    /// Gather attributes and property sets of an element
    pub fn build(model: &mut IfcModel, express_id: u32) -> Result<Self> {
        let attributes = model
            .item_properties(express_id)?
            .ok_or(ViewerError::UnknownElement(express_id))?;
        let type_name = model.type_name(express_id).unwrap_or("UNKNOWN").to_string();
        let property_sets = model.property_sets(express_id)?;
        Ok(Self::from_parts(express_id, &type_name, &attributes, &property_sets))
    }

    /// Panel from already fetched data
    ///
    /// The basic group is always present. Property sets without a single
    /// valued member are left out.
    pub fn from_parts(
        express_id: u32,
        type_name: &str,
        attributes: &ElementAttributes,
        property_sets: &[PropertySet],
    ) -> Self {
        let mut groups = Vec::with_capacity(property_sets.len() + 1);
        groups.push(PropertyGroup {
            title: BASIC_PROPERTIES_TITLE.to_string(),
            rows: attributes
                .entries()
                .map(|(name, value)| PropertyRow {
                    name: name.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        });

        for set in property_sets.iter().filter(|s| s.has_values()) {
            groups.push(PropertyGroup {
                title: set
                    .name
                    .clone()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| UNNAMED_SET_TITLE.to_string()),
                rows: set
                    .valued()
                    .map(|(name, value)| PropertyRow {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                    .collect(),
            });
        }

        Self {
            express_id,
            title: format!("{} #{}", type_name, express_id),
            groups,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifc_glance_core::{Property, PropertySetKind, PropertyValue};

    fn set(name: Option<&str>, properties: Vec<(&str, Option<PropertyValue>)>) -> PropertySet {
        PropertySet {
            id: 1,
            name: name.map(str::to_string),
            kind: PropertySetKind::PropertySet,
            properties: properties
                .into_iter()
                .map(|(n, value)| Property {
                    name: n.to_string(),
                    value,
                })
                .collect(),
        }
    }

    #[test]
    fn test_groups() {
        let attributes = ElementAttributes {
            global_id: Some("3vB2YO$MX4xv5uCqZZG05x".into()),
            name: Some("Wall".into()),
            description: None,
            object_type: Some("Basic Wall".into()),
        };
        let sets = vec![
            set(Some("Pset_WallCommon"), vec![("IsExternal", Some(PropertyValue::Boolean(true))), ("Status", None)]),
            set(Some("Empty"), vec![("Status", None)]),
            set(None, vec![("Width", Some(PropertyValue::Real(0.2)))]),
        ];

        let panel = PropertyPanel::from_parts(60, "IFCWALL", &attributes, &sets);
        assert_eq!(panel.title, "IFCWALL #60");
        assert_eq!(panel.groups.len(), 3);

        let basic = &panel.groups[0];
        assert_eq!(basic.title, "Basic Properties");
        let names: Vec<&str> = basic.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["GlobalId", "Name", "ObjectType"]);

        assert_eq!(panel.groups[1].rows, vec![PropertyRow { name: "IsExternal".into(), value: "true".into() }]);
        assert_eq!(panel.groups[2].title, "Property Set");
        assert_eq!(panel.groups[2].rows[0].value, "0.2");
    }

    #[test]
    fn test_basic_group_even_when_empty() {
        let panel = PropertyPanel::from_parts(7, "IFCSLAB", &ElementAttributes::default(), &[]);
        assert_eq!(panel.groups.len(), 1);
        assert!(panel.groups[0].rows.is_empty());
    }
}
