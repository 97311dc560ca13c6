// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Element attributes and property sets
//!
//! Property sets reach an element through `IfcRelDefinesByProperties`. The
//! relation only points from the relationship to the element, so the model
//! builds an inverse index ([`PropertyIndex`]) once and answers lookups from
//! it.

use crate::decoder::EntityDecoder;
use crate::error::{Error, Result};
use crate::schema::IfcType;
use crate::value::{AttributeValue, DecodedEntity};
use rustc_hash::FxHashMap;
use std::fmt;

/// Basic IfcRoot / IfcObject attributes
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "PascalCase"))]
pub struct ElementAttributes {
    pub global_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub object_type: Option<String>,
}

impl ElementAttributes {
    /// Read attributes 0, 2, 3 and 4 of a rooted entity
    ///
    /// Entities that are not IfcRoot subtypes (points, directions, ...) have
    /// other attributes at these positions; only string values are taken.
    pub fn from_entity(entity: &DecodedEntity) -> Self {
        let text = |i: usize| entity.get_string(i).map(str::to_string);
        Self {
            global_id: text(0),
            name: text(2),
            description: text(3),
            object_type: text(4),
        }
    }

    /// Attributes in display order with their IFC names, skipping empty ones
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("GlobalId", self.global_id.as_deref()),
            ("Name", self.name.as_deref()),
            ("Description", self.description.as_deref()),
            ("ObjectType", self.object_type.as_deref()),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
    }
}

/// Scalar property value with typed STEP wrappers removed
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Real(f64),
    Integer(i64),
    Boolean(bool),
    /// IfcLogical; `None` is `.U.`
    Logical(Option<bool>),
    /// Enumeration literal without dots
    Enum(String),
}

impl PropertyValue {
    /// Convert an attribute into a scalar; `None` for null, references and lists
    pub fn from_attribute(attr: &AttributeValue) -> Option<Self> {
        let type_name = attr.type_name().unwrap_or("");

        match attr.inner() {
            AttributeValue::String(s) | AttributeValue::Binary(s) => {
                Some(PropertyValue::Text(s.clone()))
            }
            AttributeValue::Float(f) => Some(PropertyValue::Real(*f)),
            AttributeValue::Integer(i) => Some(PropertyValue::Integer(*i)),
            AttributeValue::Enum(e) => Some(Self::from_enum(type_name, e)),
            _ => None,
        }
    }

    fn from_enum(type_name: &str, literal: &str) -> Self {
        match (type_name, literal) {
            ("IFCLOGICAL", "T") => PropertyValue::Logical(Some(true)),
            ("IFCLOGICAL", "F") => PropertyValue::Logical(Some(false)),
            (_, "U") => PropertyValue::Logical(None),
            (_, "T") => PropertyValue::Boolean(true),
            (_, "F") => PropertyValue::Boolean(false),
            _ => PropertyValue::Enum(literal.to_string()),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) | PropertyValue::Enum(s) => f.write_str(s),
            PropertyValue::Real(v) => write!(f, "{}", v),
            PropertyValue::Integer(v) => write!(f, "{}", v),
            PropertyValue::Boolean(v) | PropertyValue::Logical(Some(v)) => write!(f, "{}", v),
            PropertyValue::Logical(None) => f.write_str("unknown"),
        }
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for PropertyValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PropertyValue::Text(s) | PropertyValue::Enum(s) => serializer.serialize_str(s),
            PropertyValue::Real(v) => serializer.serialize_f64(*v),
            PropertyValue::Integer(v) => serializer.serialize_i64(*v),
            PropertyValue::Boolean(v) | PropertyValue::Logical(Some(v)) => serializer.serialize_bool(*v),
            PropertyValue::Logical(None) => serializer.serialize_str("UNKNOWN"),
        }
    }
}

/// One named property or quantity
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Property {
    pub name: String,
    pub value: Option<PropertyValue>,
}

/// Kind of property definition attached to an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PropertySetKind {
    PropertySet,
    ElementQuantity,
}

/// IfcPropertySet or IfcElementQuantity with its resolved members
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PropertySet {
    pub id: u32,
    pub name: Option<String>,
    pub kind: PropertySetKind,
    pub properties: Vec<Property>,
}

impl PropertySet {
    /// Whether at least one member carries a value
    pub fn has_values(&self) -> bool {
        self.properties.iter().any(|p| p.value.is_some())
    }

    /// Members that carry a value, in file order
    pub fn valued(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties
            .iter()
            .filter_map(|p| p.value.as_ref().map(|v| (p.name.as_str(), v)))
    }

    /// Value of a member by name
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_ref())
    }
}

/// Inverse index: element id -> property definition ids
#[derive(Debug, Default, Clone)]
pub struct PropertyIndex {
    by_element: FxHashMap<u32, Vec<u32>>,
}

impl PropertyIndex {
    /// Build from the ids of all IfcRelDefinesByProperties records
    pub fn build(decoder: &mut EntityDecoder, relation_ids: &[u32]) -> Self {
        let mut by_element: FxHashMap<u32, Vec<u32>> = FxHashMap::default();

        for &rel_id in relation_ids {
            // IfcRelDefinesByProperties: [4]=RelatedObjects, [5]=RelatingPropertyDefinition
            let Ok(rel) = decoder.decode_by_id(rel_id) else {
                continue;
            };
            let Some(definition) = rel.get_ref(5) else {
                continue;
            };
            for element in rel.get_refs(4) {
                let defs = by_element.entry(element).or_default();
                if !defs.contains(&definition) {
                    defs.push(definition);
                }
            }
        }

        Self { by_element }
    }

    /// Property definition ids attached to an element, in relation order
    pub fn definitions_of(&self, element_id: u32) -> &[u32] {
        self.by_element
            .get(&element_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve every property and quantity set attached to an element
    ///
    /// Dangling definition references are skipped; other decode failures
    /// are returned.
    pub fn property_sets(&self, decoder: &mut EntityDecoder, element_id: u32) -> Result<Vec<PropertySet>> {
        let mut sets = Vec::new();
        for &definition in self.definitions_of(element_id) {
            match read_property_set(decoder, definition) {
                Ok(Some(set)) => sets.push(set),
                Ok(None) | Err(Error::EntityNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(sets)
    }

    /// Number of elements with at least one definition
    pub fn len(&self) -> usize {
        self.by_element.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_element.is_empty()
    }
}

/// Resolve a property definition; `None` for definition types that are not
/// property sets or quantity sets (e.g. IfcPropertySetTemplate references)
pub fn read_property_set(decoder: &mut EntityDecoder, definition_id: u32) -> Result<Option<PropertySet>> {
    let definition = decoder.decode_by_id(definition_id)?;

    let (kind, members_index) = match definition.ifc_type {
        // IfcPropertySet: [2]=Name, [4]=HasProperties
        IfcType::IfcPropertySet => (PropertySetKind::PropertySet, 4),
        // IfcElementQuantity: [2]=Name, [4]=MethodOfMeasurement, [5]=Quantities
        IfcType::IfcElementQuantity => (PropertySetKind::ElementQuantity, 5),
        _ => return Ok(None),
    };

    let mut properties = Vec::new();
    for member_id in definition.get_refs(members_index) {
        match decoder.decode_by_id(member_id) {
            Ok(member) => {
                if let Some(property) = read_property(&member) {
                    properties.push(property);
                }
            }
            Err(_) => continue,
        }
    }

    Ok(Some(PropertySet {
        id: definition_id,
        name: definition.get_string(2).map(str::to_string),
        kind,
        properties,
    }))
}

/// Read a single property or quantity; `None` when it has no name
pub fn read_property(entity: &DecodedEntity) -> Option<Property> {
    let name = entity.get_string(0)?.to_string();

    let value = match entity.ifc_type {
        // [2]=NominalValue
        IfcType::IfcPropertySingleValue => entity.get(2).and_then(PropertyValue::from_attribute),
        // [2]=EnumerationValues / ListValues
        IfcType::IfcPropertyEnumeratedValue | IfcType::IfcPropertyListValue => {
            entity.get_list(2).and_then(join_values)
        }
        // [2]=UpperBoundValue, [3]=LowerBoundValue
        IfcType::IfcPropertyBoundedValue => {
            let upper = entity.get(2).and_then(PropertyValue::from_attribute);
            let lower = entity.get(3).and_then(PropertyValue::from_attribute);
            match (lower, upper) {
                (Some(lower), Some(upper)) => Some(PropertyValue::Text(format!("{} - {}", lower, upper))),
                (one, other) => one.or(other),
            }
        }
        // IfcPhysicalSimpleQuantity: [3]=value
        IfcType::IfcQuantityLength
        | IfcType::IfcQuantityArea
        | IfcType::IfcQuantityVolume
        | IfcType::IfcQuantityCount
        | IfcType::IfcQuantityWeight
        | IfcType::IfcQuantityTime => entity.get(3).and_then(PropertyValue::from_attribute),
        _ => None,
    };

    Some(Property { name, value })
}

/// A single list entry stays typed; several are joined into text
fn join_values(values: &[AttributeValue]) -> Option<PropertyValue> {
    let mut scalars: Vec<PropertyValue> = values.iter().filter_map(PropertyValue::from_attribute).collect();
    match scalars.len() {
        0 => None,
        1 => scalars.pop(),
        _ => Some(PropertyValue::Text(
            scalars.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Token;

    const CONTENT: &str = r#"DATA;
#10=IFCWALL('2O2Fr$t4X7Zf8NOew3FLOH',$,'Basic Wall','Exterior','WT-200',$,$,$);
#20=IFCPROPERTYSINGLEVALUE('IsExternal',$,IFCBOOLEAN(.T.),$);
#21=IFCPROPERTYSINGLEVALUE('Reference',$,IFCIDENTIFIER('W-01'),$);
#22=IFCPROPERTYSINGLEVALUE('FireRating',$,$,$);
#23=IFCPROPERTYENUMERATEDVALUE('Status',$,(IFCLABEL('NEW'),IFCLABEL('EXISTING')),$);
#24=IFCPROPERTYBOUNDEDVALUE('Range',$,IFCREAL(10.),IFCREAL(2.),$,$);
#30=IFCPROPERTYSET('1pset',$,'Pset_WallCommon',$,(#20,#21,#22,#23,#24));
#31=IFCQUANTITYLENGTH('Length',$,$,4.5,$);
#32=IFCQUANTITYCOUNT('Openings',$,$,2,$);
#33=IFCELEMENTQUANTITY('1qto',$,'Qto_WallBaseQuantities',$,'',(#31,#32));
#34=IFCPROPERTYSET('2pset',$,'Pset_Empty',$,(#22));
#40=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#10),#30);
#41=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#10),#33);
#42=IFCRELDEFINESBYPROPERTIES('r3',$,$,$,(#10,#99),#34);
ENDSEC;"#;

    #[test]
    fn test_element_attributes() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let wall = decoder.decode_by_id(10).unwrap();
        let attrs = ElementAttributes::from_entity(&wall);
        assert_eq!(attrs.global_id.as_deref(), Some("2O2Fr$t4X7Zf8NOew3FLOH"));
        assert_eq!(attrs.name.as_deref(), Some("Basic Wall"));
        assert_eq!(attrs.description.as_deref(), Some("Exterior"));
        assert_eq!(attrs.object_type.as_deref(), Some("WT-200"));
        let keys: Vec<_> = attrs.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["GlobalId", "Name", "Description", "ObjectType"]);
    }

    #[test]
    fn test_property_value_from_typed() {
        let attr = AttributeValue::from_token(&Token::TypedValue("IFCLOGICAL", vec![Token::Enum("U")]));
        assert_eq!(PropertyValue::from_attribute(&attr), Some(PropertyValue::Logical(None)));

        let attr = AttributeValue::from_token(&Token::TypedValue("IFCLABEL", vec![Token::String("A")]));
        assert_eq!(PropertyValue::from_attribute(&attr), Some(PropertyValue::Text("A".into())));

        assert_eq!(PropertyValue::from_attribute(&AttributeValue::Null), None);
        assert_eq!(PropertyValue::from_attribute(&AttributeValue::EntityRef(3)), None);
        assert_eq!(PropertyValue::Real(0.25).to_string(), "0.25");
        assert_eq!(PropertyValue::Real(3.0).to_string(), "3");
    }

    #[test]
    fn test_inverse_index_and_sets() {
        let mut decoder = EntityDecoder::new(CONTENT);
        let index = PropertyIndex::build(&mut decoder, &[40, 41, 42]);
        assert_eq!(index.definitions_of(10), &[30, 33, 34]);
        assert_eq!(index.definitions_of(99), &[34]);
        assert!(index.definitions_of(1).is_empty());

        let pset = read_property_set(&mut decoder, 30).unwrap().unwrap();
        assert_eq!(pset.name.as_deref(), Some("Pset_WallCommon"));
        assert_eq!(pset.kind, PropertySetKind::PropertySet);
        assert_eq!(pset.properties.len(), 5);
        assert_eq!(pset.get("IsExternal"), Some(&PropertyValue::Boolean(true)));
        assert_eq!(pset.get("Reference"), Some(&PropertyValue::Text("W-01".into())));
        assert_eq!(pset.get("FireRating"), None);
        assert_eq!(pset.get("Status"), Some(&PropertyValue::Text("NEW, EXISTING".into())));
        assert_eq!(pset.get("Range"), Some(&PropertyValue::Text("2 - 10".into())));
        assert_eq!(pset.valued().count(), 4);

        let qto = read_property_set(&mut decoder, 33).unwrap().unwrap();
        assert_eq!(qto.kind, PropertySetKind::ElementQuantity);
        assert_eq!(qto.get("Length"), Some(&PropertyValue::Real(4.5)));
        assert_eq!(qto.get("Openings"), Some(&PropertyValue::Integer(2)));

        let empty = read_property_set(&mut decoder, 34).unwrap().unwrap();
        assert!(!empty.has_values());

        let sets = index.property_sets(&mut decoder, 10).unwrap();
        let names: Vec<_> = sets.iter().filter_map(|s| s.name.as_deref()).collect();
        assert_eq!(names, vec!["Pset_WallCommon", "Qto_WallBaseQuantities", "Pset_Empty"]);
    }

    #[test]
    fn test_non_set_definition() {
        let mut decoder = EntityDecoder::new(CONTENT);
        assert_eq!(read_property_set(&mut decoder, 10).unwrap(), None);
        assert!(read_property_set(&mut decoder, 500).is_err());
    }
}
