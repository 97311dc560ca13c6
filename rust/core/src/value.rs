// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded attribute values and entities

use crate::parser::Token;
use crate::schema::IfcType;

/// IFC entity attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Entity reference
    EntityRef(u32),
    /// String value with STEP escapes decoded
    String(String),
    /// Binary value as hex digits
    Binary(String),
    /// Integer value
    Integer(i64),
    /// Float value
    Float(f64),
    /// Enum value without the surrounding dots
    Enum(String),
    /// List of values
    List(Vec<AttributeValue>),
    /// Typed value such as IFCLABEL('x') or IFCLENGTHMEASURE(2.5)
    Typed {
        type_name: String,
        value: Box<AttributeValue>,
    },
    /// Null/undefined
    Null,
    /// Derived value (*)
    Derived,
}

impl AttributeValue {
    /// Convert from Token
    pub fn from_token(token: &Token) -> Self {
        match token {
            Token::EntityRef(id) => AttributeValue::EntityRef(*id),
            Token::String(s) => AttributeValue::String(decode_step_string(s)),
            Token::Binary(s) => AttributeValue::Binary(s.to_string()),
            Token::Integer(i) => AttributeValue::Integer(*i),
            Token::Float(f) => AttributeValue::Float(*f),
            Token::Enum(e) => AttributeValue::Enum(e.to_string()),
            Token::List(items) => {
                AttributeValue::List(items.iter().map(Self::from_token).collect())
            }
            Token::TypedValue(type_name, args) => {
                let value = match args.as_slice() {
                    [single] => Self::from_token(single),
                    many => AttributeValue::List(many.iter().map(Self::from_token).collect()),
                };
                AttributeValue::Typed {
                    type_name: type_name.to_string(),
                    value: Box::new(value),
                }
            }
            Token::Null => AttributeValue::Null,
            Token::Derived => AttributeValue::Derived,
        }
    }

    /// Value inside a typed wrapper, or the value itself
    #[inline]
    pub fn inner(&self) -> &AttributeValue {
        match self {
            AttributeValue::Typed { value, .. } => value.inner(),
            other => other,
        }
    }

    /// Get as entity reference
    #[inline]
    pub fn as_entity_ref(&self) -> Option<u32> {
        match self {
            AttributeValue::EntityRef(id) => Some(*id),
            _ => None,
        }
    }

    /// Get as string (looks through typed wrappers)
    #[inline]
    pub fn as_string(&self) -> Option<&str> {
        match self.inner() {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as enum literal
    #[inline]
    pub fn as_enum(&self) -> Option<&str> {
        match self.inner() {
            AttributeValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Get as float
    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match self.inner() {
            AttributeValue::Float(f) => Some(*f),
            AttributeValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as integer
    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self.inner() {
            AttributeValue::Integer(i) => Some(*i),
            AttributeValue::Float(f) => Some(*f as i64),
            _ => None,
        }
    }

    /// Get a STEP boolean (.T. / .F.)
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self.as_enum()? {
            "T" | "TRUE" => Some(true),
            "F" | "FALSE" => Some(false),
            _ => None,
        }
    }

    /// Get as list
    #[inline]
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self.inner() {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Type name of a typed value
    #[inline]
    pub fn type_name(&self) -> Option<&str> {
        match self {
            AttributeValue::Typed { type_name, .. } => Some(type_name),
            _ => None,
        }
    }

    /// Check if null/derived
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null | AttributeValue::Derived)
    }

    /// Entity references contained in a list attribute
    pub fn entity_refs(&self) -> Vec<u32> {
        match self.as_list() {
            Some(items) => items.iter().filter_map(|v| v.as_entity_ref()).collect(),
            None => self.as_entity_ref().into_iter().collect(),
        }
    }

    /// Parse a list of coordinate tuples into (x, y, z); missing z becomes 0
    pub fn parse_coordinate_list_3d(coord_list: &[AttributeValue]) -> Vec<(f64, f64, f64)> {
        coord_list
            .iter()
            .filter_map(|coord_attr| {
                let coord = coord_attr.as_list()?;
                let x = coord.first().and_then(|v| v.as_float()).unwrap_or(0.0);
                let y = coord.get(1).and_then(|v| v.as_float()).unwrap_or(0.0);
                let z = coord.get(2).and_then(|v| v.as_float()).unwrap_or(0.0);
                Some((x, y, z))
            })
            .collect()
    }
}

/// Decoded IFC entity with attributes
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEntity {
    pub id: u32,
    pub ifc_type: IfcType,
    /// STEP type name as written in the file, e.g. "IFCWALL"
    pub type_name: String,
    pub attributes: Vec<AttributeValue>,
}

impl DecodedEntity {
    /// Create new decoded entity
    pub fn new(id: u32, type_name: &str, attributes: Vec<AttributeValue>) -> Self {
        Self {
            id,
            ifc_type: IfcType::from_str(type_name),
            type_name: type_name.to_ascii_uppercase(),
            attributes,
        }
    }

    /// Get attribute by index
    pub fn get(&self, index: usize) -> Option<&AttributeValue> {
        self.attributes.get(index)
    }

    /// Get entity reference attribute
    pub fn get_ref(&self, index: usize) -> Option<u32> {
        self.get(index).and_then(|v| v.as_entity_ref())
    }

    /// Get string attribute
    pub fn get_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_string())
    }

    /// Get float attribute
    pub fn get_float(&self, index: usize) -> Option<f64> {
        self.get(index).and_then(|v| v.as_float())
    }

    /// Get enum attribute
    pub fn get_enum(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(|v| v.as_enum())
    }

    /// Get list attribute
    pub fn get_list(&self, index: usize) -> Option<&[AttributeValue]> {
        self.get(index).and_then(|v| v.as_list())
    }

    /// Entity references held by a list attribute
    pub fn get_refs(&self, index: usize) -> Vec<u32> {
        self.get(index).map(|v| v.entity_refs()).unwrap_or_default()
    }
}

/// JSON shape of a raw record: references as `{"ref": id}`, enums as
/// `{"enum": "T"}`, typed values as `{"type": "IFCLABEL", "value": ...}`
#[cfg(feature = "serde")]
impl serde::Serialize for AttributeValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::{SerializeMap, SerializeSeq};

        match self {
            AttributeValue::EntityRef(id) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("ref", id)?;
                map.end()
            }
            AttributeValue::String(s) => serializer.serialize_str(s),
            AttributeValue::Binary(hex) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("binary", hex)?;
                map.end()
            }
            AttributeValue::Integer(v) => serializer.serialize_i64(*v),
            AttributeValue::Float(v) => serializer.serialize_f64(*v),
            AttributeValue::Enum(e) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("enum", e)?;
                map.end()
            }
            AttributeValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            AttributeValue::Typed { type_name, value } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", type_name)?;
                map.serialize_entry("value", value)?;
                map.end()
            }
            AttributeValue::Null => serializer.serialize_none(),
            AttributeValue::Derived => serializer.serialize_str("*"),
        }
    }
}

/// Decode the escape sequences of a STEP string body
///
/// Handles `''`, `\\`, `\S\c` (ISO 8859 upper half), `\X\hh` (8-bit code),
/// `\X2\...\X0\` (UTF-16) and `\X4\...\X0\` (UTF-32). `\P?\` code page
/// switches are dropped.
pub fn decode_step_string(raw: &str) -> String {
    if !raw.contains('\\') && !raw.contains("''") {
        return raw.to_string();
    }

    let bytes = raw.as_bytes();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < bytes.len() {
        let rest = &raw[i..];

        if rest.starts_with("''") {
            out.push('\'');
            i += 2;
        } else if rest.starts_with("\\\\") {
            out.push('\\');
            i += 2;
        } else if let Some(ch) = rest.strip_prefix("\\S\\").and_then(|r| r.chars().next()) {
            // only an ASCII character can be shifted into the upper half
            if ch.is_ascii() {
                out.push(char::from(ch as u8 + 128));
            } else {
                out.push(ch);
            }
            i += 3 + ch.len_utf8();
        } else if let Some(code) = rest
            .strip_prefix("\\X\\")
            .and_then(|r| r.get(..2))
            .and_then(|h| u8::from_str_radix(h, 16).ok())
        {
            out.push(char::from(code));
            i += 5;
        } else if rest.starts_with("\\X2\\") || rest.starts_with("\\X4\\") {
            let width = if rest.starts_with("\\X2\\") { 4 } else { 8 };
            let body_start = 4;
            let body_end = rest.find("\\X0\\").unwrap_or(rest.len());
            let hex = &rest[body_start.min(body_end)..body_end];
            out.push_str(&decode_hex_units(hex, width));
            i += (body_end + 4).min(rest.len());
        } else if rest.starts_with("\\P") && rest.len() >= 4 && bytes[i + 3] == b'\\' {
            i += 4;
        } else {
            let ch = rest.chars().next().unwrap_or('\u{FFFD}');
            out.push(ch);
            i += ch.len_utf8();
        }
    }

    out
}

/// Decode fixed-width hex code units (4 digits UTF-16, 8 digits UTF-32)
fn decode_hex_units(hex: &str, width: usize) -> String {
    let units: Vec<u32> = hex
        .as_bytes()
        .chunks(width)
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .filter_map(|s| u32::from_str_radix(s, 16).ok())
        .collect();

    if width == 4 {
        let utf16: Vec<u16> = units.iter().map(|&u| u as u16).collect();
        String::from_utf16_lossy(&utf16)
    } else {
        units
            .into_iter()
            .map(|u| char::from_u32(u).unwrap_or('\u{FFFD}'))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_value_conversion() {
        let attr = AttributeValue::from_token(&Token::EntityRef(123));
        assert_eq!(attr.as_entity_ref(), Some(123));

        let attr = AttributeValue::from_token(&Token::String("test"));
        assert_eq!(attr.as_string(), Some("test"));
    }

    #[test]
    fn test_typed_value_unwraps() {
        let token = Token::TypedValue("IFCLENGTHMEASURE", vec![Token::Float(2.5)]);
        let attr = AttributeValue::from_token(&token);
        assert_eq!(attr.type_name(), Some("IFCLENGTHMEASURE"));
        assert_eq!(attr.as_float(), Some(2.5));

        let token = Token::TypedValue("IFCBOOLEAN", vec![Token::Enum("T")]);
        assert_eq!(AttributeValue::from_token(&token).as_bool(), Some(true));
    }

    #[test]
    fn test_decoded_entity() {
        let entity = DecodedEntity::new(
            1,
            "IFCWALL",
            vec![
                AttributeValue::EntityRef(2),
                AttributeValue::String("Wall-001".to_string()),
                AttributeValue::Float(3.5),
                AttributeValue::List(vec![
                    AttributeValue::EntityRef(7),
                    AttributeValue::Null,
                    AttributeValue::EntityRef(8),
                ]),
            ],
        );

        assert_eq!(entity.ifc_type, IfcType::IfcWall);
        assert_eq!(entity.get_ref(0), Some(2));
        assert_eq!(entity.get_string(1), Some("Wall-001"));
        assert_eq!(entity.get_float(2), Some(3.5));
        assert_eq!(entity.get_refs(3), vec![7, 8]);
        assert_eq!(entity.get(9), None);
    }

    #[test]
    fn test_decode_step_string() {
        assert_eq!(decode_step_string("plain"), "plain");
        assert_eq!(decode_step_string("It''s"), "It's");
        assert_eq!(decode_step_string("Stra\\X2\\00DF\\X0\\e"), "Straße");
        assert_eq!(decode_step_string("W\\X\\E4nde"), "Wände");
        assert_eq!(decode_step_string("\\S\\D"), "Ä");
        assert_eq!(decode_step_string("a\\\\b"), "a\\b");
        assert_eq!(decode_step_string("\\X4\\0001F600\\X0\\"), "😀");
    }

    #[test]
    fn test_decode_step_string_non_ascii_after_escape() {
        assert_eq!(decode_step_string("\\S\\é"), "é");
        assert_eq!(decode_step_string("W\\S\\ände"), "Wände");
        assert_eq!(decode_step_string("\\X\\aé"), "\\X\\aé");
        assert_eq!(decode_step_string("\\X\\éa"), "\\X\\éa");
        assert_eq!(decode_step_string("end \\X\\a"), "end \\X\\a");
        assert_eq!(decode_step_string("\\S\\"), "\\S\\");
        assert_eq!(decode_step_string("Stra\\X2\\00DF"), "Straß");
        assert_eq!(decode_step_string("\\X2\\00é"), "");
    }
}
