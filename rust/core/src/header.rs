// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! STEP HEADER section: schema identifier and file name record

use crate::parser::parse_header_record;
use crate::value::AttributeValue;

/// Information from the HEADER section
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileHeader {
    /// Schema identifiers from FILE_SCHEMA, e.g. ["IFC4"]
    pub schemas: Vec<String>,
    /// FILE_NAME name
    pub name: Option<String>,
    /// FILE_NAME time stamp
    pub time_stamp: Option<String>,
    /// FILE_NAME originating system
    pub originating_system: Option<String>,
}

impl FileHeader {
    /// Primary schema identifier, e.g. "IFC2X3"
    pub fn schema(&self) -> Option<&str> {
        self.schemas.first().map(String::as_str)
    }
}

/// Read the HEADER section; missing or malformed records are left empty
pub fn parse_header(content: &str) -> FileHeader {
    let mut header = FileHeader::default();

    let Some(start) = content.find("HEADER;") else {
        return header;
    };
    let section = &content[start + "HEADER;".len()..];
    let section = match section.find("ENDSEC;") {
        Some(end) => &section[..end],
        None => section,
    };

    for record in split_records(section) {
        let Ok((keyword, tokens)) = parse_header_record(record) else {
            continue;
        };
        let args: Vec<AttributeValue> = tokens.iter().map(AttributeValue::from_token).collect();

        match keyword {
            "FILE_SCHEMA" => {
                header.schemas = args
                    .first()
                    .and_then(|v| v.as_list())
                    .map(|list| {
                        list.iter()
                            .filter_map(|v| v.as_string())
                            .map(|s| s.to_string())
                            .collect()
                    })
                    .unwrap_or_default();
            }
            "FILE_NAME" => {
                // FILE_NAME(name, time_stamp, author, organization, preprocessor, originating_system, authorization)
                let text = |i: usize| {
                    args.get(i)
                        .and_then(|v| v.as_string())
                        .filter(|s| !s.is_empty())
                        .map(|s| s.to_string())
                };
                header.name = text(0);
                header.time_stamp = text(1);
                header.originating_system = text(5);
            }
            _ => {}
        }
    }

    header
}

/// Split on `;` outside quoted strings
fn split_records(section: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut in_string = false;
    let mut start = 0;

    for (i, c) in section.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            ';' if !in_string => {
                records.push(&section[start..=i]);
                start = i + 1;
            }
            _ => {}
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let content = "ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION(('ViewDefinition [CoordinationView]'),'2;1');\nFILE_NAME('house.ifc','2024-03-01T10:00:00',('Author'),('Org'),'pre','Modeller 7','');\nFILE_SCHEMA(('IFC2X3'));\nENDSEC;\nDATA;\nENDSEC;";
        let header = parse_header(content);
        assert_eq!(header.schema(), Some("IFC2X3"));
        assert_eq!(header.name.as_deref(), Some("house.ifc"));
        assert_eq!(header.originating_system.as_deref(), Some("Modeller 7"));
    }

    #[test]
    fn test_missing_header() {
        let header = parse_header("DATA;\n#1=IFCWALL($);\nENDSEC;");
        assert_eq!(header, FileHeader::default());
        assert_eq!(header.schema(), None);
    }
}
