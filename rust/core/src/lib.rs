// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC-Glance Core
//!
//! STEP/IFC reader built with [nom](https://docs.rs/nom) plus the element
//! data access the viewer and the extractor share.
//!
//! ## Overview
//!
//! - **Tokenization**: zero-copy STEP tokens ([`parse_entity`])
//! - **Entity scanning**: record discovery with [memchr](https://docs.rs/memchr),
//!   quote-aware so `;` inside strings never ends a record
//! - **Lazy decoding**: [`EntityDecoder`] decodes records by id on demand
//! - **Element data**: [`IfcModel`] answers attribute, property set and
//!   spatial structure queries
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ifc_glance_core::{IfcModel, IfcType};
//!
//! let mut model = IfcModel::open(&std::fs::read("building.ifc")?)?;
//! println!("{} walls", model.all_items_of_type(IfcType::IfcWall).len());
//!
//! for pset in model.property_sets(42)? {
//!     for (name, value) in pset.valued() {
//!         println!("{:?}.{} = {}", pset.name, name, value);
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialize attributes, property sets, header and spatial tree

pub mod decoder;
pub mod error;
pub mod header;
pub mod model;
pub mod parser;
pub mod properties;
pub mod schema;
pub mod spatial;
pub mod units;
pub mod value;

pub use decoder::{build_entity_index, EntityDecoder, EntityIndex};
pub use error::{Error, Result};
pub use header::{parse_header, FileHeader};
pub use model::IfcModel;
pub use parser::{parse_entity, EntityScanner, Token};
pub use properties::{
    ElementAttributes, Property, PropertyIndex, PropertySet, PropertySetKind, PropertyValue,
};
pub use schema::{has_geometry_by_name, IfcType};
pub use spatial::SpatialNode;
pub use units::{extract_length_unit_scale, get_si_prefix_multiplier};
pub use value::{decode_step_string, AttributeValue, DecodedEntity};
