// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entity Decoder - On-demand entity parsing
//!
//! Entities are decoded lazily from byte spans recorded in an index built by
//! a single scan of the DATA section.

use crate::error::{Error, Result};
use crate::parser::{parse_entity, EntityScanner};
use crate::value::{AttributeValue, DecodedEntity};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Pre-built entity index type (express id -> record byte span)
pub type EntityIndex = FxHashMap<u32, (usize, usize)>;

/// Build entity index from content - one O(n) scan of the DATA section
pub fn build_entity_index(content: &str) -> EntityIndex {
    // Roughly one record per 50 bytes in typical exports
    let mut index = FxHashMap::with_capacity_and_hasher(content.len() / 50, Default::default());

    let mut scanner = EntityScanner::new(content);
    while let Some((id, _type_name, start, end)) = scanner.next_entity() {
        index.insert(id, (start, end));
    }

    index
}

/// Entity decoder for lazy parsing
///
/// Content and index are shared through `Arc`, so cloning a decoder for a
/// worker thread costs two reference count bumps and an empty cache.
pub struct EntityDecoder {
    content: Arc<str>,
    index: Arc<EntityIndex>,
    /// Cache of decoded entities (entity_id -> `Arc<DecodedEntity>`)
    cache: FxHashMap<u32, Arc<DecodedEntity>>,
}

impl EntityDecoder {
    /// Create decoder, building the index from the content
    pub fn new(content: impl Into<Arc<str>>) -> Self {
        let content = content.into();
        let index = Arc::new(build_entity_index(&content));
        Self::with_arc_index(content, index)
    }

    /// Create decoder with shared content and index
    pub fn with_arc_index(content: Arc<str>, index: Arc<EntityIndex>) -> Self {
        Self {
            content,
            index,
            cache: FxHashMap::default(),
        }
    }

    /// Fresh decoder over the same content and index with an empty cache
    pub fn fork(&self) -> Self {
        Self::with_arc_index(Arc::clone(&self.content), Arc::clone(&self.index))
    }

    /// Raw content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Shared entity index
    pub fn index(&self) -> &Arc<EntityIndex> {
        &self.index
    }

    /// Check whether an express id has a record
    #[inline]
    pub fn contains(&self, entity_id: u32) -> bool {
        self.index.contains_key(&entity_id)
    }

    /// Decode the record at a byte span
    pub fn decode_at(&mut self, start: usize, end: usize) -> Result<Arc<DecodedEntity>> {
        let line = &self.content[start..end];
        let (id, type_name, tokens) = parse_entity(line).map_err(|e| {
            Error::parse(
                start,
                format!("{}, input: {:?}", e, &line[..line.len().min(100)]),
            )
        })?;

        if let Some(entity) = self.cache.get(&id) {
            return Ok(Arc::clone(entity));
        }

        let attributes = tokens.iter().map(AttributeValue::from_token).collect();
        let entity = Arc::new(DecodedEntity::new(id, type_name, attributes));
        self.cache.insert(id, Arc::clone(&entity));
        Ok(entity)
    }

    /// Decode entity by ID - O(1) lookup using entity index
    pub fn decode_by_id(&mut self, entity_id: u32) -> Result<Arc<DecodedEntity>> {
        if let Some(entity) = self.cache.get(&entity_id) {
            return Ok(Arc::clone(entity));
        }

        let (start, end) = self
            .index
            .get(&entity_id)
            .copied()
            .ok_or(Error::EntityNotFound(entity_id))?;

        self.decode_at(start, end)
    }

    /// Resolve entity reference (follow #ID)
    /// Returns None for null/derived or non-reference values
    pub fn resolve_ref(&mut self, attr: &AttributeValue) -> Result<Option<Arc<DecodedEntity>>> {
        match attr.as_entity_ref() {
            Some(id) => Ok(Some(self.decode_by_id(id)?)),
            None => Ok(None),
        }
    }

    /// Resolve list of entity references, skipping non-references
    pub fn resolve_ref_list(&mut self, attr: &AttributeValue) -> Result<Vec<Arc<DecodedEntity>>> {
        let list = attr
            .as_list()
            .ok_or_else(|| Error::parse(0, "Expected list"))?;

        let mut entities = Vec::with_capacity(list.len());
        for item in list {
            if let Some(id) = item.as_entity_ref() {
                entities.push(self.decode_by_id(id)?);
            }
        }
        Ok(entities)
    }

    /// STEP type name of a record without decoding its arguments
    pub fn type_name_of(&self, entity_id: u32) -> Option<&str> {
        let (start, end) = self.index.get(&entity_id).copied()?;
        let record = &self.content[start..end];
        let after_eq = record.find('=')? + 1;
        let rest = record[after_eq..].trim_start();
        let len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        (len > 0).then(|| &rest[..len])
    }

    /// Clear cache to free memory
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Get cache size
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
