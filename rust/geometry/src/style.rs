// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Surface colours
//!
//! Chain: IfcStyledItem → (IfcPresentationStyleAssignment →) IfcSurfaceStyle
//! → IfcSurfaceStyleRendering / IfcSurfaceStyleShading → IfcColourRgb.

use ifc_glance_core::{AttributeValue, DecodedEntity, EntityDecoder, IfcType};
use rustc_hash::FxHashMap;

/// Linear RGBA colour, components in 0..=1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// From a packed `0xRRGGBB` value
    pub fn from_hex(hex: u32, alpha: f32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self::rgba(channel(16), channel(8), channel(0), alpha)
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Fallback colour when an element carries no style
    pub fn default_for_type(ifc_type: IfcType) -> Self {
        let [r, g, b, a] = match ifc_type {
            IfcType::IfcWall | IfcType::IfcWallStandardCase | IfcType::IfcWallElementedCase => {
                [0.85, 0.85, 0.85, 1.0]
            }
            IfcType::IfcSlab | IfcType::IfcSlabStandardCase => [0.7, 0.7, 0.7, 1.0],
            IfcType::IfcRoof => [0.6, 0.5, 0.4, 1.0],
            IfcType::IfcColumn | IfcType::IfcBeam | IfcType::IfcMember => [0.6, 0.65, 0.7, 1.0],
            IfcType::IfcWindow => [0.6, 0.8, 1.0, 0.4],
            IfcType::IfcDoor => [0.6, 0.45, 0.3, 1.0],
            IfcType::IfcStair | IfcType::IfcStairFlight => [0.75, 0.75, 0.75, 1.0],
            IfcType::IfcRailing => [0.4, 0.4, 0.45, 1.0],
            IfcType::IfcPlate | IfcType::IfcCovering => [0.8, 0.8, 0.8, 1.0],
            IfcType::IfcCurtainWall => [0.5, 0.7, 0.9, 0.5],
            IfcType::IfcFurnishingElement | IfcType::IfcFurniture => [0.7, 0.55, 0.4, 1.0],
            IfcType::IfcSite => [0.55, 0.65, 0.45, 1.0],
            _ => [0.8, 0.8, 0.8, 1.0],
        };
        Self::rgba(r, g, b, a)
    }
}

/// Representation item id → colour
#[derive(Debug, Default, Clone)]
pub struct StyleIndex {
    colors: FxHashMap<u32, Color>,
}

impl StyleIndex {
    /// Read every IfcStyledItem; the first style found for an item wins
    pub fn build(decoder: &mut EntityDecoder, styled_items: &[u32]) -> Self {
        let mut colors = FxHashMap::default();
        for &id in styled_items {
            let Ok(styled) = decoder.decode_by_id(id) else {
                continue;
            };
            let Some(item) = styled.get_ref(0) else {
                continue;
            };
            if colors.contains_key(&item) {
                continue;
            }
            if let Some(color) = styled.get(1).and_then(|styles| colour_from_styles(styles, decoder)) {
                colors.insert(item, color);
            }
        }
        Self { colors }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour attached directly to a representation item
    pub fn item_color(&self, item_id: u32) -> Option<Color> {
        self.colors.get(&item_id).copied()
    }

    /// First styled item reachable from an element's representations
    ///
    /// Mapped items are followed into their representation map.
    pub fn element_color(&self, element: &DecodedEntity, decoder: &mut EntityDecoder) -> Option<Color> {
        if self.colors.is_empty() {
            return None;
        }
        let shape = decoder.resolve_ref(element.get(6)?).ok()??;
        for rep_id in shape.get_refs(2) {
            let Ok(rep) = decoder.decode_by_id(rep_id) else {
                continue;
            };
            if let Some(color) = self.items_color(&rep.get_refs(3), decoder, 0) {
                return Some(color);
            }
        }
        None
    }

    fn items_color(&self, items: &[u32], decoder: &mut EntityDecoder, depth: usize) -> Option<Color> {
        if depth > 8 {
            return None;
        }
        for &item in items {
            if let Some(color) = self.item_color(item) {
                return Some(color);
            }
            let Ok(entity) = decoder.decode_by_id(item) else {
                continue;
            };
            let nested = match entity.ifc_type {
                IfcType::IfcMappedItem => {
                    let source = decoder.resolve_ref(entity.get(0)?).ok()??;
                    let rep = decoder.resolve_ref(source.get(1)?).ok()??;
                    rep.get_refs(3)
                }
                IfcType::IfcBooleanResult | IfcType::IfcBooleanClippingResult => {
                    entity.get_refs(1).into_iter().take(1).collect()
                }
                _ => continue,
            };
            if let Some(color) = self.items_color(&nested, decoder, depth + 1) {
                return Some(color);
            }
        }
        None
    }
}

/// Colour from a Styles list of an IfcStyledItem
fn colour_from_styles(styles: &AttributeValue, decoder: &mut EntityDecoder) -> Option<Color> {
    for style_id in styles.entity_refs() {
        let Ok(style) = decoder.decode_by_id(style_id) else {
            continue;
        };
        let found = match style.ifc_type {
            IfcType::IfcSurfaceStyle => surface_style_colour(&style, decoder),
            // IFC2x3 wraps styles in an assignment
            IfcType::IfcPresentationStyleAssignment => style
                .get(0)
                .and_then(|inner| colour_from_styles(inner, decoder)),
            _ => None,
        };
        if found.is_some() {
            return found;
        }
    }
    None
}

fn surface_style_colour(style: &DecodedEntity, decoder: &mut EntityDecoder) -> Option<Color> {
    for element_id in style.get_refs(2) {
        let Ok(element) = decoder.decode_by_id(element_id) else {
            continue;
        };
        if !matches!(
            element.ifc_type,
            IfcType::IfcSurfaceStyleRendering | IfcType::IfcSurfaceStyleShading
        ) {
            continue;
        }
        let Some(rgb) = element.get(0).and_then(|a| decoder.resolve_ref(a).ok().flatten()) else {
            continue;
        };
        if rgb.ifc_type != IfcType::IfcColourRgb {
            continue;
        }
        let transparency = element.get_float(1).unwrap_or(0.0).clamp(0.0, 1.0);
        return Some(Color::rgba(
            rgb.get_float(1).unwrap_or(0.8) as f32,
            rgb.get_float(2).unwrap_or(0.8) as f32,
            rgb.get_float(3).unwrap_or(0.8) as f32,
            (1.0 - transparency) as f32,
        ));
    }
    None
}
