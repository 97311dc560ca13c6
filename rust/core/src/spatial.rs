// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial structure tree
//!
//! Project → site → building → storey → elements, assembled from
//! `IfcRelAggregates` (decomposition) and `IfcRelContainedInSpatialStructure`
//! (containment). A node reachable twice is only attached the first time.

use crate::decoder::EntityDecoder;
use crate::schema::IfcType;
use rustc_hash::{FxHashMap, FxHashSet};

/// Node of the spatial structure
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SpatialNode {
    pub express_id: u32,
    /// STEP type name, e.g. "IFCBUILDINGSTOREY"
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub type_name: String,
    pub name: Option<String>,
    pub children: Vec<SpatialNode>,
}

impl SpatialNode {
    /// Depth-first pre-order visit with the depth of each node
    pub fn walk<F: FnMut(&SpatialNode, usize)>(&self, visitor: &mut F) {
        self.walk_at(0, visitor);
    }

    fn walk_at<F: FnMut(&SpatialNode, usize)>(&self, depth: usize, visitor: &mut F) {
        visitor(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visitor);
        }
    }

    /// Total number of nodes including this one
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(SpatialNode::count).sum::<usize>()
    }

    /// Find a node by express id
    pub fn find(&self, express_id: u32) -> Option<&SpatialNode> {
        if self.express_id == express_id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(express_id))
    }
}

/// Parent → children relations gathered from the relationship records
#[derive(Debug, Default)]
pub struct SpatialRelations {
    decomposes: FxHashMap<u32, Vec<u32>>,
    contains: FxHashMap<u32, Vec<u32>>,
}

impl SpatialRelations {
    /// Collect relations from IfcRelAggregates and IfcRelContainedInSpatialStructure ids
    pub fn collect(decoder: &mut EntityDecoder, aggregates: &[u32], containments: &[u32]) -> Self {
        let mut relations = Self::default();

        // IfcRelAggregates: [4]=RelatingObject, [5]=RelatedObjects
        for &id in aggregates {
            let Ok(rel) = decoder.decode_by_id(id) else {
                continue;
            };
            if let Some(parent) = rel.get_ref(4) {
                relations
                    .decomposes
                    .entry(parent)
                    .or_default()
                    .extend(rel.get_refs(5));
            }
        }

        // IfcRelContainedInSpatialStructure: [4]=RelatedElements, [5]=RelatingStructure
        for &id in containments {
            let Ok(rel) = decoder.decode_by_id(id) else {
                continue;
            };
            if let Some(structure) = rel.get_ref(5) {
                relations
                    .contains
                    .entry(structure)
                    .or_default()
                    .extend(rel.get_refs(4));
            }
        }

        relations
    }

    /// Build the tree below `root`
    pub fn build_tree(&self, decoder: &mut EntityDecoder, root: u32) -> SpatialNode {
        let mut visited = FxHashSet::default();
        visited.insert(root);
        self.build_node(decoder, root, &mut visited)
    }

    fn build_node(&self, decoder: &mut EntityDecoder, id: u32, visited: &mut FxHashSet<u32>) -> SpatialNode {
        let (type_name, name) = match decoder.decode_by_id(id) {
            Ok(entity) => (entity.type_name.clone(), entity.get_string(2).map(str::to_string)),
            Err(_) => (IfcType::Unknown.as_str().to_string(), None),
        };

        let child_ids: Vec<u32> = self
            .decomposes
            .get(&id)
            .into_iter()
            .chain(self.contains.get(&id))
            .flatten()
            .copied()
            .collect();

        let mut children = Vec::with_capacity(child_ids.len());
        for child in child_ids {
            // insert returns false for repeats and cycles
            if visited.insert(child) {
                children.push(self.build_node(decoder, child, visited));
            }
        }

        SpatialNode {
            express_id: id,
            type_name,
            name,
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT: &str = r#"DATA;
#1=IFCPROJECT('p',$,'Project',$,$,$,$,$,$);
#2=IFCSITE('s',$,'Site',$,$,$,$,$,.ELEMENT.,$,$,$,$,$);
#3=IFCBUILDING('b',$,'Building',$,$,$,$,$,.ELEMENT.,$,$,$);
#4=IFCBUILDINGSTOREY('l',$,'Level 1',$,$,$,$,$,.ELEMENT.,0.);
#10=IFCWALLSTANDARDCASE('w',$,'Wall',$,$,$,$,$);
#11=IFCSLAB('sl',$,'Slab',$,$,$,$,$,.FLOOR.);
#20=IFCRELAGGREGATES('a1',$,$,$,#1,(#2));
#21=IFCRELAGGREGATES('a2',$,$,$,#2,(#3));
#22=IFCRELAGGREGATES('a3',$,$,$,#3,(#4));
#23=IFCRELAGGREGATES('cycle',$,$,$,#4,(#1));
#30=IFCRELCONTAINEDINSPATIALSTRUCTURE('c',$,$,$,(#10,#11,#10),#4);
ENDSEC;"#;

    fn tree() -> SpatialNode {
        let mut decoder = EntityDecoder::new(CONTENT);
        let relations = SpatialRelations::collect(&mut decoder, &[20, 21, 22, 23], &[30]);
        relations.build_tree(&mut decoder, 1)
    }

    #[test]
    fn test_tree_shape() {
        let root = tree();
        assert_eq!(root.type_name, "IFCPROJECT");
        assert_eq!(root.name.as_deref(), Some("Project"));

        let storey = root.find(4).unwrap();
        assert_eq!(storey.name.as_deref(), Some("Level 1"));
        let ids: Vec<u32> = storey.children.iter().map(|c| c.express_id).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn test_cycles_are_cut() {
        let root = tree();
        assert_eq!(root.count(), 6);
    }

    #[test]
    fn test_walk_depths() {
        let root = tree();
        let mut seen = Vec::new();
        root.walk(&mut |node, depth| seen.push((node.express_id, depth)));
        assert_eq!(seen, vec![(1, 0), (2, 1), (3, 2), (4, 3), (10, 4), (11, 4)]);
    }
}
