// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ifc_glance_core::IfcModel;
use ifc_glance_extract::{extract, run, Config, ExtractError, DEFAULT_TARGET_PSETS};
use std::path::PathBuf;

const HOUSE: &str = include_str!("../../../fixtures/house.ifc");

fn default_targets() -> Vec<String> {
    DEFAULT_TARGET_PSETS.iter().map(|s| s.to_string()).collect()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ifc-glance-extract-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn house_elements_in_order() {
    let model = IfcModel::from_content(HOUSE).unwrap();
    let export = extract(&model, &default_targets());

    let ids: Vec<u32> = export.elements.iter().map(|e| e.express_id).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted);
    assert_eq!(*ids.last().unwrap(), model.max_express_id());
    assert_eq!(export.elements.len(), model.entity_count());

    let wall = export.elements.iter().find(|e| e.express_id == 60).unwrap();
    assert_eq!(wall.type_name, "IFCWALLSTANDARDCASE");
    assert_eq!(wall.basic_properties.name, "Wall North");
    assert_eq!(wall.basic_properties.object_type, "Basic Wall:200mm");
    // Custom_Wall and the quantity set are not targets
    assert_eq!(wall.property_sets.len(), 1);
    let common = wall.property_sets.get("Pset_WallCommon").unwrap();
    assert_eq!(common.properties.len(), 3);

    let slab = export.elements.iter().find(|e| e.express_id == 82).unwrap();
    assert!(slab.property_sets.get("Pset_SlabCommon").is_some());

    // the door's only target set has no values
    let door = export.elements.iter().find(|e| e.express_id == 97).unwrap();
    assert!(door.property_sets.is_empty());
}

#[test]
fn run_writes_dump_and_documents() {
    let dir = scratch_dir("run");
    let input = dir.join("house.ifc");
    std::fs::write(&input, HOUSE).unwrap();

    let config = Config {
        input,
        output: dir.join("ifc_full.json"),
        target_psets: default_targets(),
        docs_output: Some(dir.join("docs.json")),
        worker_threads: 2,
        log_json: false,
    };
    let summary = run(&config).unwrap();
    assert_eq!(summary.with_property_sets, 2);
    assert_eq!(summary.documents, Some(summary.elements));

    let dump: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.output).unwrap()).unwrap();
    let elements = dump["elements"].as_array().unwrap();
    assert_eq!(elements.len(), summary.elements);
    let wall = elements.iter().find(|e| e["expressID"] == 60).unwrap();
    assert_eq!(wall["PropertySets"]["Pset_WallCommon"]["FireRating"], "REI 60");
    assert_eq!(wall["BasicProperties"]["GlobalId"].as_str().unwrap().len(), 22);

    let docs: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.join("docs.json")).unwrap()).unwrap();
    let wall_doc = docs
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["metadata"]["expressID"] == 60)
        .unwrap();
    assert!(wall_doc["content"]
        .as_str()
        .unwrap()
        .starts_with("Element type: IFCWALLSTANDARDCASE. ExpressID: 60."));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn run_reports_missing_input() {
    let dir = scratch_dir("missing");
    let config = Config {
        input: dir.join("nope.ifc"),
        output: dir.join("out.json"),
        target_psets: default_targets(),
        docs_output: None,
        worker_threads: 1,
        log_json: false,
    };
    let err = run(&config).unwrap_err();
    assert!(matches!(err, ExtractError::Read { .. }));
    assert!(!config.output.exists());

    std::fs::remove_dir_all(&dir).ok();
}
