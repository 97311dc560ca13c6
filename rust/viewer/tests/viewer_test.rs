// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Load, hover, click and reload against the sample house
use ifc_glance_viewer::{BatchKind, HighlightKind, Viewer, ViewerConfig, Viewport};
use nalgebra::{Point3, Vector4};

const HOUSE: &str = include_str!("../../../fixtures/house.ifc");
const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;

fn viewer_with_house() -> Viewer {
    let mut viewer = Viewer::new(ViewerConfig::default());
    viewer.set_viewport(Viewport::new(0.0, 0.0, WIDTH, HEIGHT));
    viewer.load_model(HOUSE.as_bytes()).expect("house loads");
    viewer
}

/// Client coordinates of a scene point (Y up, meters)
fn screen_of(viewer: &Viewer, x: f64, y: f64, z: f64) -> (f64, f64) {
    let camera = viewer.camera();
    let p = Point3::new(x, y, z);
    let clip = camera.projection_matrix() * camera.view_matrix() * Vector4::new(p.x, p.y, p.z, 1.0);
    let (nx, ny) = (clip.x / clip.w, clip.y / clip.w);
    ((nx + 1.0) / 2.0 * WIDTH, (1.0 - ny) / 2.0 * HEIGHT)
}

#[test]
fn load_reports_model_contents() {
    let mut viewer = Viewer::new(ViewerConfig::default());
    let report = viewer.load_model(HOUSE.as_bytes()).unwrap();
    assert_eq!(report.model_id, 0);
    assert_eq!(report.elements, 3);
    assert_eq!(report.triangles, 26);
    assert_eq!(report.failed, 0);
    assert_eq!(report.spatial_nodes, 8);
    assert_eq!(report.walls, vec![60]);
    assert_eq!(report.slabs, vec![82]);
    assert_eq!(report.doors, vec![97]);

    // framed: orbiting the model centre
    let target = viewer.controls().target;
    assert!((target - Point3::new(3.0, 1.4, -2.0)).norm() < 1e-4);
}

#[test]
fn hover_preselects_and_clears() {
    let mut viewer = viewer_with_house();

    // door leaf, in front of the wall
    let (cx, cy) = screen_of(&viewer, 2.5, 1.0, -1.9);
    let hit = viewer.pointer_move(cx, cy).expect("door under cursor");
    assert_eq!(hit.express_id, 97);
    assert_eq!(hit.model_id, 0);
    let overlay = viewer.scene().highlights.get(HighlightKind::Preselect).unwrap();
    assert_eq!(overlay.express_ids, vec![97]);

    // far above the horizon
    assert!(viewer.pointer_move(WIDTH / 2.0, -1000.0).is_none());
    assert!(viewer.scene().highlights.get(HighlightKind::Preselect).is_none());
}

#[test]
fn click_opens_property_panel() {
    let mut viewer = viewer_with_house();

    let (cx, cy) = screen_of(&viewer, 4.5, 1.5, -2.0);
    let panel = viewer.click(cx, cy).unwrap().expect("wall under cursor").clone();
    assert_eq!(panel.title, "IFCWALLSTANDARDCASE #60");
    let titles: Vec<&str> = panel.groups.iter().map(|g| g.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Basic Properties", "Pset_WallCommon", "Custom_Wall", "Qto_WallBaseQuantities"]
    );
    assert_eq!(panel.groups[0].rows.len(), 4);
    assert_eq!(panel.groups[1].rows[1].value, "REI 60");

    // door: only the basic group, its one property set has no values
    let (cx, cy) = screen_of(&viewer, 2.5, 1.0, -1.9);
    let panel = viewer.click(cx, cy).unwrap().unwrap();
    assert_eq!(panel.title, "IFCDOOR #97");
    assert_eq!(panel.groups.len(), 1);

    let selection = viewer.scene().highlights.get(HighlightKind::Select).unwrap();
    assert_eq!(selection.express_ids, vec![97]);

    let frame = viewer.render_frame();
    let elements = frame.batches.iter().filter(|b| b.kind == BatchKind::Element).count();
    let overlays: Vec<_> = frame.batches.iter().filter(|b| b.kind == BatchKind::Overlay).collect();
    assert_eq!(elements, 3);
    assert_eq!(overlays.len(), 1);
    assert!(!overlays[0].depth_test);

    viewer.close_panel();
    assert!(viewer.panel().is_none());
    assert!(viewer.scene().highlights.get(HighlightKind::Select).is_none());
}

#[test]
fn click_on_slab_and_on_nothing() {
    let mut viewer = viewer_with_house();

    let (cx, cy) = screen_of(&viewer, 0.5, 0.0, -0.5);
    let panel = viewer.click(cx, cy).unwrap().unwrap();
    assert_eq!(panel.title, "IFCSLAB #82");

    assert!(viewer.click(WIDTH / 2.0, -1000.0).unwrap().is_none());
    // a miss keeps the open panel
    assert_eq!(viewer.panel().unwrap().express_id, 82);
}

#[test]
fn reload_replaces_previous_model() {
    let mut viewer = viewer_with_house();
    let (cx, cy) = screen_of(&viewer, 2.5, 1.0, -1.9);
    viewer.click(cx, cy).unwrap();

    let report = viewer.load_model(HOUSE.as_bytes()).unwrap();
    assert_eq!(report.model_id, 1);
    assert_eq!(viewer.model_ids(), vec![1]);
    assert!(viewer.panel().is_none());
    assert_eq!(viewer.scene().highlights.overlays().count(), 0);

    let err = viewer.load_model(b"definitely not IFC").unwrap_err();
    assert!(err.user_message().starts_with("Failed to load IFC model"));
    assert!(viewer.model_ids().is_empty());
}
