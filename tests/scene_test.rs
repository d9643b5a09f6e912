//! Integration tests for scene assembly from decoded archives

mod common;

use common::{build_3mf, model_xml, tetrahedron_object, tetrahedron_stl};
use plate_preview::{DecodeConfig, PlacementCase, SceneBuilder, SceneConfig, decode_3mf, decode_stl};

/// Two plates; plate 2 sits 300mm to the right in model space
fn two_plate_archive(plate_json: &str) -> Vec<u8> {
    let resources = [
        tetrahedron_object(1, r#"extruder="1""#),
        tetrahedron_object(2, r#"extruder="2""#),
    ]
    .join("\n");
    let build = r#"    <item objectid="1" plate_id="1" transform="1 0 0 0 1 0 0 0 1 20 30 0"/>
    <item objectid="2" plate_id="2" transform="1 0 0 0 1 0 0 0 1 320 30 0"/>
    <item objectid="2" plate_id="2" transform="1 0 0 0 1 0 0 0 1 340 30 0"/>"#;
    build_3mf(
        &model_xml(&resources, build),
        &[("Metadata/plate_2.json", plate_json)],
    )
}

#[test]
fn test_unknown_plate_renders_everything() {
    let model = decode_3mf(two_plate_archive("{}"), &DecodeConfig::default()).unwrap();

    let all = SceneBuilder::new(&SceneConfig::new()).build(&model).unwrap();
    let stale = SceneBuilder::new(&SceneConfig::new().with_selected_plate(Some(42)))
        .build(&model)
        .unwrap();

    assert_eq!(all, stale);
    assert_eq!(all.triangle_count(), 12);
    assert_eq!(all.plate, None);
    assert_eq!(all.placement, PlacementCase::Centered);
}

#[test]
fn test_selected_plate_filters_and_batches() {
    let model = decode_3mf(two_plate_archive("{}"), &DecodeConfig::default()).unwrap();
    let config = SceneConfig::new()
        .with_colors(["#ff0000", "#00ff00"])
        .with_selected_plate(Some(2));
    let scene = SceneBuilder::new(&config).build(&model).unwrap();

    assert_eq!(scene.plate, Some(2));
    assert_eq!(scene.triangle_count(), 8);
    assert_eq!(scene.batches.len(), 1);
    assert_eq!(scene.batches[0].material, 1);
    assert_eq!(scene.batches[0].color, [0.0, 1.0, 0.0]);
    assert_eq!(scene.batches[0].positions.len(), scene.batches[0].normals.len());
}

#[test]
fn test_plate_bounds_center_the_plate() {
    // Plate 2 content spans x 320..350, y 30..40 in model space
    let plate_json = r#"{"bbox_all": [320.0, 30.0, 350.0, 40.0], "offset": [307.0, 0.0]}"#;
    let model = decode_3mf(two_plate_archive(plate_json), &DecodeConfig::default()).unwrap();
    let config = SceneConfig::new().with_selected_plate(Some(2));
    let scene = SceneBuilder::new(&config).build(&model).unwrap();

    assert_eq!(scene.placement, PlacementCase::PlateBounds);
    let center = scene.bounds.center();
    assert!((center[0] - 128.0).abs() < 1e-6, "x center {}", center[0]);
    assert!((center[2] - 128.0).abs() < 1e-6, "z center {}", center[2]);
    assert_eq!(scene.bounds.min[1], 0.0);
}

#[test]
fn test_plate_offset_only() {
    let plate_json = r#"{"offset": [307.0, 0.0]}"#;
    let model = decode_3mf(two_plate_archive(plate_json), &DecodeConfig::default()).unwrap();
    let config = SceneConfig::new().with_selected_plate(Some(2));
    let scene = SceneBuilder::new(&config).build(&model).unwrap();

    assert_eq!(scene.placement, PlacementCase::PlateOffset);
    assert!((scene.bounds.min[0] - 13.0).abs() < 1e-9);
    assert!((scene.bounds.min[2] - 30.0).abs() < 1e-9);
}

#[test]
fn test_stl_is_centered_on_plate() {
    let model = decode_stl(tetrahedron_stl().into_bytes()).unwrap();
    let config = SceneConfig::new().with_build_volume([200.0, 180.0, 150.0]);
    let scene = SceneBuilder::new(&config).build(&model).unwrap();

    let center = scene.bounds.center();
    assert!((center[0] - 100.0).abs() < 1e-6);
    assert!((center[2] - 90.0).abs() < 1e-6);
    assert_eq!(scene.bounds.min[1], 0.0);
    // Source Z (height) ends up on Y
    assert!((scene.bounds.size()[1] - 10.0).abs() < 1e-6);
    assert!(scene.camera.distance >= 10.0);
}
