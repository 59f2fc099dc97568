//! Full-lifecycle scenarios: create, list, cascade delete, audit coverage.

use terravault_geo::DistanceUnit;
use terravault_store::{AuditAction, LoadedMap, NewPath, StoreError};

use crate::test_utils::{survey_map, survey_point, temp_store};

#[test]
fn test_full_session_lifecycle() {
    let (mut store, db_path) = temp_store("field-op");

    // Build up a complete survey
    let map = store.create_map(survey_map("ridge-line")).unwrap();
    let p1 = store.add_point(map.id, survey_point("north-cairn", 0.0, 0.0)).unwrap();
    let p2 = store.add_point(map.id, survey_point("river-ford", 0.0, 1.0)).unwrap();
    let p3 = store.add_point(map.id, survey_point("summit", 1.0, 1.0)).unwrap();

    let distance = store
        .record_distance(map.id, p1.id, p2.id, DistanceUnit::Kilometers)
        .unwrap();
    assert!((distance.distance - 111.19).abs() < 0.01);

    let path = store
        .create_path(
            map.id,
            NewPath {
                name: "approach".to_string(),
                point_ids: vec![p1.id, p2.id, p3.id],
                ..NewPath::default()
            },
        )
        .unwrap();
    assert_eq!(path.point_ids.len(), 3);

    // Everything is visible through the listing operations
    assert_eq!(store.points_for_map(map.id).unwrap().len(), 3);
    assert_eq!(store.distances_for_map(map.id).unwrap().len(), 1);
    assert_eq!(store.paths_for_map(map.id).unwrap().len(), 1);

    // Cascade delete removes every dependent row
    store.delete_map(map.id).unwrap();
    assert!(matches!(store.map(map.id), Err(StoreError::UnknownMap(_))));

    let entries = store.audit_log().unwrap();
    // 6 creations, then 1 distance + 1 path + 3 points + 1 map deletions
    assert_eq!(entries.len(), 12);
    assert!(entries.iter().all(|e| e.actor == "field-op"));

    let delete_count = entries
        .iter()
        .filter(|e| e.action == AuditAction::Delete)
        .count();
    assert_eq!(delete_count, 6);

    store.close();
    std::fs::remove_file(db_path).ok();
}

#[test]
fn test_duplicate_create_fails_second_time() {
    let (mut store, db_path) = temp_store("field-op");

    store.create_map(survey_map("ridge-line")).unwrap();
    let second = store.create_map(survey_map("ridge-line"));
    assert!(matches!(second, Err(StoreError::DuplicateName(name)) if name == "ridge-line"));

    // The failed attempt left exactly one map behind
    assert_eq!(store.load_all_maps().unwrap().len(), 1);

    store.close();
    std::fs::remove_file(db_path).ok();
}

#[test]
fn test_unknown_ids_leave_store_unchanged() {
    let (mut store, db_path) = temp_store("field-op");

    let map = store.create_map(survey_map("ridge-line")).unwrap();
    let point = store.add_point(map.id, survey_point("cairn", 10.0, 10.0)).unwrap();
    let audit_before = store.audit_log().unwrap().len();

    assert!(matches!(
        store.delete_map(404),
        Err(StoreError::UnknownMap(404))
    ));
    assert!(matches!(
        store.delete_point(404),
        Err(StoreError::UnknownPoint(404))
    ));
    assert!(matches!(
        store.record_distance(map.id, point.id, 404, DistanceUnit::Miles),
        Err(StoreError::UnknownPoint(404))
    ));

    assert_eq!(store.audit_log().unwrap().len(), audit_before);
    assert_eq!(store.points_for_map(map.id).unwrap().len(), 1);

    store.close();
    std::fs::remove_file(db_path).ok();
}

#[test]
fn test_records_are_detached_snapshots() {
    let (mut store, db_path) = temp_store("field-op");

    let map = store.create_map(survey_map("ridge-line")).unwrap();

    // Mutating the returned value does not touch the store
    let mut copy = map.clone();
    copy.name = "renamed-locally".to_string();

    let reloaded = store.map(map.id).unwrap();
    assert_eq!(reloaded.name, "ridge-line");
    assert!(reloaded.verify_checksum());

    store.close();
    std::fs::remove_file(db_path).ok();
}

#[test]
fn test_listing_orders_and_payload_round_trip() {
    let (mut store, db_path) = temp_store("field-op");

    store.create_map(survey_map("tango")).unwrap();
    store.create_map(survey_map("alpha")).unwrap();
    let mut no_image = survey_map("mike");
    no_image.image_data = None;
    store.create_map(no_image).unwrap();

    let maps = store.load_all_maps().unwrap();
    let names: Vec<_> = maps
        .iter()
        .map(|m| match m {
            LoadedMap::Intact(record) => record.name.clone(),
            LoadedMap::Corrupted { name, .. } => name.clone(),
        })
        .collect();
    assert_eq!(names, vec!["alpha", "mike", "tango"]);

    for loaded in &maps {
        match loaded {
            LoadedMap::Intact(record) => {
                if record.name == "mike" {
                    assert!(record.image_data.is_none());
                } else {
                    assert_eq!(record.image_data.as_deref(), Some(&[0x42u8; 256][..]));
                }
            }
            LoadedMap::Corrupted { name, .. } => panic!("unexpected corruption: {}", name),
        }
    }

    store.close();
    std::fs::remove_file(db_path).ok();
}
