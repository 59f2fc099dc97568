//! Test utilities for store integration tests

use std::path::PathBuf;

use terravault_store::{NewMap, NewPoint, RecordStore, StoreConfig};

/// Open a store on a unique temp-file database.
pub fn temp_store(operator: &str) -> (RecordStore, PathBuf) {
    let db_path =
        std::env::temp_dir().join(format!("terravault_it_{}.db", uuid::Uuid::new_v4()));
    let store = RecordStore::open(StoreConfig {
        db_path: db_path.clone(),
        operator: operator.to_string(),
    })
    .expect("store open");
    (store, db_path)
}

/// Map fixture with a small raster payload.
pub fn survey_map(name: &str) -> NewMap {
    NewMap {
        name: name.to_string(),
        description: "integration fixture".to_string(),
        image_data: Some(vec![0x42; 256]),
        bounds_north: 49.0,
        bounds_south: 45.0,
        bounds_east: -116.0,
        bounds_west: -124.0,
        scale_factor: 1.0,
    }
}

/// Point fixture at the given coordinates.
pub fn survey_point(name: &str, latitude: f64, longitude: f64) -> NewPoint {
    NewPoint {
        name: name.to_string(),
        latitude,
        longitude,
        ..NewPoint::default()
    }
}
