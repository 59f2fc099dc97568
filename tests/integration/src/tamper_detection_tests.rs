//! Tamper detection across the digest and sealing layers.

use rusqlite::ToSql;
use terravault_crypto::{CipherBox, NONCE_SIZE};
use terravault_store::{LoadedMap, StoreError};

use crate::test_utils::{survey_map, temp_store};

#[test]
fn test_semantic_field_tampering_detected() {
    let (mut store, db_path) = temp_store("auditor");

    let map = store.create_map(survey_map("ridge-line")).unwrap();

    for sql in [
        "UPDATE maps SET name = 'forged' WHERE id = ?1",
        "UPDATE maps SET description = 'forged' WHERE id = ?1",
        "UPDATE maps SET bounds_north = 12.0 WHERE id = ?1",
        "UPDATE maps SET scale_factor = 9.0 WHERE id = ?1",
    ] {
        // Tamper, observe detection, then restore via a legitimate update
        store
            .__test_execute_raw_sql(sql, &[&map.id as &dyn ToSql])
            .unwrap();
        assert!(
            matches!(store.map(map.id), Err(StoreError::Integrity(_))),
            "tampering not detected for: {}",
            sql
        );

        let restored = store.update_map(map.id, survey_map("ridge-line")).unwrap();
        assert!(restored.verify_checksum());
        assert!(store.map(map.id).is_ok());
    }

    store.close();
    std::fs::remove_file(db_path).ok();
}

#[test]
fn test_one_corrupted_record_does_not_abort_listing() {
    let (mut store, db_path) = temp_store("auditor");

    let alpha = store.create_map(survey_map("alpha")).unwrap();
    let bravo = store.create_map(survey_map("bravo")).unwrap();
    let charlie = store.create_map(survey_map("charlie")).unwrap();

    // Replace bravo's sealed payload with bytes that cannot authenticate
    let garbage = vec![0x00u8; NONCE_SIZE + 32];
    store
        .__test_execute_raw_sql(
            "UPDATE maps SET image_data = ?1 WHERE id = ?2",
            &[&garbage as &dyn ToSql, &bravo.id],
        )
        .unwrap();

    let maps = store.load_all_maps().unwrap();
    assert_eq!(maps.len(), 3);

    let mut intact_ids = Vec::new();
    let mut corrupted_ids = Vec::new();
    for loaded in maps {
        match loaded {
            LoadedMap::Intact(record) => intact_ids.push(record.id),
            LoadedMap::Corrupted { map_id, reason, .. } => {
                assert!(matches!(reason, StoreError::Integrity(_)));
                corrupted_ids.push(map_id);
            }
        }
    }
    assert_eq!(intact_ids, vec![alpha.id, charlie.id]);
    assert_eq!(corrupted_ids, vec![bravo.id]);

    store.close();
    std::fs::remove_file(db_path).ok();
}

#[test]
fn test_sealed_payload_wire_format() {
    let cipherbox = CipherBox::new();
    let payload = vec![7u8; 1024];

    let sealed = cipherbox.seal(&payload).unwrap();
    // [16-byte nonce][ciphertext+tag]
    assert_eq!(sealed.len(), NONCE_SIZE + payload.len() + 16);
    assert_eq!(cipherbox.open(&sealed).unwrap(), payload);
}

#[test]
fn test_nonces_never_repeat_across_seals() {
    let cipherbox = CipherBox::new();
    let mut seen = std::collections::HashSet::new();

    for _ in 0..256 {
        let sealed = cipherbox.seal(b"fixed plaintext").unwrap();
        let nonce: [u8; NONCE_SIZE] = sealed[..NONCE_SIZE].try_into().unwrap();
        assert!(seen.insert(nonce), "nonce repeated");
    }
}

#[test]
fn test_audit_entries_survive_tampered_records() {
    let (mut store, db_path) = temp_store("auditor");

    let map = store.create_map(survey_map("ridge-line")).unwrap();
    store
        .__test_execute_raw_sql(
            "UPDATE maps SET checksum = 'bogus' WHERE id = ?1",
            &[&map.id as &dyn ToSql],
        )
        .unwrap();

    // The audit log is independent of entity integrity
    let entries = store.audit_log().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].table_name, "maps");

    store.close();
    std::fs::remove_file(db_path).ok();
}
