//! Secure Geospatial Record Store - Encrypted SQLite Persistence
//!
//! This module provides the orchestrating store for survey data with:
//! - SQLite backend with foreign-key enforcement and secure delete
//! - Transparent sealing of sensitive payload fields
//! - Content digests stamped on write and verified on read
//! - Explicit, audited cascade deletion
//! - An append-only audit trail for every mutation
//!
//! # Guarantees
//!
//! - Atomicity: each mutating operation (record + cascades + audit) runs in
//!   one transaction; partial application cannot be observed
//! - Single writer: one store owns one connection and one payload key
//! - Tamper evidence: a record whose payload fails to unseal or whose digest
//!   no longer matches is surfaced per record, never silently returned
//! - Distances and path totals are always produced by the calculator;
//!   caller-supplied values are never stored

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info, warn};

use terravault_crypto::CipherBox;
use terravault_geo::{distance, total_distance, Coordinate, DistanceUnit};

use crate::audit::AuditTrail;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::model::{
    now_millis, AuditAction, AuditEntry, DistanceRecord, LineStyle, MapRecord, NewMap, NewPath,
    NewPoint, PathRecord, PointRecord, SymbolType,
};

/// Outcome of loading one map in a bulk listing.
///
/// A corrupted record is reported in place so callers can see and react to
/// it; it never aborts retrieval of the remaining records.
#[derive(Debug)]
pub enum LoadedMap {
    /// Payload unsealed and digest verified
    Intact(MapRecord),
    /// Record failed to unseal or verify
    Corrupted {
        map_id: i64,
        name: String,
        reason: StoreError,
    },
}

/// A map row as stored, payload still sealed.
struct SealedMap {
    id: i64,
    name: String,
    description: String,
    image: Option<Vec<u8>>,
    bounds_north: f64,
    bounds_south: f64,
    bounds_east: f64,
    bounds_west: f64,
    scale_factor: f64,
    created_at: i64,
    modified_at: i64,
    checksum: String,
}

const SEALED_MAP_COLUMNS: &str = "id, name, description, image_data, bounds_north, bounds_south, \
     bounds_east, bounds_west, scale_factor, created_at, modified_at, checksum";

/// Record store over an encrypted-at-rest SQLite database.
pub struct RecordStore {
    /// SQLite database connection
    conn: Connection,
    /// Payload cipher; the key never leaves it
    cipher: CipherBox,
    /// Audit trail writer
    audit: AuditTrail,
}

impl RecordStore {
    /// Open or create a store at the configured path.
    ///
    /// Generates the in-memory payload key, applies the security pragmas,
    /// and creates the schema idempotently.
    pub fn open(config: StoreConfig) -> Result<Self> {
        info!(
            path = %config.db_path.display(),
            operator = %config.operator,
            "Opening record store"
        );

        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Config(format!("Cannot create database directory: {}", e))
                })?;
            }
        }

        let conn = Connection::open(&config.db_path)?;

        // DELETE journal mode: row images must not survive in a WAL side log
        conn.pragma_update(None, "journal_mode", "DELETE")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "secure_delete", "ON")?;

        Self::init_schema(&conn)?;

        Ok(Self {
            conn,
            cipher: CipherBox::new(),
            audit: AuditTrail::new(config.operator),
        })
    }

    /// Initialize database schema.
    ///
    /// Foreign keys cascade on delete as a backstop; mutating operations
    /// still remove children explicitly so each row is audited.
    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS maps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                image_data BLOB,
                bounds_north REAL NOT NULL,
                bounds_south REAL NOT NULL,
                bounds_east REAL NOT NULL,
                bounds_west REAL NOT NULL,
                scale_factor REAL NOT NULL,
                created_at INTEGER NOT NULL,
                modified_at INTEGER NOT NULL,
                checksum TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS points (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                map_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                symbol_type TEXT NOT NULL,
                color TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                FOREIGN KEY (map_id) REFERENCES maps(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS paths (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                map_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                color TEXT NOT NULL,
                width INTEGER NOT NULL,
                style TEXT NOT NULL,
                total_distance REAL NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (map_id) REFERENCES maps(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS path_points (
                path_id INTEGER NOT NULL,
                seq INTEGER NOT NULL,
                point_id INTEGER NOT NULL,
                PRIMARY KEY (path_id, seq),
                FOREIGN KEY (path_id) REFERENCES paths(id) ON DELETE CASCADE,
                FOREIGN KEY (point_id) REFERENCES points(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS distances (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                map_id INTEGER NOT NULL,
                point1_id INTEGER NOT NULL,
                point2_id INTEGER NOT NULL,
                distance REAL NOT NULL,
                unit TEXT NOT NULL,
                calculated_at INTEGER NOT NULL,
                FOREIGN KEY (map_id) REFERENCES maps(id) ON DELETE CASCADE,
                FOREIGN KEY (point1_id) REFERENCES points(id) ON DELETE CASCADE,
                FOREIGN KEY (point2_id) REFERENCES points(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                action TEXT NOT NULL,
                table_name TEXT NOT NULL,
                record_id INTEGER,
                actor TEXT NOT NULL,
                timestamp INTEGER NOT NULL,
                details TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_points_map ON points(map_id);
            CREATE INDEX IF NOT EXISTS idx_paths_map ON paths(map_id);
            CREATE INDEX IF NOT EXISTS idx_distances_map ON distances(map_id);
            "#,
        )?;

        Ok(())
    }

    // ---- Maps -----------------------------------------------------------

    /// Create a map record.
    ///
    /// Seals the raster payload when present, stamps the content digest,
    /// and sets `created_at == modified_at`.
    ///
    /// # Returns
    /// * `Ok(MapRecord)` - The persisted record including its assigned id
    /// * `Err(StoreError)` - `DuplicateName`, `Validation`, or storage failure
    pub fn create_map(&mut self, fields: NewMap) -> Result<MapRecord> {
        Self::validate_map_fields(&fields)?;

        let sealed = match fields.image_data.as_deref() {
            Some(bytes) => Some(self.cipher.seal(bytes)?),
            None => None,
        };
        let now = now_millis();

        let mut record = MapRecord {
            id: 0,
            name: fields.name,
            description: fields.description,
            image_data: fields.image_data,
            bounds_north: fields.bounds_north,
            bounds_south: fields.bounds_south,
            bounds_east: fields.bounds_east,
            bounds_west: fields.bounds_west,
            scale_factor: fields.scale_factor,
            created_at: now,
            modified_at: now,
            checksum: String::new(),
        };
        record.checksum = record.compute_checksum();

        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        if Self::map_name_exists(&tx, &record.name, None)? {
            return Err(StoreError::DuplicateName(record.name));
        }

        tx.execute(
            r#"
            INSERT INTO maps (
                name, description, image_data, bounds_north, bounds_south,
                bounds_east, bounds_west, scale_factor, created_at, modified_at, checksum
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.name,
                record.description,
                sealed,
                record.bounds_north,
                record.bounds_south,
                record.bounds_east,
                record.bounds_west,
                record.scale_factor,
                now as i64,
                now as i64,
                record.checksum,
            ],
        )?;
        record.id = tx.last_insert_rowid();

        audit.record(
            &tx,
            AuditAction::Insert,
            "maps",
            Some(record.id),
            &format!("Map created: {}", record.name),
        );
        tx.commit()?;

        debug!(map_id = record.id, name = %record.name, "Map created");
        Ok(record)
    }

    /// Load a single map with its payload unsealed and digest verified.
    pub fn map(&self, map_id: i64) -> Result<MapRecord> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {} FROM maps WHERE id = ?1", SEALED_MAP_COLUMNS),
                params![map_id],
                Self::read_sealed_map,
            )
            .optional()?
            .ok_or(StoreError::UnknownMap(map_id))?;

        self.unseal_map(raw)
    }

    /// Load all maps ordered by name.
    ///
    /// A record whose payload fails to unseal or whose digest no longer
    /// matches is surfaced as `LoadedMap::Corrupted`; the rest of the
    /// listing is unaffected.
    pub fn load_all_maps(&self) -> Result<Vec<LoadedMap>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM maps ORDER BY name",
            SEALED_MAP_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], Self::read_sealed_map)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut maps = Vec::with_capacity(rows.len());
        for raw in rows {
            let map_id = raw.id;
            let name = raw.name.clone();
            match self.unseal_map(raw) {
                Ok(record) => maps.push(LoadedMap::Intact(record)),
                Err(reason) => {
                    warn!(map_id, name = %name, error = %reason, "Corrupted map record in listing");
                    maps.push(LoadedMap::Corrupted {
                        map_id,
                        name,
                        reason,
                    });
                }
            }
        }

        Ok(maps)
    }

    /// Replace a map's semantic fields.
    ///
    /// Re-validates, re-seals a changed payload, restamps the digest, and
    /// bumps `modified_at`. Name uniqueness is preserved across the rename.
    pub fn update_map(&mut self, map_id: i64, fields: NewMap) -> Result<MapRecord> {
        Self::validate_map_fields(&fields)?;

        let sealed = match fields.image_data.as_deref() {
            Some(bytes) => Some(self.cipher.seal(bytes)?),
            None => None,
        };
        let now = now_millis();

        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        let created_at: i64 = tx
            .query_row(
                "SELECT created_at FROM maps WHERE id = ?1",
                params![map_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::UnknownMap(map_id))?;

        if Self::map_name_exists(&tx, &fields.name, Some(map_id))? {
            return Err(StoreError::DuplicateName(fields.name));
        }

        let mut record = MapRecord {
            id: map_id,
            name: fields.name,
            description: fields.description,
            image_data: fields.image_data,
            bounds_north: fields.bounds_north,
            bounds_south: fields.bounds_south,
            bounds_east: fields.bounds_east,
            bounds_west: fields.bounds_west,
            scale_factor: fields.scale_factor,
            created_at: created_at as u64,
            modified_at: now,
            checksum: String::new(),
        };
        record.checksum = record.compute_checksum();

        tx.execute(
            r#"
            UPDATE maps SET
                name = ?1, description = ?2, image_data = ?3,
                bounds_north = ?4, bounds_south = ?5, bounds_east = ?6, bounds_west = ?7,
                scale_factor = ?8, modified_at = ?9, checksum = ?10
            WHERE id = ?11
            "#,
            params![
                record.name,
                record.description,
                sealed,
                record.bounds_north,
                record.bounds_south,
                record.bounds_east,
                record.bounds_west,
                record.scale_factor,
                now as i64,
                record.checksum,
                map_id,
            ],
        )?;

        audit.record(
            &tx,
            AuditAction::Update,
            "maps",
            Some(map_id),
            &format!("Map updated: {}", record.name),
        );
        tx.commit()?;

        debug!(map_id, name = %record.name, "Map updated");
        Ok(record)
    }

    /// Delete a map and everything that references it.
    ///
    /// Points, paths, and distance records are removed first, each with its
    /// own audit entry, then the map itself, as one transaction. A missing
    /// id fails with `UnknownMap` and leaves the store unchanged.
    pub fn delete_map(&mut self, map_id: i64) -> Result<()> {
        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        let name: String = tx
            .query_row(
                "SELECT name FROM maps WHERE id = ?1",
                params![map_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::UnknownMap(map_id))?;

        for id in Self::ids(&tx, "SELECT id FROM distances WHERE map_id = ?1", map_id)? {
            tx.execute("DELETE FROM distances WHERE id = ?1", params![id])?;
            audit.record(
                &tx,
                AuditAction::Delete,
                "distances",
                Some(id),
                &format!("Removed with map {}", map_id),
            );
        }

        for id in Self::ids(&tx, "SELECT id FROM paths WHERE map_id = ?1", map_id)? {
            tx.execute("DELETE FROM path_points WHERE path_id = ?1", params![id])?;
            tx.execute("DELETE FROM paths WHERE id = ?1", params![id])?;
            audit.record(
                &tx,
                AuditAction::Delete,
                "paths",
                Some(id),
                &format!("Removed with map {}", map_id),
            );
        }

        for id in Self::ids(&tx, "SELECT id FROM points WHERE map_id = ?1", map_id)? {
            tx.execute("DELETE FROM points WHERE id = ?1", params![id])?;
            audit.record(
                &tx,
                AuditAction::Delete,
                "points",
                Some(id),
                &format!("Removed with map {}", map_id),
            );
        }

        tx.execute("DELETE FROM maps WHERE id = ?1", params![map_id])?;
        audit.record(
            &tx,
            AuditAction::Delete,
            "maps",
            Some(map_id),
            &format!("Map deleted: {}", name),
        );
        tx.commit()?;

        info!(map_id, name = %name, "Map deleted with cascades");
        Ok(())
    }

    // ---- Points ---------------------------------------------------------

    /// Add a point under an existing map.
    pub fn add_point(&mut self, map_id: i64, fields: NewPoint) -> Result<PointRecord> {
        if fields.name.trim().is_empty() {
            return Err(StoreError::Validation(
                "Point name cannot be empty".to_string(),
            ));
        }
        let coordinate = Coordinate::new(fields.latitude, fields.longitude)?;

        let now = now_millis();
        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        Self::require_map(&tx, map_id)?;

        tx.execute(
            r#"
            INSERT INTO points (map_id, name, latitude, longitude, symbol_type, color, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                map_id,
                fields.name,
                coordinate.latitude,
                coordinate.longitude,
                fields.symbol_type.as_str(),
                fields.color,
                fields.description,
                now as i64,
            ],
        )?;
        let id = tx.last_insert_rowid();

        audit.record(
            &tx,
            AuditAction::Insert,
            "points",
            Some(id),
            &format!("Point saved: {}", fields.name),
        );
        tx.commit()?;

        Ok(PointRecord {
            id,
            map_id,
            name: fields.name,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            symbol_type: fields.symbol_type,
            color: fields.color,
            description: fields.description,
            created_at: now,
        })
    }

    /// All points of a map, ordered by name.
    pub fn points_for_map(&self, map_id: i64) -> Result<Vec<PointRecord>> {
        Self::require_map(&self.conn, map_id)?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, map_id, name, latitude, longitude, symbol_type, color, description, created_at
            FROM points
            WHERE map_id = ?1
            ORDER BY name
            "#,
        )?;

        let rows = stmt
            .query_map(params![map_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, i64>(8)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, map_id, name, latitude, longitude, symbol, color, description, created)| {
                    let symbol_type = symbol.parse::<SymbolType>().map_err(|_| {
                        StoreError::Integrity(format!(
                            "Unrecognized symbol type in storage: {}",
                            symbol
                        ))
                    })?;
                    Ok(PointRecord {
                        id,
                        map_id,
                        name,
                        latitude,
                        longitude,
                        symbol_type,
                        color,
                        description,
                        created_at: created as u64,
                    })
                },
            )
            .collect()
    }

    /// Delete a point, cascading to distance records that reference it and
    /// removing it from any path (whose total is recomputed in the same
    /// transaction).
    pub fn delete_point(&mut self, point_id: i64) -> Result<()> {
        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        let (map_id, name): (i64, String) = tx
            .query_row(
                "SELECT map_id, name FROM points WHERE id = ?1",
                params![point_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?
            .ok_or(StoreError::UnknownPoint(point_id))?;

        let distance_ids = Self::ids(
            &tx,
            "SELECT id FROM distances WHERE point1_id = ?1 OR point2_id = ?1",
            point_id,
        )?;
        for id in distance_ids {
            tx.execute("DELETE FROM distances WHERE id = ?1", params![id])?;
            audit.record(
                &tx,
                AuditAction::Delete,
                "distances",
                Some(id),
                &format!("Removed with point {}", point_id),
            );
        }

        let path_ids = Self::ids(
            &tx,
            "SELECT DISTINCT path_id FROM path_points WHERE point_id = ?1",
            point_id,
        )?;
        for path_id in path_ids {
            tx.execute(
                "DELETE FROM path_points WHERE path_id = ?1 AND point_id = ?2",
                params![path_id, point_id],
            )?;
            let total = Self::recompute_path_total(&tx, path_id)?;
            audit.record(
                &tx,
                AuditAction::Update,
                "paths",
                Some(path_id),
                &format!("Point {} removed, total now {:.3} km", point_id, total),
            );
        }

        tx.execute("DELETE FROM points WHERE id = ?1", params![point_id])?;
        audit.record(
            &tx,
            AuditAction::Delete,
            "points",
            Some(point_id),
            &format!("Point deleted: {}", name),
        );
        tx.commit()?;

        debug!(point_id, map_id, name = %name, "Point deleted with cascades");
        Ok(())
    }

    // ---- Distances ------------------------------------------------------

    /// Record the distance between two points of a map.
    ///
    /// The value is computed internally from the stored coordinates; a
    /// caller can never supply one, so the store and the calculator cannot
    /// diverge.
    pub fn record_distance(
        &mut self,
        map_id: i64,
        point1_id: i64,
        point2_id: i64,
        unit: DistanceUnit,
    ) -> Result<DistanceRecord> {
        let now = now_millis();
        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        Self::require_map(&tx, map_id)?;
        let a = Self::point_coordinate(&tx, map_id, point1_id)?;
        let b = Self::point_coordinate(&tx, map_id, point2_id)?;

        let value = distance(a, b, unit);

        tx.execute(
            r#"
            INSERT INTO distances (map_id, point1_id, point2_id, distance, unit, calculated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![map_id, point1_id, point2_id, value, unit.as_str(), now as i64],
        )?;
        let id = tx.last_insert_rowid();

        audit.record(
            &tx,
            AuditAction::Insert,
            "distances",
            Some(id),
            &format!("Distance recorded: {:.3} {}", value, unit),
        );
        tx.commit()?;

        Ok(DistanceRecord {
            id,
            map_id,
            point1_id,
            point2_id,
            distance: value,
            unit,
            calculated_at: now,
        })
    }

    /// All distance records of a map.
    pub fn distances_for_map(&self, map_id: i64) -> Result<Vec<DistanceRecord>> {
        Self::require_map(&self.conn, map_id)?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, map_id, point1_id, point2_id, distance, unit, calculated_at
            FROM distances
            WHERE map_id = ?1
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map(params![map_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(id, map_id, point1_id, point2_id, value, unit, calculated)| {
                    let unit = unit.parse::<DistanceUnit>().map_err(|_| {
                        StoreError::Integrity(format!("Unrecognized unit in storage: {}", unit))
                    })?;
                    Ok(DistanceRecord {
                        id,
                        map_id,
                        point1_id,
                        point2_id,
                        distance: value,
                        unit,
                        calculated_at: calculated as u64,
                    })
                },
            )
            .collect()
    }

    // ---- Paths ----------------------------------------------------------

    /// Create a path over an ordered sequence of the map's points.
    ///
    /// The total distance is computed from the stored coordinates before the
    /// path becomes visible.
    pub fn create_path(&mut self, map_id: i64, fields: NewPath) -> Result<PathRecord> {
        if fields.name.trim().is_empty() {
            return Err(StoreError::Validation(
                "Path name cannot be empty".to_string(),
            ));
        }
        if fields.width == 0 {
            return Err(StoreError::Validation(
                "Path width must be positive".to_string(),
            ));
        }

        let now = now_millis();
        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        Self::require_map(&tx, map_id)?;

        let mut coords = Vec::with_capacity(fields.point_ids.len());
        for &point_id in &fields.point_ids {
            coords.push(Self::point_coordinate(&tx, map_id, point_id)?);
        }
        let total = total_distance(&coords, DistanceUnit::Kilometers);

        tx.execute(
            r#"
            INSERT INTO paths (map_id, name, color, width, style, total_distance, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                map_id,
                fields.name,
                fields.color,
                fields.width,
                fields.style.as_str(),
                total,
                now as i64,
            ],
        )?;
        let id = tx.last_insert_rowid();

        for (seq, &point_id) in fields.point_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO path_points (path_id, seq, point_id) VALUES (?1, ?2, ?3)",
                params![id, seq as i64, point_id],
            )?;
        }

        audit.record(
            &tx,
            AuditAction::Insert,
            "paths",
            Some(id),
            &format!("Path created: {}", fields.name),
        );
        tx.commit()?;

        Ok(PathRecord {
            id,
            map_id,
            name: fields.name,
            point_ids: fields.point_ids,
            color: fields.color,
            width: fields.width,
            style: fields.style,
            total_distance: total,
            created_at: now,
        })
    }

    /// All paths of a map, ordered by name.
    pub fn paths_for_map(&self, map_id: i64) -> Result<Vec<PathRecord>> {
        Self::require_map(&self.conn, map_id)?;

        let ids = Self::ids(
            &self.conn,
            "SELECT id FROM paths WHERE map_id = ?1 ORDER BY name",
            map_id,
        )?;
        ids.into_iter()
            .map(|id| Self::load_path(&self.conn, id))
            .collect()
    }

    /// Append a point to the end of a path and recompute its total.
    pub fn append_path_point(&mut self, path_id: i64, point_id: i64) -> Result<PathRecord> {
        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        let map_id = Self::path_map_id(&tx, path_id)?;
        Self::point_coordinate(&tx, map_id, point_id)?;

        let next_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq) + 1, 0) FROM path_points WHERE path_id = ?1",
            params![path_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO path_points (path_id, seq, point_id) VALUES (?1, ?2, ?3)",
            params![path_id, next_seq, point_id],
        )?;

        let total = Self::recompute_path_total(&tx, path_id)?;
        audit.record(
            &tx,
            AuditAction::Update,
            "paths",
            Some(path_id),
            &format!("Point {} appended, total now {:.3} km", point_id, total),
        );

        let record = Self::load_path(&tx, path_id)?;
        tx.commit()?;
        Ok(record)
    }

    /// Remove every occurrence of a point from a path and recompute its
    /// total. Fails with `UnknownPoint` if the path does not contain it.
    pub fn remove_path_point(&mut self, path_id: i64, point_id: i64) -> Result<PathRecord> {
        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        Self::path_map_id(&tx, path_id)?;

        let removed = tx.execute(
            "DELETE FROM path_points WHERE path_id = ?1 AND point_id = ?2",
            params![path_id, point_id],
        )?;
        if removed == 0 {
            return Err(StoreError::UnknownPoint(point_id));
        }

        let total = Self::recompute_path_total(&tx, path_id)?;
        audit.record(
            &tx,
            AuditAction::Update,
            "paths",
            Some(path_id),
            &format!("Point {} removed, total now {:.3} km", point_id, total),
        );

        let record = Self::load_path(&tx, path_id)?;
        tx.commit()?;
        Ok(record)
    }

    /// Delete a path and its point sequence.
    pub fn delete_path(&mut self, path_id: i64) -> Result<()> {
        let audit = &self.audit;
        let tx = self.conn.transaction()?;

        let name: String = tx
            .query_row(
                "SELECT name FROM paths WHERE id = ?1",
                params![path_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::UnknownPath(path_id))?;

        tx.execute(
            "DELETE FROM path_points WHERE path_id = ?1",
            params![path_id],
        )?;
        tx.execute("DELETE FROM paths WHERE id = ?1", params![path_id])?;
        audit.record(
            &tx,
            AuditAction::Delete,
            "paths",
            Some(path_id),
            &format!("Path deleted: {}", name),
        );
        tx.commit()?;
        Ok(())
    }

    // ---- Audit ----------------------------------------------------------

    /// The full audit log, oldest first. Read-only: entries are never
    /// updated or deleted.
    pub fn audit_log(&self) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, action, table_name, record_id, actor, timestamp, details
            FROM audit_log
            ORDER BY id
            "#,
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, action, table_name, record_id, actor, timestamp, details)| {
                let action = action.parse::<AuditAction>().map_err(|_| {
                    StoreError::Integrity(format!("Unrecognized audit action in storage: {}", action))
                })?;
                Ok(AuditEntry {
                    id,
                    action,
                    table_name,
                    record_id,
                    actor,
                    timestamp: timestamp as u64,
                    details,
                })
            })
            .collect()
    }

    // ---- Lifecycle ------------------------------------------------------

    /// Close the store.
    ///
    /// The connection is released here; the payload key is overwritten when
    /// the contained `CipherBox` drops.
    pub fn close(self) {
        if let Err((_conn, e)) = self.conn.close() {
            warn!(error = %e, "Error closing store database");
        }
        info!("Record store closed");
    }

    /// Execute raw SQL for testing purposes only.
    ///
    /// **WARNING**: This bypasses sealing and digest stamping and exists
    /// solely so tests can simulate tampering and corruption.
    #[doc(hidden)]
    pub fn __test_execute_raw_sql(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<usize> {
        Ok(self.conn.execute(sql, params)?)
    }

    // ---- Internal helpers -----------------------------------------------

    fn validate_map_fields(fields: &NewMap) -> Result<()> {
        if fields.name.trim().is_empty() {
            return Err(StoreError::Validation(
                "Map name cannot be empty".to_string(),
            ));
        }
        if !(fields.scale_factor > 0.0) {
            return Err(StoreError::Validation(format!(
                "Scale factor must be positive, got {}",
                fields.scale_factor
            )));
        }
        for (label, value) in [
            ("north", fields.bounds_north),
            ("south", fields.bounds_south),
        ] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(StoreError::Validation(format!(
                    "Bound {} must be between -90 and 90, got {}",
                    label, value
                )));
            }
        }
        for (label, value) in [("east", fields.bounds_east), ("west", fields.bounds_west)] {
            if !(-180.0..=180.0).contains(&value) {
                return Err(StoreError::Validation(format!(
                    "Bound {} must be between -180 and 180, got {}",
                    label, value
                )));
            }
        }
        if fields.bounds_north < fields.bounds_south {
            return Err(StoreError::Validation(
                "North bound must not be below south bound".to_string(),
            ));
        }
        Ok(())
    }

    fn map_name_exists(conn: &Connection, name: &str, exclude: Option<i64>) -> Result<bool> {
        let existing: Option<i64> = conn
            .query_row("SELECT id FROM maps WHERE name = ?1", params![name], |row| {
                row.get(0)
            })
            .optional()?;
        match existing {
            Some(id) => Ok(exclude != Some(id)),
            None => Ok(false),
        }
    }

    fn require_map(conn: &Connection, map_id: i64) -> Result<()> {
        let exists: Option<i64> = conn
            .query_row("SELECT id FROM maps WHERE id = ?1", params![map_id], |row| {
                row.get(0)
            })
            .optional()?;
        exists.map(|_| ()).ok_or(StoreError::UnknownMap(map_id))
    }

    /// Coordinate of a point that must belong to the given map.
    ///
    /// An out-of-range stored coordinate is tampering, not a caller mistake.
    fn point_coordinate(conn: &Connection, map_id: i64, point_id: i64) -> Result<Coordinate> {
        let row: Option<(f64, f64)> = conn
            .query_row(
                "SELECT latitude, longitude FROM points WHERE id = ?1 AND map_id = ?2",
                params![point_id, map_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (latitude, longitude) = row.ok_or(StoreError::UnknownPoint(point_id))?;
        Coordinate::new(latitude, longitude)
            .map_err(|e| StoreError::Integrity(format!("Stored coordinate out of range: {}", e)))
    }

    fn path_map_id(conn: &Connection, path_id: i64) -> Result<i64> {
        conn.query_row(
            "SELECT map_id FROM paths WHERE id = ?1",
            params![path_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or(StoreError::UnknownPath(path_id))
    }

    fn path_coordinates(conn: &Connection, path_id: i64) -> Result<Vec<Coordinate>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT p.latitude, p.longitude
            FROM path_points pp
            JOIN points p ON p.id = pp.point_id
            WHERE pp.path_id = ?1
            ORDER BY pp.seq
            "#,
        )?;
        let raw = stmt
            .query_map(params![path_id], |row| {
                Ok((row.get::<_, f64>(0)?, row.get::<_, f64>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(latitude, longitude)| {
                Coordinate::new(latitude, longitude).map_err(|e| {
                    StoreError::Integrity(format!("Stored coordinate out of range: {}", e))
                })
            })
            .collect()
    }

    /// Recompute and persist a path's total from its current sequence.
    fn recompute_path_total(conn: &Connection, path_id: i64) -> Result<f64> {
        let coords = Self::path_coordinates(conn, path_id)?;
        let total = total_distance(&coords, DistanceUnit::Kilometers);
        conn.execute(
            "UPDATE paths SET total_distance = ?1 WHERE id = ?2",
            params![total, path_id],
        )?;
        Ok(total)
    }

    fn load_path(conn: &Connection, path_id: i64) -> Result<PathRecord> {
        let (id, map_id, name, color, width, style, total, created): (
            i64,
            i64,
            String,
            String,
            u32,
            String,
            f64,
            i64,
        ) = conn
            .query_row(
                r#"
                SELECT id, map_id, name, color, width, style, total_distance, created_at
                FROM paths
                WHERE id = ?1
                "#,
                params![path_id],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                    ))
                },
            )
            .optional()?
            .ok_or(StoreError::UnknownPath(path_id))?;

        let style = style.parse::<LineStyle>().map_err(|_| {
            StoreError::Integrity(format!("Unrecognized line style in storage: {}", style))
        })?;

        let point_ids = Self::ids(
            conn,
            "SELECT point_id FROM path_points WHERE path_id = ?1 ORDER BY seq",
            path_id,
        )?;

        Ok(PathRecord {
            id,
            map_id,
            name,
            point_ids,
            color,
            width,
            style,
            total_distance: total,
            created_at: created as u64,
        })
    }

    fn ids(conn: &Connection, sql: &str, param: i64) -> Result<Vec<i64>> {
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![param], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    fn read_sealed_map(row: &Row<'_>) -> rusqlite::Result<SealedMap> {
        Ok(SealedMap {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            image: row.get(3)?,
            bounds_north: row.get(4)?,
            bounds_south: row.get(5)?,
            bounds_east: row.get(6)?,
            bounds_west: row.get(7)?,
            scale_factor: row.get(8)?,
            created_at: row.get(9)?,
            modified_at: row.get(10)?,
            checksum: row.get(11)?,
        })
    }

    /// Unseal a raw map row and verify its digest.
    fn unseal_map(&self, raw: SealedMap) -> Result<MapRecord> {
        let image_data = match raw.image {
            Some(sealed) => Some(self.cipher.open(&sealed)?),
            None => None,
        };

        let record = MapRecord {
            id: raw.id,
            name: raw.name,
            description: raw.description,
            image_data,
            bounds_north: raw.bounds_north,
            bounds_south: raw.bounds_south,
            bounds_east: raw.bounds_east,
            bounds_west: raw.bounds_west,
            scale_factor: raw.scale_factor,
            created_at: raw.created_at as u64,
            modified_at: raw.modified_at as u64,
            checksum: raw.checksum,
        };

        if !record.verify_checksum() {
            return Err(StoreError::Integrity(format!(
                "Checksum mismatch for map '{}'",
                record.name
            )));
        }

        Ok(record)
    }
}
