//! Record models for the TerraVault store.
//!
//! Records returned by the store are detached value snapshots: mutating a
//! copy has no effect until it is passed back through a named store
//! operation, which re-validates the fields and restamps the checksum.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use terravault_crypto::DigestWriter;
use terravault_geo::DistanceUnit;

use crate::error::StoreError;

/// Current timestamp in Unix milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis()
        .min(u64::MAX as u128) as u64
}

/// A stored map with its metadata and decrypted raster payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapRecord {
    /// Store-assigned identifier
    pub id: i64,
    /// Unique map name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Decrypted raster payload, if any
    pub image_data: Option<Vec<u8>>,
    /// Bounding box, decimal degrees
    pub bounds_north: f64,
    pub bounds_south: f64,
    pub bounds_east: f64,
    pub bounds_west: f64,
    /// Scale factor (> 0)
    pub scale_factor: f64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last-modification timestamp (Unix milliseconds)
    pub modified_at: u64,
    /// Hex BLAKE3 content digest
    pub checksum: String,
}

impl MapRecord {
    /// Compute the content digest over the record's semantic fields.
    ///
    /// Field order is fixed: name, description, image bytes, north, south,
    /// east, west, scale factor. Floats are written as decimal text; an
    /// absent image is skipped. Timestamps are not covered.
    pub fn compute_checksum(&self) -> String {
        let mut digest = DigestWriter::new();
        digest.text(&self.name);
        digest.text(&self.description);
        digest.opt_bytes(self.image_data.as_deref());
        digest.decimal(self.bounds_north);
        digest.decimal(self.bounds_south);
        digest.decimal(self.bounds_east);
        digest.decimal(self.bounds_west);
        digest.decimal(self.scale_factor);
        digest.finish()
    }

    /// Recompute the digest and compare to the stored checksum.
    pub fn verify_checksum(&self) -> bool {
        self.compute_checksum() == self.checksum
    }
}

/// Fields for creating or replacing a map.
#[derive(Debug, Clone, Default)]
pub struct NewMap {
    pub name: String,
    pub description: String,
    pub image_data: Option<Vec<u8>>,
    pub bounds_north: f64,
    pub bounds_south: f64,
    pub bounds_east: f64,
    pub bounds_west: f64,
    pub scale_factor: f64,
}

/// Marker symbol for a stored point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SymbolType {
    #[default]
    Circle,
    Square,
    Triangle,
    Star,
    Cross,
}

impl SymbolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolType::Circle => "Circle",
            SymbolType::Square => "Square",
            SymbolType::Triangle => "Triangle",
            SymbolType::Star => "Star",
            SymbolType::Cross => "Cross",
        }
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Circle" => Ok(SymbolType::Circle),
            "Square" => Ok(SymbolType::Square),
            "Triangle" => Ok(SymbolType::Triangle),
            "Star" => Ok(SymbolType::Star),
            "Cross" => Ok(SymbolType::Cross),
            other => Err(StoreError::Validation(format!(
                "Unknown symbol type: {}",
                other
            ))),
        }
    }
}

/// A stored point belonging to a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointRecord {
    pub id: i64,
    pub map_id: i64,
    pub name: String,
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
    pub symbol_type: SymbolType,
    pub color: String,
    pub description: String,
    pub created_at: u64,
}

/// Fields for creating a point under a map.
#[derive(Debug, Clone)]
pub struct NewPoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub symbol_type: SymbolType,
    pub color: String,
    pub description: String,
}

impl Default for NewPoint {
    fn default() -> Self {
        Self {
            name: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            symbol_type: SymbolType::Circle,
            color: "Red".to_string(),
            description: String::new(),
        }
    }
}

/// A stored pairwise distance, always produced by the calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceRecord {
    pub id: i64,
    pub map_id: i64,
    pub point1_id: i64,
    pub point2_id: i64,
    /// Distance value in `unit` (>= 0)
    pub distance: f64,
    pub unit: DistanceUnit,
    pub calculated_at: u64,
}

impl DistanceRecord {
    /// Retarget the stored value to another unit via the conversion factors.
    pub fn distance_in(&self, unit: DistanceUnit) -> f64 {
        DistanceUnit::convert(self.distance, self.unit, unit)
    }
}

/// Stroke style for a stored path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

impl LineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
        }
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineStyle {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            "dotted" => Ok(LineStyle::Dotted),
            other => Err(StoreError::Validation(format!(
                "Unknown line style: {}",
                other
            ))),
        }
    }
}

/// A stored path over an ordered sequence of points.
///
/// `total_distance` is derived from the point sequence and recomputed by
/// every operation that mutates it; a stale total is never exposed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRecord {
    pub id: i64,
    pub map_id: i64,
    pub name: String,
    /// Ordered point references
    pub point_ids: Vec<i64>,
    pub color: String,
    /// Stroke width (> 0)
    pub width: u32,
    pub style: LineStyle,
    /// Total path distance in kilometers
    pub total_distance: f64,
    pub created_at: u64,
}

/// Fields for creating a path under a map.
#[derive(Debug, Clone)]
pub struct NewPath {
    pub name: String,
    pub point_ids: Vec<i64>,
    pub color: String,
    pub width: u32,
    pub style: LineStyle,
}

impl Default for NewPath {
    fn default() -> Self {
        Self {
            name: String::new(),
            point_ids: Vec::new(),
            color: "Blue".to_string(),
            width: 2,
            style: LineStyle::Solid,
        }
    }
}

/// Kind of mutation recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    Insert,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Insert => "INSERT",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INSERT" => Ok(AuditAction::Insert),
            "UPDATE" => Ok(AuditAction::Update),
            "DELETE" => Ok(AuditAction::Delete),
            other => Err(StoreError::Validation(format!(
                "Unknown audit action: {}",
                other
            ))),
        }
    }
}

/// One append-only audit log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: i64,
    pub action: AuditAction,
    pub table_name: String,
    pub record_id: Option<i64>,
    pub actor: String,
    pub timestamp: u64,
    pub details: String,
}
