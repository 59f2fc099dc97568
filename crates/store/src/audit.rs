//! Append-only audit trail.
//!
//! Every mutating store operation records what it did and who did it. The
//! audit write is best-effort by contract: a failed insert is logged and
//! swallowed so it never blocks the primary operation it describes. Entries
//! are immutable once appended; there is no update or delete operation.

use rusqlite::{params, Connection};
use tracing::warn;

use crate::model::{now_millis, AuditAction};

/// Best-effort writer for the `audit_log` relation.
///
/// `record` takes the enclosing operation's transaction handle, so
/// successful audit rows commit atomically with the rows they describe.
pub struct AuditTrail {
    actor: String,
}

impl AuditTrail {
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Append one entry. Never raises: audit failure must not fail the
    /// mutation it describes.
    pub fn record(
        &self,
        conn: &Connection,
        action: AuditAction,
        table_name: &str,
        record_id: Option<i64>,
        details: &str,
    ) {
        let result = conn.execute(
            r#"
            INSERT INTO audit_log (action, table_name, record_id, actor, timestamp, details)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                action.as_str(),
                table_name,
                record_id,
                self.actor,
                now_millis() as i64,
                details,
            ],
        );

        if let Err(e) = result {
            warn!(
                action = action.as_str(),
                table_name = table_name,
                error = %e,
                "Audit write failed, continuing"
            );
        }
    }
}
