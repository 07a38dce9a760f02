//! Table Record Model

use serde::{Deserialize, Serialize};

/// Per-table persisted flags and the session-epoch start.
///
/// A record is implicitly created with defaults the first time a table
/// identifier is referenced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    pub table_id: String,
    /// Set when a bill is requested; cleared only by mark-paid or reset
    pub is_locked: bool,
    pub is_vip: bool,
    /// Session-epoch start, millis since epoch. Requests created before
    /// this timestamp are hidden from the active view.
    pub session_start: i64,
}

impl TableRecord {
    pub fn new(table_id: impl Into<String>, session_start: i64) -> Self {
        Self {
            table_id: table_id.into(),
            is_locked: false,
            is_vip: false,
            session_start,
        }
    }
}
