//! Archival history models
//!
//! Append-only copies written at archival time. Never read back into an
//! active table session; they exist for historical reporting.

use serde::{Deserialize, Serialize};

use super::request::{PaymentMethod, RequestKind};

/// Archived copy of a single request, status forced to completed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedOrder {
    pub id: String,
    /// The request this row was copied from
    pub request_id: String,
    pub table_id: String,
    pub kind: RequestKind,
    pub details: String,
    pub total: f64,
    pub payment_method: Option<PaymentMethod>,
    /// Original request creation timestamp, millis
    pub created_at: i64,
    /// When the archival sequence copied this row, millis
    pub archived_at: i64,
}

/// Per-archival session summary with an integrity hash chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub id: String,
    pub table_id: String,
    /// Number of requests folded into this record
    pub request_count: usize,
    /// Aggregate revenue over the archived requests
    pub revenue: f64,
    /// Session-epoch start that this record closes, millis
    pub session_started_at: i64,
    pub archived_at: i64,
    /// now − earliest request timestamp, in whole minutes
    pub duration_minutes: i64,
    /// Hash of the previous archive record ("genesis" for the first)
    pub prev_hash: String,
    pub curr_hash: String,
}
