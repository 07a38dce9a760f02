//! Table Request Model
//!
//! Requests are the append-only audit trail of everything that happened at
//! a table. Immutable once created except for monotonic status transitions.

use serde::{Deserialize, Serialize};

/// What kind of event a request records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    NewOrder,
    CallStaff,
    BillRequest,
}

impl RequestKind {
    /// Display label used in logs and staff-facing summaries
    pub fn label(&self) -> &'static str {
        match self {
            RequestKind::NewOrder => "NEW ORDER",
            RequestKind::CallStaff => "STAFF CALL",
            RequestKind::BillRequest => "BILL REQUEST",
        }
    }
}

/// Request lifecycle: `Pending -> Confirmed -> Completed`, monotonic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Confirmed,
    Completed,
}

impl RequestStatus {
    /// The next status toward `Completed`; `Completed` stays put.
    pub fn advanced(self) -> Self {
        match self {
            RequestStatus::Pending => RequestStatus::Confirmed,
            RequestStatus::Confirmed | RequestStatus::Completed => RequestStatus::Completed,
        }
    }
}

/// Settlement method carried on bill requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
}

/// An auditable event at a table (order, staff call, bill request)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRequest {
    pub id: String,
    pub table_id: String,
    pub kind: RequestKind,
    /// Free-text summary; for orders, "qty× name" pairs joined by commas
    pub details: String,
    pub total: f64,
    pub status: RequestStatus,
    /// Creation timestamp, millis since epoch
    pub created_at: i64,
    pub payment_method: Option<PaymentMethod>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_never_regresses() {
        assert_eq!(RequestStatus::Pending.advanced(), RequestStatus::Confirmed);
        assert_eq!(RequestStatus::Confirmed.advanced(), RequestStatus::Completed);
        assert_eq!(RequestStatus::Completed.advanced(), RequestStatus::Completed);
    }

    #[test]
    fn status_ordering_matches_lifecycle() {
        assert!(RequestStatus::Pending < RequestStatus::Confirmed);
        assert!(RequestStatus::Confirmed < RequestStatus::Completed);
    }
}
