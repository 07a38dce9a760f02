//! Composed table-session view
//!
//! What consumers (customer devices, staff dashboard) actually read: the
//! table record joined with resolved cart entries and the epoch-filtered
//! request set. Built by the local session cache, never persisted as-is.

use serde::{Deserialize, Serialize};

use super::request::{RequestStatus, TableRequest};

/// A cart line resolved against the catalog (name and price attached)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartEntry {
    pub item_id: String,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
}

/// The cart + request history + lock state of one table, scoped to the
/// current session epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSession {
    pub table_id: String,
    pub is_locked: bool,
    pub is_vip: bool,
    pub session_start: i64,
    pub cart: Vec<CartEntry>,
    pub requests: Vec<TableRequest>,
}

impl TableSession {
    /// Empty session for a table never seen before
    pub fn empty(table_id: impl Into<String>, session_start: i64) -> Self {
        Self {
            table_id: table_id.into(),
            is_locked: false,
            is_vip: false,
            session_start,
            cart: Vec::new(),
            requests: Vec::new(),
        }
    }

    /// Sum of price×quantity over the cart (unrounded; callers round at
    /// the money boundary)
    pub fn cart_total(&self) -> f64 {
        self.cart
            .iter()
            .map(|e| e.price * e.quantity as f64)
            .sum()
    }

    /// Total item count in the cart
    pub fn cart_item_count(&self) -> i32 {
        self.cart.iter().map(|e| e.quantity).sum()
    }

    /// Number of requests still awaiting staff action
    pub fn pending_count(&self) -> usize {
        self.requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .count()
    }

    pub fn cart_entry(&self, item_id: &str) -> Option<&CartEntry> {
        self.cart.iter().find(|e| e.item_id == item_id)
    }

    pub fn request(&self, request_id: &str) -> Option<&TableRequest> {
        self.requests.iter().find(|r| r.id == request_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, price: f64, qty: i32) -> CartEntry {
        CartEntry {
            item_id: id.into(),
            name: id.to_uppercase(),
            price,
            quantity: qty,
        }
    }

    #[test]
    fn totals_derive_from_cart() {
        let mut session = TableSession::empty("T1", 0);
        session.cart.push(entry("a", 5.0, 2));
        session.cart.push(entry("b", 3.5, 1));
        assert_eq!(session.cart_total(), 13.5);
        assert_eq!(session.cart_item_count(), 3);
    }

    #[test]
    fn empty_session_has_no_pending_work() {
        let session = TableSession::empty("T1", 0);
        assert_eq!(session.cart_total(), 0.0);
        assert_eq!(session.pending_count(), 0);
    }
}
