//! Cart Line Model

use serde::{Deserialize, Serialize};

/// One cart row, keyed by (table, menu item).
///
/// Invariant: at most one line per (table, item) pair; a quantity update
/// to 0 or below deletes the row instead of storing zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub table_id: String,
    pub menu_item_id: String,
    pub quantity: i32,
}

impl CartLine {
    pub fn new(table_id: impl Into<String>, menu_item_id: impl Into<String>, quantity: i32) -> Self {
        Self {
            table_id: table_id.into(),
            menu_item_id: menu_item_id.into(),
            quantity,
        }
    }

    /// Stable row address within the cart-lines collection
    pub fn key(&self) -> (String, String) {
        (self.table_id.clone(), self.menu_item_id.clone())
    }
}
