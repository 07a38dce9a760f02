//! Authoritative store abstraction
//!
//! The store owns the durable truth for every collection. Writes are
//! per-entity; there are no transactions spanning collections, so
//! multi-step workflows (archival) must tolerate partial completion.
//! After any successful write the store pushes a payload-free change
//! signal on the matching collection channel.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use shared::models::{
    ArchiveRecord, CartLine, CompletedOrder, MenuItem, TableRecord, TableRequest,
};
use shared::AppResult;

/// Collections the store tracks, one change channel each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    MenuItems,
    Tables,
    CartLines,
    Requests,
    CompletedOrders,
    ArchiveRecords,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::MenuItems,
        Collection::Tables,
        Collection::CartLines,
        Collection::Requests,
        Collection::CompletedOrders,
        Collection::ArchiveRecords,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::MenuItems => "menu_items",
            Collection::Tables => "tables",
            Collection::CartLines => "cart_lines",
            Collection::Requests => "requests",
            Collection::CompletedOrders => "completed_orders",
            Collection::ArchiveRecords => "archive_records",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something changed in a collection. Carries no row data; consumers
/// reload and re-derive state from a full read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSignal {
    pub collection: Collection,
}

/// Durable backend for all session state.
///
/// Every mutating call is a single-entity write: it either fully applies
/// or fully fails, but consecutive calls are not atomic together.
#[async_trait]
pub trait SessionStore: Send + Sync {
    // --- menu items ---
    async fn list_menu_items(&self) -> AppResult<Vec<MenuItem>>;
    async fn get_menu_item(&self, id: &str) -> AppResult<Option<MenuItem>>;
    async fn put_menu_item(&self, item: MenuItem) -> AppResult<()>;
    async fn delete_menu_item(&self, id: &str) -> AppResult<()>;

    // --- tables ---
    async fn list_tables(&self) -> AppResult<Vec<TableRecord>>;
    async fn get_table(&self, table_id: &str) -> AppResult<Option<TableRecord>>;
    async fn put_table(&self, record: TableRecord) -> AppResult<()>;

    // --- cart lines ---
    async fn list_cart_lines(&self) -> AppResult<Vec<CartLine>>;
    async fn list_cart_lines_for_table(&self, table_id: &str) -> AppResult<Vec<CartLine>>;
    /// Absolute write; `quantity` must be positive
    async fn put_cart_line(&self, line: CartLine) -> AppResult<()>;
    /// Atomic read-modify-write on one line. Inserts the line when absent,
    /// removes it when the resulting quantity drops to 0 or below. Returns
    /// the quantity after the update (0 if removed).
    async fn increment_cart_line(
        &self,
        table_id: &str,
        menu_item_id: &str,
        delta: i32,
    ) -> AppResult<i32>;
    async fn delete_cart_line(&self, table_id: &str, menu_item_id: &str) -> AppResult<()>;
    async fn clear_cart(&self, table_id: &str) -> AppResult<()>;

    // --- requests ---
    async fn list_requests(&self) -> AppResult<Vec<TableRequest>>;
    async fn list_requests_for_table(&self, table_id: &str) -> AppResult<Vec<TableRequest>>;
    async fn put_request(&self, request: TableRequest) -> AppResult<()>;
    async fn delete_requests_for_table(&self, table_id: &str) -> AppResult<()>;

    // --- archival history ---
    async fn put_completed_order(&self, order: CompletedOrder) -> AppResult<()>;
    async fn list_completed_orders_for_table(
        &self,
        table_id: &str,
    ) -> AppResult<Vec<CompletedOrder>>;
    async fn put_archive_record(&self, record: ArchiveRecord) -> AppResult<()>;
    async fn list_archive_records_for_table(
        &self,
        table_id: &str,
    ) -> AppResult<Vec<ArchiveRecord>>;
    /// Hash of the most recently written archive record, if any
    async fn last_archive_hash(&self) -> AppResult<Option<String>>;

    /// Subscribe to change signals for one collection
    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeSignal>;
}
