//! In-memory store backend
//!
//! Keeps every collection in a single `RwLock`ed struct so read-modify-
//! write operations (`increment_cart_line`) are atomic under the write
//! lock. Broadcast channels per collection carry payload-free change
//! signals after successful writes.
//!
//! Fault injection (`fail_next_writes`) lets tests exercise transient
//! failure, rejection, and partial-archival paths without a flaky
//! network.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;

use shared::models::{
    ArchiveRecord, CartLine, CompletedOrder, MenuItem, TableRecord, TableRequest,
};
use shared::{AppError, AppResult, ErrorCode};

use super::{ChangeSignal, Collection, SessionStore};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct StoreData {
    menu_items: BTreeMap<String, MenuItem>,
    tables: BTreeMap<String, TableRecord>,
    /// Keyed by (table_id, menu_item_id); one row per pair
    cart_lines: BTreeMap<(String, String), CartLine>,
    requests: BTreeMap<String, TableRequest>,
    completed_orders: Vec<CompletedOrder>,
    archive_records: Vec<ArchiveRecord>,
}

struct FaultPlan {
    code: ErrorCode,
    remaining: usize,
}

pub struct MemoryStore {
    data: RwLock<StoreData>,
    channels: HashMap<Collection, broadcast::Sender<ChangeSignal>>,
    faults: Mutex<HashMap<Collection, FaultPlan>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Collection::ALL
            .into_iter()
            .map(|c| (c, broadcast::channel(capacity).0))
            .collect();
        Self {
            data: RwLock::new(StoreData::default()),
            channels,
            faults: Mutex::new(HashMap::new()),
        }
    }

    /// Make the next `count` writes against `collection` fail with `code`.
    /// Reads are unaffected.
    pub fn fail_next_writes(&self, collection: Collection, code: ErrorCode, count: usize) {
        self.faults.lock().insert(
            collection,
            FaultPlan {
                code,
                remaining: count,
            },
        );
    }

    fn check_fault(&self, collection: Collection) -> AppResult<()> {
        let mut faults = self.faults.lock();
        if let Some(plan) = faults.get_mut(&collection) {
            if plan.remaining > 0 {
                plan.remaining -= 1;
                let code = plan.code;
                if plan.remaining == 0 {
                    faults.remove(&collection);
                }
                return Err(AppError::new(code).with_detail("collection", collection.as_str()));
            }
        }
        Ok(())
    }

    fn notify(&self, collection: Collection) {
        if let Some(sender) = self.channels.get(&collection) {
            // No receivers is fine; signals are best-effort
            let _ = sender.send(ChangeSignal { collection });
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn list_menu_items(&self) -> AppResult<Vec<MenuItem>> {
        Ok(self.data.read().menu_items.values().cloned().collect())
    }

    async fn get_menu_item(&self, id: &str) -> AppResult<Option<MenuItem>> {
        Ok(self.data.read().menu_items.get(id).cloned())
    }

    async fn put_menu_item(&self, item: MenuItem) -> AppResult<()> {
        self.check_fault(Collection::MenuItems)?;
        self.data.write().menu_items.insert(item.id.clone(), item);
        self.notify(Collection::MenuItems);
        Ok(())
    }

    async fn delete_menu_item(&self, id: &str) -> AppResult<()> {
        self.check_fault(Collection::MenuItems)?;
        self.data.write().menu_items.remove(id);
        self.notify(Collection::MenuItems);
        Ok(())
    }

    async fn list_tables(&self) -> AppResult<Vec<TableRecord>> {
        Ok(self.data.read().tables.values().cloned().collect())
    }

    async fn get_table(&self, table_id: &str) -> AppResult<Option<TableRecord>> {
        Ok(self.data.read().tables.get(table_id).cloned())
    }

    async fn put_table(&self, record: TableRecord) -> AppResult<()> {
        self.check_fault(Collection::Tables)?;
        self.data
            .write()
            .tables
            .insert(record.table_id.clone(), record);
        self.notify(Collection::Tables);
        Ok(())
    }

    async fn list_cart_lines(&self) -> AppResult<Vec<CartLine>> {
        Ok(self.data.read().cart_lines.values().cloned().collect())
    }

    async fn list_cart_lines_for_table(&self, table_id: &str) -> AppResult<Vec<CartLine>> {
        Ok(self
            .data
            .read()
            .cart_lines
            .values()
            .filter(|l| l.table_id == table_id)
            .cloned()
            .collect())
    }

    async fn put_cart_line(&self, line: CartLine) -> AppResult<()> {
        self.check_fault(Collection::CartLines)?;
        if line.quantity <= 0 {
            return Err(AppError::validation(format!(
                "cart line quantity must be positive, got {}",
                line.quantity
            )));
        }
        self.data.write().cart_lines.insert(line.key(), line);
        self.notify(Collection::CartLines);
        Ok(())
    }

    async fn increment_cart_line(
        &self,
        table_id: &str,
        menu_item_id: &str,
        delta: i32,
    ) -> AppResult<i32> {
        self.check_fault(Collection::CartLines)?;
        let key = (table_id.to_string(), menu_item_id.to_string());
        let resulting = {
            let mut data = self.data.write();
            let current = data.cart_lines.get(&key).map(|l| l.quantity).unwrap_or(0);
            let next = current + delta;
            if next <= 0 {
                data.cart_lines.remove(&key);
                0
            } else {
                data.cart_lines
                    .insert(key, CartLine::new(table_id, menu_item_id, next));
                next
            }
        };
        self.notify(Collection::CartLines);
        Ok(resulting)
    }

    async fn delete_cart_line(&self, table_id: &str, menu_item_id: &str) -> AppResult<()> {
        self.check_fault(Collection::CartLines)?;
        let key = (table_id.to_string(), menu_item_id.to_string());
        self.data.write().cart_lines.remove(&key);
        self.notify(Collection::CartLines);
        Ok(())
    }

    async fn clear_cart(&self, table_id: &str) -> AppResult<()> {
        self.check_fault(Collection::CartLines)?;
        self.data
            .write()
            .cart_lines
            .retain(|(t, _), _| t != table_id);
        self.notify(Collection::CartLines);
        Ok(())
    }

    async fn list_requests(&self) -> AppResult<Vec<TableRequest>> {
        let mut requests: Vec<_> = self.data.read().requests.values().cloned().collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn list_requests_for_table(&self, table_id: &str) -> AppResult<Vec<TableRequest>> {
        let mut requests: Vec<_> = self
            .data
            .read()
            .requests
            .values()
            .filter(|r| r.table_id == table_id)
            .cloned()
            .collect();
        requests.sort_by_key(|r| r.created_at);
        Ok(requests)
    }

    async fn put_request(&self, request: TableRequest) -> AppResult<()> {
        self.check_fault(Collection::Requests)?;
        self.data
            .write()
            .requests
            .insert(request.id.clone(), request);
        self.notify(Collection::Requests);
        Ok(())
    }

    async fn delete_requests_for_table(&self, table_id: &str) -> AppResult<()> {
        self.check_fault(Collection::Requests)?;
        self.data
            .write()
            .requests
            .retain(|_, r| r.table_id != table_id);
        self.notify(Collection::Requests);
        Ok(())
    }

    async fn put_completed_order(&self, order: CompletedOrder) -> AppResult<()> {
        self.check_fault(Collection::CompletedOrders)?;
        self.data.write().completed_orders.push(order);
        self.notify(Collection::CompletedOrders);
        Ok(())
    }

    async fn list_completed_orders_for_table(
        &self,
        table_id: &str,
    ) -> AppResult<Vec<CompletedOrder>> {
        Ok(self
            .data
            .read()
            .completed_orders
            .iter()
            .filter(|o| o.table_id == table_id)
            .cloned()
            .collect())
    }

    async fn put_archive_record(&self, record: ArchiveRecord) -> AppResult<()> {
        self.check_fault(Collection::ArchiveRecords)?;
        self.data.write().archive_records.push(record);
        self.notify(Collection::ArchiveRecords);
        Ok(())
    }

    async fn list_archive_records_for_table(
        &self,
        table_id: &str,
    ) -> AppResult<Vec<ArchiveRecord>> {
        Ok(self
            .data
            .read()
            .archive_records
            .iter()
            .filter(|r| r.table_id == table_id)
            .cloned()
            .collect())
    }

    async fn last_archive_hash(&self) -> AppResult<Option<String>> {
        Ok(self
            .data
            .read()
            .archive_records
            .last()
            .map(|r| r.curr_hash.clone()))
    }

    fn subscribe(&self, collection: Collection) -> broadcast::Receiver<ChangeSignal> {
        self.channels[&collection].subscribe()
    }
}
