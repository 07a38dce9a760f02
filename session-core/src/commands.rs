//! Session commands
//!
//! Every command follows the same shape: validate against the composed
//! view, stage the optimistic result, write to the store, then either
//! fold the acknowledged value into the confirmed snapshot or unstage
//! and force a reload. A per-table async mutex serializes commands for
//! one table on this node; cross-node races are resolved by the store's
//! atomic per-entity writes plus reload convergence.
//!
//! Only idempotent absolute writes are retried. `add_item` goes through
//! the store's atomic increment and is never retried, since replaying a
//! relative update after an ambiguous failure could double-apply it.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use shared::models::{
    CartEntry, MenuItem, PaymentMethod, RequestKind, RequestStatus, TableRecord, TableRequest,
    TableSession,
};
use shared::util::{now_millis, snowflake_id};
use shared::{AppError, AppResult, ErrorCode};

use crate::cache::SessionCache;
use crate::config::Config;
use crate::money;
use crate::reconcile;
use crate::store::SessionStore;

pub struct SessionService {
    store: Arc<dyn SessionStore>,
    cache: Arc<SessionCache>,
    config: Config,
    /// Per-table command serialization on this node
    table_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Node identity for log correlation
    instance: String,
}

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>, cache: Arc<SessionCache>, config: Config) -> Self {
        Self {
            store,
            cache,
            config,
            table_locks: DashMap::new(),
            instance: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    pub(crate) fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn instance_id(&self) -> &str {
        &self.instance
    }

    /// Composed view of one table
    pub fn session(&self, table_id: &str) -> TableSession {
        self.cache.session(table_id)
    }

    /// Composed views of every known table
    pub fn sessions(&self) -> Vec<TableSession> {
        self.cache.sessions()
    }

    /// Full reload from the store, outside the debounce schedule
    pub async fn reload(&self) -> AppResult<()> {
        reconcile::reload(self.store.as_ref(), &self.cache).await
    }

    pub(crate) fn table_mutex(&self, table_id: &str) -> Arc<Mutex<()>> {
        self.table_locks
            .entry(table_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Fetch the table record, creating it with defaults on first touch
    pub(crate) async fn ensure_table(&self, table_id: &str) -> AppResult<TableRecord> {
        if let Some(record) = self.store.get_table(table_id).await? {
            return Ok(record);
        }
        let record = TableRecord::new(table_id, now_millis());
        info!(table_id, instance = %self.instance, "creating table record on first touch");
        self.store.put_table(record.clone()).await?;
        Ok(record)
    }

    async fn menu_item(&self, item_id: &str) -> AppResult<MenuItem> {
        if let Some(item) = self.cache.menu_item(item_id) {
            return Ok(item);
        }
        self.store
            .get_menu_item(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("menu item {}", item_id)))
    }

    fn reject_if_locked(&self, session: &TableSession) -> AppResult<()> {
        if session.is_locked {
            return Err(AppError::table_locked(&session.table_id));
        }
        Ok(())
    }

    /// Unstage on failure and force convergence with the store's truth
    pub(crate) async fn forced_reload(&self, table_id: &str) {
        if let Err(err) = self.reload().await {
            warn!(table_id, error = %err, "forced reload after failed write also failed");
        }
    }

    /// Retry wrapper for idempotent absolute writes. Transient errors are
    /// retried with capped exponential backoff; everything else fails
    /// immediately.
    async fn write_with_retry<F, Fut>(&self, op: &str, mut f: F) -> AppResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<()>>,
    {
        let attempts = self.config.cart_write_retries.max(1);
        let mut delay = self.config.retry_base();
        let mut attempt = 0;
        loop {
            attempt += 1;
            match f().await {
                Ok(()) => return Ok(()),
                Err(err) if err.is_transient() && attempt < attempts => {
                    warn!(op, attempt, error = %err, "transient write failure, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }

    // ==================== cart commands ====================

    /// Add one unit of a menu item to the table's cart.
    ///
    /// Relative by design: the store applies +1 atomically, so two
    /// concurrent adds from different clients end at quantity 2 rather
    /// than racing a read-modify-write. Not retried.
    #[instrument(skip(self), fields(instance = %self.instance))]
    pub async fn add_item(&self, table_id: &str, item_id: &str) -> AppResult<CartEntry> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;

        self.ensure_table(table_id).await?;
        let session = self.cache.session(table_id);
        self.reject_if_locked(&session)?;

        let item = self.menu_item(item_id).await?;
        let visible_qty = session.cart_entry(item_id).map(|e| e.quantity).unwrap_or(0);
        money::validate_quantity(visible_qty + 1)?;

        let staged = CartEntry {
            item_id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity: visible_qty + 1,
        };
        self.cache.stage_cart(table_id, item_id, Some(staged));

        match self.store.increment_cart_line(table_id, item_id, 1).await {
            Ok(confirmed_qty) => {
                let entry = CartEntry {
                    item_id: item.id,
                    name: item.name,
                    price: item.price,
                    quantity: confirmed_qty,
                };
                self.cache.fold_cart(table_id, item_id, Some(entry.clone()));
                Ok(entry)
            }
            Err(err) => {
                warn!(table_id, item_id, error = %err, "add_item write failed");
                self.cache.unstage_cart(table_id, item_id);
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }

    /// Set the absolute quantity of a cart line. Zero or below removes
    /// the line. Idempotent, so transient failures are retried.
    #[instrument(skip(self), fields(instance = %self.instance))]
    pub async fn set_quantity(
        &self,
        table_id: &str,
        item_id: &str,
        quantity: i32,
    ) -> AppResult<()> {
        if quantity <= 0 {
            return self.remove_item(table_id, item_id).await;
        }
        money::validate_quantity(quantity)?;

        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;

        self.ensure_table(table_id).await?;
        let session = self.cache.session(table_id);
        self.reject_if_locked(&session)?;
        let item = self.menu_item(item_id).await?;

        let staged = CartEntry {
            item_id: item.id.clone(),
            name: item.name.clone(),
            price: item.price,
            quantity,
        };
        self.cache.stage_cart(table_id, item_id, Some(staged.clone()));

        let line = shared::models::CartLine::new(table_id, item_id, quantity);
        let result = self
            .write_with_retry("put_cart_line", || self.store.put_cart_line(line.clone()))
            .await;
        match result {
            Ok(()) => {
                self.cache.fold_cart(table_id, item_id, Some(staged));
                Ok(())
            }
            Err(err) => {
                warn!(table_id, item_id, quantity, error = %err, "set_quantity write failed");
                self.cache.unstage_cart(table_id, item_id);
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }

    /// Remove a cart line entirely. Idempotent; retried.
    #[instrument(skip(self), fields(instance = %self.instance))]
    pub async fn remove_item(&self, table_id: &str, item_id: &str) -> AppResult<()> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;

        self.ensure_table(table_id).await?;
        let session = self.cache.session(table_id);
        self.reject_if_locked(&session)?;

        self.cache.stage_cart(table_id, item_id, None);
        let result = self
            .write_with_retry("delete_cart_line", || {
                self.store.delete_cart_line(table_id, item_id)
            })
            .await;
        match result {
            Ok(()) => {
                self.cache.fold_cart(table_id, item_id, None);
                Ok(())
            }
            Err(err) => {
                warn!(table_id, item_id, error = %err, "remove_item write failed");
                self.cache.unstage_cart(table_id, item_id);
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }

    /// Empty the table's cart without submitting. Idempotent; retried.
    #[instrument(skip(self), fields(instance = %self.instance))]
    pub async fn clear_cart(&self, table_id: &str) -> AppResult<()> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;

        self.ensure_table(table_id).await?;
        let session = self.cache.session(table_id);
        self.reject_if_locked(&session)?;

        let staged_keys = self.cache.stage_cart_cleared(table_id);
        let result = self
            .write_with_retry("clear_cart", || self.store.clear_cart(table_id))
            .await;
        match result {
            Ok(()) => {
                self.cache.fold_cart_cleared(table_id);
                Ok(())
            }
            Err(err) => {
                warn!(table_id, error = %err, "clear_cart write failed");
                for key in staged_keys {
                    self.cache.unstage_cart(table_id, &key);
                }
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }

    // ==================== request commands ====================

    /// Turn the current cart into a new-order request and empty the cart.
    ///
    /// Two writes with no transaction around them. If the cart wipe fails
    /// after the request landed, the request stays (it is already part of
    /// the audit trail) and the error is surfaced; the cart converges on
    /// the next reload or retry.
    #[instrument(skip(self), fields(instance = %self.instance))]
    pub async fn submit_order(&self, table_id: &str) -> AppResult<TableRequest> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;

        self.ensure_table(table_id).await?;
        let session = self.cache.session(table_id);
        self.reject_if_locked(&session)?;
        if session.cart.is_empty() {
            return Err(AppError::new(ErrorCode::CartEmpty).with_detail("table_id", table_id));
        }

        let details = session
            .cart
            .iter()
            .map(|e| format!("{}× {}", e.quantity, e.name))
            .collect::<Vec<_>>()
            .join(", ");
        let request = TableRequest {
            id: format!("req_{}", snowflake_id()),
            table_id: table_id.to_string(),
            kind: RequestKind::NewOrder,
            details,
            total: money::order_total(session.cart.iter()),
            status: RequestStatus::Pending,
            created_at: now_millis(),
            payment_method: None,
        };

        self.cache.stage_request(table_id, request.clone());
        let staged_keys = self.cache.stage_cart_cleared(table_id);

        if let Err(err) = self.store.put_request(request.clone()).await {
            warn!(table_id, error = %err, "submit_order request write failed");
            self.cache.unstage_request(table_id, &request.id);
            for key in staged_keys {
                self.cache.unstage_cart(table_id, &key);
            }
            self.forced_reload(table_id).await;
            return Err(err);
        }
        self.cache.fold_request(table_id, request.clone());

        let result = self
            .write_with_retry("clear_cart", || self.store.clear_cart(table_id))
            .await;
        match result {
            Ok(()) => {
                self.cache.fold_cart_cleared(table_id);
                info!(
                    table_id,
                    request_id = %request.id,
                    total = request.total,
                    "order submitted"
                );
                Ok(request)
            }
            Err(err) => {
                warn!(
                    table_id,
                    request_id = %request.id,
                    error = %err,
                    "order persisted but cart wipe failed"
                );
                for key in staged_keys {
                    self.cache.unstage_cart(table_id, &key);
                }
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }

    /// Log a staff-assistance request for the table
    #[instrument(skip(self), fields(instance = %self.instance))]
    pub async fn call_staff(&self, table_id: &str) -> AppResult<TableRequest> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;

        self.ensure_table(table_id).await?;
        let session = self.cache.session(table_id);
        self.reject_if_locked(&session)?;

        let request = TableRequest {
            id: format!("req_{}", snowflake_id()),
            table_id: table_id.to_string(),
            kind: RequestKind::CallStaff,
            details: "Customer requested assistance".to_string(),
            total: 0.0,
            status: RequestStatus::Pending,
            created_at: now_millis(),
            payment_method: None,
        };

        self.cache.stage_request(table_id, request.clone());
        match self.store.put_request(request.clone()).await {
            Ok(()) => {
                self.cache.fold_request(table_id, request.clone());
                Ok(request)
            }
            Err(err) => {
                warn!(table_id, error = %err, "call_staff write failed");
                self.cache.unstage_request(table_id, &request.id);
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }

    /// Ask for the bill and lock the table against further ordering.
    ///
    /// The bill total aggregates the session's completed orders; pending
    /// or confirmed orders are still in the kitchen and not billable yet.
    #[instrument(skip(self), fields(instance = %self.instance))]
    pub async fn request_bill(
        &self,
        table_id: &str,
        payment_method: PaymentMethod,
    ) -> AppResult<TableRequest> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;

        let mut record = self.ensure_table(table_id).await?;
        let session = self.cache.session(table_id);
        self.reject_if_locked(&session)?;

        let total = money::sum_totals(
            session
                .requests
                .iter()
                .filter(|r| r.kind == RequestKind::NewOrder && r.status == RequestStatus::Completed)
                .map(|r| r.total),
        );
        let request = TableRequest {
            id: format!("req_{}", snowflake_id()),
            table_id: table_id.to_string(),
            kind: RequestKind::BillRequest,
            details: format!("Bill requested ({})", payment_label(payment_method)),
            total,
            status: RequestStatus::Pending,
            created_at: now_millis(),
            payment_method: Some(payment_method),
        };

        self.cache.stage_request(table_id, request.clone());
        self.cache.stage_lock(table_id, true);

        if let Err(err) = self.store.put_request(request.clone()).await {
            warn!(table_id, error = %err, "request_bill request write failed");
            self.cache.unstage_request(table_id, &request.id);
            self.cache.unstage_lock(table_id);
            self.forced_reload(table_id).await;
            return Err(err);
        }
        self.cache.fold_request(table_id, request.clone());

        record.is_locked = true;
        match self.store.put_table(record).await {
            Ok(()) => {
                self.cache.fold_lock(table_id, true);
                info!(table_id, total, "bill requested, table locked");
                Ok(request)
            }
            Err(err) => {
                // Bill request persisted but the lock did not; surface the
                // failure and let reload converge the lock flag
                warn!(table_id, error = %err, "bill persisted but table lock failed");
                self.cache.unstage_lock(table_id);
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }

    /// Advance a request one status step. Completed requests stay put and
    /// the call is a no-op. Allowed while the table is locked so staff
    /// can finish outstanding work before settlement.
    #[instrument(skip(self), fields(instance = %self.instance))]
    pub async fn confirm_request(
        &self,
        table_id: &str,
        request_id: &str,
    ) -> AppResult<TableRequest> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;

        let session = self.cache.session(table_id);
        let current = match session.request(request_id) {
            Some(request) => request.clone(),
            None => self
                .store
                .list_requests_for_table(table_id)
                .await?
                .into_iter()
                .find(|r| r.id == request_id)
                .ok_or_else(|| {
                    AppError::new(ErrorCode::RequestNotFound).with_detail("request_id", request_id)
                })?,
        };

        if current.status == RequestStatus::Completed {
            return Ok(current);
        }
        let mut updated = current.clone();
        updated.status = current.status.advanced();

        self.cache.stage_request(table_id, updated.clone());
        match self.store.put_request(updated.clone()).await {
            Ok(()) => {
                self.cache.fold_request(table_id, updated.clone());
                Ok(updated)
            }
            Err(err) => {
                warn!(table_id, request_id, error = %err, "confirm_request write failed");
                self.cache.unstage_request(table_id, request_id);
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }

    // ==================== table flags ====================

    /// Toggle the table's VIP flag
    #[instrument(skip(self), fields(instance = %self.instance))]
    pub async fn mark_vip(&self, table_id: &str, vip: bool) -> AppResult<()> {
        let mutex = self.table_mutex(table_id);
        let _guard = mutex.lock().await;

        let mut record = self.ensure_table(table_id).await?;
        self.cache.stage_vip(table_id, vip);
        record.is_vip = vip;
        match self.store.put_table(record).await {
            Ok(()) => {
                self.cache.fold_vip(table_id, vip);
                Ok(())
            }
            Err(err) => {
                warn!(table_id, vip, error = %err, "mark_vip write failed");
                self.cache.unstage_vip(table_id);
                self.forced_reload(table_id).await;
                Err(err)
            }
        }
    }
}

fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "cash",
        PaymentMethod::Card => "card",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn item(id: &str, price: f64) -> MenuItem {
        MenuItem {
            id: id.into(),
            category: None,
            name: id.to_uppercase(),
            price,
            description: None,
        }
    }

    async fn service_with_menu() -> (Arc<MemoryStore>, SessionService) {
        let store = Arc::new(MemoryStore::new());
        store.put_menu_item(item("a", 5.0)).await.unwrap();
        store.put_menu_item(item("b", 3.5)).await.unwrap();
        let cache = Arc::new(SessionCache::new(Duration::from_secs(2)));
        let config = Config {
            debounce_ms: 500,
            archive_suppress_ms: 2000,
            cart_write_retries: 3,
            retry_base_ms: 10,
        };
        let service = SessionService::new(store.clone(), cache, config);
        service.reload().await.unwrap();
        (store, service)
    }

    #[tokio::test]
    async fn add_item_twice_yields_one_line_quantity_two() {
        let (_store, service) = service_with_menu().await;
        service.add_item("T1", "a").await.unwrap();
        let entry = service.add_item("T1", "a").await.unwrap();
        assert_eq!(entry.quantity, 2);
        let session = service.session("T1");
        assert_eq!(session.cart.len(), 1);
        assert_eq!(session.cart_item_count(), 2);
    }

    #[tokio::test]
    async fn set_quantity_zero_removes_the_line() {
        let (store, service) = service_with_menu().await;
        service.add_item("T1", "a").await.unwrap();
        service.set_quantity("T1", "a", 0).await.unwrap();
        assert!(service.session("T1").cart.is_empty());
        assert!(store.list_cart_lines_for_table("T1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_item_unknown_menu_item_fails_clean() {
        let (_store, service) = service_with_menu().await;
        let err = service.add_item("T1", "ghost").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(service.session("T1").cart.is_empty());
    }

    #[tokio::test]
    async fn submit_order_totals_and_empties_cart() {
        let (store, service) = service_with_menu().await;
        service.add_item("T1", "a").await.unwrap();
        service.add_item("T1", "a").await.unwrap();
        service.add_item("T1", "b").await.unwrap();

        let request = service.submit_order("T1").await.unwrap();
        assert_eq!(request.kind, RequestKind::NewOrder);
        assert_eq!(request.total, 13.5);
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.details.contains("2× A"));
        assert!(request.details.contains("1× B"));

        assert!(service.session("T1").cart.is_empty());
        assert!(store.list_cart_lines_for_table("T1").await.unwrap().is_empty());
        assert_eq!(store.list_requests_for_table("T1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn submit_empty_cart_is_rejected() {
        let (_store, service) = service_with_menu().await;
        service.ensure_table("T1").await.unwrap();
        let err = service.submit_order("T1").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartEmpty);
    }

    #[tokio::test]
    async fn locked_table_rejects_cart_and_order_commands() {
        let (_store, service) = service_with_menu().await;
        service.add_item("T1", "a").await.unwrap();
        service.request_bill("T1", PaymentMethod::Card).await.unwrap();

        assert_eq!(
            service.add_item("T1", "a").await.unwrap_err().code,
            ErrorCode::TableLocked
        );
        assert_eq!(
            service.submit_order("T1").await.unwrap_err().code,
            ErrorCode::TableLocked
        );
        assert_eq!(
            service.call_staff("T1").await.unwrap_err().code,
            ErrorCode::TableLocked
        );
        assert_eq!(
            service
                .request_bill("T1", PaymentMethod::Cash)
                .await
                .unwrap_err()
                .code,
            ErrorCode::TableLocked
        );
    }

    #[tokio::test]
    async fn confirm_advances_one_step_and_completed_is_terminal() {
        let (_store, service) = service_with_menu().await;
        let request = service.call_staff("T1").await.unwrap();

        let r = service.confirm_request("T1", &request.id).await.unwrap();
        assert_eq!(r.status, RequestStatus::Confirmed);
        let r = service.confirm_request("T1", &request.id).await.unwrap();
        assert_eq!(r.status, RequestStatus::Completed);
        let r = service.confirm_request("T1", &request.id).await.unwrap();
        assert_eq!(r.status, RequestStatus::Completed);
    }

    #[tokio::test]
    async fn confirm_is_allowed_while_locked() {
        let (_store, service) = service_with_menu().await;
        service.add_item("T1", "a").await.unwrap();
        let order = service.submit_order("T1").await.unwrap();
        service.request_bill("T1", PaymentMethod::Cash).await.unwrap();

        let r = service.confirm_request("T1", &order.id).await.unwrap();
        assert_eq!(r.status, RequestStatus::Confirmed);
    }

    #[tokio::test]
    async fn bill_totals_completed_orders_only() {
        let (_store, service) = service_with_menu().await;
        service.add_item("T1", "a").await.unwrap();
        service.add_item("T1", "a").await.unwrap();
        let completed = service.submit_order("T1").await.unwrap();
        service.confirm_request("T1", &completed.id).await.unwrap();
        service.confirm_request("T1", &completed.id).await.unwrap();

        service.add_item("T1", "b").await.unwrap();
        service.submit_order("T1").await.unwrap(); // stays pending

        let bill = service.request_bill("T1", PaymentMethod::Cash).await.unwrap();
        assert_eq!(bill.total, 10.0);
        assert_eq!(bill.payment_method, Some(PaymentMethod::Cash));
        assert!(service.session("T1").is_locked);
    }

    #[tokio::test]
    async fn unknown_request_confirmation_fails() {
        let (_store, service) = service_with_menu().await;
        service.ensure_table("T1").await.unwrap();
        let err = service.confirm_request("T1", "req_missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::RequestNotFound);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_then_succeed() {
        let (store, service) = service_with_menu().await;
        service.add_item("T1", "a").await.unwrap();

        // Two transient failures, third attempt succeeds
        store.fail_next_writes(
            crate::store::Collection::CartLines,
            ErrorCode::StoreUnavailable,
            2,
        );
        service.set_quantity("T1", "a", 5).await.unwrap();
        assert_eq!(
            service.session("T1").cart_entry("a").map(|e| e.quantity),
            Some(5)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_write_rolls_back_the_optimistic_value() {
        let (store, service) = service_with_menu().await;
        service.add_item("T1", "a").await.unwrap();

        // Permanent rejection, no retry
        store.fail_next_writes(
            crate::store::Collection::CartLines,
            ErrorCode::StoreRejected,
            1,
        );
        let err = service.set_quantity("T1", "a", 5).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreRejected);
        // Rolled back to the confirmed quantity
        assert_eq!(
            service.session("T1").cart_entry("a").map(|e| e.quantity),
            Some(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_the_error() {
        let (store, service) = service_with_menu().await;
        service.add_item("T1", "a").await.unwrap();

        store.fail_next_writes(
            crate::store::Collection::CartLines,
            ErrorCode::StoreUnavailable,
            5,
        );
        let err = service.set_quantity("T1", "a", 5).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::StoreUnavailable);
    }

    #[tokio::test]
    async fn vip_flag_round_trips_through_store() {
        let (store, service) = service_with_menu().await;
        service.mark_vip("T1", true).await.unwrap();
        assert!(service.session("T1").is_vip);
        assert!(store.get_table("T1").await.unwrap().unwrap().is_vip);
    }
}
