//! Local session cache: confirmed snapshots plus an optimistic overlay
//!
//! Every table holds two layers. The confirmed snapshot is what the last
//! full reload (or a folded write acknowledgement) said the store
//! contains. The overlay holds optimistic values staged by commands whose
//! writes have not been acknowledged yet. Readers always see the overlay
//! applied on top of the snapshot, so a command's effect is visible
//! immediately.
//!
//! Overlay entries leave in exactly three ways: the write succeeds and
//! the entry is folded into the snapshot, the write fails and the entry
//! is unstaged, or a reload produces a confirmed value equal to the
//! staged one and the entry is pruned. Pruning compares values rather
//! than versions since the store carries no row versions.
//!
//! Archival leaves a short-lived marker per table. While the marker is
//! live, reloads suppress that table's cart and requests so a snapshot
//! read before the deletes landed cannot resurrect archived state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::debug;

use shared::models::{CartEntry, MenuItem, TableRecord, TableRequest, TableSession};

/// Optimistic, not-yet-acknowledged state for one table
#[derive(Debug, Default)]
struct Overlay {
    /// item_id -> staged entry; `None` stages a deletion
    cart: HashMap<String, Option<CartEntry>>,
    /// request_id -> staged request (new or status-advanced)
    requests: HashMap<String, TableRequest>,
    locked: Option<bool>,
    vip: Option<bool>,
    /// Staged wipe of the request log (archival)
    requests_cleared: bool,
}

impl Overlay {
    fn is_empty(&self) -> bool {
        self.cart.is_empty()
            && self.requests.is_empty()
            && self.locked.is_none()
            && self.vip.is_none()
            && !self.requests_cleared
    }

    /// Drop entries the confirmed snapshot now agrees with
    fn prune_against(&mut self, confirmed: &TableSession) {
        self.cart.retain(|item_id, staged| {
            let confirmed_entry = confirmed.cart_entry(item_id);
            match staged.as_ref() {
                Some(entry) => confirmed_entry != Some(entry),
                None => confirmed_entry.is_some(),
            }
        });
        self.requests
            .retain(|id, staged| confirmed.request(id) != Some(&*staged));
        if self.locked == Some(confirmed.is_locked) {
            self.locked = None;
        }
        if self.vip == Some(confirmed.is_vip) {
            self.vip = None;
        }
        if self.requests_cleared && confirmed.requests.is_empty() {
            self.requests_cleared = false;
        }
    }
}

#[derive(Debug)]
struct TableState {
    confirmed: TableSession,
    overlay: Overlay,
}

/// Shared read model for all consumers on this node
pub struct SessionCache {
    menu: RwLock<Vec<MenuItem>>,
    tables: RwLock<HashMap<String, TableState>>,
    /// table_id -> archival instant; entries expire after `suppress_window`
    recently_archived: DashMap<String, Instant>,
    suppress_window: Duration,
    /// Bumped once per completed reload
    generation: AtomicU64,
}

impl SessionCache {
    pub fn new(suppress_window: Duration) -> Self {
        Self {
            menu: RwLock::new(Vec::new()),
            tables: RwLock::new(HashMap::new()),
            recently_archived: DashMap::new(),
            suppress_window,
            generation: AtomicU64::new(0),
        }
    }

    // ==================== reads ====================

    /// The composed view of one table: confirmed snapshot with the
    /// overlay applied on top. Unknown tables read as an empty session.
    pub fn session(&self, table_id: &str) -> TableSession {
        let tables = self.tables.read();
        match tables.get(table_id) {
            Some(state) => compose(table_id, state),
            None => TableSession::empty(table_id, 0),
        }
    }

    /// Composed views for every known table, sorted by table id
    pub fn sessions(&self) -> Vec<TableSession> {
        let tables = self.tables.read();
        let mut out: Vec<_> = tables
            .iter()
            .map(|(id, state)| compose(id, state))
            .collect();
        out.sort_by(|a, b| a.table_id.cmp(&b.table_id));
        out
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        self.menu.read().clone()
    }

    pub fn menu_item(&self, item_id: &str) -> Option<MenuItem> {
        self.menu.read().iter().find(|m| m.id == item_id).cloned()
    }

    /// Reload counter; changes exactly once per applied snapshot
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    // ==================== optimistic staging ====================

    /// Stage a cart entry (`None` stages its deletion)
    pub fn stage_cart(&self, table_id: &str, item_id: &str, staged: Option<CartEntry>) {
        let mut tables = self.tables.write();
        let state = entry_for(&mut tables, table_id);
        state.overlay.cart.insert(item_id.to_string(), staged);
    }

    pub fn unstage_cart(&self, table_id: &str, item_id: &str) {
        let mut tables = self.tables.write();
        if let Some(state) = tables.get_mut(table_id) {
            state.overlay.cart.remove(item_id);
        }
    }

    /// Stage deletion of every currently visible cart entry. Returns the
    /// staged item ids so a failed write can unstage exactly those.
    pub fn stage_cart_cleared(&self, table_id: &str) -> Vec<String> {
        let mut tables = self.tables.write();
        let state = entry_for(&mut tables, table_id);
        let visible = compose(table_id, state);
        let keys: Vec<String> = visible.cart.iter().map(|e| e.item_id.clone()).collect();
        for key in &keys {
            state.overlay.cart.insert(key.clone(), None);
        }
        keys
    }

    pub fn stage_request(&self, table_id: &str, request: TableRequest) {
        let mut tables = self.tables.write();
        let state = entry_for(&mut tables, table_id);
        state.overlay.requests.insert(request.id.clone(), request);
    }

    pub fn unstage_request(&self, table_id: &str, request_id: &str) {
        let mut tables = self.tables.write();
        if let Some(state) = tables.get_mut(table_id) {
            state.overlay.requests.remove(request_id);
        }
    }

    pub fn stage_lock(&self, table_id: &str, locked: bool) {
        let mut tables = self.tables.write();
        entry_for(&mut tables, table_id).overlay.locked = Some(locked);
    }

    pub fn unstage_lock(&self, table_id: &str) {
        let mut tables = self.tables.write();
        if let Some(state) = tables.get_mut(table_id) {
            state.overlay.locked = None;
        }
    }

    pub fn stage_vip(&self, table_id: &str, vip: bool) {
        let mut tables = self.tables.write();
        entry_for(&mut tables, table_id).overlay.vip = Some(vip);
    }

    pub fn unstage_vip(&self, table_id: &str) {
        let mut tables = self.tables.write();
        if let Some(state) = tables.get_mut(table_id) {
            state.overlay.vip = None;
        }
    }

    pub fn stage_requests_cleared(&self, table_id: &str) {
        let mut tables = self.tables.write();
        entry_for(&mut tables, table_id).overlay.requests_cleared = true;
    }

    /// Discard every staged value for a table
    pub fn clear_table_stages(&self, table_id: &str) {
        let mut tables = self.tables.write();
        if let Some(state) = tables.get_mut(table_id) {
            state.overlay = Overlay::default();
        }
    }

    // ==================== folding acknowledged writes ====================

    /// The store acknowledged a cart write; `confirmed` is the resulting
    /// row (`None` when the row was removed).
    pub fn fold_cart(&self, table_id: &str, item_id: &str, confirmed: Option<CartEntry>) {
        let mut tables = self.tables.write();
        let state = entry_for(&mut tables, table_id);
        match confirmed {
            Some(entry) => upsert_cart(&mut state.confirmed.cart, entry),
            None => state.confirmed.cart.retain(|e| e.item_id != item_id),
        }
        state.overlay.cart.remove(item_id);
    }

    pub fn fold_request(&self, table_id: &str, request: TableRequest) {
        let mut tables = self.tables.write();
        let state = entry_for(&mut tables, table_id);
        upsert_request(&mut state.confirmed.requests, request.clone());
        state.overlay.requests.remove(&request.id);
    }

    pub fn fold_lock(&self, table_id: &str, locked: bool) {
        let mut tables = self.tables.write();
        let state = entry_for(&mut tables, table_id);
        state.confirmed.is_locked = locked;
        state.overlay.locked = None;
    }

    pub fn fold_vip(&self, table_id: &str, vip: bool) {
        let mut tables = self.tables.write();
        let state = entry_for(&mut tables, table_id);
        state.confirmed.is_vip = vip;
        state.overlay.vip = None;
    }

    /// The store acknowledged a full cart wipe
    pub fn fold_cart_cleared(&self, table_id: &str) {
        let mut tables = self.tables.write();
        let state = entry_for(&mut tables, table_id);
        state.confirmed.cart.clear();
        state.overlay.cart.retain(|_, staged| staged.is_some());
    }

    /// Archival finished; the table restarts from the given record
    pub fn fold_table_reset(&self, record: &TableRecord) {
        let mut tables = self.tables.write();
        let state = entry_for(&mut tables, &record.table_id);
        let mut session = TableSession::empty(&record.table_id, record.session_start);
        session.is_locked = record.is_locked;
        session.is_vip = record.is_vip;
        state.confirmed = session;
        state.overlay = Overlay::default();
    }

    // ==================== reload ====================

    /// Install a full snapshot from the store. Overlays are pruned where
    /// the snapshot caught up with them and preserved otherwise. Tables
    /// with a live archival marker get their cart, requests, and lock
    /// suppressed regardless of what the snapshot says.
    pub fn replace_all(&self, menu: Vec<MenuItem>, snapshot: HashMap<String, TableSession>) {
        *self.menu.write() = menu;

        let mut tables = self.tables.write();
        let snapshot_ids: std::collections::HashSet<String> = snapshot.keys().cloned().collect();
        for (table_id, mut confirmed) in snapshot {
            if self.is_recently_archived(&table_id) {
                debug!(table_id = %table_id, "suppressing reload for recently archived table");
                confirmed.cart.clear();
                confirmed.requests.clear();
                confirmed.is_locked = false;
            }
            let state = entry_for(&mut tables, &table_id);
            state.confirmed = confirmed;
            state.overlay.prune_against(&state.confirmed);
        }
        // Tables the snapshot no longer mentions survive only while they
        // carry unacknowledged staged work
        tables.retain(|table_id, state| {
            snapshot_ids.contains(table_id) || !state.overlay.is_empty()
        });
        drop(tables);

        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    // ==================== archival markers ====================

    pub fn mark_recently_archived(&self, table_id: &str) {
        self.recently_archived
            .insert(table_id.to_string(), Instant::now());
    }

    pub fn unmark_recently_archived(&self, table_id: &str) {
        self.recently_archived.remove(table_id);
    }

    pub fn is_recently_archived(&self, table_id: &str) -> bool {
        if let Some(marked) = self.recently_archived.get(table_id) {
            if marked.elapsed() < self.suppress_window {
                return true;
            }
        }
        // Expired markers are removed lazily on read
        self.recently_archived
            .remove_if(table_id, |_, marked| marked.elapsed() >= self.suppress_window);
        false
    }
}

fn entry_for<'a>(
    tables: &'a mut HashMap<String, TableState>,
    table_id: &str,
) -> &'a mut TableState {
    tables.entry(table_id.to_string()).or_insert_with(|| TableState {
        confirmed: TableSession::empty(table_id, 0),
        overlay: Overlay::default(),
    })
}

fn compose(table_id: &str, state: &TableState) -> TableSession {
    let mut session = state.confirmed.clone();
    session.table_id = table_id.to_string();

    if state.overlay.requests_cleared {
        session.requests.clear();
    }
    for request in state.overlay.requests.values() {
        upsert_request(&mut session.requests, request.clone());
    }
    session.requests.sort_by_key(|r| r.created_at);

    for (item_id, staged) in &state.overlay.cart {
        match staged {
            Some(entry) => upsert_cart(&mut session.cart, entry.clone()),
            None => session.cart.retain(|e| &e.item_id != item_id),
        }
    }

    if let Some(locked) = state.overlay.locked {
        session.is_locked = locked;
    }
    if let Some(vip) = state.overlay.vip {
        session.is_vip = vip;
    }
    session
}

fn upsert_cart(cart: &mut Vec<CartEntry>, entry: CartEntry) {
    match cart.iter_mut().find(|e| e.item_id == entry.item_id) {
        Some(existing) => *existing = entry,
        None => cart.push(entry),
    }
}

fn upsert_request(requests: &mut Vec<TableRequest>, request: TableRequest) {
    match requests.iter_mut().find(|r| r.id == request.id) {
        Some(existing) => *existing = request,
        None => requests.push(request),
    }
}
