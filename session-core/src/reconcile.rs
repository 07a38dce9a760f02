//! Reload reconciliation
//!
//! Change signals carry no payload, so convergence is always a full
//! reload: read every collection, compose per-table sessions, install
//! the snapshot. Signals arriving in a burst (one archival touches four
//! collections) are coalesced behind a debounce window measured from the
//! first signal of the burst.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use shared::models::TableSession;
use shared::AppResult;

use crate::cache::SessionCache;
use crate::config::Config;
use crate::store::{Collection, SessionStore};

/// Collections whose change signals trigger a session reload
const WATCHED: [Collection; 4] = [
    Collection::MenuItems,
    Collection::Tables,
    Collection::CartLines,
    Collection::Requests,
];

/// Background task that keeps the cache converged with the store
pub struct Reconciler {
    store: Arc<dyn SessionStore>,
    cache: Arc<SessionCache>,
    debounce: Duration,
    shutdown: CancellationToken,
}

impl Reconciler {
    pub fn new(store: Arc<dyn SessionStore>, cache: Arc<SessionCache>, config: &Config) -> Self {
        Self {
            store,
            cache,
            debounce: config.debounce(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that stops the reload loop when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut receivers: Vec<_> = WATCHED
            .into_iter()
            .map(|c| self.store.subscribe(c))
            .collect();

        // Initial snapshot before any signal arrives
        if let Err(err) = reload(self.store.as_ref(), &self.cache).await {
            warn!(error = %err, "initial reload failed");
        }

        let mut dirty = false;
        let mut deadline = Instant::now();
        info!(debounce_ms = self.debounce.as_millis() as u64, "reconciler started");

        loop {
            // Poll all four channels plus the debounce timer in one select.
            // The deadline is armed by the first signal of a burst and not
            // extended by followers, so a steady stream of signals cannot
            // starve the reload.
            let recv_any = async {
                let polls = receivers.iter_mut().map(|rx| Box::pin(rx.recv()));
                futures::future::select_all(polls).await.0
            };

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("reconciler stopping");
                    break;
                }
                result = recv_any => match result {
                    Ok(signal) => {
                        debug!(collection = %signal.collection, "change signal");
                        if !dirty {
                            dirty = true;
                            deadline = Instant::now() + self.debounce;
                        }
                    }
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "change channel lagged, forcing reload");
                        if !dirty {
                            dirty = true;
                            deadline = Instant::now() + self.debounce;
                        }
                    }
                    Err(RecvError::Closed) => {
                        info!("change channels closed, reconciler stopping");
                        break;
                    }
                },
                _ = tokio::time::sleep_until(deadline), if dirty => {
                    dirty = false;
                    if let Err(err) = reload(self.store.as_ref(), &self.cache).await {
                        // Try again after another window rather than
                        // dropping the pending changes
                        warn!(error = %err, "reload failed, rescheduling");
                        dirty = true;
                        deadline = Instant::now() + self.debounce;
                    }
                }
            }
        }
    }
}

/// Read every collection and install a composed snapshot into the cache.
///
/// Cart lines referencing unknown menu items are kept with a placeholder
/// name and zero price instead of being dropped. Requests predating a
/// table's session epoch are filtered out.
pub async fn reload(store: &dyn SessionStore, cache: &SessionCache) -> AppResult<()> {
    let menu = store.list_menu_items().await?;
    let tables = store.list_tables().await?;
    let cart_lines = store.list_cart_lines().await?;
    let requests = store.list_requests().await?;

    let menu_by_id: HashMap<&str, _> = menu.iter().map(|m| (m.id.as_str(), m)).collect();

    let mut snapshot: HashMap<String, TableSession> = HashMap::with_capacity(tables.len());
    for record in &tables {
        let mut session = TableSession::empty(&record.table_id, record.session_start);
        session.is_locked = record.is_locked;
        session.is_vip = record.is_vip;
        snapshot.insert(record.table_id.clone(), session);
    }

    for line in cart_lines {
        let Some(session) = snapshot.get_mut(&line.table_id) else {
            continue;
        };
        let entry = match menu_by_id.get(line.menu_item_id.as_str()) {
            Some(item) => shared::models::CartEntry {
                item_id: line.menu_item_id,
                name: item.name.clone(),
                price: item.price,
                quantity: line.quantity,
            },
            None => shared::models::CartEntry {
                name: line.menu_item_id.clone(),
                item_id: line.menu_item_id,
                price: 0.0,
                quantity: line.quantity,
            },
        };
        session.cart.push(entry);
    }

    for request in requests {
        let Some(session) = snapshot.get_mut(&request.table_id) else {
            continue;
        };
        // Session-epoch filter: older requests belong to an archived visit
        if request.created_at >= session.session_start {
            session.requests.push(request);
        }
    }
    for session in snapshot.values_mut() {
        session.requests.sort_by_key(|r| r.created_at);
        session.cart.sort_by(|a, b| a.item_id.cmp(&b.item_id));
    }

    debug!(tables = snapshot.len(), menu_items = menu.len(), "snapshot composed");
    cache.replace_all(menu, snapshot);
    Ok(())
}
