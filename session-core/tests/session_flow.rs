//! End-to-end flows over a shared in-memory store, exercising the full
//! command -> store -> signal -> reload loop across multiple clients.

use std::sync::Arc;
use std::time::Duration;

use session_core::{
    reload, CatalogService, Config, MemoryStore, Reconciler, SessionCache, SessionService,
    SessionStore,
};
use shared::models::{MenuItemCreate, PaymentMethod, RequestKind, RequestStatus};
use shared::ErrorCode;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn test_config() -> Config {
    Config {
        debounce_ms: 500,
        archive_suppress_ms: 2000,
        cart_write_retries: 3,
        retry_base_ms: 10,
    }
}

/// A client node: its own cache and service over the shared store
fn client(store: &Arc<MemoryStore>) -> SessionService {
    let cache = Arc::new(SessionCache::new(test_config().suppress_window()));
    SessionService::new(store.clone(), cache, test_config())
}

async fn stocked_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let catalog = CatalogService::new(store.clone());
    catalog
        .add_item(MenuItemCreate {
            category: Some("Mains".into()),
            name: "Burger".into(),
            price: 12.5,
            description: None,
        })
        .await
        .unwrap();
    catalog
        .add_item(MenuItemCreate {
            category: Some("Drinks".into()),
            name: "Cola".into(),
            price: 3.0,
            description: None,
        })
        .await
        .unwrap();
    store
}

async fn item_id(store: &Arc<MemoryStore>, name: &str) -> String {
    store
        .list_menu_items()
        .await
        .unwrap()
        .into_iter()
        .find(|m| m.name == name)
        .map(|m| m.id)
        .expect("item seeded")
}

#[tokio::test]
async fn full_table_lifecycle() {
    init_tracing();
    let store = stocked_store().await;
    let customer = client(&store);
    let staff = client(&store);
    customer.reload().await.unwrap();
    staff.reload().await.unwrap();

    let burger = item_id(&store, "Burger").await;
    let cola = item_id(&store, "Cola").await;

    // Customer builds a cart and submits
    customer.add_item("T1", &burger).await.unwrap();
    customer.add_item("T1", &burger).await.unwrap();
    customer.add_item("T1", &cola).await.unwrap();
    let order = customer.submit_order("T1").await.unwrap();
    assert_eq!(order.total, 28.0);
    assert!(customer.session("T1").cart.is_empty());

    // Staff converges and works the order to completion
    staff.reload().await.unwrap();
    assert_eq!(staff.session("T1").pending_count(), 1);
    staff.confirm_request("T1", &order.id).await.unwrap();
    let done = staff.confirm_request("T1", &order.id).await.unwrap();
    assert_eq!(done.status, RequestStatus::Completed);

    // Customer asks for the bill; the table locks on both nodes
    customer.reload().await.unwrap();
    let bill = customer.request_bill("T1", PaymentMethod::Card).await.unwrap();
    assert_eq!(bill.total, 28.0);
    assert_eq!(bill.kind, RequestKind::BillRequest);
    staff.reload().await.unwrap();
    assert!(staff.session("T1").is_locked);
    assert_eq!(
        customer.add_item("T1", &burger).await.unwrap_err().code,
        ErrorCode::TableLocked
    );

    // Settlement archives the session and reopens the table
    let archive = staff.mark_paid("T1").await.unwrap();
    assert_eq!(archive.request_count, 2);
    assert_eq!(archive.revenue, 28.0);

    customer.reload().await.unwrap();
    let session = customer.session("T1");
    assert!(session.cart.is_empty());
    assert!(session.requests.is_empty());
    assert!(!session.is_locked);

    // A fresh round works immediately
    customer.add_item("T1", &cola).await.unwrap();
    assert_eq!(customer.session("T1").cart_total(), 3.0);
}

#[tokio::test]
async fn concurrent_adds_from_two_clients_accumulate() {
    init_tracing();
    let store = stocked_store().await;
    let a = client(&store);
    let b = client(&store);
    a.reload().await.unwrap();
    b.reload().await.unwrap();
    let burger = item_id(&store, "Burger").await;

    // Neither client has seen the other's write when it issues its own
    let (ra, rb) = tokio::join!(a.add_item("T1", &burger), b.add_item("T1", &burger));
    ra.unwrap();
    rb.unwrap();

    a.reload().await.unwrap();
    b.reload().await.unwrap();
    assert_eq!(
        a.session("T1").cart_entry(&burger).map(|e| e.quantity),
        Some(2)
    );
    assert_eq!(a.session("T1").cart.len(), 1);
    assert_eq!(b.session("T1"), a.session("T1"));
}

#[tokio::test(start_paused = true)]
async fn reconciler_carries_remote_writes_across_nodes() {
    init_tracing();
    let store = stocked_store().await;
    let writer = client(&store);
    writer.reload().await.unwrap();

    // Observer node converges only through the reconciler
    let observer_cache = Arc::new(SessionCache::new(test_config().suppress_window()));
    let reconciler = Reconciler::new(store.clone(), observer_cache.clone(), &test_config());
    let shutdown = reconciler.shutdown_token();
    let handle = reconciler.spawn();
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let burger = item_id(&store, "Burger").await;
    writer.add_item("T1", &burger).await.unwrap();
    writer.add_item("T1", &burger).await.unwrap();

    // Before the debounce window elapses the observer still sees nothing
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(observer_cache.session("T1").cart.is_empty());

    tokio::time::advance(Duration::from_millis(600)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert_eq!(
        observer_cache.session("T1").cart_entry(&burger).map(|e| e.quantity),
        Some(2)
    );

    shutdown.cancel();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn archival_is_not_resurrected_by_a_racing_reload() {
    init_tracing();
    let store = stocked_store().await;
    let staff = client(&store);
    staff.reload().await.unwrap();
    let burger = item_id(&store, "Burger").await;

    staff.add_item("T1", &burger).await.unwrap();
    staff.submit_order("T1").await.unwrap();
    staff.mark_paid("T1").await.unwrap();

    // Reload immediately after archival: the suppression marker keeps
    // the table empty even if the snapshot were stale
    reload(store.as_ref(), staff.cache()).await.unwrap();
    let session = staff.session("T1");
    assert!(session.requests.is_empty());
    assert!(session.cart.is_empty());

    // After the window the table reads normally from the store, which
    // the archival has already wiped
    tokio::time::advance(Duration::from_millis(2100)).await;
    reload(store.as_ref(), staff.cache()).await.unwrap();
    assert!(staff.session("T1").requests.is_empty());
}

#[tokio::test]
async fn archived_session_requests_stay_hidden_from_the_next_session() {
    init_tracing();
    let store = stocked_store().await;
    let staff = client(&store);
    staff.reload().await.unwrap();
    let burger = item_id(&store, "Burger").await;

    staff.add_item("T1", &burger).await.unwrap();
    let old_order = staff.submit_order("T1").await.unwrap();
    staff.mark_paid("T1").await.unwrap();

    // Simulate a delete that never landed: the old request reappears in
    // the store after the epoch rotated
    session_core::SessionStore::put_request(store.as_ref(), old_order.clone())
        .await
        .unwrap();

    let fresh = client(&store);
    fresh.reload().await.unwrap();
    // Epoch filter hides it from the new session
    assert!(fresh.session("T1").requests.is_empty());
}

#[tokio::test]
async fn reset_all_reopens_every_table() {
    init_tracing();
    let store = stocked_store().await;
    session_core::seed_default_tables(store.as_ref(), 3).await.unwrap();
    let staff = client(&store);
    staff.reload().await.unwrap();
    let cola = item_id(&store, "Cola").await;

    staff.add_item("Table_01", &cola).await.unwrap();
    staff.request_bill("Table_02", PaymentMethod::Cash).await.unwrap();

    let count = staff.reset_all().await.unwrap();
    assert_eq!(count, 3);
    staff.reload().await.unwrap();
    for session in staff.sessions() {
        assert!(session.cart.is_empty());
        assert!(session.requests.is_empty());
        assert!(!session.is_locked);
    }
}
