//! Default table seeding
//!
//! Fresh deployments start with a fixed set of numbered tables so the
//! staff view is populated before any customer connects. Existing
//! records are never touched.

use tracing::info;

use shared::models::{MenuItem, TableRecord};
use shared::util::{now_millis, snowflake_id};
use shared::AppResult;

use crate::store::SessionStore;

/// Starter menu for a fresh deployment
const DEFAULT_MENU: [(&str, &str, f64); 6] = [
    ("Starters", "Soup of the Day", 4.5),
    ("Starters", "Bruschetta", 5.0),
    ("Mains", "Margherita Pizza", 9.5),
    ("Mains", "Grilled Salmon", 14.0),
    ("Drinks", "Still Water", 2.0),
    ("Drinks", "House Red (glass)", 4.0),
];

/// Create `Table_01` .. `Table_NN` records for any that do not exist
/// yet. Returns how many were created.
pub async fn seed_default_tables(store: &dyn SessionStore, count: u32) -> AppResult<usize> {
    let now = now_millis();
    let mut created = 0;
    for n in 1..=count {
        let table_id = format!("Table_{:02}", n);
        if store.get_table(&table_id).await?.is_some() {
            continue;
        }
        store.put_table(TableRecord::new(&table_id, now)).await?;
        created += 1;
    }
    if created > 0 {
        info!(created, total = count, "seeded default tables");
    }
    Ok(created)
}

/// Populate the catalog with a starter menu, but only when it is empty.
/// Returns how many items were created.
pub async fn seed_default_menu(store: &dyn SessionStore) -> AppResult<usize> {
    if !store.list_menu_items().await?.is_empty() {
        return Ok(0);
    }
    for (category, name, price) in DEFAULT_MENU {
        store
            .put_menu_item(MenuItem {
                id: format!("item_{}", snowflake_id()),
                category: Some(category.to_string()),
                name: name.to_string(),
                price,
                description: None,
            })
            .await?;
    }
    info!(items = DEFAULT_MENU.len(), "seeded default menu");
    Ok(DEFAULT_MENU.len())
}
