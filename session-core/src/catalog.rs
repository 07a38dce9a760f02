//! Menu catalog management
//!
//! Catalog writes go straight to the store; consumers pick them up
//! through the same change-signal reload path as everything else, so
//! there is no optimistic overlay for menu data. Category grouping is
//! computed at read time and never stored.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{info, instrument};

use shared::models::{normalize_category, MenuItem, MenuItemCreate, MenuItemUpdate};
use shared::util::snowflake_id;
use shared::{AppError, AppResult};

use crate::money;
use crate::store::SessionStore;

pub struct CatalogService {
    store: Arc<dyn SessionStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> AppResult<Vec<MenuItem>> {
        let mut items = self.store.list_menu_items().await?;
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    /// Items grouped by category label, sorted by label then name. Items
    /// without a category land in the unassigned bucket.
    pub async fn list_by_category(&self) -> AppResult<BTreeMap<String, Vec<MenuItem>>> {
        let items = self.list().await?;
        let mut grouped: BTreeMap<String, Vec<MenuItem>> = BTreeMap::new();
        for item in items {
            grouped
                .entry(item.category_label().to_string())
                .or_default()
                .push(item);
        }
        Ok(grouped)
    }

    #[instrument(skip(self, create), fields(name = %create.name))]
    pub async fn add_item(&self, create: MenuItemCreate) -> AppResult<MenuItem> {
        let name = create.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("menu item name must not be blank"));
        }
        money::validate_price(create.price)?;

        let item = MenuItem {
            id: format!("item_{}", snowflake_id()),
            category: normalize_category(create.category),
            name,
            price: money::round_money(create.price),
            description: create.description,
        };
        self.store.put_menu_item(item.clone()).await?;
        info!(item_id = %item.id, "menu item added");
        Ok(item)
    }

    /// Partial update; absent fields keep their current value
    #[instrument(skip(self, update))]
    pub async fn update_item(&self, item_id: &str, update: MenuItemUpdate) -> AppResult<MenuItem> {
        let mut item = self
            .store
            .get_menu_item(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("menu item {}", item_id)))?;

        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(AppError::validation("menu item name must not be blank"));
            }
            item.name = name;
        }
        if let Some(price) = update.price {
            money::validate_price(price)?;
            item.price = money::round_money(price);
        }
        if update.category.is_some() {
            item.category = normalize_category(update.category);
        }
        if update.description.is_some() {
            item.description = update.description;
        }

        self.store.put_menu_item(item.clone()).await?;
        Ok(item)
    }

    /// Remove an item from the catalog. Cart lines referencing it are
    /// left alone; reloads render them with a placeholder until cleared.
    #[instrument(skip(self))]
    pub async fn delete_item(&self, item_id: &str) -> AppResult<()> {
        self.store
            .get_menu_item(item_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("menu item {}", item_id)))?;
        self.store.delete_menu_item(item_id).await?;
        info!(item_id, "menu item deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use shared::ErrorCode;

    fn catalog() -> (Arc<MemoryStore>, CatalogService) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), CatalogService::new(store))
    }

    fn create(name: &str, price: f64, category: Option<&str>) -> MenuItemCreate {
        MenuItemCreate {
            category: category.map(Into::into),
            name: name.into(),
            price,
            description: None,
        }
    }

    #[tokio::test]
    async fn add_validates_name_and_price() {
        let (_store, catalog) = catalog();
        assert_eq!(
            catalog.add_item(create("  ", 5.0, None)).await.unwrap_err().code,
            ErrorCode::ValidationFailed
        );
        assert_eq!(
            catalog.add_item(create("Soup", 0.0, None)).await.unwrap_err().code,
            ErrorCode::ValidationFailed
        );
        assert_eq!(
            catalog.add_item(create("Soup", -2.0, None)).await.unwrap_err().code,
            ErrorCode::ValidationFailed
        );

        let item = catalog.add_item(create(" Soup ", 3.505, None)).await.unwrap();
        assert_eq!(item.name, "Soup");
        assert_eq!(item.price, 3.51);
    }

    #[tokio::test]
    async fn blank_category_lands_in_unassigned_bucket() {
        let (_store, catalog) = catalog();
        catalog.add_item(create("Soup", 3.5, Some("  "))).await.unwrap();
        catalog.add_item(create("Steak", 18.0, Some("Mains"))).await.unwrap();

        let grouped = catalog.list_by_category().await.unwrap();
        assert_eq!(grouped["Unassigned"].len(), 1);
        assert_eq!(grouped["Mains"].len(), 1);
    }

    #[tokio::test]
    async fn update_is_partial() {
        let (_store, catalog) = catalog();
        let item = catalog
            .add_item(create("Soup", 3.5, Some("Starters")))
            .await
            .unwrap();

        let updated = catalog
            .update_item(
                &item.id,
                MenuItemUpdate {
                    price: Some(4.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Soup");
        assert_eq!(updated.price, 4.0);
        assert_eq!(updated.category.as_deref(), Some("Starters"));
    }

    #[tokio::test]
    async fn delete_missing_item_fails() {
        let (_store, catalog) = catalog();
        assert_eq!(
            catalog.delete_item("ghost").await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
