//! Menu Item Model

use serde::{Deserialize, Serialize};

/// Bucket label for items without a category, computed at read time.
/// Never stored as a sentinel value.
pub const UNASSIGNED_CATEGORY: &str = "Unassigned";

/// Menu item entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    /// Free-text category label; blank input is normalized to `None`
    pub category: Option<String>,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

impl MenuItem {
    /// Category label for grouping, with the unassigned bucket applied
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNASSIGNED_CATEGORY)
    }
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItemCreate {
    pub category: Option<String>,
    pub name: String,
    pub price: f64,
    pub description: Option<String>,
}

/// Update menu item payload (partial)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub category: Option<String>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
}

/// Normalize a free-text category label: trimmed, blank becomes `None`
pub fn normalize_category(category: Option<String>) -> Option<String> {
    category.and_then(|c| {
        let trimmed = c.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_category_normalizes_to_none() {
        assert_eq!(normalize_category(Some("  ".into())), None);
        assert_eq!(normalize_category(Some("".into())), None);
        assert_eq!(normalize_category(None), None);
        assert_eq!(normalize_category(Some(" Mains ".into())), Some("Mains".into()));
    }

    #[test]
    fn unassigned_bucket_applies_at_read() {
        let item = MenuItem {
            id: "m1".into(),
            category: None,
            name: "Soup".into(),
            price: 3.5,
            description: None,
        };
        assert_eq!(item.category_label(), UNASSIGNED_CATEGORY);
    }
}
