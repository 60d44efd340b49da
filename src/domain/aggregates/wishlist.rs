//! Wishlist Aggregate

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::aggregates::product::Product;

/// Products saved for later, at most one entry per product id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    items: Vec<Product>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WishlistNotice {
    Added,
    Removed,
    Cleared,
}

impl fmt::Display for WishlistNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "Item added to wishlist",
            Self::Removed => "Item removed from wishlist",
            Self::Cleared => "Wishlist cleared",
        })
    }
}

impl Wishlist {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[Product] { &self.items }
    pub fn len(&self) -> usize { self.items.len() }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Inserts when absent. Re-adding an existing product is a silent no-op.
    pub fn add_item(&mut self, product: Product) -> Option<WishlistNotice> {
        if self.contains(product.id.as_str()) { return None; }
        self.items.push(product);
        Some(WishlistNotice::Added)
    }

    /// Always reports removal, even when the product was not listed.
    pub fn remove_item(&mut self, product_id: &str) -> WishlistNotice {
        self.items.retain(|p| p.id.as_str() != product_id);
        WishlistNotice::Removed
    }

    pub fn contains(&self, product_id: &str) -> bool {
        self.items.iter().any(|p| p.id.as_str() == product_id)
    }

    pub fn clear(&mut self) -> WishlistNotice {
        self.items.clear();
        WishlistNotice::Cleared
    }

    /// Drops duplicate ids that may come from hand-edited or stale storage.
    pub(crate) fn dedup(mut self) -> Self {
        let mut seen = std::collections::HashSet::new();
        self.items.retain(|p| seen.insert(p.id.clone()));
        self
    }
}
