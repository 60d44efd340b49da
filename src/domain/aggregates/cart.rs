//! Cart Aggregate
//!
//! Pure state transitions. Every mutation reports the notice the UI should
//! show, or `None` when nothing changed.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::{Money, Quantity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub product: Product,
    pub quantity: Quantity,
}

impl CartItem {
    /// Base price times quantity; a missing price counts as zero.
    pub fn line_total(&self) -> Money {
        self.product.price.unwrap_or(Money::ZERO).multiply(self.quantity.value())
    }
}

/// Ordered list of distinct products with positive quantities.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CartNotice {
    Added,
    QuantityIncreased,
    QuantityDecreased,
    Removed,
    Cleared,
}

impl fmt::Display for CartNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "Item added to cart",
            Self::QuantityIncreased => "Item quantity increased",
            Self::QuantityDecreased => "Item quantity decreased",
            Self::Removed => "Item removed from cart",
            Self::Cleared => "Cart cleared",
        })
    }
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    pub fn items(&self) -> &[CartItem] { &self.items }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn len(&self) -> usize { self.items.len() }

    /// Adds `delta` units of `product`. A delta that takes the quantity to
    /// zero or below drops the entry; a non-positive delta for an absent
    /// product changes nothing.
    pub fn add_item(&mut self, product: Product, delta: i64) -> Option<CartNotice> {
        if let Some(pos) = self.position(product.id.as_str()) {
            return match self.items[pos].quantity.offset(delta) {
                None => { self.items.remove(pos); Some(CartNotice::Removed) }
                Some(q) if delta > 0 => { self.items[pos].quantity = q; Some(CartNotice::QuantityIncreased) }
                Some(q) if delta < 0 => { self.items[pos].quantity = q; Some(CartNotice::QuantityDecreased) }
                Some(_) => None,
            };
        }
        let quantity = u32::try_from(delta).ok().and_then(Quantity::new)?;
        self.items.push(CartItem { product, quantity });
        Some(CartNotice::Added)
    }

    /// Decrements by one, dropping the entry when it reaches zero.
    pub fn remove_item(&mut self, product_id: &str) -> Option<CartNotice> {
        let pos = self.position(product_id)?;
        match self.items[pos].quantity.offset(-1) {
            Some(q) => { self.items[pos].quantity = q; Some(CartNotice::QuantityDecreased) }
            None => { self.items.remove(pos); Some(CartNotice::Removed) }
        }
    }

    pub fn remove_item_completely(&mut self, product_id: &str) -> Option<CartNotice> {
        let pos = self.position(product_id)?;
        self.items.remove(pos);
        Some(CartNotice::Removed)
    }

    pub fn clear(&mut self) -> CartNotice {
        self.items.clear();
        CartNotice::Cleared
    }

    /// Sum of base price times quantity; not discount-aware.
    pub fn total_price(&self) -> Money { self.items.iter().map(CartItem::line_total).sum() }

    pub fn item_count(&self, product_id: &str) -> u32 {
        self.position(product_id).map_or(0, |pos| self.items[pos].quantity.value())
    }

    fn position(&self, product_id: &str) -> Option<usize> {
        self.items.iter().position(|i| i.product.id.as_str() == product_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use crate::domain::value_objects::ProductId;

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id), name: format!("Product {id}"), slug: id.to_string(),
            price: Some(Money::from_minor_units(cents)), discount: None, stock: 10,
            images: vec![], categories: vec![], description: None, video_url: None,
        }
    }

    #[test]
    fn test_cart_operations() {
        let mut cart = Cart::new();
        assert_eq!(cart.add_item(product("P1", 1000), 2), Some(CartNotice::Added));
        assert_eq!(cart.add_item(product("P1", 1000), 1), Some(CartNotice::QuantityIncreased));
        assert_eq!(cart.item_count("P1"), 3); // Merged
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_price().amount(), Decimal::new(30, 0));
    }

    #[test]
    fn test_negative_delta_removes_entry() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 500), 2);
        assert_eq!(cart.add_item(product("P1", 500), -1), Some(CartNotice::QuantityDecreased));
        assert_eq!(cart.add_item(product("P1", 500), -5), Some(CartNotice::Removed));
        assert!(cart.is_empty());
        assert_eq!(cart.item_count("P1"), 0);
    }

    #[test]
    fn test_non_positive_add_of_absent_product_is_noop() {
        let mut cart = Cart::new();
        assert_eq!(cart.add_item(product("P1", 500), 0), None);
        assert_eq!(cart.add_item(product("P1", 500), -2), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_item_decrements_then_drops() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 500), 2);
        assert_eq!(cart.remove_item("P1"), Some(CartNotice::QuantityDecreased));
        assert_eq!(cart.item_count("P1"), 1);
        assert_eq!(cart.remove_item("P1"), Some(CartNotice::Removed));
        assert!(cart.items().is_empty());
        assert_eq!(cart.remove_item("P1"), None);
    }

    #[test]
    fn test_remove_completely_and_clear() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 500), 4);
        cart.add_item(product("P2", 250), 1);
        assert_eq!(cart.remove_item_completely("P1"), Some(CartNotice::Removed));
        assert_eq!(cart.item_count("P1"), 0);
        assert_eq!(cart.clear(), CartNotice::Cleared);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_total_tracks_present_items_over_mixed_sequence() {
        let mut cart = Cart::new();
        let ops: [(&str, i64, i64); 8] = [
            ("A", 1999, 3), ("B", 500, 1), ("A", 1999, -1), ("C", 125, 4),
            ("B", 500, -1), ("C", 125, 2), ("A", 1999, -7), ("D", 10, 0),
        ];
        for (id, cents, delta) in ops {
            cart.add_item(product(id, cents), delta);
            assert!(cart.items().iter().all(|i| i.quantity.value() >= 1));
            let expected: Decimal = cart.items().iter()
                .map(|i| i.product.price.unwrap().amount() * Decimal::from(i.quantity.value()))
                .sum();
            assert_eq!(cart.total_price().amount(), expected);
        }
        assert_eq!(cart.item_count("A"), 0);
        assert_eq!(cart.item_count("B"), 0);
        assert_eq!(cart.item_count("C"), 6);
        assert_eq!(cart.total_price().amount(), Decimal::new(750, 2));
    }

    #[test]
    fn test_missing_price_counts_as_zero() {
        let mut cart = Cart::new();
        cart.add_item(Product { price: None, ..product("P1", 0) }, 3);
        cart.add_item(product("P2", 200), 1);
        assert_eq!(cart.total_price().amount(), Decimal::new(2, 0));
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let mut cart = Cart::new();
        cart.add_item(product("P1", 100), 2);
        let json = serde_json::to_value(&cart).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["quantity"], 2);
        assert_eq!(serde_json::from_value::<Cart>(json).unwrap(), cart);
    }
}
