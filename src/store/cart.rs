//! Cart Store

use std::sync::Arc;
use tracing::debug;
use crate::domain::aggregates::{Cart, CartItem, CartNotice, Product};
use crate::domain::value_objects::Money;
use super::{hydrate, persist, ClientStorage, CART_KEY};

pub struct CartStore {
    cart: Cart,
    storage: Arc<dyn ClientStorage>,
}

impl CartStore {
    /// Hydrates from storage when a record exists.
    pub fn open(storage: Arc<dyn ClientStorage>) -> Self {
        let cart = hydrate(storage.as_ref(), CART_KEY);
        Self { cart, storage }
    }

    pub fn state(&self) -> &Cart { &self.cart }
    pub fn items(&self) -> &[CartItem] { self.cart.items() }

    pub fn add_item(&mut self, product: Product, quantity: i64) -> Option<CartNotice> {
        let notice = self.cart.add_item(product, quantity);
        self.commit(notice)
    }

    /// Adds a single unit, the usual "add to cart" action.
    pub fn add_one(&mut self, product: Product) -> Option<CartNotice> { self.add_item(product, 1) }

    pub fn remove_item(&mut self, product_id: &str) -> Option<CartNotice> {
        let notice = self.cart.remove_item(product_id);
        self.commit(notice)
    }

    pub fn remove_item_completely(&mut self, product_id: &str) -> Option<CartNotice> {
        let notice = self.cart.remove_item_completely(product_id);
        self.commit(notice)
    }

    /// `notify = false` is used after a successful payment, where a
    /// "cart cleared" message would be noise.
    pub fn clear_cart(&mut self, notify: bool) -> Option<CartNotice> {
        let notice = self.cart.clear();
        persist(self.storage.as_ref(), CART_KEY, &self.cart);
        notify.then_some(notice)
    }

    pub fn total_price(&self) -> Money { self.cart.total_price() }
    pub fn item_count(&self, product_id: &str) -> u32 { self.cart.item_count(product_id) }

    fn commit(&self, notice: Option<CartNotice>) -> Option<CartNotice> {
        if let Some(n) = notice {
            debug!(notice = %n, items = self.cart.len(), "cart updated");
            persist(self.storage.as_ref(), CART_KEY, &self.cart);
        }
        notice
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ProductId;
    use crate::store::MemoryStorage;
    use rust_decimal::Decimal;

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: ProductId::new(id), name: id.to_string(), slug: id.to_string(),
            price: Some(Money::from_minor_units(cents)), discount: None, stock: 5,
            images: vec!["https://cdn.example.com/a.png".into()], categories: vec![], description: None, video_url: None,
        }
    }

    #[test]
    fn test_mutations_persist_and_rehydrate() {
        let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
        let mut store = CartStore::open(storage.clone());
        assert_eq!(store.add_item(product("P1", 1250), 2), Some(CartNotice::Added));
        store.add_item(product("P2", 300), 1);
        store.remove_item("P2");

        let reopened = CartStore::open(storage.clone());
        assert_eq!(reopened.item_count("P1"), 2);
        assert_eq!(reopened.item_count("P2"), 0);
        assert_eq!(reopened.total_price().amount(), Decimal::new(25, 0));
        assert_eq!(reopened.state(), store.state());
    }

    #[test]
    fn test_add_one_increments_by_a_single_unit() {
        let mut store = CartStore::open(Arc::new(MemoryStorage::new()));
        assert_eq!(store.add_one(product("P1", 500)), Some(CartNotice::Added));
        assert_eq!(store.add_one(product("P1", 500)), Some(CartNotice::QuantityIncreased));
        assert_eq!(store.item_count("P1"), 2);
        assert_eq!(store.total_price(), Money::from_minor_units(1000));
    }

    #[test]
    fn test_clear_cart_without_notice_still_persists() {
        let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
        let mut store = CartStore::open(storage.clone());
        store.add_item(product("P1", 100), 1);
        assert_eq!(store.clear_cart(false), None);
        assert!(CartStore::open(storage.clone()).items().is_empty());
        store.add_item(product("P1", 100), 1);
        assert_eq!(store.clear_cart(true), Some(CartNotice::Cleared));
    }

    #[test]
    fn test_malformed_record_starts_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.save(CART_KEY, "{not json").unwrap();
        let store = CartStore::open(storage);
        assert!(store.items().is_empty());
    }

    #[test]
    fn test_noop_does_not_write() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = CartStore::open(storage.clone());
        assert_eq!(store.remove_item("missing"), None);
        assert!(storage.load(CART_KEY).unwrap().is_none());
    }
}
