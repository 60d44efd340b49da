//! Wishlist Store

use std::sync::Arc;
use tracing::debug;
use crate::domain::aggregates::{Product, Wishlist, WishlistNotice};
use super::{hydrate, persist, ClientStorage, WISHLIST_KEY};

pub struct WishlistStore {
    wishlist: Wishlist,
    storage: Arc<dyn ClientStorage>,
}

impl WishlistStore {
    pub fn open(storage: Arc<dyn ClientStorage>) -> Self {
        let wishlist = hydrate::<Wishlist>(storage.as_ref(), WISHLIST_KEY).dedup();
        Self { wishlist, storage }
    }

    pub fn items(&self) -> &[Product] { self.wishlist.items() }

    pub fn add_item(&mut self, product: Product) -> Option<WishlistNotice> {
        let notice = self.wishlist.add_item(product)?;
        Some(self.commit(notice))
    }

    pub fn remove_item(&mut self, product_id: &str) -> WishlistNotice {
        let notice = self.wishlist.remove_item(product_id);
        self.commit(notice)
    }

    pub fn is_in_wishlist(&self, product_id: &str) -> bool { self.wishlist.contains(product_id) }

    pub fn clear_wishlist(&mut self) -> WishlistNotice {
        let notice = self.wishlist.clear();
        self.commit(notice)
    }

    fn commit(&self, notice: WishlistNotice) -> WishlistNotice {
        debug!(notice = %notice, items = self.wishlist.len(), "wishlist updated");
        persist(self.storage.as_ref(), WISHLIST_KEY, &self.wishlist);
        notice
    }
}
