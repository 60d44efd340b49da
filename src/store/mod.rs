//! Client state containers for the cart and the wishlist.
//!
//! Each store owns its state, applies the pure transitions from
//! `domain::aggregates` and persists after every committed mutation.

pub mod cart;
pub mod storage;
pub mod wishlist;

pub use cart::CartStore;
pub use storage::{ClientStorage, FileStorage, MemoryStorage, StorageError};
pub use wishlist::WishlistStore;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

pub const CART_KEY: &str = "cart";
pub const WISHLIST_KEY: &str = "wishlist";

/// Missing, unreadable or malformed records start empty.
fn hydrate<T: DeserializeOwned + Default>(storage: &dyn ClientStorage, key: &str) -> T {
    let raw = match storage.load(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            warn!(key, error = %e, "failed to read client state");
            return T::default();
        }
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(key, error = %e, "discarding malformed client state");
        T::default()
    })
}

/// Failures are logged; the in-memory state stays authoritative.
fn persist<T: Serialize>(storage: &dyn ClientStorage, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(StorageError::from)
        .and_then(|json| storage.save(key, &json));
    if let Err(e) = result {
        warn!(key, error = %e, "failed to persist client state");
    }
}
