//! Aggregates module
pub mod product;
pub mod order;
pub mod cart;
pub mod wishlist;

pub use product::{Category, Product, ProductDocument, ProductError, Sale};
pub use order::{CheckoutMetadata, Order, OrderError, OrderLine, OrderStatus, ShippingAddress};
pub use cart::{Cart, CartItem, CartNotice};
pub use wishlist::{Wishlist, WishlistNotice};
