//! Domain models for the storefront.
//!
//! Models are plain data loaded by the repositories in [`crate::db`]. Derived
//! values such as image URLs and cart totals are computed here so that
//! templates never touch the database.

mod catalog;
mod order;
mod review;
pub mod session;
mod user;

pub use catalog::{Category, FavouriteProduct, GalleryImage, Product};
pub use order::{Cart, CartLine, Order, OrderProduct, ShippingAddress};
pub use review::{Review, ReviewWithAuthor};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{Customer, User};
