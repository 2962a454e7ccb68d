//! Business logic services for the storefront.
//!
//! - `auth` - Password registration and login
//! - `cart` - The signed-in customer's open order

pub mod auth;
pub mod cart;
