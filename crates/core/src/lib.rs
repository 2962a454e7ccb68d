//! Bozor Core - Shared domain types.
//!
//! This crate provides the types used across all Bozor components:
//! - `storefront` - Public-facing shop (catalog, cart, checkout)
//! - `cli` - Migrations, catalog seeding and administrative deletes
//!
//! # Architecture
//!
//! Like the rest of the domain layer, this crate contains only types, static
//! tables and pure functions - no I/O, no database access. The `postgres`
//! feature adds `sqlx` encode/decode support for the ID newtypes.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, slugs and prices
//! - [`relations`] - Foreign keys and their on-delete policy
//! - [`sorting`] - Sort option catalog offered on listing pages
//! - [`media`] - Image URL resolution and the placeholder image

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod media;
pub mod relations;
pub mod sorting;
pub mod types;

pub use types::*;
