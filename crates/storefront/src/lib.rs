//! Bozor Storefront library.
//!
//! The storefront is split into a library and a thin binary so that
//! repositories, forms and the router can be exercised from tests and from
//! `bozor-cli`.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
