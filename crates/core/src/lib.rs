//! Bookstore Core - Shared domain types.
//!
//! This crate provides the types used across all bookstore components:
//! - `storefront` - Public-facing shop and the cart ledger
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. The quantity clamping policy lives here so that the
//! storefront's SQL and its unit tests agree on one definition.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, cart owners, quantities, prices and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
