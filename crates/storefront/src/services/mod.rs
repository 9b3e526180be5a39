//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password registration and login

pub mod auth;
