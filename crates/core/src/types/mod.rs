//! Core types for the bookstore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod owner;
pub mod price;
pub mod quantity;

pub use email::{Email, EmailError};
pub use id::*;
pub use owner::{CartOwner, SessionId, SessionIdError};
pub use price::Price;
pub use quantity::{MAX_LINE_QUANTITY, Quantity, QuantityError, StockCap};
