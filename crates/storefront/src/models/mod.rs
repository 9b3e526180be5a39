//! Domain models for the storefront.
//!
//! These are validated domain objects, separate from the raw rows that the
//! repositories decode.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLine, MergeOutcome};
pub use order::{Order, OrderLine};
pub use product::{NewProduct, Product};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
