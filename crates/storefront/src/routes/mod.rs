//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! # Products
//! GET    /api/products                 - Catalog
//! GET    /api/products/{id}            - Product detail
//!
//! # Cart
//! GET    /api/cart                     - Cart with line subtotals and total
//! GET    /api/cart/count               - Cart count badge
//! POST   /api/cart/items               - Add to cart ({product_id, quantity?})
//! PUT    /api/cart/items/{product_id}  - Set quantity ({quantity})
//! DELETE /api/cart/items/{product_id}  - Remove line
//!
//! # Auth
//! POST   /api/auth/register            - Register and sign in
//! POST   /api/auth/login               - Login
//! POST   /api/auth/logout              - Logout
//!
//! # Orders (requires auth)
//! POST   /api/checkout                 - Create order from cart
//! GET    /api/orders                   - Order history
//! ```

pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route("/items/{product_id}", put(cart::update).delete(cart::remove))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/auth", auth_routes())
        .route("/api/checkout", post(orders::checkout))
        .route("/api/orders", get(orders::index))
}
