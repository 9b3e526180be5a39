//! Cart route handlers.
//!
//! The cart belongs to the signed-in user or, for visitors, to an anonymous
//! id kept in the session. Write handlers report the quantity actually
//! stored, which can be lower than requested when stock runs short.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{ProductId, Quantity};

use crate::db::CartRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::CartSession;
use crate::models::Cart;
use crate::state::AppState;

/// Add to cart request body.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// Update quantity request body.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

/// Result of a cart write.
#[derive(Debug, Serialize)]
pub struct LineResponse {
    pub product_id: ProductId,
    pub requested: i32,
    /// Units stored on the line after the write.
    pub quantity: Quantity,
    pub cart_count: i64,
}

/// Cart count badge.
#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Result of a removal.
#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub removed: bool,
    pub cart_count: i64,
}

/// Show the current cart. A visitor without a cart sees an empty one.
#[instrument(skip(state, cart_session))]
pub async fn show(State(state): State<AppState>, cart_session: CartSession) -> Result<Json<Cart>> {
    let cart = match cart_session.owner().await? {
        Some(owner) => CartRepository::new(state.pool()).get_items(&owner).await?,
        None => Cart::default(),
    };
    Ok(Json(cart))
}

/// Number of units in the current cart.
#[instrument(skip(state, cart_session))]
pub async fn count(
    State(state): State<AppState>,
    cart_session: CartSession,
) -> Result<Json<CountResponse>> {
    let count = match cart_session.owner().await? {
        Some(owner) => CartRepository::new(state.pool()).item_count(&owner).await?,
        None => 0,
    };
    Ok(Json(CountResponse { count }))
}

/// Add a product to the cart.
#[instrument(skip(state, cart_session))]
pub async fn add(
    State(state): State<AppState>,
    cart_session: CartSession,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<LineResponse>> {
    let owner = cart_session.owner_or_create().await?;
    let cart = CartRepository::new(state.pool());

    let quantity = cart.add_item(&owner, body.product_id, body.quantity).await?;
    let cart_count = cart.item_count(&owner).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[
            ("product_id", body.product_id.to_string()),
            ("quantity", quantity.to_string()),
        ],
    );

    Ok(Json(LineResponse {
        product_id: body.product_id,
        requested: body.quantity,
        quantity,
        cart_count,
    }))
}

/// Set the quantity of a product in the cart.
#[instrument(skip(state, cart_session))]
pub async fn update(
    State(state): State<AppState>,
    cart_session: CartSession,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<LineResponse>> {
    let owner = cart_session.owner_or_create().await?;
    let cart = CartRepository::new(state.pool());

    let quantity = cart
        .update_quantity(&owner, product_id, body.quantity)
        .await?;
    let cart_count = cart.item_count(&owner).await?;

    Ok(Json(LineResponse {
        product_id,
        requested: body.quantity,
        quantity,
        cart_count,
    }))
}

/// Remove a product from the cart. Removing a missing line succeeds.
#[instrument(skip(state, cart_session))]
pub async fn remove(
    State(state): State<AppState>,
    cart_session: CartSession,
    Path(product_id): Path<ProductId>,
) -> Result<Json<RemoveResponse>> {
    let Some(owner) = cart_session.owner().await? else {
        return Ok(Json(RemoveResponse {
            removed: false,
            cart_count: 0,
        }));
    };

    let cart = CartRepository::new(state.pool());
    let removed = cart.remove_item(&owner, product_id).await?;
    let cart_count = cart.item_count(&owner).await?;

    Ok(Json(RemoveResponse {
        removed,
        cart_count,
    }))
}
