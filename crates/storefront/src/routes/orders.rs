//! Checkout and order history handlers. Both require a signed-in user.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::instrument;

use bookstore_core::{CartOwner, OrderId};

use crate::db::OrderRepository;
use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::state::AppState;

/// Response to a successful checkout.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
}

/// Turn the user's cart into an order.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    let order_id = OrderRepository::new(state.pool())
        .create_from_cart(&CartOwner::User(user.id))
        .await?;

    add_breadcrumb("checkout", "Order placed", &[("order_id", order_id.to_string())]);
    Ok((StatusCode::CREATED, Json(CheckoutResponse { order_id })))
}

/// The user's orders, newest first.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}
