//! Order history types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookstore_core::{OrderId, Price, ProductId, UserId};

/// A placed order with its lines.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub total_amount: Price,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// A product snapshot inside an order, priced at checkout time.
#[derive(Debug, Clone, Serialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub name: String,
    pub quantity: i32,
    pub price: Price,
}
