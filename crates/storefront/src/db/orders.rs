//! Order repository: checkout and order history.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::{info, instrument};

use bookstore_core::{CartOwner, OrderId, Price, ProductId, Quantity, UserId};

use super::RepositoryError;
use super::cart::{ProductLock, clear_with, lock_cart_products, owner_filter};
use crate::models::{Order, OrderLine};

#[derive(sqlx::FromRow)]
struct CheckoutLineRow {
    product_id: ProductId,
    quantity: Quantity,
    price: Price,
    stock_quantity: i32,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    total_amount: Price,
    status: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    order_id: OrderId,
    product_id: ProductId,
    name: String,
    quantity: i32,
    price: Price,
}

/// Repository for `storefront.order` and `storefront.order_item`.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Turn the owner's cart into an order.
    ///
    /// In one transaction: locks the cart lines and their products, records
    /// the order with each line at the current price, decrements stock and
    /// empties the cart. Any failure leaves the cart, stock and orders as
    /// they were.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidArgument` if the cart is empty.
    /// Returns `RepositoryError::OutOfStock` if a line asks for more units
    /// than the product has left.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn create_from_cart(&self, owner: &CartOwner) -> Result<OrderId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Products before cart lines, in id order: cart writes take the
        // product lock first too, so the two never wait on each other in a cycle.
        lock_cart_products(&mut tx, owner, ProductLock::Update).await?;

        let lines = sqlx::query_as::<_, CheckoutLineRow>(&format!(
            r"
            SELECT ci.product_id, ci.quantity, p.price, p.stock_quantity
            FROM storefront.cart_item ci
            JOIN storefront.product p ON p.id = ci.product_id
            WHERE ci.{filter}
            ORDER BY ci.product_id
            FOR UPDATE OF ci
            ",
            filter = owner_filter(owner),
        ))
        .bind(owner.user_id())
        .bind(owner.session_id())
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(RepositoryError::InvalidArgument("cart is empty".to_owned()));
        }
        if let Some(short) = lines
            .iter()
            .find(|line| line.quantity.get() > line.stock_quantity)
        {
            return Err(RepositoryError::OutOfStock(short.product_id));
        }

        let total: Price = lines.iter().map(|line| line.price.times(line.quantity)).sum();

        let order_id = sqlx::query_scalar::<_, OrderId>(
            r"
            INSERT INTO storefront.order (user_id, session_id, total_amount, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING id
            ",
        )
        .bind(owner.user_id())
        .bind(owner.session_id())
        .bind(total)
        .fetch_one(&mut *tx)
        .await?;

        for line in &lines {
            sqlx::query(
                r"
                INSERT INTO storefront.order_item (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.price)
            .execute(&mut *tx)
            .await?;

            let updated = sqlx::query(
                r"
                UPDATE storefront.product SET stock_quantity = stock_quantity - $2
                WHERE id = $1 AND stock_quantity >= $2
                ",
            )
            .bind(line.product_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
            if updated.rows_affected() == 0 {
                return Err(RepositoryError::OutOfStock(line.product_id));
            }
        }

        clear_with(&mut *tx, owner).await?;
        tx.commit().await?;

        info!(order_id = %order_id, total = %total, lines = lines.len(), "Order created");
        Ok(order_id)
    }

    /// A user's orders, newest first, each with its lines ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total_amount, status, created_at
            FROM storefront.order
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = orders.iter().map(|order| order.id.as_i32()).collect();
        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT oi.order_id, oi.product_id, p.name, oi.quantity, oi.price
            FROM storefront.order_item oi
            JOIN storefront.product p ON p.id = oi.product_id
            WHERE oi.order_id = ANY($1)
            ORDER BY p.name, oi.id
            ",
        )
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut lines_by_order: HashMap<OrderId, Vec<OrderLine>> = HashMap::new();
        for item in items {
            lines_by_order
                .entry(item.order_id)
                .or_default()
                .push(OrderLine {
                    product_id: item.product_id,
                    name: item.name,
                    quantity: item.quantity,
                    price: item.price,
                });
        }

        Ok(orders
            .into_iter()
            .map(|order| Order {
                lines: lines_by_order.remove(&order.id).unwrap_or_default(),
                id: order.id,
                user_id: order.user_id,
                total_amount: order.total_amount,
                status: order.status,
                created_at: order.created_at,
            })
            .collect())
    }
}
