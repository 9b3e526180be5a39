//! The cart ledger.
//!
//! Every cart line belongs to exactly one [`CartOwner`]: a signed-in user or
//! an anonymous browser session. The partial unique indexes
//! `idx_cart_items_user_product` and `idx_cart_items_session_product` keep one
//! row per (owner, product), and every write goes through a single
//! `INSERT ... ON CONFLICT DO UPDATE` against them, so concurrent adds of the
//! same product serialize on the conflicting row instead of duplicating it.
//!
//! ## Quantity rules
//!
//! Stored quantities stay within `[1, min(stock, 99)]`. Requests above the cap
//! are reduced and the stored quantity is returned so the caller can tell the
//! shopper. A product without stock cannot be added.

use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use bookstore_core::{
    CartOwner, MAX_LINE_QUANTITY, Price, ProductId, Quantity, SessionId, StockCap, UserId,
};

use super::RepositoryError;
use crate::models::{Cart, CartLine, MergeOutcome};

/// Row predicate selecting one owner's lines.
///
/// Both owner parameters are always bound (`$1` user id, `$2` session id)
/// and exactly one of them is non-null.
pub(super) const fn owner_filter(owner: &CartOwner) -> &'static str {
    match owner {
        CartOwner::User(_) => "user_id = $1 AND $2::text IS NULL",
        CartOwner::Session(_) => "session_id = $2 AND $1::int4 IS NULL",
    }
}

/// `ON CONFLICT` target matching the owner's partial unique index.
const fn conflict_target(owner: &CartOwner) -> &'static str {
    match owner {
        CartOwner::User(_) => "(user_id, product_id) WHERE user_id IS NOT NULL",
        CartOwner::Session(_) => "(session_id, product_id) WHERE session_id IS NOT NULL",
    }
}

/// Row lock taken on the products behind a cart.
#[derive(Debug, Clone, Copy)]
pub(super) enum ProductLock {
    /// Stock is read but not changed.
    Share,
    /// Stock is about to be decremented.
    Update,
}

/// Lock the products in the owner's cart, in product id order.
///
/// Every path that locks both a product and a cart line takes the product
/// first. Cart writes do it with a single `FOR SHARE` in [`CartRepository`];
/// merge and checkout call this before touching their cart lines.
pub(super) async fn lock_cart_products(
    tx: &mut Transaction<'_, Postgres>,
    owner: &CartOwner,
    lock: ProductLock,
) -> Result<(), RepositoryError> {
    let mode = match lock {
        ProductLock::Share => "FOR SHARE",
        ProductLock::Update => "FOR UPDATE",
    };
    sqlx::query(&format!(
        r"
        SELECT id FROM storefront.product
        WHERE id IN (SELECT product_id FROM storefront.cart_item WHERE {filter})
        ORDER BY id
        {mode}
        ",
        filter = owner_filter(owner),
    ))
    .bind(owner.user_id())
    .bind(owner.session_id())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// How an upsert combines the request with an existing line.
#[derive(Debug, Clone, Copy)]
enum Upsert {
    /// Add the requested units to the line.
    Increment,
    /// Replace the line's quantity.
    Replace,
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    product_id: ProductId,
    name: String,
    image_url: Option<String>,
    price: Price,
    quantity: Quantity,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self::new(
            row.product_id,
            row.name,
            row.image_url,
            row.price,
            row.quantity,
        )
    }
}

#[derive(sqlx::FromRow)]
struct SessionLineRow {
    product_id: ProductId,
    quantity: i32,
    stock_quantity: i32,
}

/// Repository for the `storefront.cart_item` table.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add units of a product to the owner's cart.
    ///
    /// Creates the line if it does not exist, otherwise increments it. The
    /// stored quantity is `min(existing + requested, stock, 99)`.
    ///
    /// # Returns
    ///
    /// The quantity stored on the line after the write.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidArgument` if `requested < 1`.
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::OutOfStock` if the product has no stock.
    #[instrument(skip(self), fields(owner = %owner, product = %product_id))]
    pub async fn add_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        requested: i32,
    ) -> Result<Quantity, RepositoryError> {
        self.write_line(owner, product_id, requested, Upsert::Increment)
            .await
    }

    /// Set the quantity of a product in the owner's cart.
    ///
    /// The target is clamped to `min(stock, 99)`. The line is created if it
    /// does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidArgument` if `requested < 1`; use
    /// [`Self::remove_item`] to drop a line.
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::OutOfStock` if the product has no stock.
    #[instrument(skip(self), fields(owner = %owner, product = %product_id))]
    pub async fn update_quantity(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        requested: i32,
    ) -> Result<Quantity, RepositoryError> {
        self.write_line(owner, product_id, requested, Upsert::Replace)
            .await
    }

    /// Remove a product from the owner's cart.
    ///
    /// Removing a line that is not there is not an error.
    ///
    /// # Returns
    ///
    /// Whether a line was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(owner = %owner, product = %product_id))]
    pub async fn remove_item(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(&format!(
            "DELETE FROM storefront.cart_item WHERE {} AND product_id = $3",
            owner_filter(owner)
        ))
        .bind(owner.user_id())
        .bind(owner.session_id())
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the owner's cart joined with current catalog data.
    ///
    /// Lines are ordered by product name, then product ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn get_items(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
        let rows = sqlx::query_as::<_, CartLineRow>(&format!(
            r"
            SELECT ci.product_id, p.name, p.image_url, p.price, ci.quantity
            FROM storefront.cart_item ci
            JOIN storefront.product p ON p.id = ci.product_id
            WHERE ci.{}
            ORDER BY p.name, p.id
            ",
            owner_filter(owner)
        ))
        .bind(owner.user_id())
        .bind(owner.session_id())
        .fetch_all(self.pool)
        .await?;

        Ok(Cart::from_lines(rows.into_iter().map(CartLine::from).collect()))
    }

    /// Total number of units in the owner's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item_count(&self, owner: &CartOwner) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COALESCE(SUM(quantity), 0)::int8 FROM storefront.cart_item WHERE {}",
            owner_filter(owner)
        ))
        .bind(owner.user_id())
        .bind(owner.session_id())
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Delete every line in the owner's cart.
    ///
    /// # Returns
    ///
    /// The number of lines deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(owner = %owner))]
    pub async fn clear(&self, owner: &CartOwner) -> Result<u64, RepositoryError> {
        clear_with(self.pool, owner).await
    }

    /// Fold an anonymous session cart into a user's cart.
    ///
    /// Runs in one transaction. Each session line is added to the user's
    /// line for the same product, clamped to `min(stock, 99)`. Lines for
    /// products that are out of stock are dropped. Afterwards the session
    /// cart is empty. Merging an empty session cart does nothing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; nothing is
    /// changed in that case.
    #[instrument(skip(self), fields(session = %session_id, user = %user_id))]
    pub async fn merge(
        &self,
        session_id: &SessionId,
        user_id: UserId,
    ) -> Result<MergeOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        // Stock stays put until commit, so the clamp below still holds when
        // a checkout runs next.
        let session = CartOwner::from(session_id.clone());
        lock_cart_products(&mut tx, &session, ProductLock::Share).await?;

        let session_lines = sqlx::query_as::<_, SessionLineRow>(
            r"
            SELECT ci.product_id, ci.quantity, p.stock_quantity
            FROM storefront.cart_item ci
            JOIN storefront.product p ON p.id = ci.product_id
            WHERE ci.session_id = $1
            ORDER BY ci.product_id
            FOR UPDATE OF ci FOR SHARE OF p
            ",
        )
        .bind(session_id)
        .fetch_all(&mut *tx)
        .await?;

        if session_lines.is_empty() {
            tx.commit().await?;
            return Ok(MergeOutcome::default());
        }

        let user = CartOwner::from(user_id);
        let mut outcome = MergeOutcome::default();
        for line in &session_lines {
            let Some(cap) = StockCap::for_stock(line.stock_quantity) else {
                outcome.dropped_lines += 1;
                continue;
            };
            let quantity = line.quantity.min(MAX_LINE_QUANTITY);
            upsert_line(&mut tx, &user, line.product_id, quantity, cap, Upsert::Increment)
                .await?;
            outcome.merged_lines += 1;
        }

        sqlx::query("DELETE FROM storefront.cart_item WHERE session_id = $1")
            .bind(session_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            merged = outcome.merged_lines,
            dropped = outcome.dropped_lines,
            "Merged session cart into user cart"
        );
        Ok(outcome)
    }

    async fn write_line(
        &self,
        owner: &CartOwner,
        product_id: ProductId,
        requested: i32,
        mode: Upsert,
    ) -> Result<Quantity, RepositoryError> {
        // Anything above the line limit clamps to the same result, and keeping
        // the bound value small rules out overflow in `quantity + $n`.
        let requested = Quantity::new(requested.min(MAX_LINE_QUANTITY))?.get();

        let mut tx = self.pool.begin().await?;

        // Shared lock: concurrent adds proceed, checkout's stock decrement waits.
        let stock = sqlx::query_scalar::<_, i32>(
            "SELECT stock_quantity FROM storefront.product WHERE id = $1 FOR SHARE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let cap = StockCap::for_stock(stock).ok_or(RepositoryError::OutOfStock(product_id))?;
        let stored = upsert_line(&mut tx, owner, product_id, requested, cap, mode).await?;

        tx.commit().await?;
        Ok(stored)
    }
}

/// Write one line with a single upsert and return the stored quantity.
async fn upsert_line(
    tx: &mut Transaction<'_, Postgres>,
    owner: &CartOwner,
    product_id: ProductId,
    requested: i32,
    cap: StockCap,
    mode: Upsert,
) -> Result<Quantity, RepositoryError> {
    let initial = cap.clamp(requested)?;
    let on_conflict = match mode {
        Upsert::Increment => "GREATEST(1, LEAST(ci.quantity + $5, $6))",
        Upsert::Replace => "EXCLUDED.quantity",
    };

    let sql = format!(
        r"
        INSERT INTO storefront.cart_item AS ci (user_id, session_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT {target} DO UPDATE
        SET quantity = {on_conflict}, updated_at = NOW()
        RETURNING quantity
        ",
        target = conflict_target(owner),
    );
    let mut query = sqlx::query_scalar::<_, Quantity>(&sql)
        .bind(owner.user_id())
        .bind(owner.session_id())
        .bind(product_id)
        .bind(initial);
    if let Upsert::Increment = mode {
        query = query.bind(requested).bind(cap.get());
    }
    let stored = query.fetch_one(&mut **tx).await?;

    Ok(stored)
}

/// Delete every line owned by `owner` using any executor.
///
/// Checkout calls this inside its transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn clear_with<'e, E>(executor: E, owner: &CartOwner) -> Result<u64, RepositoryError>
where
    E: PgExecutor<'e>,
{
    let result = sqlx::query(&format!(
        "DELETE FROM storefront.cart_item WHERE {}",
        owner_filter(owner)
    ))
    .bind(owner.user_id())
    .bind(owner.session_id())
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_filter_binds_both_parameters() {
        for owner in [
            CartOwner::User(UserId::new(1)),
            CartOwner::Session(SessionId::generate()),
        ] {
            let filter = owner_filter(&owner);
            assert!(filter.contains("$1") && filter.contains("$2"), "{filter}");
        }
    }

    #[test]
    fn test_conflict_target_matches_partial_index() {
        assert_eq!(
            conflict_target(&CartOwner::User(UserId::new(1))),
            "(user_id, product_id) WHERE user_id IS NOT NULL"
        );
        let session = CartOwner::Session(SessionId::generate());
        assert!(conflict_target(&session).ends_with("WHERE session_id IS NOT NULL"));
    }

    #[test]
    fn test_row_converts_to_line_with_subtotal() {
        let row = CartLineRow {
            product_id: ProductId::new(3),
            name: "Emma".to_owned(),
            image_url: None,
            price: Price::from_cents(450),
            quantity: Quantity::new(2).unwrap_or(Quantity::ONE),
        };
        let line = CartLine::from(row);
        assert_eq!(line.subtotal, Price::from_cents(900));
    }
}
