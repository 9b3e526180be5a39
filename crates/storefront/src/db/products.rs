//! Product catalog repository.

use sqlx::PgPool;
use tracing::{debug, instrument};

use bookstore_core::ProductId;

use super::RepositoryError;
use crate::models::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, sku, name, description, price, stock_quantity, image_url";

/// Repository for the `storefront.product` table.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// List the whole catalog ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.product ORDER BY name, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Current stock level of a product, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stock(&self, id: ProductId) -> Result<Option<i32>, RepositoryError> {
        let stock = sqlx::query_scalar::<_, i32>(
            "SELECT stock_quantity FROM storefront.product WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(stock)
    }

    /// Insert a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidArgument` for a negative price or stock.
    /// Returns `RepositoryError::Conflict` if the SKU is already taken.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        validate(product)?;

        let created = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO storefront.product
                (sku, name, description, price, stock_quantity, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(product.sku.as_deref())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock_quantity)
        .bind(product.image_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("sku already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        debug!(id = %created.id, "Created product");
        Ok(created)
    }

    /// Insert or refresh a product keyed by its SKU.
    ///
    /// Running the same seed file twice leaves one row per SKU with the
    /// latest name, price, stock and image.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::InvalidArgument` if the product has no SKU
    /// or a negative price or stock.
    #[instrument(skip(self, product), fields(sku = ?product.sku))]
    pub async fn upsert_by_sku(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        validate(product)?;
        let Some(sku) = product.sku.as_deref() else {
            return Err(RepositoryError::InvalidArgument(
                "product sku is required for upsert".to_owned(),
            ));
        };

        let upserted = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO storefront.product
                (sku, name, description, price, stock_quantity, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (sku) DO UPDATE
            SET name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                stock_quantity = EXCLUDED.stock_quantity,
                image_url = EXCLUDED.image_url
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.stock_quantity)
        .bind(product.image_url.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(upserted)
    }
}

fn validate(product: &NewProduct) -> Result<(), RepositoryError> {
    if product.name.trim().is_empty() {
        return Err(RepositoryError::InvalidArgument(
            "product name must not be empty".to_owned(),
        ));
    }
    if product.price.amount().is_sign_negative() {
        return Err(RepositoryError::InvalidArgument(format!(
            "price must not be negative (got {})",
            product.price
        )));
    }
    if product.stock_quantity < 0 {
        return Err(RepositoryError::InvalidArgument(format!(
            "stock must not be negative (got {})",
            product.stock_quantity
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bookstore_core::Price;

    use super::*;

    fn product(price_cents: i64, stock: i32) -> NewProduct {
        NewProduct {
            sku: Some("BK-1".to_owned()),
            name: "Dune".to_owned(),
            description: String::new(),
            price: Price::from_cents(price_cents),
            stock_quantity: stock,
            image_url: None,
        }
    }

    #[test]
    fn test_validate_accepts_free_and_sold_out() {
        assert!(validate(&product(0, 0)).is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_values() {
        assert!(matches!(
            validate(&product(-1, 3)),
            Err(RepositoryError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate(&product(100, -1)),
            Err(RepositoryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let mut p = product(100, 1);
        p.name = "  ".to_owned();
        assert!(validate(&p).is_err());
    }
}
