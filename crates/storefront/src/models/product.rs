//! Catalog types.

use serde::{Deserialize, Serialize};

use bookstore_core::{Price, ProductId};

/// A product as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub sku: Option<String>,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub stock_quantity: i32,
    pub image_url: Option<String>,
}

/// Input for creating or seeding a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    #[serde(default)]
    pub sku: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub image_url: Option<String>,
}
