//! Seed the catalog from a YAML file.
//!
//! The file is a list of products keyed by SKU. Seeding is idempotent: each
//! run inserts new SKUs and refreshes existing ones in place.
//!
//! ```yaml
//! - sku: GUT-1342
//!   name: Pride and Prejudice
//!   description: Jane Austen
//!   price: "9.99"
//!   stock_quantity: 25
//! ```

use std::collections::HashSet;
use std::path::Path;

use tracing::{error, info};

use bookstore_storefront::db::ProductRepository;
use bookstore_storefront::models::NewProduct;

/// Check a parsed seed file before touching the database.
///
/// Returns one message per problem.
fn validate(products: &[NewProduct]) -> Vec<String> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, product) in products.iter().enumerate() {
        match product.sku.as_deref() {
            None | Some("") => errors.push(format!("entry {index}: sku is required")),
            Some(sku) => {
                if !seen.insert(sku) {
                    errors.push(format!("entry {index}: duplicate sku {sku}"));
                }
            }
        }
        if product.name.trim().is_empty() {
            errors.push(format!("entry {index}: name is required"));
        }
        if product.stock_quantity < 0 {
            errors.push(format!("entry {index}: stock_quantity must not be negative"));
        }
        if product.price.amount().is_sign_negative() {
            errors.push(format!("entry {index}: price must not be negative"));
        }
    }

    errors
}

/// Seed products from a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or a database write fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let products: Vec<NewProduct> = serde_yaml::from_str(&content)?;

    let errors = validate(&products);
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;
    let repo = ProductRepository::new(&pool);

    for product in &products {
        repo.upsert_by_sku(product).await?;
    }

    info!(products = products.len(), "Seeding complete!");
    Ok(())
}
