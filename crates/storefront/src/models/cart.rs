//! Cart views returned by the ledger.

use serde::Serialize;

use bookstore_core::{Price, ProductId, Quantity};

/// One product in a cart, joined with its current catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: Price,
    pub quantity: Quantity,
    pub subtotal: Price,
}

impl CartLine {
    /// Build a line, deriving the subtotal from price and quantity.
    #[must_use]
    pub fn new(
        product_id: ProductId,
        name: String,
        image_url: Option<String>,
        unit_price: Price,
        quantity: Quantity,
    ) -> Self {
        Self {
            product_id,
            name,
            image_url,
            unit_price,
            quantity,
            subtotal: unit_price.times(quantity),
        }
    }
}

/// All lines of one owner's cart and their total.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub total: Price,
}

impl Cart {
    /// Build a cart; the total is the sum of the line subtotals.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let total = lines.iter().map(|line| line.subtotal).sum();
        Self { lines, total }
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> i64 {
        self.lines
            .iter()
            .map(|line| i64::from(line.quantity.get()))
            .sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// What happened when an anonymous cart was folded into a user's cart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
    /// Session lines written into the user's cart.
    pub merged_lines: u64,
    /// Session lines discarded because the product is out of stock.
    pub dropped_lines: u64,
}
