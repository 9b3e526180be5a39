//! Cart line quantities and the stock clamping policy.
//!
//! ## Rules
//!
//! - A stored line quantity is always in `1..=MAX_LINE_QUANTITY`.
//! - A line may never hold more than the product's current stock; this is
//!   the [`StockCap`], `min(stock, MAX_LINE_QUANTITY)`.
//! - Asking for more than the cap is not an error: the request is reduced
//!   to the cap and the caller reports the stored quantity back.
//! - Asking for less than one unit is an error.
//! - A product without stock has no cap, so it cannot be put in a cart.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound on a single cart line, independent of stock.
pub const MAX_LINE_QUANTITY: i32 = 99;

/// Errors produced when validating a quantity.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantity.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i32),
    /// Quantity above the per-line limit.
    #[error("quantity must be at most {max} (got {value})")]
    AboveMaximum {
        /// Rejected value.
        value: i32,
        /// Per-line limit.
        max: i32,
    },
}

/// A validated line quantity in `1..=MAX_LINE_QUANTITY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// The per-line limit.
    pub const MAX: Self = Self(MAX_LINE_QUANTITY);

    /// Validate a quantity.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is outside `1..=MAX_LINE_QUANTITY`.
    pub const fn new(value: i32) -> Result<Self, QuantityError> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        if value > MAX_LINE_QUANTITY {
            return Err(QuantityError::AboveMaximum {
                value,
                max: MAX_LINE_QUANTITY,
            });
        }
        Ok(Self(value))
    }

    /// The raw unit count.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Quantity {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <i32 as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <i32 as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Quantity {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let raw = <i32 as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(raw)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Quantity {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <i32 as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

/// The most units of one product a single cart line may hold right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockCap(i32);

impl StockCap {
    /// Cap for a product with `stock` units on hand.
    ///
    /// Returns `None` when nothing is in stock.
    #[must_use]
    pub const fn for_stock(stock: i32) -> Option<Self> {
        if stock < 1 {
            None
        } else if stock > MAX_LINE_QUANTITY {
            Some(Self(MAX_LINE_QUANTITY))
        } else {
            Some(Self(stock))
        }
    }

    /// The cap as a raw unit count.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Clamp an absolute target quantity into `[1, cap]`.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::NotPositive`] if `requested < 1`.
    pub const fn clamp(self, requested: i32) -> Result<Quantity, QuantityError> {
        if requested < 1 {
            return Err(QuantityError::NotPositive(requested));
        }
        if requested > self.0 {
            Ok(Quantity(self.0))
        } else {
            Ok(Quantity(requested))
        }
    }
}
