//! Product price.
//!
//! Prices are stored as `DOUBLE PRECISION` with a `CHECK (price >= 0)`
//! constraint, so the domain type is a checked `f64` rather than a decimal.

use serde::{Deserialize, Serialize};

/// Reasons a value is not accepted as a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    #[error("price must be a finite number")]
    NotFinite,
    #[error("price cannot be negative")]
    Negative,
}

/// A finite, non-negative unit price.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(f64);

impl Price {
    pub const ZERO: Self = Self(0.0);

    /// Validate a raw amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotFinite`] for NaN or infinities and
    /// [`PriceError::Negative`] for amounts below zero.
    pub fn new(amount: f64) -> Result<Self, PriceError> {
        if !amount.is_finite() {
            return Err(PriceError::NotFinite);
        }
        if amount < 0.0 {
            return Err(PriceError::Negative);
        }
        // Normalize -0.0 so it displays as 0.00.
        Ok(Self(amount.abs()))
    }

    #[must_use]
    pub const fn amount(self) -> f64 {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: i32) -> f64 {
        self.0 * f64::from(quantity)
    }
}

impl TryFrom<f64> for Price {
    type Error = PriceError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
