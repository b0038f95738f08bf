//! Amounts in minor currency units.
//!
//! All amounts are stored as integer kobo (1/100 naira). Decimal arithmetic
//! only appears at the edges: pricing by weight and formatting for display.

use core::fmt;
use core::ops::{Add, Sub};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// An amount of money in kobo.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct Kobo(i64);

impl Kobo {
    /// Zero kobo.
    pub const ZERO: Self = Self(0);

    /// Kobo per naira.
    pub const PER_NAIRA: i64 = 100;

    /// Create an amount from kobo.
    #[must_use]
    pub const fn new(kobo: i64) -> Self {
        Self(kobo)
    }

    /// Create an amount from whole naira.
    #[must_use]
    pub const fn from_naira(naira: i64) -> Self {
        Self(naira * Self::PER_NAIRA)
    }

    /// The raw kobo value.
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// The amount in naira as an exact decimal.
    #[must_use]
    pub fn to_naira(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Whole naira contained in this amount (truncated).
    #[must_use]
    pub const fn whole_naira(&self) -> i64 {
        self.0 / Self::PER_NAIRA
    }

    /// Multiply by an item count.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * i64::from(quantity))
    }

    /// Multiply by a decimal factor (e.g. a weight in kilograms), rounding
    /// half away from zero to the nearest kobo.
    ///
    /// Returns `None` if the result does not fit in an `i64`.
    #[must_use]
    pub fn scale(self, factor: Decimal) -> Option<Self> {
        Decimal::from(self.0)
            .checked_mul(factor)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }

    /// Subtract, returning `None` if the result would be negative.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        if other.0 > self.0 {
            None
        } else {
            Some(Self(self.0 - other.0))
        }
    }

    /// Format for display, e.g. `₦1,250.00`.
    #[must_use]
    pub fn display(&self) -> String {
        let negative = self.0 < 0;
        let abs = self.0.unsigned_abs();
        let naira = abs / 100;
        let kobo = abs % 100;

        let digits = naira.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }

        format!("{}₦{grouped}.{kobo:02}", if negative { "-" } else { "" })
    }
}

impl fmt::Display for Kobo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl Add for Kobo {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Kobo {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl core::iter::Sum for Kobo {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<i64> for Kobo {
    fn from(kobo: i64) -> Self {
        Self(kobo)
    }
}

/// Errors building [`OrderAmounts`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderAmountsError {
    /// An amount was below zero.
    #[error("amounts cannot be negative")]
    Negative,
    /// The discount exceeds the order total.
    #[error("discount {discount} exceeds total {total}")]
    DiscountExceedsTotal {
        /// Order total.
        total: Kobo,
        /// Requested discount.
        discount: Kobo,
    },
    /// A stored final amount disagrees with total minus discount.
    #[error("final amount {final_amount} does not equal {total} - {discount}")]
    Inconsistent {
        /// Stored total.
        total: Kobo,
        /// Stored discount.
        discount: Kobo,
        /// Stored final amount.
        final_amount: Kobo,
    },
}

/// The three amounts carried by an order.
///
/// Constructed values always satisfy `final = total - discount` with
/// `0 <= discount <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderAmounts {
    #[serde(rename = "total_amount")]
    total: Kobo,
    #[serde(rename = "discount_amount")]
    discount: Kobo,
    final_amount: Kobo,
}

impl OrderAmounts {
    /// Build amounts from a total and a discount.
    ///
    /// # Errors
    ///
    /// Returns an error if either amount is negative or the discount exceeds
    /// the total.
    pub const fn new(total: Kobo, discount: Kobo) -> Result<Self, OrderAmountsError> {
        if total.0 < 0 || discount.0 < 0 {
            return Err(OrderAmountsError::Negative);
        }
        match total.checked_sub(discount) {
            Some(final_amount) => Ok(Self {
                total,
                discount,
                final_amount,
            }),
            None => Err(OrderAmountsError::DiscountExceedsTotal { total, discount }),
        }
    }

    /// Rebuild amounts read back from storage, checking the stored final amount.
    ///
    /// # Errors
    ///
    /// Returns [`OrderAmountsError::Inconsistent`] when the stored final
    /// amount is not `total - discount`.
    pub fn from_stored(
        total: Kobo,
        discount: Kobo,
        final_amount: Kobo,
    ) -> Result<Self, OrderAmountsError> {
        let amounts = Self::new(total, discount)?;
        if amounts.final_amount != final_amount {
            return Err(OrderAmountsError::Inconsistent {
                total,
                discount,
                final_amount,
            });
        }
        Ok(amounts)
    }

    /// Sum of all item prices.
    #[must_use]
    pub const fn total(&self) -> Kobo {
        self.total
    }

    /// Discount applied to the total.
    #[must_use]
    pub const fn discount(&self) -> Kobo {
        self.discount
    }

    /// Amount payable.
    #[must_use]
    pub const fn final_amount(&self) -> Kobo {
        self.final_amount
    }
}
