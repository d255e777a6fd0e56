//! Discount franchise: the ceiling a consultant may discount without
//! penalty, and the excess clawed back in full from commission.
//!
//! Only the consultant's own discount counts here. Authorized discounts
//! never reach this module.

use crate::{
    money::round2,
    types::{Money, Rate},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Share of the franchise used from which the consultant is warned.
pub const USAGE_WARNING_PCT: Decimal = dec!(70);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FranchiseUsage {
    Comfortable,
    Warning,
    Exhausted,
}

impl FranchiseUsage {
    pub fn from_pct(usage_pct: Decimal) -> Self {
        if usage_pct >= Decimal::ONE_HUNDRED {
            FranchiseUsage::Exhausted
        } else if usage_pct >= USAGE_WARNING_PCT {
            FranchiseUsage::Warning
        } else {
            FranchiseUsage::Comfortable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FranchiseAssessment {
    pub rate:            Rate,
    pub ceiling:         Money,
    /// discount / sales, unrounded; zero when there are no sales.
    pub discount_ratio:  Rate,
    pub excess_discount: Money,
    /// Percentage of the ceiling consumed, capped at 100.
    pub usage_pct:       Decimal,
    pub usage:           FranchiseUsage,
    /// False under policies without discount rules: nothing is clawed back.
    pub enforced:        bool,
}

pub struct FranchiseEnforcer {
    franchise_rate: Rate,
    enforced:       bool,
}

impl FranchiseEnforcer {
    pub fn new(franchise_rate: Rate, enforced: bool) -> Self {
        Self { franchise_rate, enforced }
    }

    pub fn assess(&self, sales_revenue: Money, discount_given: Money) -> FranchiseAssessment {
        let ceiling = round2(sales_revenue * self.franchise_rate);
        let discount_ratio = discount_ratio(sales_revenue, discount_given);

        let excess_discount = if self.enforced {
            excess_discount(discount_given, ceiling)
        } else {
            Decimal::ZERO
        };

        // Measured against the unrounded ceiling.
        let usage_pct = discount_given
            .checked_div(sales_revenue * self.franchise_rate)
            .and_then(|used| used.checked_mul(Decimal::ONE_HUNDRED))
            .map_or(Decimal::ZERO, |pct| round2(pct).min(Decimal::ONE_HUNDRED));

        if excess_discount > Decimal::ZERO {
            log::info!(
                "franchise: discount {discount_given} exceeds ceiling {ceiling}, clawing back {excess_discount}"
            );
        }

        FranchiseAssessment {
            rate: self.franchise_rate,
            ceiling,
            discount_ratio,
            excess_discount,
            usage_pct,
            usage: FranchiseUsage::from_pct(usage_pct),
            enforced: self.enforced,
        }
    }
}

/// discount / sales, with "no sales, no ratio" as zero.
pub fn discount_ratio(sales_revenue: Money, discount_given: Money) -> Rate {
    if sales_revenue > Decimal::ZERO {
        discount_given.checked_div(sales_revenue).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    }
}

/// max(0, round2(discount - ceiling)).
pub fn excess_discount(discount_given: Money, ceiling: Money) -> Money {
    round2(discount_given - ceiling).max(Decimal::ZERO)
}
