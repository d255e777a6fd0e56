//! Tier commission: maps commissionable revenue to a bracket.
//!
//! Selection is "first bracket whose upper bound is at or above the
//! revenue". A fixed stipend replaces only the bracket's flat addition;
//! the percentage commission and goal bonus are untouched.

use crate::{
    config::TierBracket,
    money::{round2, sanitize},
    types::{Money, Rate},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierCommission {
    pub bracket_index:         usize,
    pub label:                 String,
    pub percentage:            Rate,
    pub percentage_commission: Money,
    /// The bracket's flat addition, or the fixed stipend when one applies.
    pub flat_addition:         Money,
    pub goal_bonus:            Money,
    pub total:                 Money,
    pub is_fixed_stipend:      bool,
}

pub struct TierCommissionResolver<'a> {
    brackets: &'a [TierBracket],
}

impl<'a> TierCommissionResolver<'a> {
    pub fn new(brackets: &'a [TierBracket]) -> Self {
        Self { brackets }
    }

    /// The bracket covering `revenue`. Falls back to the last bracket so a
    /// table whose top edge is bounded still resolves.
    pub fn bracket_for(&self, revenue: Money) -> Option<(usize, &'a TierBracket)> {
        self.brackets
            .iter()
            .enumerate()
            .find(|(_, b)| b.covers(revenue))
            .or_else(|| self.brackets.iter().enumerate().last())
    }

    pub fn resolve(
        &self,
        revenue: Money,
        has_fixed_stipend: bool,
        fixed_stipend_amount: Money,
    ) -> TierCommission {
        let revenue = sanitize(revenue);

        let Some((index, bracket)) = self.bracket_for(revenue) else {
            log::warn!("tier: empty bracket table, commission resolves to zero");
            return TierCommission {
                bracket_index:         0,
                label:                 String::new(),
                percentage:            Decimal::ZERO,
                percentage_commission: Decimal::ZERO,
                flat_addition:         Decimal::ZERO,
                goal_bonus:            Decimal::ZERO,
                total:                 Decimal::ZERO,
                is_fixed_stipend:      has_fixed_stipend,
            };
        };

        let percentage_commission = round2(revenue * bracket.percentage);
        let flat_addition = if has_fixed_stipend {
            sanitize(fixed_stipend_amount)
        } else {
            bracket.flat_addition
        };
        let total = round2(percentage_commission + flat_addition + bracket.goal_bonus);

        log::debug!(
            "tier: revenue {revenue} -> '{}' ({} + {} + {} = {total})",
            bracket.label, percentage_commission, flat_addition, bracket.goal_bonus
        );

        TierCommission {
            bracket_index: index,
            label: bracket.label.clone(),
            percentage: bracket.percentage,
            percentage_commission,
            flat_addition,
            goal_bonus: bracket.goal_bonus,
            total,
            is_fixed_stipend: has_fixed_stipend,
        }
    }
}
