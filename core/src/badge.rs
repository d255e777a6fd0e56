//! Performance badges: the consultant's discount discipline.
//!
//! The discount ratio is classified into the first tier whose ceiling
//! holds it. Above every tier sits the margin alert; without sales the
//! state is neutral. For each tier the classifier also reports how much
//! more discount fits before the tier is lost.

use crate::{
    config::BadgeTier,
    money::{format_brl, format_pct, round2},
    types::{Money, Rate},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const NO_SALES_LABEL: &str = "No Sales";
pub const ALERT_LABEL:    &str = "Margin Alert";
pub const DISABLED_LABEL: &str = "Not Applicable";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BadgeState {
    NoSales,
    /// The policy runs without badges.
    Disabled,
    /// `rank` 0 is the best tier.
    Earned {
        rank:             usize,
        label:            String,
        bonus_percentage: Rate,
    },
    Alert,
}

impl BadgeState {
    pub fn label(&self) -> &str {
        match self {
            BadgeState::NoSales           => NO_SALES_LABEL,
            BadgeState::Disabled          => DISABLED_LABEL,
            BadgeState::Earned { label, .. } => label,
            BadgeState::Alert             => ALERT_LABEL,
        }
    }

    pub fn bonus_percentage(&self) -> Rate {
        match self {
            BadgeState::Earned { bonus_percentage, .. } => *bonus_percentage,
            _ => Decimal::ZERO,
        }
    }

    /// Position on the badge ladder, lower is better. Alert sits below
    /// every tier; neutral states have no standing.
    pub fn standing(&self, tier_count: usize) -> Option<usize> {
        match self {
            BadgeState::Earned { rank, .. } => Some(*rank),
            BadgeState::Alert => Some(tier_count),
            BadgeState::NoSales | BadgeState::Disabled => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeHeadroom {
    pub label:              String,
    pub max_discount_ratio: Rate,
    /// Largest discount compatible with holding this tier.
    pub tier_ceiling:       Money,
    /// Discount still available before the tier is lost; zero once lost.
    pub headroom:           Money,
    /// True once the discount is above the tier ceiling. Distinguishes
    /// "no headroom left, tier held" from "tier lost".
    pub lost:               bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeAssessment {
    pub state:             BadgeState,
    pub performance_bonus: Money,
    pub headrooms:         Vec<BadgeHeadroom>,
    pub guidance:          Option<String>,
}

pub struct PerformanceBadgeClassifier<'a> {
    tiers:  &'a [BadgeTier],
    active: bool,
}

impl<'a> PerformanceBadgeClassifier<'a> {
    pub fn new(tiers: &'a [BadgeTier], active: bool) -> Self {
        Self { tiers, active }
    }

    /// Classify a ratio alone. Monotonic: a larger ratio never yields a
    /// better state.
    pub fn classify(&self, sales_revenue: Money, discount_ratio: Rate) -> BadgeState {
        if !self.active {
            return BadgeState::Disabled;
        }
        if sales_revenue <= Decimal::ZERO {
            return BadgeState::NoSales;
        }
        self.tiers
            .iter()
            .enumerate()
            .find(|(_, tier)| discount_ratio <= tier.max_discount_ratio)
            .map_or(BadgeState::Alert, |(rank, tier)| BadgeState::Earned {
                rank,
                label: tier.label.clone(),
                bonus_percentage: tier.bonus_percentage,
            })
    }

    pub fn assess(
        &self,
        sales_revenue: Money,
        discount_given: Money,
        discount_ratio: Rate,
    ) -> BadgeAssessment {
        let state = self.classify(sales_revenue, discount_ratio);
        let performance_bonus = round2(sales_revenue * state.bonus_percentage());

        let headrooms: Vec<BadgeHeadroom> = if self.active {
            self.tiers
                .iter()
                .map(|tier| {
                    let tier_ceiling = round2(sales_revenue * tier.max_discount_ratio);
                    BadgeHeadroom {
                        label: tier.label.clone(),
                        max_discount_ratio: tier.max_discount_ratio,
                        tier_ceiling,
                        headroom: round2((tier_ceiling - discount_given).max(Decimal::ZERO)),
                        // Same test as `classify`: the rounded ceiling can
                        // sit a cent above the exact one.
                        lost: discount_ratio > tier.max_discount_ratio,
                    }
                })
                .collect()
        } else {
            Vec::new()
        };

        let guidance = self.guidance(&state, &headrooms);

        BadgeAssessment {
            state,
            performance_bonus,
            headrooms,
            guidance,
        }
    }

    fn guidance(&self, state: &BadgeState, headrooms: &[BadgeHeadroom]) -> Option<String> {
        match state {
            BadgeState::Earned { rank, label, .. } => {
                let headroom = format_brl(headrooms.get(*rank)?.headroom);
                let text = if *rank == 0 {
                    format!(
                        "You hold {label}. You can still give up to {headroom} in discount without losing it."
                    )
                } else if *rank + 1 == self.tiers.len() {
                    format!(
                        "Attention: you hold {label}. Only {headroom} of discount remains before losing every badge."
                    )
                } else {
                    let better = &self.tiers[*rank - 1].label;
                    format!(
                        "You hold {label}. Grow sales without discount to recover {better}. \
                         {headroom} of discount remains to keep {label}."
                    )
                };
                Some(text)
            }
            BadgeState::Alert => {
                let ceiling = self
                    .tiers
                    .last()
                    .map_or_else(String::new, |t| format!(" of {}", format_pct(t.max_discount_ratio, 0)));
                Some(format!(
                    "Discount above the franchise{ceiling}: the excess is deducted in full from your commission."
                ))
            }
            BadgeState::NoSales | BadgeState::Disabled => None,
        }
    }
}
