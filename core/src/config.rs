//! Settlement policy configuration.
//!
//! A policy is the tagged configuration that selects the bracket table,
//! the hospitality rule set, the badge tiers and whether the
//! franchise/badge discount rules are active. Two built-in policies
//! ship with the engine; others can be loaded from JSON.

use crate::{
    error::{EngineResult, SettlementError},
    types::{Money, Rate},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// One commission bracket. `upper_bound = None` is the unbounded top bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierBracket {
    pub lower_bound:   Money,
    pub upper_bound:   Option<Money>,
    pub label:         String,
    pub percentage:    Rate,
    pub flat_addition: Money,
    pub goal_bonus:    Money,
}

impl TierBracket {
    /// True when `revenue` is at or below this bracket's upper edge.
    pub fn covers(&self, revenue: Money) -> bool {
        self.upper_bound.map_or(true, |upper| revenue <= upper)
    }
}

/// One performance badge. Tiers are evaluated in ascending ratio order;
/// a ratio above the last tier is the margin alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeTier {
    pub max_discount_ratio: Rate,
    pub label:              String,
    pub bonus_percentage:   Rate,
}

/// Commission and agency-margin rates for one hospitality margin band.
/// The supplier receives whatever the two rates leave over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginBandRate {
    pub label:              String,
    pub commission_rate:    Rate,
    pub agency_margin_rate: Rate,
}

impl MarginBandRate {
    pub fn pass_through_rate(&self) -> Rate {
        Decimal::ONE - self.commission_rate - self.agency_margin_rate
    }
}

/// A volume band; the rate applies to the whole amount, not marginally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeBand {
    pub upper_bound:     Option<Money>,
    pub commission_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum HospitalityRules {
    /// Standard- and high-margin sales, each with a fixed rate.
    MarginBand {
        standard: MarginBandRate,
        high:     MarginBandRate,
    },
    /// A single figure classified into ascending volume bands.
    /// The agency retains `agency_retained_rate` of the revenue, out of
    /// which the consultant commission is paid.
    VolumeTiered {
        bands:                Vec<VolumeBand>,
        agency_retained_rate: Rate,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    pub policy_id:               String,
    pub label:                   String,
    pub brackets:                Vec<TierBracket>,
    pub hospitality:             HospitalityRules,
    pub badge_tiers:             Vec<BadgeTier>,
    /// When false, no performance bonus is paid and excess discount is
    /// not clawed back. Ceiling and ratio are still reported.
    pub discount_rules_active:   bool,
    pub franchise_rate:          Rate,
    pub sales_pass_through_rate: Rate,
    pub sales_margin_rate:       Rate,
    pub tax_rate:                Rate,
}

impl PolicyConfig {
    /// Reference policy: margin-band hospitality, badges and franchise on.
    pub fn margin_band() -> Self {
        Self {
            policy_id: "margin_band".into(),
            label: "Margin-band hospitality with performance badges".into(),
            brackets: reference_brackets(),
            hospitality: HospitalityRules::MarginBand {
                standard: MarginBandRate {
                    label:              "Standard-margin hospitality".into(),
                    commission_rate:    dec!(0.015),
                    agency_margin_rate: dec!(0.085),
                },
                high: MarginBandRate {
                    label:              "High-margin hospitality".into(),
                    commission_rate:    dec!(0.10),
                    agency_margin_rate: dec!(0.20),
                },
            },
            badge_tiers: reference_badges(),
            discount_rules_active:   true,
            franchise_rate:          dec!(0.10),
            sales_pass_through_rate: dec!(0.625),
            sales_margin_rate:       dec!(0.375),
            tax_rate:                dec!(0.06),
        }
    }

    /// Earlier rule set: volume-tiered hospitality, no badge or
    /// franchise enforcement.
    pub fn volume_tiered() -> Self {
        Self {
            policy_id: "volume_tiered".into(),
            label: "Volume-tiered hospitality without discount rules".into(),
            brackets: reference_brackets(),
            hospitality: HospitalityRules::VolumeTiered {
                bands: vec![
                    VolumeBand { upper_bound: Some(dec!(10000)), commission_rate: dec!(0.02) },
                    VolumeBand { upper_bound: Some(dec!(30000)), commission_rate: dec!(0.025) },
                    VolumeBand { upper_bound: Some(dec!(50000)), commission_rate: dec!(0.03) },
                    VolumeBand { upper_bound: None,              commission_rate: dec!(0.035) },
                ],
                agency_retained_rate: dec!(0.12),
            },
            badge_tiers: reference_badges(),
            discount_rules_active:   false,
            franchise_rate:          dec!(0.10),
            sales_pass_through_rate: dec!(0.625),
            sales_margin_rate:       dec!(0.375),
            tax_rate:                dec!(0.06),
        }
    }

    /// Resolve a built-in policy by id.
    pub fn builtin(policy_id: &str) -> Option<Self> {
        match policy_id {
            "margin_band" | "margin-band"     => Some(Self::margin_band()),
            "volume_tiered" | "volume-tiered" => Some(Self::volume_tiered()),
            _ => None,
        }
    }

    /// Load a policy from a JSON file and validate it.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let policy: PolicyConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        policy.validate()?;
        log::info!("config: loaded policy '{}' from {path}", policy.policy_id);
        Ok(policy)
    }

    /// Check the structural rules the engine relies on:
    /// brackets contiguous from 0 and ending unbounded, badge tiers
    /// ascending, every rate within [0, 1].
    pub fn validate(&self) -> EngineResult<()> {
        let fail = |reason: String| SettlementError::InvalidPolicy {
            policy_id: self.policy_id.clone(),
            reason,
        };

        let first = self
            .brackets
            .first()
            .ok_or_else(|| fail("no commission brackets".into()))?;
        if !first.lower_bound.is_zero() {
            return Err(fail(format!("first bracket '{}' must start at 0", first.label)));
        }
        for pair in self.brackets.windows(2) {
            let upper = pair[0].upper_bound.ok_or_else(|| {
                fail(format!("bracket '{}' is unbounded but not last", pair[0].label))
            })?;
            if upper <= pair[0].lower_bound {
                return Err(fail(format!("bracket '{}' is empty", pair[0].label)));
            }
            // Brackets are whole-currency ranges: "10 001 to 21 000" follows "up to 10 000".
            let expected = [upper, upper + Decimal::ONE, upper + dec!(0.01)];
            if !expected.contains(&pair[1].lower_bound) {
                return Err(fail(format!(
                    "gap or overlap between '{}' and '{}'",
                    pair[0].label, pair[1].label
                )));
            }
        }
        if self.brackets.last().and_then(|b| b.upper_bound).is_some() {
            return Err(fail("last bracket must be unbounded".into()));
        }

        for pair in self.badge_tiers.windows(2) {
            if pair[1].max_discount_ratio <= pair[0].max_discount_ratio {
                return Err(fail(format!(
                    "badge '{}' must have a higher ratio than '{}'",
                    pair[1].label, pair[0].label
                )));
            }
        }

        let mut rates: Vec<(&str, Rate)> = vec![
            ("franchise_rate", self.franchise_rate),
            ("sales_pass_through_rate", self.sales_pass_through_rate),
            ("sales_margin_rate", self.sales_margin_rate),
            ("tax_rate", self.tax_rate),
        ];
        rates.extend(self.brackets.iter().map(|b| (b.label.as_str(), b.percentage)));
        rates.extend(self.badge_tiers.iter().map(|b| (b.label.as_str(), b.bonus_percentage)));
        match &self.hospitality {
            HospitalityRules::MarginBand { standard, high } => {
                for band in [standard, high] {
                    rates.push((band.label.as_str(), band.commission_rate));
                    rates.push((band.label.as_str(), band.pass_through_rate()));
                }
            }
            HospitalityRules::VolumeTiered { bands, agency_retained_rate } => {
                if bands.last().map_or(true, |b| b.upper_bound.is_some()) {
                    return Err(fail("last volume band must be unbounded".into()));
                }
                rates.push(("agency_retained_rate", *agency_retained_rate));
                for band in bands {
                    rates.push(("volume band", band.commission_rate));
                    if band.commission_rate > *agency_retained_rate {
                        return Err(fail(
                            "volume band commission exceeds the agency retained rate".into(),
                        ));
                    }
                }
            }
        }
        if let Some((name, rate)) = rates
            .into_iter()
            .find(|(_, r)| *r < Decimal::ZERO || *r > Decimal::ONE)
        {
            return Err(fail(format!("rate for '{name}' out of range: {rate}")));
        }

        Ok(())
    }
}

fn bracket(
    lower: Decimal,
    upper: Option<Decimal>,
    label: &str,
    percentage: Decimal,
    flat_addition: Decimal,
    goal_bonus: Decimal,
) -> TierBracket {
    TierBracket {
        lower_bound: lower,
        upper_bound: upper,
        label: label.into(),
        percentage,
        flat_addition,
        goal_bonus,
    }
}

fn reference_brackets() -> Vec<TierBracket> {
    vec![
        bracket(dec!(0),      Some(dec!(10000)),  "Up to 10,000",       dec!(0.10), dec!(0),    dec!(0)),
        bracket(dec!(10001),  Some(dec!(21000)),  "10,001 to 21,000",   dec!(0.02), dec!(1700), dec!(0)),
        bracket(dec!(21001),  Some(dec!(31000)),  "21,001 to 31,000",   dec!(0.03), dec!(2000), dec!(500)),
        bracket(dec!(31001),  Some(dec!(41000)),  "31,001 to 41,000",   dec!(0.04), dec!(2000), dec!(800)),
        bracket(dec!(41001),  Some(dec!(51000)),  "41,001 to 51,000",   dec!(0.05), dec!(2000), dec!(1200)),
        bracket(dec!(51001),  Some(dec!(100000)), "51,001 to 100,000",  dec!(0.06), dec!(2000), dec!(1500)),
        bracket(dec!(100001), None,               "Above 100,000",      dec!(0.06), dec!(2000), dec!(3000)),
    ]
}

fn reference_badges() -> Vec<BadgeTier> {
    vec![
        BadgeTier { max_discount_ratio: dec!(0.03), label: "Gold Seller".into(),   bonus_percentage: dec!(0.01) },
        BadgeTier { max_discount_ratio: dec!(0.07), label: "Silver Seller".into(), bonus_percentage: dec!(0.005) },
        BadgeTier { max_discount_ratio: dec!(0.10), label: "Bronze Seller".into(), bonus_percentage: dec!(0.002) },
    ]
}
