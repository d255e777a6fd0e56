//! Hospitality commission under either rule variant.
//!
//! Each segment is rounded on its own before summing. Besides the
//! consultant commission, every segment carries the agency margin and
//! the supplier pass-through rate the agency waterfall needs.

use crate::{
    config::HospitalityRules,
    input::HospitalityRevenue,
    money::{round2, sanitize},
    types::{Money, Rate},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalitySegment {
    pub label:             String,
    pub revenue:           Money,
    pub commission_rate:   Rate,
    pub commission:        Money,
    pub agency_margin:     Money,
    /// Kept as a rate: the waterfall sums unrounded pass-through terms
    /// and rounds once.
    pub pass_through_rate: Rate,
}

impl HospitalitySegment {
    pub fn pass_through(&self) -> Decimal {
        self.revenue * self.pass_through_rate
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HospitalityCommission {
    pub segments:      Vec<HospitalitySegment>,
    pub revenue:       Money,
    pub commission:    Money,
    pub agency_margin: Money,
}

pub struct HospitalitySegmentCalculator<'a> {
    rules: &'a HospitalityRules,
}

impl<'a> HospitalitySegmentCalculator<'a> {
    pub fn new(rules: &'a HospitalityRules) -> Self {
        Self { rules }
    }

    pub fn compute(&self, revenue: &HospitalityRevenue) -> HospitalityCommission {
        let segments = match self.rules {
            HospitalityRules::MarginBand { standard, high } => {
                let (standard_revenue, high_revenue) = match revenue {
                    HospitalityRevenue::MarginBand { standard, high } => (*standard, *high),
                    HospitalityRevenue::Volume { total } => {
                        log::warn!(
                            "hospitality: volume figure under margin-band rules, \
                             treating {total} as standard margin"
                        );
                        (*total, Decimal::ZERO)
                    }
                };
                vec![
                    margin_segment(&standard.label, standard_revenue, standard.commission_rate,
                                   standard.agency_margin_rate, standard.pass_through_rate()),
                    margin_segment(&high.label, high_revenue, high.commission_rate,
                                   high.agency_margin_rate, high.pass_through_rate()),
                ]
            }
            HospitalityRules::VolumeTiered { bands, agency_retained_rate } => {
                let total = sanitize(revenue.sanitized().total());
                let rate = bands
                    .iter()
                    .find(|b| b.upper_bound.map_or(true, |upper| total <= upper))
                    .or(bands.last())
                    .map_or(Decimal::ZERO, |b| b.commission_rate);
                vec![margin_segment(
                    "Hospitality",
                    total,
                    rate,
                    *agency_retained_rate - rate,
                    Decimal::ONE - *agency_retained_rate,
                )]
            }
        };

        let commission = round2(segments.iter().map(|s| s.commission).sum::<Decimal>());
        let agency_margin = round2(segments.iter().map(|s| s.agency_margin).sum::<Decimal>());
        let revenue = round2(segments.iter().map(|s| s.revenue).sum::<Decimal>());

        HospitalityCommission {
            segments,
            revenue,
            commission,
            agency_margin,
        }
    }
}

fn margin_segment(
    label: &str,
    revenue: Money,
    commission_rate: Rate,
    agency_margin_rate: Rate,
    pass_through_rate: Rate,
) -> HospitalitySegment {
    let revenue = sanitize(revenue);
    HospitalitySegment {
        label: label.to_string(),
        revenue,
        commission_rate,
        commission: round2(revenue * commission_rate),
        agency_margin: round2(revenue * agency_margin_rate),
        pass_through_rate,
    }
}
