//! Hospitality commission tests: both rule variants.

use commission_core::{
    config::PolicyConfig,
    hospitality::HospitalitySegmentCalculator,
    input::HospitalityRevenue,
};
use rust_decimal_macros::dec;

#[test]
fn margin_band_rates_apply_per_segment() {
    let policy = PolicyConfig::margin_band();
    let result = HospitalitySegmentCalculator::new(&policy.hospitality).compute(
        &HospitalityRevenue::MarginBand { standard: dec!(10000), high: dec!(5000) },
    );

    assert_eq!(result.segments.len(), 2);
    assert_eq!(result.segments[0].commission, dec!(150));
    assert_eq!(result.segments[0].agency_margin, dec!(850));
    assert_eq!(result.segments[1].commission, dec!(500));
    assert_eq!(result.segments[1].agency_margin, dec!(1000));
    assert_eq!(result.commission, dec!(650));
    assert_eq!(result.agency_margin, dec!(1850));
    assert_eq!(result.revenue, dec!(15000));
}

#[test]
fn margin_band_segments_round_separately() {
    let policy = PolicyConfig::margin_band();
    // 333.33 × 1.5% = 4.99995 -> 5.00 ; 33.33 × 10% = 3.333 -> 3.33
    let result = HospitalitySegmentCalculator::new(&policy.hospitality).compute(
        &HospitalityRevenue::MarginBand { standard: dec!(333.33), high: dec!(33.33) },
    );
    assert_eq!(result.segments[0].commission, dec!(5.00));
    assert_eq!(result.segments[1].commission, dec!(3.33));
    assert_eq!(result.commission, dec!(8.33));
}

#[test]
fn volume_bands_apply_to_the_whole_amount() {
    let policy = PolicyConfig::volume_tiered();
    let calc = HospitalitySegmentCalculator::new(&policy.hospitality);

    let cases = [
        (dec!(10000), dec!(200)),     // 2%
        (dec!(10000.01), dec!(250)),  // 2.5% of the whole amount
        (dec!(30000), dec!(750)),
        (dec!(50000), dec!(1500)),    // 3%
        (dec!(60000), dec!(2100)),    // 3.5%
    ];
    for (revenue, expected) in cases {
        let result = calc.compute(&HospitalityRevenue::Volume { total: revenue });
        assert_eq!(result.commission, expected, "revenue {revenue}");
    }
}

#[test]
fn volume_agency_margin_is_retained_share_minus_commission() {
    let policy = PolicyConfig::volume_tiered();
    let result = HospitalitySegmentCalculator::new(&policy.hospitality)
        .compute(&HospitalityRevenue::Volume { total: dec!(30000) });

    let segment = &result.segments[0];
    assert_eq!(segment.commission, dec!(750));
    assert_eq!(segment.agency_margin, dec!(2850));
    assert_eq!(segment.pass_through(), dec!(26400));
    assert_eq!(segment.commission + segment.agency_margin + segment.pass_through(), dec!(30000));
}

#[test]
fn volume_rules_sum_margin_band_figures() {
    let policy = PolicyConfig::volume_tiered();
    let result = HospitalitySegmentCalculator::new(&policy.hospitality).compute(
        &HospitalityRevenue::MarginBand { standard: dec!(8000), high: dec!(4000) },
    );
    assert_eq!(result.revenue, dec!(12000));
    assert_eq!(result.commission, dec!(300));
}

#[test]
fn margin_band_rules_treat_volume_figure_as_standard_margin() {
    let policy = PolicyConfig::margin_band();
    let result = HospitalitySegmentCalculator::new(&policy.hospitality)
        .compute(&HospitalityRevenue::Volume { total: dec!(2000) });
    assert_eq!(result.segments[0].revenue, dec!(2000));
    assert_eq!(result.segments[1].revenue, dec!(0));
    assert_eq!(result.commission, dec!(30));
}

#[test]
fn no_hospitality_revenue_yields_zero() {
    for policy in [PolicyConfig::margin_band(), PolicyConfig::volume_tiered()] {
        let result = HospitalitySegmentCalculator::new(&policy.hospitality)
            .compute(&HospitalityRevenue::default());
        assert_eq!(result.commission, dec!(0));
        assert_eq!(result.agency_margin, dec!(0));
    }
}
