//! End-to-end settlement scenarios under both built-in policies.

use commission_core::{
    badge::BadgeState,
    money::MAX_AMOUNT,
    settle, AuthorizedDiscountLedger, ConsultantIdentity, HospitalityRevenue, NewDiscountEntry,
    PolicyConfig, SettlementInput,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn input(sales: Decimal, discount: Decimal) -> SettlementInput {
    SettlementInput {
        identity: ConsultantIdentity {
            name:       "Ana Souza".into(),
            tax_id:     "123.456.789-09".into(),
            payout_key: "ana@pix.example".into(),
        },
        sales_revenue: sales,
        discount_given: discount,
        ..Default::default()
    }
}

fn director(amount: Decimal) -> NewDiscountEntry {
    NewDiscountEntry {
        amount,
        authorized_by: "Director".into(),
        ..Default::default()
    }
}

#[test]
fn full_period_with_ledger_and_hospitality() {
    let policy = PolicyConfig::margin_band();
    let mut period = input(dec!(25000), dec!(750));
    period.hospitality = HospitalityRevenue::MarginBand { standard: dec!(10000), high: dec!(5000) };
    period.reimbursements = dec!(200);
    period.advances = dec!(100);

    let mut ledger = AuthorizedDiscountLedger::new();
    ledger.add_entry(&director(dec!(1000))).unwrap();

    let result = settle(&period, &ledger, &policy);

    assert_eq!(result.total_authorized, dec!(1000));
    assert_eq!(result.commissionable_base, dec!(24000));
    assert_eq!(result.tier.label, "21,001 to 31,000");
    assert_eq!(result.tier.total, dec!(3220)); // 720 + 2000 + 500
    assert_eq!(result.hospitality.commission, dec!(650));
    assert_eq!(result.badge.state.label(), "Gold Seller");

    let c = &result.consultant;
    assert_eq!(c.performance_bonus, dec!(250));
    assert_eq!(c.total_commission, dec!(4120));
    assert_eq!(c.excess_discount, dec!(0));
    assert_eq!(c.adjustments, dec!(100));
    assert_eq!(c.net_payable, dec!(4220));

    let a = &result.agency;
    assert_eq!(a.gross_revenue, dec!(40000));
    assert_eq!(a.supplier_pass_through, dec!(27500));
    assert_eq!(a.agency_gross_margin, dec!(10850));
    assert_eq!(a.margin_after_discount, dec!(10100));
    assert_eq!(a.net_commission_paid, dec!(4220));
    assert_eq!(a.invoice_base, dec!(5880));
    assert_eq!(a.estimated_tax, dec!(352.80));
    assert_eq!(a.agency_net_profit, dec!(5527.20));
}

#[test]
fn gross_revenue_splits_without_leakage() {
    let policy = PolicyConfig::margin_band();
    let mut period = input(dec!(25000), dec!(0));
    period.hospitality = HospitalityRevenue::MarginBand { standard: dec!(10000), high: dec!(5000) };
    let mut ledger = AuthorizedDiscountLedger::new();
    ledger.add_entry(&director(dec!(1000))).unwrap();

    let result = settle(&period, &ledger, &policy);
    let a = &result.agency;
    // Revenue = pass-through + agency margin + hospitality commission + ledger-exempt sales.
    assert_eq!(
        a.supplier_pass_through + a.agency_gross_margin + result.hospitality.commission
            + result.total_authorized,
        a.gross_revenue
    );
}

#[test]
fn fixed_stipend_scenario() {
    let policy = PolicyConfig::margin_band();
    let mut period = input(dec!(35000), dec!(0));
    period.has_fixed_stipend = true;
    period.fixed_stipend_amount = dec!(5000);

    let result = settle(&period, &AuthorizedDiscountLedger::new(), &policy);
    assert_eq!(result.tier.label, "31,001 to 41,000");
    assert_eq!(result.tier.total, dec!(7200));
    assert!(result.tier.is_fixed_stipend);
}

#[test]
fn empty_period_settles_to_zero() {
    let policy = PolicyConfig::margin_band();
    let result = settle(&SettlementInput::default(), &AuthorizedDiscountLedger::new(), &policy);

    assert_eq!(result.badge.state, BadgeState::NoSales);
    assert_eq!(result.franchise.discount_ratio, dec!(0));
    assert_eq!(result.franchise.ceiling, dec!(0));
    assert_eq!(result.consultant.excess_discount, dec!(0));
    assert_eq!(result.tier.total, dec!(0));
    assert_eq!(result.consultant.net_payable, dec!(0));
    assert_eq!(result.agency.agency_net_profit, dec!(0));
}

#[test]
fn net_payable_may_go_negative() {
    let policy = PolicyConfig::margin_band();
    let mut period = input(dec!(10000), dec!(5000));
    period.advances = dec!(500);

    let result = settle(&period, &AuthorizedDiscountLedger::new(), &policy);

    assert_eq!(result.franchise.excess_discount, dec!(4000));
    assert_eq!(result.badge.state, BadgeState::Alert);
    assert_eq!(result.consultant.total_commission, dec!(1000));
    assert_eq!(result.consultant.net_payable, dec!(-3500));

    // The agency pays nothing out and its invoice base floors at zero.
    assert_eq!(result.agency.net_commission_paid, dec!(0));
    assert_eq!(result.agency.margin_after_discount, dec!(-1250));
    assert_eq!(result.agency.invoice_base, dec!(0));
    assert_eq!(result.agency.estimated_tax, dec!(0));
}

#[test]
fn ledger_moves_only_the_commissionable_base() {
    let policy = PolicyConfig::margin_band();
    let period = input(dec!(25000), dec!(1500));

    let empty = AuthorizedDiscountLedger::new();
    let mut ledger = AuthorizedDiscountLedger::new();
    ledger.add_entry(&director(dec!(5000))).unwrap();

    let without = settle(&period, &empty, &policy);
    let with = settle(&period, &ledger, &policy);

    assert_eq!(with.commissionable_base, dec!(20000));
    assert_ne!(with.tier, without.tier);
    assert_eq!(with.franchise, without.franchise);
    assert_eq!(with.badge, without.badge);
    assert_eq!(with.consultant.excess_discount, without.consultant.excess_discount);
}

#[test]
fn ledger_larger_than_sales_floors_base_at_zero() {
    let policy = PolicyConfig::margin_band();
    let mut ledger = AuthorizedDiscountLedger::new();
    ledger.add_entry(&director(dec!(50000))).unwrap();

    let result = settle(&input(dec!(20000), dec!(0)), &ledger, &policy);
    assert_eq!(result.commissionable_base, dec!(0));
    assert_eq!(result.tier.total, dec!(0));
    assert_eq!(result.badge.state.label(), "Gold Seller");
}

#[test]
fn negative_inputs_are_clamped_before_settling() {
    let policy = PolicyConfig::margin_band();
    let mut period = input(dec!(-100), dec!(-5));
    period.reimbursements = dec!(-20);

    let result = settle(&period, &AuthorizedDiscountLedger::new(), &policy);
    assert_eq!(result.input.sales_revenue, dec!(0));
    assert_eq!(result.input.discount_given, dec!(0));
    assert_eq!(result.consultant.net_payable, dec!(0));
}

#[test]
fn volume_policy_settles_without_discount_rules() {
    let policy = PolicyConfig::volume_tiered();
    let mut period = input(dec!(25000), dec!(3000));
    period.hospitality = HospitalityRevenue::Volume { total: dec!(30000) };

    let result = settle(&period, &AuthorizedDiscountLedger::new(), &policy);

    assert_eq!(result.policy_id, policy.policy_id);
    assert_eq!(result.hospitality.commission, dec!(750));
    assert_eq!(result.franchise.excess_discount, dec!(0));
    assert_eq!(result.badge.state, BadgeState::Disabled);
    assert_eq!(result.consultant.performance_bonus, dec!(0));
    // 25000 × 3% + 2000 + 500
    assert_eq!(result.tier.total, dec!(3250));
    assert_eq!(result.consultant.total_commission, dec!(4000));
    assert_eq!(result.consultant.net_payable, dec!(4000));
}

#[test]
fn settling_twice_is_deterministic() {
    let policy = PolicyConfig::margin_band();
    let mut period = input(dec!(48123.45), dec!(2111.11));
    period.hospitality = HospitalityRevenue::MarginBand { standard: dec!(3210.10), high: dec!(987.65) };
    let ledger = AuthorizedDiscountLedger::new();

    assert_eq!(settle(&period, &ledger, &policy), settle(&period, &ledger, &policy));
}

#[test]
fn oversized_inputs_clamp_instead_of_overflowing() {
    let mut period = input(Decimal::MAX, Decimal::MAX);
    period.hospitality = HospitalityRevenue::MarginBand { standard: Decimal::MAX, high: Decimal::MAX };
    period.reimbursements = Decimal::MAX;
    period.has_fixed_stipend = true;
    period.fixed_stipend_amount = Decimal::MAX;
    let mut ledger = AuthorizedDiscountLedger::new();
    ledger.add_entry(&director(Decimal::MAX)).unwrap();
    assert_eq!(ledger.total_authorized(), MAX_AMOUNT);

    for policy in [PolicyConfig::margin_band(), PolicyConfig::volume_tiered()] {
        let result = settle(&period, &ledger, &policy);
        assert_eq!(result.input.sales_revenue, MAX_AMOUNT);
        assert!(result.hospitality.revenue >= MAX_AMOUNT);
        assert!(result.agency.gross_revenue > MAX_AMOUNT);
        assert!(result.consultant.net_payable > Decimal::ZERO);
    }
}

#[test]
fn huge_json_amounts_settle_at_the_cap() {
    let period: SettlementInput = serde_json::from_str(
        r#"{"sales_revenue": 7e28, "discount_given": 1e21,
            "hospitality": {"kind": "margin_band", "standard": 7e28}}"#,
    )
    .unwrap();
    assert_eq!(period.sales_revenue, MAX_AMOUNT);
    assert_eq!(period.discount_given, MAX_AMOUNT);

    let result = settle(&period, &AuthorizedDiscountLedger::new(), &PolicyConfig::margin_band());
    assert_eq!(result.badge.state, BadgeState::Alert);
    assert_eq!(result.franchise.excess_discount, MAX_AMOUNT - result.franchise.ceiling);
}
