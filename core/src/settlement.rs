//! Settlement aggregation: derives every figure of one period.
//!
//! DERIVATION ORDER (fixed):
//!   1. Sanitize the input snapshot
//!   2. Commissionable base = max(0, sales - authorized ledger total)
//!   3. Tier commission on the commissionable base
//!   4. Hospitality commission
//!   5. Franchise ceiling / excess on sales and the consultant's discount
//!   6. Badge classification on the same ratio
//!   7. Consultant totals and net payable
//!   8. Agency waterfall
//!
//! RULES:
//!   - Stages 3–6 are independent of each other; only stage 7–8 combine.
//!   - Every figure is rounded where it is derived.
//!   - The ledger only moves the commissionable base. Franchise and badge
//!     figures see raw sales and the consultant's own discount.
//!   - Net payable is never clamped. A negative value means the
//!     consultant owes the agency.
//!   - Agency figures are always computed; visibility is an export concern.

use crate::{
    badge::{BadgeAssessment, PerformanceBadgeClassifier},
    config::PolicyConfig,
    franchise::{FranchiseAssessment, FranchiseEnforcer},
    hospitality::{HospitalityCommission, HospitalitySegmentCalculator},
    input::SettlementInput,
    ledger::{AuthorizedDiscountEntry, AuthorizedDiscountLedger},
    money::round2,
    tier_commission::{TierCommission, TierCommissionResolver},
    types::{Money, Rate},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsultantSettlement {
    pub tier_commission:        Money,
    pub hospitality_commission: Money,
    pub performance_bonus:      Money,
    pub total_commission:       Money,
    pub excess_discount:        Money,
    /// reimbursements - advances
    pub adjustments:            Money,
    pub net_payable:            Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgencyWaterfall {
    pub gross_revenue:         Money,
    pub supplier_pass_through: Money,
    pub agency_gross_margin:   Money,
    pub discount_given:        Money,
    pub margin_after_discount: Money,
    pub net_commission_paid:   Money,
    pub invoice_base:          Money,
    pub tax_rate:              Rate,
    pub estimated_tax:         Money,
    pub agency_net_profit:     Money,
}

/// One immutable snapshot of a fully itemized settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementResult {
    pub policy_id:            String,
    pub input:                SettlementInput,
    pub commissionable_base:  Money,
    pub total_authorized:     Money,
    pub authorized_discounts: Vec<AuthorizedDiscountEntry>,
    pub tier:                 TierCommission,
    pub hospitality:          HospitalityCommission,
    pub franchise:            FranchiseAssessment,
    pub badge:                BadgeAssessment,
    pub consultant:           ConsultantSettlement,
    pub agency:               AgencyWaterfall,
}

pub struct SettlementAggregator<'a> {
    policy: &'a PolicyConfig,
}

impl<'a> SettlementAggregator<'a> {
    pub fn new(policy: &'a PolicyConfig) -> Self {
        Self { policy }
    }

    /// Compute a settlement from scratch. Total over any input: there is
    /// no error path.
    pub fn settle(
        &self,
        input: &SettlementInput,
        ledger: &AuthorizedDiscountLedger,
    ) -> SettlementResult {
        let policy = self.policy;
        let input = input.sanitized();
        let sales = input.sales_revenue;
        let discount = input.discount_given;

        let total_authorized = ledger.total_authorized();
        let commissionable_base = round2((sales - total_authorized).max(Decimal::ZERO));

        let tier = TierCommissionResolver::new(&policy.brackets).resolve(
            commissionable_base,
            input.has_fixed_stipend,
            input.fixed_stipend_amount,
        );

        let hospitality =
            HospitalitySegmentCalculator::new(&policy.hospitality).compute(&input.hospitality);

        let franchise = FranchiseEnforcer::new(policy.franchise_rate, policy.discount_rules_active)
            .assess(sales, discount);

        let badge = PerformanceBadgeClassifier::new(&policy.badge_tiers, policy.discount_rules_active)
            .assess(sales, discount, franchise.discount_ratio);

        let consultant = consultant_settlement(&input, &tier, &hospitality, &franchise, &badge);
        let agency = self.agency_waterfall(&input, commissionable_base, &hospitality, &consultant);

        log::debug!(
            "settlement: policy={} base={commissionable_base} commission={} net={}",
            policy.policy_id, consultant.total_commission, consultant.net_payable
        );

        SettlementResult {
            policy_id: policy.policy_id.clone(),
            input,
            commissionable_base,
            total_authorized,
            authorized_discounts: ledger.entries().to_vec(),
            tier,
            hospitality,
            franchise,
            badge,
            consultant,
            agency,
        }
    }

    fn agency_waterfall(
        &self,
        input: &SettlementInput,
        commissionable_base: Money,
        hospitality: &HospitalityCommission,
        consultant: &ConsultantSettlement,
    ) -> AgencyWaterfall {
        let policy = self.policy;

        let gross_revenue = round2(input.sales_revenue + hospitality.revenue);

        let hospitality_pass_through: Decimal =
            hospitality.segments.iter().map(|s| s.pass_through()).sum();
        let supplier_pass_through = round2(
            commissionable_base * policy.sales_pass_through_rate + hospitality_pass_through,
        );

        let agency_gross_margin = round2(
            commissionable_base * policy.sales_margin_rate
                + hospitality.segments.iter().map(|s| s.agency_margin).sum::<Decimal>(),
        );

        // The discount comes out of the agency's margin, not the supplier's.
        let margin_after_discount = round2(agency_gross_margin - input.discount_given);
        let net_commission_paid = round2(consultant.net_payable.max(Decimal::ZERO));
        let invoice_base = round2(margin_after_discount - net_commission_paid).max(Decimal::ZERO);
        let estimated_tax = round2(invoice_base * policy.tax_rate);
        let agency_net_profit = round2(invoice_base - estimated_tax);

        AgencyWaterfall {
            gross_revenue,
            supplier_pass_through,
            agency_gross_margin,
            discount_given: input.discount_given,
            margin_after_discount,
            net_commission_paid,
            invoice_base,
            tax_rate: policy.tax_rate,
            estimated_tax,
            agency_net_profit,
        }
    }
}

fn consultant_settlement(
    input: &SettlementInput,
    tier: &TierCommission,
    hospitality: &HospitalityCommission,
    franchise: &FranchiseAssessment,
    badge: &BadgeAssessment,
) -> ConsultantSettlement {
    let total_commission =
        round2(tier.total + hospitality.commission + badge.performance_bonus);
    let adjustments = round2(input.reimbursements - input.advances);
    let net_payable = round2(
        total_commission - franchise.excess_discount + input.reimbursements - input.advances,
    );

    ConsultantSettlement {
        tier_commission: tier.total,
        hospitality_commission: hospitality.commission,
        performance_bonus: badge.performance_bonus,
        total_commission,
        excess_discount: franchise.excess_discount,
        adjustments,
        net_payable,
    }
}

/// Compute a settlement under `policy`. Convenience over
/// `SettlementAggregator::new(policy).settle(..)`.
pub fn settle(
    input: &SettlementInput,
    ledger: &AuthorizedDiscountLedger,
    policy: &PolicyConfig,
) -> SettlementResult {
    SettlementAggregator::new(policy).settle(input, ledger)
}
