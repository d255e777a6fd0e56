//! Report export: plain text and JSON views of a settlement.
//!
//! The consultant view carries revenue, commission breakdown and net
//! payable. The agency view adds the margin waterfall and the ledger
//! audit table, and is only produced for elevated access.
//! Export is refused while identity fields are invalid.

use crate::{
    access::AccessLevel,
    badge::BadgeState,
    error::{EngineResult, SettlementError},
    franchise::FranchiseAssessment,
    input::{ConsultantIdentity, HospitalityRevenue},
    ledger::AuthorizedDiscountEntry,
    money::{format_brl, format_pct},
    settlement::{AgencyWaterfall, ConsultantSettlement, SettlementResult},
    tier_commission::TierCommission,
    types::Money,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

const WIDTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Text,
    Json,
}

/// What a consultant may see.
#[derive(Debug, Clone, Serialize)]
pub struct ConsultantView<'a> {
    pub identity:          &'a ConsultantIdentity,
    pub sales_revenue:     Money,
    pub hospitality:       &'a HospitalityRevenue,
    pub discount_given:    Money,
    pub total_authorized:  Money,
    pub badge:             &'a BadgeState,
    pub guidance:          Option<&'a str>,
    pub tier:              &'a TierCommission,
    pub franchise:         &'a FranchiseAssessment,
    pub settlement:        &'a ConsultantSettlement,
}

/// What the agency may see on top of the consultant view.
#[derive(Debug, Clone, Serialize)]
pub struct AgencyView<'a> {
    #[serde(flatten)]
    pub consultant:           ConsultantView<'a>,
    pub agency:               &'a AgencyWaterfall,
    pub commissionable_base:  Money,
    pub authorized_discounts: &'a [AuthorizedDiscountEntry],
}

pub fn consultant_view(result: &SettlementResult) -> ConsultantView<'_> {
    ConsultantView {
        identity:         &result.input.identity,
        sales_revenue:    result.input.sales_revenue,
        hospitality:      &result.input.hospitality,
        discount_given:   result.input.discount_given,
        total_authorized: result.total_authorized,
        badge:            &result.badge.state,
        guidance:         result.badge.guidance.as_deref(),
        tier:             &result.tier,
        franchise:        &result.franchise,
        settlement:       &result.consultant,
    }
}

pub fn agency_view(result: &SettlementResult) -> AgencyView<'_> {
    AgencyView {
        consultant: consultant_view(result),
        agency: &result.agency,
        commissionable_base: result.commissionable_base,
        authorized_discounts: &result.authorized_discounts,
    }
}

/// Render the report the access level allows, in the requested format.
pub fn export(
    result: &SettlementResult,
    access: AccessLevel,
    format: ExportFormat,
) -> EngineResult<String> {
    let errors = result.input.identity.validate();
    if !errors.is_empty() {
        log::warn!(
            "report: export refused, {} identity field(s) invalid",
            errors.len()
        );
        return Err(SettlementError::Validation(errors));
    }

    let rendered = match (format, access) {
        (ExportFormat::Text, AccessLevel::Consultant) => render_consultant_report(result),
        (ExportFormat::Text, AccessLevel::Agency)     => render_agency_report(result),
        (ExportFormat::Json, AccessLevel::Consultant) => {
            serde_json::to_string_pretty(&consultant_view(result))?
        }
        (ExportFormat::Json, AccessLevel::Agency) => {
            serde_json::to_string_pretty(&agency_view(result))?
        }
    };
    Ok(rendered)
}

pub fn render_consultant_report(result: &SettlementResult) -> String {
    let mut out = String::new();
    header(&mut out, "COMMISSION SETTLEMENT");
    identity_block(&mut out, result);
    audit_table(&mut out, result);

    section(&mut out, "REVENUE AND PERFORMANCE");
    line(&mut out, "Sales revenue", &format_brl(result.input.sales_revenue));
    for segment in &result.hospitality.segments {
        let label = format!("{} ({})", segment.label, format_pct(segment.commission_rate, 1));
        line(&mut out, &label, &format_brl(segment.revenue));
    }
    line(&mut out, "Consultant discount", &format_brl(result.input.discount_given));
    line(&mut out, "Authorized exemptions", &format_brl(result.total_authorized));
    line(&mut out, "Performance badge", result.badge.state.label());
    let bonus_label = format!(
        "Performance bonus ({})",
        format_pct(result.badge.state.bonus_percentage(), 1)
    );
    line(&mut out, &bonus_label, &format_brl(result.badge.performance_bonus));
    if let Some(guidance) = &result.badge.guidance {
        let _ = writeln!(out, "  > {guidance}");
    }

    section(&mut out, "COMMISSION BREAKDOWN");
    let tier = &result.tier;
    line(&mut out, "Bracket", &tier.label);
    let pct_label = format!("Sales commission ({})", format_pct(tier.percentage, 0));
    line(&mut out, &pct_label, &format_brl(tier.percentage_commission));
    let flat_label = if tier.is_fixed_stipend { "Fixed monthly stipend" } else { "Bracket addition" };
    line(&mut out, flat_label, &format_brl(tier.flat_addition));
    line(&mut out, "Goal bonus", &format_brl(tier.goal_bonus));
    line(&mut out, "Hospitality commission", &format_brl(result.hospitality.commission));
    line(&mut out, "Performance bonus", &format_brl(result.badge.performance_bonus));
    line(&mut out, "TOTAL COMMISSION", &format_brl(result.consultant.total_commission));

    section(&mut out, "FINAL SETTLEMENT");
    let c = &result.consultant;
    line(&mut out, "Total commission", &format_brl(c.total_commission));
    let franchise_label = format!(
        "Excess discount deduction (>{})",
        format_pct(result.franchise.rate, 0)
    );
    line(&mut out, &franchise_label, &deduction(c.excess_discount));
    line(&mut out, "Adjustments (reimbursements - advances)", &format_brl(c.adjustments));
    line(&mut out, "NET PAYABLE", &format_brl(c.net_payable));
    out
}

pub fn render_agency_report(result: &SettlementResult) -> String {
    let mut out = String::new();
    header(&mut out, "AGENCY SETTLEMENT");
    identity_block(&mut out, result);
    audit_table(&mut out, result);

    section(&mut out, "AGENCY CASH FLOW");
    let a = &result.agency;
    let c = &result.consultant;
    line(&mut out, "Gross revenue", &format_brl(a.gross_revenue));
    line(&mut out, "(-) Supplier pass-through", &format_brl(a.supplier_pass_through));
    line(&mut out, "(=) Agency gross margin", &format_brl(a.agency_gross_margin));
    line(&mut out, "(-) Discount given to client", &format_brl(a.discount_given));
    line(&mut out, "(=) Margin after discount", &format_brl(a.margin_after_discount));
    line(&mut out, "(-) Net commission paid", &format_brl(a.net_commission_paid));
    line(&mut out, "    Gross commission", &format_brl(c.total_commission));
    line(&mut out, "    Excess discount deduction", &deduction(c.excess_discount));
    line(&mut out, "    Adjustments", &format_brl(c.adjustments));
    line(&mut out, "(=) Invoice base", &format_brl(a.invoice_base));
    let tax_label = format!("(-) Estimated tax ({})", format_pct(a.tax_rate, 0));
    line(&mut out, &tax_label, &format_brl(a.estimated_tax));
    line(&mut out, "(=) AGENCY NET PROFIT", &format_brl(a.agency_net_profit));
    out.push('\n');
    line(&mut out, "Commissionable base", &format_brl(result.commissionable_base));
    line(&mut out, "Authorized exemptions (audited)", &format_brl(result.total_authorized));
    out
}

fn header(out: &mut String, title: &str) {
    let _ = writeln!(out, "{}", "=".repeat(WIDTH));
    let _ = writeln!(out, "{title:^WIDTH$}");
    let _ = writeln!(out, "{}", "=".repeat(WIDTH));
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out);
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));
}

fn line(out: &mut String, label: &str, value: &str) {
    let pad = WIDTH.saturating_sub(value.chars().count() + 1);
    let _ = writeln!(out, "{label:<pad$} {value}");
}

fn identity_block(out: &mut String, result: &SettlementResult) {
    let id = &result.input.identity;
    section(out, "CONSULTANT");
    line(out, "Name", or_dash(&id.name));
    line(out, "Tax id", or_dash(&id.tax_id));
    line(out, "Payout key", or_dash(&id.payout_key));
    line(out, "Performance status", result.badge.state.label());
}

fn audit_table(out: &mut String, result: &SettlementResult) {
    if result.authorized_discounts.is_empty() {
        return;
    }
    section(out, "AUTHORIZED DISCOUNT AUDIT");
    let _ = writeln!(out, "{:<18} {:<12} {:<14} {:>17}", "AUTHORIZED BY", "DATE", "RESERVATION", "AMOUNT");
    for entry in &result.authorized_discounts {
        let date = entry.date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default();
        let _ = writeln!(
            out,
            "{:<18} {:<12} {:<14} {:>17}",
            entry.authorized_by,
            date,
            entry.reservation_ref,
            format_brl(entry.amount)
        );
    }
}

fn deduction(amount: Money) -> String {
    if amount.is_zero() {
        format_brl(amount)
    } else {
        format!("- {}", format_brl(amount))
    }
}

fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "---" } else { value }
}
