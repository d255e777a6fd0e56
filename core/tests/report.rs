use commission_core::{
    access::{AccessLevel, PassphraseAuthorizer},
    report::{self, ExportFormat},
    settle, AuthorizedDiscountLedger, ConsultantIdentity, HospitalityRevenue, NewDiscountEntry,
    PolicyConfig, SettlementError, SettlementInput, SettlementResult,
};
use rust_decimal_macros::dec;

fn identity() -> ConsultantIdentity {
    ConsultantIdentity {
        name:       "Ana Souza".into(),
        tax_id:     "12345678909".into(),
        payout_key: "ana@pix.example".into(),
    }
}

fn worked_example(identity: ConsultantIdentity) -> SettlementResult {
    let input = SettlementInput {
        identity,
        sales_revenue: dec!(25000),
        discount_given: dec!(750),
        hospitality: HospitalityRevenue::MarginBand { standard: dec!(10000), high: dec!(5000) },
        reimbursements: dec!(200),
        advances: dec!(100),
        ..Default::default()
    };
    let mut ledger = AuthorizedDiscountLedger::new();
    ledger
        .add_entry(&NewDiscountEntry {
            amount: dec!(1000),
            authorized_by: "Director".into(),
            reservation_ref: "RES-0042".into(),
            ..Default::default()
        })
        .unwrap();
    settle(&input, &ledger, &PolicyConfig::margin_band())
}

#[test]
fn consultant_text_report_hides_agency_figures() {
    let result = worked_example(identity());
    let text = report::export(&result, AccessLevel::Consultant, ExportFormat::Text).unwrap();

    assert!(text.contains("COMMISSION SETTLEMENT"));
    assert!(text.contains("Gold Seller"));
    assert!(text.contains("R$ 4.220,00"), "net payable missing:\n{text}");
    assert!(text.contains("Director"), "audit table missing:\n{text}");
    assert!(!text.contains("AGENCY NET PROFIT"));
    assert!(!text.contains("Invoice base"));
}

#[test]
fn agency_text_report_shows_waterfall() {
    let result = worked_example(identity());
    let text = report::export(&result, AccessLevel::Agency, ExportFormat::Text).unwrap();

    assert!(text.contains("AGENCY NET PROFIT"));
    assert!(text.contains("R$ 5.880,00"), "invoice base missing:\n{text}");
    assert!(text.contains("R$ 5.527,20"), "net profit missing:\n{text}");
    assert!(text.contains("Estimated tax (6%)"));
}

#[test]
fn json_views_differ_by_access() {
    let result = worked_example(identity());

    let consultant: serde_json::Value = serde_json::from_str(
        &report::export(&result, AccessLevel::Consultant, ExportFormat::Json).unwrap(),
    )
    .unwrap();
    assert!(consultant.get("agency").is_none());
    assert!(consultant.get("settlement").is_some());

    let agency: serde_json::Value = serde_json::from_str(
        &report::export(&result, AccessLevel::Agency, ExportFormat::Json).unwrap(),
    )
    .unwrap();
    assert!(agency.get("agency").is_some());
    assert!(agency.get("settlement").is_some());
    assert_eq!(agency["authorized_discounts"].as_array().unwrap().len(), 1);
}

#[test]
fn export_refused_until_identity_is_valid() {
    let mut bad = identity();
    bad.tax_id = "123".into();
    bad.payout_key = String::new();
    let result = worked_example(bad);

    let err = report::export(&result, AccessLevel::Consultant, ExportFormat::Text).unwrap_err();
    match err {
        SettlementError::Validation(errors) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["tax_id", "payout_key"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    // The figures themselves are still available.
    let text = report::render_consultant_report(&result);
    let payout = text.lines().find(|l| l.starts_with("Payout key")).unwrap();
    assert!(payout.ends_with("---"), "payout line: {payout}");
}

#[test]
fn wrong_passphrase_keeps_consultant_access() {
    let auth = PassphraseAuthorizer::new("open-sesame");
    assert_eq!(AccessLevel::from_credential(&auth, Some("guess")), AccessLevel::Consultant);
    assert_eq!(AccessLevel::from_credential(&auth, None), AccessLevel::Consultant);
    assert_eq!(AccessLevel::from_credential(&auth, Some("open-sesame")), AccessLevel::Agency);
}
