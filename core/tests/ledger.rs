use chrono::NaiveDate;
use commission_core::{
    ledger::{AuthorizedDiscountEntry, AuthorizedDiscountLedger, NewDiscountEntry},
    SettlementError,
};
use rust_decimal_macros::dec;

fn entry(amount: rust_decimal::Decimal, by: &str) -> NewDiscountEntry {
    NewDiscountEntry {
        amount,
        authorized_by: by.into(),
        date: NaiveDate::from_ymd_opt(2026, 3, 14),
        reservation_ref: "RES-0042".into(),
    }
}

#[test]
fn entries_get_increasing_ids_and_sum() {
    let mut ledger = AuthorizedDiscountLedger::new();
    let a = ledger.add_entry(&entry(dec!(1000), "Director")).unwrap();
    let b = ledger.add_entry(&entry(dec!(250.555), "Manager")).unwrap();

    assert_eq!(a, 1);
    assert_eq!(b, 2);
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger.get(b).unwrap().amount, dec!(250.56));
    assert_eq!(ledger.total_authorized(), dec!(1250.56));
}

#[test]
fn invalid_entries_are_rejected_with_field_errors() {
    let mut ledger = AuthorizedDiscountLedger::new();

    let err = ledger.add_entry(&entry(dec!(0), "")).unwrap_err();
    match err {
        SettlementError::Validation(errors) => {
            let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["amount", "authorized_by"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    assert!(ledger.add_entry(&entry(dec!(100), "   ")).is_err());
    assert!(ledger.is_empty());
    assert_eq!(ledger.total_authorized(), dec!(0));
}

#[test]
fn authorizer_name_is_trimmed() {
    let mut ledger = AuthorizedDiscountLedger::new();
    let id = ledger.add_entry(&entry(dec!(10), "  Director ")).unwrap();
    assert_eq!(ledger.get(id).unwrap().authorized_by, "Director");
}

#[test]
fn removal_keeps_ids_monotonic() {
    let mut ledger = AuthorizedDiscountLedger::new();
    let first = ledger.add_entry(&entry(dec!(100), "Director")).unwrap();
    ledger.add_entry(&entry(dec!(200), "Director")).unwrap();

    let removed = ledger.remove_entry(first).unwrap();
    assert_eq!(removed.amount, dec!(100));
    assert!(!ledger.contains(first));
    assert_eq!(ledger.total_authorized(), dec!(200));

    let third = ledger.add_entry(&entry(dec!(300), "Director")).unwrap();
    assert_eq!(third, 3);
}

#[test]
fn removing_unknown_id_fails() {
    let mut ledger = AuthorizedDiscountLedger::new();
    ledger.add_entry(&entry(dec!(100), "Director")).unwrap();

    let err = ledger.remove_entry(99).unwrap_err();
    assert!(matches!(err, SettlementError::EntryNotFound { id: 99 }));
    assert_eq!(ledger.len(), 1);
}

#[test]
fn rebuilt_ledger_continues_after_highest_id() {
    let stored = vec![
        AuthorizedDiscountEntry {
            id: 7,
            amount: dec!(50),
            authorized_by: "Director".into(),
            date: None,
            reservation_ref: String::new(),
        },
        AuthorizedDiscountEntry {
            id: 3,
            amount: dec!(25),
            authorized_by: "Manager".into(),
            date: None,
            reservation_ref: String::new(),
        },
    ];
    let mut ledger = AuthorizedDiscountLedger::from_entries(stored.clone(), 1);

    assert_eq!(ledger.entries()[0].id, 3);
    assert_eq!(ledger.total_authorized(), dec!(75));
    assert_eq!(ledger.add_entry(&entry(dec!(1), "Director")).unwrap(), 8);

    // A high-water mark above the stored ids wins: id 9 was removed earlier.
    let mut ledger = AuthorizedDiscountLedger::from_entries(stored, 10);
    assert_eq!(ledger.add_entry(&entry(dec!(1), "Director")).unwrap(), 10);
}

#[test]
fn lenient_amount_parses_comma_decimal() {
    let new: NewDiscountEntry =
        serde_json::from_str(r#"{"amount": "1.500,75", "authorized_by": "Director"}"#).unwrap();
    assert_eq!(new.amount, dec!(1500.75));
    assert!(new.validate().is_empty());
}
