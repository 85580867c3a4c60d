//! Behavioural tests for the ledger through its public API.
//!
//! Covers the payment state machine, error paths that must leave the ledger
//! untouched, aggregation and snapshot persistence.

use debt_ledger::{
    CustomerId, CustomerMetadata, DebtStatus, JsonFileStore, Ledger, LedgerError, MemoryStore,
    Money, SnapshotStore,
};
use std::str::FromStr;

fn money(s: &str) -> Money {
    Money::from_str(s).unwrap()
}

fn no_details() -> CustomerMetadata {
    CustomerMetadata::default()
}

// ==================== PAYMENT SCENARIOS ====================

#[test]
fn test_jane_pays_invoice_in_two_installments() {
    let mut ledger = Ledger::new();
    let jane = ledger.add_customer("Jane", no_details()).unwrap();
    let invoice = ledger
        .add_debt(jane.id(), "Invoice #1", money("1000"))
        .unwrap();

    let debt = ledger
        .record_installment(jane.id(), invoice.id(), money("600"))
        .unwrap();
    assert_eq!(debt.status(), DebtStatus::Unpaid);
    assert_eq!(debt.balance(), money("400"));

    let debt = ledger
        .record_installment(jane.id(), invoice.id(), money("400"))
        .unwrap();
    assert_eq!(debt.status(), DebtStatus::Paid);
    assert_eq!(debt.balance(), Money::ZERO);
}

#[test]
fn test_overpayment_is_accepted() {
    let mut ledger = Ledger::new();
    let customer = ledger.add_customer("Ali", no_details()).unwrap();
    let debt = ledger.add_debt(customer.id(), "Loan", money("500")).unwrap();

    let debt = ledger
        .record_installment(customer.id(), debt.id(), money("700"))
        .unwrap();
    assert_eq!(debt.paid_amount(), money("700"));
    assert_eq!(debt.balance(), money("-200"));
    assert_eq!(debt.status(), DebtStatus::Paid);
}

#[test]
fn test_paid_debt_accepts_further_payments_and_stays_paid() {
    let mut ledger = Ledger::new();
    let customer = ledger.add_customer("Ali", no_details()).unwrap();
    let debt = ledger.add_debt(customer.id(), "Loan", money("100")).unwrap();

    ledger
        .record_installment(customer.id(), debt.id(), money("100"))
        .unwrap();
    let debt = ledger
        .record_installment(customer.id(), debt.id(), money("5"))
        .unwrap();
    assert!(debt.is_paid());
    assert_eq!(debt.installments().len(), 2);
}

#[test]
fn test_paid_amount_tracks_running_sum() {
    let mut ledger = Ledger::new();
    let customer = ledger.add_customer("Wanjiku", no_details()).unwrap();
    let debt = ledger
        .add_debt(customer.id(), "Stock on credit", money("250"))
        .unwrap();

    let payments = ["10", "0.01", "39.99", "100", "75.5", "24.5", "3"];
    let mut running = Money::ZERO;

    for amount in payments {
        running += money(amount);
        let updated = ledger
            .record_installment(customer.id(), debt.id(), money(amount))
            .unwrap();

        assert_eq!(updated.paid_amount(), running);
        let recorded: Money = updated.installments().iter().map(|i| i.amount).sum();
        assert_eq!(updated.paid_amount(), recorded);
        assert_eq!(updated.is_paid(), running >= updated.principal());
        assert!(updated.check_invariant());
    }

    let debt = ledger.debt(customer.id(), debt.id()).unwrap();
    let dates: Vec<_> = debt.installments().iter().map(|i| i.date).collect();
    assert!(dates.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_debts_of_one_customer_are_independent() {
    let mut ledger = Ledger::new();
    let customer = ledger.add_customer("Jane", no_details()).unwrap();
    let first = ledger.add_debt(customer.id(), "First", money("100")).unwrap();
    let second = ledger.add_debt(customer.id(), "Second", money("100")).unwrap();

    ledger
        .record_installment(customer.id(), second.id(), money("100"))
        .unwrap();

    assert!(!ledger.debt(customer.id(), first.id()).unwrap().is_paid());
    assert!(ledger.debt(customer.id(), second.id()).unwrap().is_paid());
}

// ==================== ERROR PATHS ====================

#[test]
fn test_blank_names_create_nothing() {
    let mut ledger = Ledger::new();
    for name in ["", "   "] {
        let err = ledger.add_customer(name, no_details()).unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
    assert_eq!(ledger.totals().customer_count, 0);
}

#[test]
fn test_delete_unknown_customer_leaves_ledger_unchanged() {
    let mut ledger = Ledger::new();
    let customer = ledger.add_customer("Jane", no_details()).unwrap();
    ledger.add_debt(customer.id(), "Rent", money("300")).unwrap();
    let before = ledger.snapshot();
    let saves = ledger.store().save_count();

    let err = ledger.delete_customer(CustomerId(9999)).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(ledger.snapshot(), before);
    assert_eq!(ledger.store().save_count(), saves);
}

#[test]
fn test_repeated_delete_fails() {
    let mut ledger = Ledger::new();
    let customer = ledger.add_customer("Jane", no_details()).unwrap();

    assert!(ledger.delete_customer(customer.id()).is_ok());
    assert!(ledger.delete_customer(customer.id()).unwrap_err().is_not_found());
}

#[test]
fn test_invalid_payment_changes_nothing() {
    let mut ledger = Ledger::new();
    let customer = ledger.add_customer("Jane", no_details()).unwrap();
    let debt = ledger.add_debt(customer.id(), "Rent", money("300")).unwrap();
    let before = ledger.snapshot();

    assert!(ledger
        .record_installment(customer.id(), debt.id(), Money::ZERO)
        .unwrap_err()
        .is_validation());
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn test_ids_are_not_reused_after_delete() {
    let mut ledger = Ledger::new();
    let first = ledger.add_customer("Jane", no_details()).unwrap();
    ledger.delete_customer(first.id()).unwrap();

    let second = ledger.add_customer("Jane", no_details()).unwrap();
    assert_ne!(first.id(), second.id());
}

// ==================== TOTALS ====================

#[test]
fn test_outstanding_ignores_paid_and_overpaid_debts() {
    let mut ledger = Ledger::new();
    let jane = ledger.add_customer("Jane", no_details()).unwrap();
    let ali = ledger.add_customer("Ali", no_details()).unwrap();

    let open = ledger.add_debt(jane.id(), "Open", money("1000")).unwrap();
    let overpaid = ledger.add_debt(jane.id(), "Overpaid", money("500")).unwrap();
    let settled = ledger.add_debt(ali.id(), "Settled", money("200")).unwrap();

    ledger.record_installment(jane.id(), open.id(), money("100")).unwrap();
    ledger
        .record_installment(jane.id(), overpaid.id(), money("700"))
        .unwrap();
    ledger
        .record_installment(ali.id(), settled.id(), money("200"))
        .unwrap();

    let totals = ledger.totals();
    assert_eq!(totals.customer_count, 2);
    assert_eq!(totals.total_principal, money("1700"));
    assert_eq!(totals.total_paid, money("1000"));
    assert_eq!(totals.total_outstanding, money("900"));
}

#[test]
fn test_totals_of_empty_ledger() {
    let totals = Ledger::new().totals();
    assert_eq!(totals.customer_count, 0);
    assert_eq!(totals.debt_count, 0);
    assert_eq!(totals.total_outstanding, Money::ZERO);
}

// ==================== PERSISTENCE ====================

#[test]
fn test_every_mutation_saves_a_snapshot() {
    let mut ledger = Ledger::new();
    let customer = ledger.add_customer("Jane", no_details()).unwrap();
    let debt = ledger.add_debt(customer.id(), "Rent", money("300")).unwrap();
    ledger
        .record_installment(customer.id(), debt.id(), money("100"))
        .unwrap();

    assert_eq!(ledger.store().save_count(), 3);
    assert_eq!(ledger.store().saved(), Some(&ledger.snapshot()));
}

#[test]
fn test_reopen_from_memory_store() {
    let mut ledger = Ledger::new();
    let customer = ledger.add_customer("Jane", no_details()).unwrap();
    let debt = ledger.add_debt(customer.id(), "Rent", money("300")).unwrap();
    ledger
        .record_installment(customer.id(), debt.id(), money("300"))
        .unwrap();

    let store = MemoryStore::with_snapshot(ledger.snapshot());
    let reopened = Ledger::open(store).unwrap();
    assert_eq!(reopened.snapshot(), ledger.snapshot());
    assert!(reopened.debt(customer.id(), debt.id()).unwrap().is_paid());
}

#[test]
fn test_json_snapshot_round_trip_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = Ledger::open(JsonFileStore::new(dir.path())).unwrap();

    for name in ["Zawadi", "Amina", "Juma"] {
        let customer = ledger
            .add_customer(
                name,
                CustomerMetadata {
                    mobile_no: Some("0700000000".to_string()),
                    comment: Some(format!("{} pays weekly", name)),
                    ..CustomerMetadata::default()
                },
            )
            .unwrap();
        for (description, principal) in [("Flour", "900"), ("Sugar", "450")] {
            let debt = ledger
                .add_debt(customer.id(), description, money(principal))
                .unwrap();
            ledger
                .record_installment(customer.id(), debt.id(), money("150"))
                .unwrap();
            ledger
                .record_installment(customer.id(), debt.id(), money("50"))
                .unwrap();
        }
    }

    let store = JsonFileStore::new(dir.path());
    let loaded = store.load().unwrap();
    assert_eq!(loaded, ledger.snapshot());

    let names: Vec<_> = loaded.customers.iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["Zawadi", "Amina", "Juma"]);

    let mut copy = JsonFileStore::with_key(dir.path(), "copy");
    copy.save(&loaded).unwrap();
    assert_eq!(copy.load().unwrap(), loaded);
    assert_eq!(
        std::fs::read_to_string(copy.path()).unwrap(),
        std::fs::read_to_string(store.path()).unwrap()
    );
}

#[test]
fn test_reopen_from_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = Ledger::open(JsonFileStore::new(dir.path())).unwrap();
    ledger.add_customer("Jane", no_details()).unwrap();

    let reopened = Ledger::open(JsonFileStore::new(dir.path())).unwrap();
    assert_eq!(reopened.customers().len(), 1);
    assert_eq!(reopened.customers()[0].name(), "Jane");
}
