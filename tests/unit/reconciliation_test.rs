// Reconciliation tests for customer balances against the collection ledger
//
// A customer's balances must always equal the replay of their non-voided
// ledger entries. These tests drive the model layer directly: record moves
// money via the allocation, void restores it from the entry's stored split.

use kistpay::modules::collections::models::{CollectionEntry, PaymentMode};
use kistpay::modules::collections::services::PaymentAllocator;
use kistpay::modules::customers::models::{AccountStatus, CustomerAccount};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Convert integer paise into a rupee Decimal
fn rupees(paise: u64) -> Decimal {
    Decimal::from(paise) / Decimal::from(100)
}

fn open_account(outstanding: Decimal, penalty: Decimal) -> CustomerAccount {
    CustomerAccount::new(
        "LN-2201".to_string(),
        "agent-7".to_string(),
        outstanding,
        penalty,
        dec!(1000),
    )
    .expect("Failed to create account")
}

/// Allocate, build the ledger entry, and apply it to the account
fn record(account: &mut CustomerAccount, amount: Decimal) -> CollectionEntry {
    let allocation = PaymentAllocator::allocate(
        amount,
        account.outstanding_amount,
        account.penalty_amount,
        account.emi_amount,
    )
    .expect("Failed to allocate");

    let entry = CollectionEntry::new(
        account.get_id().expect("Account has no ID").to_string(),
        "agent-7".to_string(),
        account.loan_id.clone(),
        amount,
        PaymentMode::Cash,
        account.emi_amount,
        &allocation,
        account.outstanding_amount,
        None,
        None,
        None,
        None,
    )
    .expect("Failed to build entry");

    account
        .apply_collection(&allocation)
        .expect("Failed to apply collection");

    entry
}

#[test]
fn test_collection_moves_every_balance() {
    let mut account = open_account(dec!(10000), dec!(500));

    let entry = record(&mut account, dec!(700));

    assert_eq!(account.outstanding_amount, dec!(9800));
    assert_eq!(account.penalty_amount, Decimal::ZERO);
    assert_eq!(account.total_paid, dec!(200));
    assert_eq!(account.get_status().unwrap(), AccountStatus::Active);

    assert_eq!(entry.penalty_paid, dec!(500));
    assert_eq!(entry.principal_paid, dec!(200));
    assert_eq!(entry.outstanding_before, dec!(10000));
    assert_eq!(entry.outstanding_after, dec!(9800));
}

#[test]
fn test_settling_total_due_closes_account() {
    let mut account = open_account(dec!(4000), dec!(350));

    record(&mut account, dec!(4350));

    assert_eq!(account.outstanding_amount, Decimal::ZERO);
    assert_eq!(account.penalty_amount, Decimal::ZERO);
    assert_eq!(account.total_paid, dec!(4000));
    assert_eq!(account.get_status().unwrap(), AccountStatus::Closed);
}

#[test]
fn test_void_restores_exact_balances() {
    let mut account = open_account(dec!(10000), dec!(500));

    let entry = record(&mut account, dec!(700));
    account
        .reverse_collection(&entry)
        .expect("Failed to reverse");

    assert_eq!(account.outstanding_amount, dec!(10000));
    assert_eq!(account.penalty_amount, dec!(500));
    assert_eq!(account.total_paid, Decimal::ZERO);
    assert_eq!(account.get_status().unwrap(), AccountStatus::Active);
}

#[test]
fn test_void_reopens_closed_account() {
    let mut account = open_account(dec!(4000), dec!(350));

    let entry = record(&mut account, dec!(4350));
    assert_eq!(account.get_status().unwrap(), AccountStatus::Closed);

    account
        .reverse_collection(&entry)
        .expect("Failed to reverse");

    assert_eq!(account.outstanding_amount, dec!(4000));
    assert_eq!(account.penalty_amount, dec!(350));
    assert_eq!(account.get_status().unwrap(), AccountStatus::Active);
}

#[test]
fn test_final_emi_with_zero_penalty_settles_and_reopens() {
    // Last EMI of a loan: nothing owed beyond one full installment
    let mut account = CustomerAccount::new(
        "LN-2202".to_string(),
        "agent-7".to_string(),
        dec!(500),
        dec!(0),
        dec!(500),
    )
    .expect("Failed to create account");

    let entry = record(&mut account, dec!(500));

    assert!(!entry.is_partial_payment);
    assert_eq!(entry.penalty_paid, Decimal::ZERO);
    assert_eq!(entry.outstanding_after, Decimal::ZERO);
    assert_eq!(account.get_status().unwrap(), AccountStatus::Closed);

    account
        .reverse_collection(&entry)
        .expect("Failed to reverse");

    assert_eq!(account.outstanding_amount, dec!(500));
    assert_eq!(account.get_status().unwrap(), AccountStatus::Active);
}

#[test]
fn test_ledger_replay_matches_running_balances() {
    let mut account = open_account(dec!(10000), dec!(500));
    let mut entries = Vec::new();

    for amount in [dec!(700), dec!(1000), dec!(250)] {
        entries.push(record(&mut account, amount));
    }

    // Entries chain: each starts where the previous one ended
    for pair in entries.windows(2) {
        assert_eq!(pair[0].outstanding_after, pair[1].outstanding_before);
    }

    let principal_total: Decimal = entries.iter().map(|e| e.principal_paid).sum();
    let penalty_total: Decimal = entries.iter().map(|e| e.penalty_paid).sum();

    assert_eq!(account.total_paid, principal_total);
    assert_eq!(account.outstanding_amount, dec!(10000) - principal_total);
    assert_eq!(account.penalty_amount, dec!(500) - penalty_total);
}

proptest! {
    /// Property: record followed by void is the identity on balances
    #[test]
    fn prop_record_then_void_is_identity(
        outstanding in 1u64..100_000_000u64,
        penalty in 0u64..1_000_000u64,
        amount in 1u64..5_000_000u64,
    ) {
        prop_assume!(amount <= outstanding + penalty);

        let mut account = open_account(rupees(outstanding), rupees(penalty));
        let opening_status = account.status.clone();

        let entry = record(&mut account, rupees(amount));
        account.reverse_collection(&entry).expect("Failed to reverse");

        prop_assert_eq!(account.outstanding_amount, rupees(outstanding));
        prop_assert_eq!(account.penalty_amount, rupees(penalty));
        prop_assert_eq!(account.total_paid, Decimal::ZERO);
        prop_assert_eq!(account.status, opening_status);
    }

    /// Property: after voiding any subset, balances equal the replay of the
    /// surviving entries alone
    #[test]
    fn prop_balances_equal_replay_of_surviving_entries(
        payments in prop::collection::vec((1u64..200_000u64, any::<bool>()), 1..6),
    ) {
        let opening_outstanding = rupees(10_000_000);
        let opening_penalty = rupees(50_000);
        let mut account = open_account(opening_outstanding, opening_penalty);

        let mut recorded = Vec::new();
        for (paise, void_later) in payments {
            let due = account.total_due();
            if due == Decimal::ZERO {
                break;
            }
            let amount = rupees(paise).min(due);
            let entry = record(&mut account, amount);
            recorded.push((entry, void_later));
        }

        for (entry, void_later) in &recorded {
            if *void_later {
                account.reverse_collection(entry).expect("Failed to reverse");
            }
        }

        let surviving: Vec<_> = recorded
            .iter()
            .filter(|(_, void_later)| !void_later)
            .map(|(entry, _)| entry)
            .collect();

        let principal_total: Decimal = surviving.iter().map(|e| e.principal_paid).sum();
        let penalty_total: Decimal = surviving.iter().map(|e| e.penalty_paid).sum();

        prop_assert_eq!(account.total_paid, principal_total);
        prop_assert_eq!(
            account.outstanding_amount,
            opening_outstanding - principal_total
        );
        prop_assert_eq!(account.penalty_amount, opening_penalty - penalty_total);
    }
}
