// Property-based tests for the penalty-first payment allocator
//
// The allocator is pure arithmetic, so these tests pin down the algebra:
// every paisa of a collection lands in exactly one bucket, penalty is
// always cleared before principal, and no balance ever goes negative.

use kistpay::modules::collections::services::PaymentAllocator;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Convert integer paise into a rupee Decimal
fn rupees(paise: u64) -> Decimal {
    Decimal::from(paise) / Decimal::from(100)
}

#[test]
fn test_emi_sized_collection_mid_loan() {
    let allocation =
        PaymentAllocator::allocate(dec!(1500), dec!(20000), dec!(350), dec!(1500)).unwrap();

    assert_eq!(allocation.penalty_paid, dec!(350));
    assert_eq!(allocation.principal_paid, dec!(1150));
    assert_eq!(allocation.outstanding_after, dec!(18850));
    assert!(!allocation.is_partial_payment);
}

#[test]
fn test_collection_below_emi_is_flagged_partial() {
    let allocation =
        PaymentAllocator::allocate(dec!(900), dec!(20000), dec!(0), dec!(1500)).unwrap();

    assert_eq!(allocation.principal_paid, dec!(900));
    assert!(allocation.is_partial_payment);
}

#[test]
fn test_settlement_of_total_due_clears_outstanding() {
    // Paying exactly outstanding + penalty is the largest acceptable amount
    let allocation =
        PaymentAllocator::allocate(dec!(4350), dec!(4000), dec!(350), dec!(1500)).unwrap();

    assert_eq!(allocation.penalty_paid, dec!(350));
    assert_eq!(allocation.principal_paid, dec!(4000));
    assert_eq!(allocation.outstanding_after, Decimal::ZERO);
}

#[test]
fn test_one_paisa_over_total_due_is_rejected() {
    let result = PaymentAllocator::allocate(dec!(4350.01), dec!(4000), dec!(350), dec!(1500));
    assert!(result.is_err(), "Amount above total due must be rejected");
}

proptest! {
    /// Property: the split conserves the collected amount exactly
    #[test]
    fn prop_split_conserves_amount(
        amount in 1u64..5_000_000u64,
        outstanding in 1u64..100_000_000u64,
        penalty in 0u64..1_000_000u64,
    ) {
        prop_assume!(amount <= outstanding + penalty);

        let allocation = PaymentAllocator::allocate(
            rupees(amount),
            rupees(outstanding),
            rupees(penalty),
            dec!(1500),
        ).expect("Failed to allocate");

        prop_assert_eq!(
            allocation.penalty_paid + allocation.principal_paid,
            rupees(amount),
            "Split must sum exactly to the collected amount"
        );
    }

    /// Property: penalty is never overpaid
    #[test]
    fn prop_penalty_never_overpaid(
        amount in 1u64..5_000_000u64,
        outstanding in 1u64..100_000_000u64,
        penalty in 0u64..1_000_000u64,
    ) {
        prop_assume!(amount <= outstanding + penalty);

        let allocation = PaymentAllocator::allocate(
            rupees(amount),
            rupees(outstanding),
            rupees(penalty),
            dec!(1500),
        ).expect("Failed to allocate");

        prop_assert!(allocation.penalty_paid <= rupees(penalty));
        prop_assert!(allocation.penalty_paid <= rupees(amount));
        prop_assert!(allocation.principal_paid >= Decimal::ZERO);
    }

    /// Property: principal reduces outstanding exactly, never below zero
    #[test]
    fn prop_outstanding_reduced_exactly(
        amount in 1u64..5_000_000u64,
        outstanding in 1u64..100_000_000u64,
        penalty in 0u64..1_000_000u64,
    ) {
        prop_assume!(amount <= outstanding + penalty);

        let allocation = PaymentAllocator::allocate(
            rupees(amount),
            rupees(outstanding),
            rupees(penalty),
            dec!(1500),
        ).expect("Failed to allocate");

        // Within the total-due cap the principal portion fits inside the
        // outstanding balance, so no clamping happens
        prop_assert_eq!(
            allocation.outstanding_after,
            rupees(outstanding) - allocation.principal_paid
        );
        prop_assert!(allocation.outstanding_after >= Decimal::ZERO);
    }

    /// Property: the partial flag mirrors the EMI comparison
    #[test]
    fn prop_partial_flag_matches_emi(
        amount in 1u64..5_000_000u64,
        emi in 1u64..500_000u64,
    ) {
        let allocation = PaymentAllocator::allocate(
            rupees(amount),
            rupees(100_000_000),
            Decimal::ZERO,
            rupees(emi),
        ).expect("Failed to allocate");

        prop_assert_eq!(allocation.is_partial_payment, rupees(amount) < rupees(emi));
    }

    /// Property: a run of collections never loses or invents money
    #[test]
    fn prop_collection_sequence_conserves_money(
        payments in prop::collection::vec(1u64..200_000u64, 1..8),
    ) {
        let mut outstanding = rupees(10_000_000);
        let mut penalty = rupees(50_000);
        let opening_total = outstanding + penalty;
        let mut collected = Decimal::ZERO;

        for paise in payments {
            let due = outstanding + penalty;
            if due == Decimal::ZERO {
                break;
            }
            let amount = rupees(paise).min(due);

            let allocation = PaymentAllocator::allocate(
                amount,
                outstanding,
                penalty,
                dec!(1500),
            ).expect("Failed to allocate");

            outstanding = allocation.outstanding_after;
            penalty -= allocation.penalty_paid;
            collected += amount;
        }

        prop_assert_eq!(
            outstanding + penalty,
            opening_total - collected,
            "Remaining due must shrink by exactly the money collected"
        );
        prop_assert!(outstanding >= Decimal::ZERO);
        prop_assert!(penalty >= Decimal::ZERO);
    }

    /// Property: amounts beyond the total due are always rejected
    #[test]
    fn prop_rejects_amount_above_total_due(
        outstanding in 0u64..1_000_000u64,
        penalty in 0u64..100_000u64,
        excess in 1u64..1_000_000u64,
    ) {
        let result = PaymentAllocator::allocate(
            rupees(outstanding + penalty + excess),
            rupees(outstanding),
            rupees(penalty),
            dec!(1500),
        );

        prop_assert!(result.is_err());
    }
}
