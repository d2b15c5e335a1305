use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::{money, AppError, Result};

/// Result of splitting one payment between penalty and principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Allocation {
    /// Portion applied to the accrued penalty
    pub penalty_paid: Decimal,

    /// Portion applied to the outstanding principal
    pub principal_paid: Decimal,

    /// Outstanding principal after applying the principal portion
    pub outstanding_after: Decimal,

    /// True when the payment fell short of the EMI due
    pub is_partial_payment: bool,
}

/// Penalty-first payment allocator
///
/// Policy: accrued penalty is cleared before any money reaches principal.
/// Pure arithmetic with no I/O, so the same inputs always produce the same
/// split; both the recording workflow and the tests rely on that.
pub struct PaymentAllocator;

impl PaymentAllocator {
    /// Split a collection amount against a customer's current balances
    ///
    /// # Arguments
    /// * `collection_amount` - Money received; must be positive and within
    ///   the total due
    /// * `outstanding_amount` - Principal currently remaining
    /// * `penalty_amount` - Penalty currently accrued
    /// * `emi_amount` - Standard EMI, the partial-payment threshold
    ///
    /// # Returns
    /// * `Result<Allocation>` - The split, or a validation error
    pub fn allocate(
        collection_amount: Decimal,
        outstanding_amount: Decimal,
        penalty_amount: Decimal,
        emi_amount: Decimal,
    ) -> Result<Allocation> {
        money::validate_amount(collection_amount).map_err(AppError::validation)?;

        if collection_amount <= Decimal::ZERO {
            return Err(AppError::validation(
                "Collection amount must be positive".to_string(),
            ));
        }

        let total_due = outstanding_amount + penalty_amount;
        if collection_amount > total_due {
            return Err(AppError::validation(format!(
                "Collection amount {} exceeds total due {}",
                collection_amount, total_due
            )));
        }

        let penalty_paid = collection_amount.min(penalty_amount);
        let principal_paid = collection_amount - penalty_paid;
        let outstanding_after = (outstanding_amount - principal_paid).max(Decimal::ZERO);
        let is_partial_payment = collection_amount < emi_amount;

        Ok(Allocation {
            penalty_paid,
            principal_paid,
            outstanding_after,
            is_partial_payment,
        })
    }
}
