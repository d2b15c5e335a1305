use crate::core::{money, AppError, Result};
use crate::modules::collections::models::CollectionEntry;
use crate::modules::collections::services::allocation::Allocation;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// Customer account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    /// Loan running, balances outstanding
    Active,

    /// Both outstanding principal and penalty are fully cleared
    Closed,

    /// Behind on payments; classification owned by the risk process
    Defaulter,

    /// Non-performing asset; classification owned by the risk process
    Npa,
}

impl AccountStatus {
    /// Derive the status implied by the current balances.
    ///
    /// Both workflows (recording and void) call this one function so the
    /// closed/active transitions can never diverge:
    /// - both balances zero, the account is `Closed`
    /// - a positive balance on a `Closed` account reopens it as `Active`
    /// - otherwise the current status stands; `defaulter`/`npa` are assigned
    ///   by the external risk process and are never derived here
    pub fn derive(outstanding: Decimal, penalty: Decimal, current: AccountStatus) -> AccountStatus {
        if outstanding <= Decimal::ZERO && penalty <= Decimal::ZERO {
            AccountStatus::Closed
        } else if current == AccountStatus::Closed {
            AccountStatus::Active
        } else {
            current
        }
    }
}

impl Default for AccountStatus {
    fn default() -> Self {
        AccountStatus::Active
    }
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "active"),
            AccountStatus::Closed => write!(f, "closed"),
            AccountStatus::Defaulter => write!(f, "defaulter"),
            AccountStatus::Npa => write!(f, "npa"),
        }
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "active" => Ok(AccountStatus::Active),
            "closed" => Ok(AccountStatus::Closed),
            "defaulter" => Ok(AccountStatus::Defaulter),
            "npa" => Ok(AccountStatus::Npa),
            _ => Err(format!("Invalid account status: {}", s)),
        }
    }
}

/// Customer balance aggregate
///
/// The balance subset of the customer record owned by this service. The full
/// customer profile (KYC, contact details) lives with the external profile
/// service; only the collection workflows mutate these fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomerAccount {
    /// Unique customer ID (UUID)
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    /// Loan identifier, denormalized onto every ledger entry at recording time
    pub loan_id: String,

    /// Field agent this customer is assigned to
    pub assigned_agent_id: String,

    /// Principal remaining on the loan
    pub outstanding_amount: Decimal,

    /// Accrued penalty remaining, collected before principal
    pub penalty_amount: Decimal,

    /// Cumulative principal collected; grows on collection, shrinks on void
    pub total_paid: Decimal,

    /// Standard EMI, the partial-payment threshold
    pub emi_amount: Decimal,

    /// Account status (active, closed, defaulter, npa)
    pub status: String,

    /// Creation timestamp
    #[serde(skip_deserializing)]
    pub created_at: Option<DateTime<Utc>>,

    /// Last update timestamp
    #[serde(skip_deserializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CustomerAccount {
    /// Create a new customer account
    ///
    /// # Arguments
    /// * `loan_id` - Loan identifier
    /// * `assigned_agent_id` - Field agent responsible for this customer
    /// * `outstanding_amount` - Opening principal balance
    /// * `penalty_amount` - Opening penalty balance
    /// * `emi_amount` - Standard EMI amount
    ///
    /// # Returns
    /// * `Result<CustomerAccount>` - New account instance
    pub fn new(
        loan_id: String,
        assigned_agent_id: String,
        outstanding_amount: Decimal,
        penalty_amount: Decimal,
        emi_amount: Decimal,
    ) -> Result<Self> {
        if loan_id.trim().is_empty() {
            return Err(AppError::validation("Loan ID cannot be empty".to_string()));
        }

        if assigned_agent_id.trim().is_empty() {
            return Err(AppError::validation(
                "Assigned agent ID cannot be empty".to_string(),
            ));
        }

        money::validate_amount(outstanding_amount).map_err(AppError::validation)?;
        money::validate_amount(penalty_amount).map_err(AppError::validation)?;

        if emi_amount <= Decimal::ZERO {
            return Err(AppError::validation(
                "EMI amount must be positive".to_string(),
            ));
        }

        let status = AccountStatus::derive(outstanding_amount, penalty_amount, AccountStatus::Active);

        Ok(Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            loan_id,
            assigned_agent_id,
            outstanding_amount,
            penalty_amount,
            total_paid: Decimal::ZERO,
            emi_amount,
            status: status.to_string(),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        })
    }

    /// Get account ID
    pub fn get_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Get account status
    pub fn get_status(&self) -> Result<AccountStatus> {
        AccountStatus::from_str(&self.status)
            .map_err(|e| AppError::Internal(format!("Invalid account status: {}", e)))
    }

    /// Everything the customer currently owes (principal plus penalty)
    pub fn total_due(&self) -> Decimal {
        self.outstanding_amount + self.penalty_amount
    }

    /// Apply one completed collection to the balances.
    ///
    /// The allocation already carries the penalty/principal split and the new
    /// outstanding figure, so this only moves the aggregate and re-derives
    /// the status.
    pub fn apply_collection(&mut self, allocation: &Allocation) -> Result<()> {
        let current = self.get_status()?;

        self.outstanding_amount = allocation.outstanding_after;
        self.penalty_amount = money::round(self.penalty_amount - allocation.penalty_paid);
        self.total_paid = money::round(self.total_paid + allocation.principal_paid);
        self.status =
            AccountStatus::derive(self.outstanding_amount, self.penalty_amount, current).to_string();
        self.updated_at = Some(Utc::now());

        Ok(())
    }

    /// Reverse a voided collection onto the balances.
    ///
    /// Restores exactly from the entry's stored split; nothing is recomputed,
    /// so a void after later EMI changes still reverses the original money.
    pub fn reverse_collection(&mut self, entry: &CollectionEntry) -> Result<()> {
        let current = self.get_status()?;

        self.outstanding_amount = money::round(self.outstanding_amount + entry.principal_paid);
        self.penalty_amount = money::round(self.penalty_amount + entry.penalty_paid);
        self.total_paid = money::round(self.total_paid - entry.principal_paid);
        self.status =
            AccountStatus::derive(self.outstanding_amount, self.penalty_amount, current).to_string();
        self.updated_at = Some(Utc::now());

        Ok(())
    }
}

/// Balance figures returned alongside a recorded collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub outstanding_amount: Decimal,
    pub penalty_amount: Decimal,
    pub total_paid: Decimal,
    pub status: String,
}

impl From<&CustomerAccount> for BalanceSnapshot {
    fn from(account: &CustomerAccount) -> Self {
        Self {
            outstanding_amount: account.outstanding_amount,
            penalty_amount: account.penalty_amount,
            total_paid: account.total_paid,
            status: account.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::collections::models::PaymentMode;
    use rust_decimal_macros::dec;

    fn account(outstanding: Decimal, penalty: Decimal, emi: Decimal) -> CustomerAccount {
        CustomerAccount::new(
            "loan-001".to_string(),
            "agent-7".to_string(),
            outstanding,
            penalty,
            emi,
        )
        .unwrap()
    }

    #[test]
    fn test_account_creation_valid() {
        let account = account(dec!(10000), dec!(500), dec!(1000));

        assert!(account.id.is_some());
        assert_eq!(account.outstanding_amount, dec!(10000));
        assert_eq!(account.penalty_amount, dec!(500));
        assert_eq!(account.total_paid, Decimal::ZERO);
        assert_eq!(account.status, "active");
        assert_eq!(account.total_due(), dec!(10500));
    }

    #[test]
    fn test_account_creation_rejects_bad_input() {
        assert!(CustomerAccount::new(
            "".to_string(),
            "agent-7".to_string(),
            dec!(10000),
            dec!(0),
            dec!(1000),
        )
        .is_err());

        assert!(CustomerAccount::new(
            "loan-001".to_string(),
            "agent-7".to_string(),
            dec!(-1),
            dec!(0),
            dec!(1000),
        )
        .is_err());

        assert!(CustomerAccount::new(
            "loan-001".to_string(),
            "agent-7".to_string(),
            dec!(10000),
            dec!(0),
            dec!(0),
        )
        .is_err());
    }

    #[test]
    fn test_zero_balance_account_starts_closed() {
        let account = account(dec!(0), dec!(0), dec!(500));
        assert_eq!(account.status, "closed");
    }

    #[test]
    fn test_derive_status_truth_table() {
        use AccountStatus::*;

        // Both zero closes the account regardless of where it was
        assert_eq!(AccountStatus::derive(dec!(0), dec!(0), Active), Closed);
        assert_eq!(AccountStatus::derive(dec!(0), dec!(0), Defaulter), Closed);
        assert_eq!(AccountStatus::derive(dec!(0), dec!(0), Closed), Closed);

        // Positive balance reopens a closed account
        assert_eq!(AccountStatus::derive(dec!(500), dec!(0), Closed), Active);
        assert_eq!(AccountStatus::derive(dec!(0), dec!(50), Closed), Active);

        // Otherwise the current status stands
        assert_eq!(AccountStatus::derive(dec!(500), dec!(0), Active), Active);
        assert_eq!(AccountStatus::derive(dec!(500), dec!(0), Defaulter), Defaulter);
        assert_eq!(AccountStatus::derive(dec!(500), dec!(0), Npa), Npa);
    }

    #[test]
    fn test_apply_collection_moves_balances() {
        let mut account = account(dec!(10000), dec!(500), dec!(1000));
        let allocation = Allocation {
            penalty_paid: dec!(500),
            principal_paid: dec!(200),
            outstanding_after: dec!(9800),
            is_partial_payment: true,
        };

        account.apply_collection(&allocation).unwrap();

        assert_eq!(account.outstanding_amount, dec!(9800));
        assert_eq!(account.penalty_amount, dec!(0));
        assert_eq!(account.total_paid, dec!(200));
        assert_eq!(account.status, "active");
    }

    #[test]
    fn test_apply_collection_closes_cleared_account() {
        let mut account = account(dec!(500), dec!(0), dec!(500));
        let allocation = Allocation {
            penalty_paid: dec!(0),
            principal_paid: dec!(500),
            outstanding_after: dec!(0),
            is_partial_payment: false,
        };

        account.apply_collection(&allocation).unwrap();

        assert_eq!(account.outstanding_amount, dec!(0));
        assert_eq!(account.status, "closed");
    }

    #[test]
    fn test_reverse_collection_restores_exactly() {
        let mut account = account(dec!(10000), dec!(500), dec!(1000));
        let allocation = Allocation {
            penalty_paid: dec!(500),
            principal_paid: dec!(200),
            outstanding_after: dec!(9800),
            is_partial_payment: true,
        };

        account.apply_collection(&allocation).unwrap();

        let entry = CollectionEntry::new(
            account.get_id().unwrap().to_string(),
            "agent-7".to_string(),
            account.loan_id.clone(),
            dec!(700),
            PaymentMode::Cash,
            dec!(1000),
            &allocation,
            dec!(10000),
            None,
            None,
            None,
            None,
        )
        .unwrap();

        account.reverse_collection(&entry).unwrap();

        assert_eq!(account.outstanding_amount, dec!(10000));
        assert_eq!(account.penalty_amount, dec!(500));
        assert_eq!(account.total_paid, dec!(0));
        assert_eq!(account.status, "active");
    }

    #[test]
    fn test_void_reopens_closed_account() {
        let mut account = account(dec!(500), dec!(0), dec!(500));
        let allocation = Allocation {
            penalty_paid: dec!(0),
            principal_paid: dec!(500),
            outstanding_after: dec!(0),
            is_partial_payment: false,
        };

        account.apply_collection(&allocation).unwrap();
        assert_eq!(account.status, "closed");

        let entry = CollectionEntry::new(
            account.get_id().unwrap().to_string(),
            "agent-7".to_string(),
            account.loan_id.clone(),
            dec!(500),
            PaymentMode::Upi,
            dec!(500),
            &allocation,
            dec!(500),
            None,
            None,
            None,
            None,
        )
        .unwrap();

        account.reverse_collection(&entry).unwrap();

        assert_eq!(account.outstanding_amount, dec!(500));
        assert_eq!(account.status, "active");
    }

    #[test]
    fn test_balance_snapshot_from_account() {
        let account = account(dec!(10000), dec!(500), dec!(1000));
        let snapshot = BalanceSnapshot::from(&account);

        assert_eq!(snapshot.outstanding_amount, dec!(10000));
        assert_eq!(snapshot.penalty_amount, dec!(500));
        assert_eq!(snapshot.total_paid, dec!(0));
        assert_eq!(snapshot.status, "active");
    }
}
