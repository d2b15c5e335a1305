use crate::core::{AppError, Result};
use crate::modules::collections::services::allocation::Allocation;
use crate::modules::customers::models::BalanceSnapshot;
use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

/// Reason recorded when a void request carries none
pub const DEFAULT_VOID_REASON: &str = "Voided by supervisor";

/// Payment instrument used in the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
    Qr,
    Card,
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMode::Cash => write!(f, "cash"),
            PaymentMode::Upi => write!(f, "upi"),
            PaymentMode::Qr => write!(f, "qr"),
            PaymentMode::Card => write!(f, "card"),
        }
    }
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            "qr" => Ok(PaymentMode::Qr),
            "card" => Ok(PaymentMode::Card),
            _ => Err(format!(
                "Invalid payment mode: '{}' (expected cash, upi, qr or card)",
                s
            )),
        }
    }
}

/// Ledger entry status overlay
///
/// The money fields of an entry never change after creation; only this
/// status (and the void metadata that comes with it) moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Collection stands and is counted in balances and reports
    Completed,

    /// Reversed by a supervisor; terminal
    Voided,

    /// Abandoned before completion; never counted
    Cancelled,
}

impl Default for EntryStatus {
    fn default() -> Self {
        EntryStatus::Completed
    }
}

impl std::fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryStatus::Completed => write!(f, "completed"),
            EntryStatus::Voided => write!(f, "voided"),
            EntryStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "completed" => Ok(EntryStatus::Completed),
            "voided" => Ok(EntryStatus::Voided),
            "cancelled" => Ok(EntryStatus::Cancelled),
            _ => Err(format!("Invalid entry status: {}", s)),
        }
    }
}

/// Where the collection physically happened; informational only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationSnapshot {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

/// Collection ledger entry
///
/// One row per payment event. Created only by the recording workflow, never
/// deleted; the void workflow flips the status overlay and the balances are
/// reversed from the stored split, so the entry remains the audit record of
/// exactly what moved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CollectionEntry {
    /// Unique entry ID (UUID)
    #[serde(skip_deserializing)]
    pub id: Option<String>,

    /// Human-readable receipt ID, globally unique
    pub transaction_id: String,

    /// Customer the collection was taken from
    pub customer_id: String,

    /// Agent who recorded the collection
    pub agent_id: String,

    /// Loan identifier at the time of collection
    pub loan_id: String,

    /// Total money received
    pub collection_amount: Decimal,

    /// Payment instrument (cash, upi, qr, card)
    pub payment_mode: String,

    /// Customer's EMI at the time of collection
    pub emi_due: Decimal,

    /// Portion allocated to penalty
    pub penalty_paid: Decimal,

    /// Portion allocated to principal
    pub principal_paid: Decimal,

    /// Outstanding principal before this collection
    pub outstanding_before: Decimal,

    /// Outstanding principal after this collection
    pub outstanding_after: Decimal,

    /// True when the collection was below the EMI due
    pub is_partial_payment: bool,

    /// Capture location (JSON), informational
    pub location: Option<serde_json::Value>,

    /// Collecting device identifier, informational
    pub device_id: Option<String>,

    /// Free-text remarks; editable while the entry is not voided
    pub remarks: Option<String>,

    /// Entry status (completed, voided, cancelled)
    pub status: String,

    /// Supervisor who voided the entry
    pub voided_by: Option<String>,

    /// When the entry was voided
    pub voided_at: Option<DateTime<Utc>>,

    /// Why the entry was voided
    pub void_reason: Option<String>,

    /// Collection timestamp, immutable
    #[serde(skip_deserializing)]
    pub collected_at: Option<DateTime<Utc>>,
}

impl CollectionEntry {
    /// Create a new collection entry from an allocation result
    ///
    /// # Arguments
    /// * `customer_id` - Customer the collection belongs to
    /// * `agent_id` - Recording agent
    /// * `loan_id` - Customer's loan ID, denormalized
    /// * `collection_amount` - Total money received
    /// * `payment_mode` - Payment instrument
    /// * `emi_due` - Customer's EMI at recording time
    /// * `allocation` - Penalty/principal split for this amount
    /// * `outstanding_before` - Customer's outstanding before the collection
    /// * `transaction_id` - Pre-assigned receipt ID, generated when `None`
    /// * `location` - Optional capture location as JSON
    /// * `device_id` - Optional device identifier
    /// * `remarks` - Optional free-text remarks
    ///
    /// # Returns
    /// * `Result<CollectionEntry>` - New entry with status `completed`
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        customer_id: String,
        agent_id: String,
        loan_id: String,
        collection_amount: Decimal,
        payment_mode: PaymentMode,
        emi_due: Decimal,
        allocation: &Allocation,
        outstanding_before: Decimal,
        transaction_id: Option<String>,
        location: Option<serde_json::Value>,
        device_id: Option<String>,
        remarks: Option<String>,
    ) -> Result<Self> {
        if customer_id.trim().is_empty() {
            return Err(AppError::validation("Customer ID cannot be empty".to_string()));
        }

        if agent_id.trim().is_empty() {
            return Err(AppError::validation("Agent ID cannot be empty".to_string()));
        }

        if loan_id.trim().is_empty() {
            return Err(AppError::validation("Loan ID cannot be empty".to_string()));
        }

        if collection_amount <= Decimal::ZERO {
            return Err(AppError::validation(
                "Collection amount must be positive".to_string(),
            ));
        }

        if emi_due <= Decimal::ZERO {
            return Err(AppError::validation("EMI due must be positive".to_string()));
        }

        // The split must account for every paisa of the collection
        if allocation.penalty_paid + allocation.principal_paid != collection_amount {
            return Err(AppError::Internal(format!(
                "Allocation {} + {} does not sum to collection amount {}",
                allocation.penalty_paid, allocation.principal_paid, collection_amount
            )));
        }

        let expected_after = (outstanding_before - allocation.principal_paid).max(Decimal::ZERO);
        if allocation.outstanding_after != expected_after {
            return Err(AppError::Internal(format!(
                "Outstanding after allocation is {}, expected {}",
                allocation.outstanding_after, expected_after
            )));
        }

        let transaction_id = match transaction_id {
            Some(supplied) if !supplied.trim().is_empty() => supplied.trim().to_uppercase(),
            _ => Self::generate_transaction_id(),
        };

        Ok(Self {
            id: Some(uuid::Uuid::new_v4().to_string()),
            transaction_id,
            customer_id,
            agent_id,
            loan_id,
            collection_amount,
            payment_mode: payment_mode.to_string(),
            emi_due,
            penalty_paid: allocation.penalty_paid,
            principal_paid: allocation.principal_paid,
            outstanding_before,
            outstanding_after: allocation.outstanding_after,
            is_partial_payment: allocation.is_partial_payment,
            location,
            device_id,
            remarks,
            status: EntryStatus::Completed.to_string(),
            voided_by: None,
            voided_at: None,
            void_reason: None,
            collected_at: Some(Utc::now()),
        })
    }

    /// Generate a receipt ID: `TXN` + epoch millis + a 0..9999 discriminator.
    ///
    /// The discriminator keeps two entries created in the same millisecond
    /// from colliding in practice; the database unique index is the actual
    /// guarantee and a collision there surfaces as a conflict.
    pub fn generate_transaction_id() -> String {
        let epoch_millis = Utc::now().timestamp_millis();
        let discriminator = rand::thread_rng().gen_range(0..10_000);
        format!("TXN{}{}", epoch_millis, discriminator)
    }

    /// Get entry ID
    pub fn get_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Get entry status
    pub fn get_status(&self) -> Result<EntryStatus> {
        EntryStatus::from_str(&self.status)
            .map_err(|e| AppError::Internal(format!("Invalid entry status: {}", e)))
    }

    /// Get payment mode
    pub fn get_payment_mode(&self) -> Result<PaymentMode> {
        PaymentMode::from_str(&self.payment_mode)
            .map_err(|e| AppError::Internal(format!("Invalid payment mode: {}", e)))
    }

    /// Check if entry has been voided
    pub fn is_voided(&self) -> bool {
        matches!(self.get_status(), Ok(EntryStatus::Voided))
    }

    /// Check if entry can still be voided
    pub fn can_be_voided(&self) -> bool {
        matches!(self.get_status(), Ok(EntryStatus::Completed))
    }

    /// Check if the collection fell short of the EMI due
    pub fn is_partial(&self) -> bool {
        self.is_partial_payment
    }

    /// Transition the entry to `voided`
    ///
    /// Only a `completed` entry may be voided; a second void and a void of a
    /// cancelled entry both fail with a conflict. A missing or blank reason
    /// falls back to [`DEFAULT_VOID_REASON`].
    pub fn mark_voided(&mut self, voided_by: String, reason: Option<String>) -> Result<()> {
        match self.get_status()? {
            EntryStatus::Completed => {}
            EntryStatus::Voided => {
                return Err(AppError::conflict(format!(
                    "Collection '{}' is already voided",
                    self.transaction_id
                )));
            }
            EntryStatus::Cancelled => {
                return Err(AppError::conflict(format!(
                    "Cancelled collection '{}' cannot be voided",
                    self.transaction_id
                )));
            }
        }

        self.status = EntryStatus::Voided.to_string();
        self.voided_by = Some(voided_by);
        self.voided_at = Some(Utc::now());
        self.void_reason = Some(
            reason
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_VOID_REASON.to_string()),
        );

        Ok(())
    }

    /// Replace the free-text remarks
    ///
    /// Voided entries are frozen for audit; their remarks can no longer be
    /// edited.
    pub fn update_remarks(&mut self, remarks: String) -> Result<()> {
        if self.is_voided() {
            return Err(AppError::conflict(format!(
                "Collection '{}' is voided; remarks are frozen",
                self.transaction_id
            )));
        }

        self.remarks = Some(remarks);
        Ok(())
    }
}

/// Request body for recording a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCollectionRequest {
    /// Total money received, in rupees
    pub amount: Decimal,

    /// Payment instrument: cash, upi, qr or card
    pub payment_mode: String,

    /// Pre-assigned receipt ID from an offline-capable device
    pub transaction_id: Option<String>,

    /// Capture location
    pub location: Option<LocationSnapshot>,

    /// Collecting device identifier
    pub device_id: Option<String>,

    /// Free-text remarks
    pub remarks: Option<String>,
}

/// Request body for voiding a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoidCollectionRequest {
    pub reason: Option<String>,
}

/// Request body for editing remarks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRemarksRequest {
    pub remarks: String,
}

/// Response for a recorded collection: the ledger entry plus the customer's
/// balances after the update
#[derive(Debug, Serialize)]
pub struct RecordCollectionResponse {
    pub entry: CollectionEntry,
    pub balances: BalanceSnapshot,
}

/// Paginated history listing
#[derive(Debug, Serialize)]
pub struct CollectionHistoryResponse {
    pub entries: Vec<CollectionEntry>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}
