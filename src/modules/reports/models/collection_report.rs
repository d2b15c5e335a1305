use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::modules::customers::models::CustomerAccount;

/// Daily collection report for one business day (IST)
///
/// Sums cover `completed` entries only; voided and cancelled collections
/// never count towards a day's takings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyCollectionReport {
    /// Business date the report covers
    pub date: NaiveDate,
    /// Total collected across all payment modes
    pub total_amount: Decimal,
    /// Number of collections that contributed
    pub total_count: i64,
    /// Per-mode breakdown
    pub by_mode: Vec<ModeBreakdown>,
}

/// Collection aggregation for one payment mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeBreakdown {
    /// Payment mode (cash, upi, qr, card)
    pub payment_mode: String,
    /// Total collected through this mode
    pub total_amount: Decimal,
    /// Number of collections through this mode
    pub collection_count: i64,
}

impl DailyCollectionReport {
    /// Build a report from per-mode aggregates; totals are derived here so
    /// they can never disagree with the breakdown
    pub fn new(date: NaiveDate, by_mode: Vec<ModeBreakdown>) -> Self {
        let total_amount = by_mode.iter().map(|m| m.total_amount).sum();
        let total_count = by_mode.iter().map(|m| m.collection_count).sum();

        Self {
            date,
            total_amount,
            total_count,
            by_mode,
        }
    }

    /// Check if nothing was collected on this day
    pub fn is_empty(&self) -> bool {
        self.by_mode.is_empty()
    }
}

impl ModeBreakdown {
    pub fn new(payment_mode: String, total_amount: Decimal, collection_count: i64) -> Self {
        Self {
            payment_mode,
            total_amount,
            collection_count,
        }
    }
}

/// Ledger-derived figures for one customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    /// Total money taken across all completed collections, penalty included
    pub lifetime_collected: Decimal,
    /// Completed entries on the ledger
    pub completed_count: i64,
    /// Voided entries on the ledger
    pub voided_count: i64,
    /// Most recent completed collection
    pub last_collection_at: Option<DateTime<Utc>>,
}

/// Per-customer summary: current balances plus lifetime ledger figures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub customer_id: String,
    pub loan_id: String,
    pub outstanding_amount: Decimal,
    pub penalty_amount: Decimal,
    pub total_paid: Decimal,
    pub emi_amount: Decimal,
    pub status: String,
    pub lifetime_collected: Decimal,
    pub completed_count: i64,
    pub voided_count: i64,
    pub last_collection_at: Option<DateTime<Utc>>,
}

impl CustomerSummary {
    /// Combine the live balance aggregate with the ledger-derived stats
    pub fn from_parts(account: &CustomerAccount, stats: CollectionStats) -> Self {
        Self {
            customer_id: account.id.clone().unwrap_or_default(),
            loan_id: account.loan_id.clone(),
            outstanding_amount: account.outstanding_amount,
            penalty_amount: account.penalty_amount,
            total_paid: account.total_paid,
            emi_amount: account.emi_amount,
            status: account.status.clone(),
            lifetime_collected: stats.lifetime_collected,
            completed_count: stats.completed_count,
            voided_count: stats.voided_count,
            last_collection_at: stats.last_collection_at,
        }
    }
}
