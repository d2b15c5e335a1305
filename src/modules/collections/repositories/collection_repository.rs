use super::super::models::CollectionEntry;
use crate::core::{AppError, Result};
use sqlx::{MySql, MySqlPool, Transaction};

const ENTRY_COLUMNS: &str = r#"
    id, transaction_id, customer_id, agent_id, loan_id,
    collection_amount, payment_mode, emi_due, penalty_paid, principal_paid,
    outstanding_before, outstanding_after, is_partial_payment,
    location, device_id, remarks, status,
    voided_by, voided_at, void_reason, collected_at
"#;

/// Repository for collection ledger persistence
///
/// Entries are append-only; the only mutations ever issued are the status
/// flip to `voided` (guarded so it can fire at most once) and remarks edits
/// on non-voided entries.
pub struct CollectionRepository {
    pool: MySqlPool,
}

impl CollectionRepository {
    /// Create a new CollectionRepository
    ///
    /// # Arguments
    /// * `pool` - Database connection pool
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Get the database connection pool
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Insert a ledger entry within an existing transaction
    ///
    /// The ledger insert runs before the balance update in the recording
    /// workflow, so a failure here rolls the whole collection back. A
    /// duplicate `transaction_id` trips the unique index and surfaces as a
    /// conflict.
    pub async fn insert_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        entry: &CollectionEntry,
    ) -> Result<()> {
        let id = entry
            .id
            .as_ref()
            .ok_or_else(|| AppError::Internal("Entry ID is required for creation".to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO collection_entries (
                id, transaction_id, customer_id, agent_id, loan_id,
                collection_amount, payment_mode, emi_due, penalty_paid, principal_paid,
                outstanding_before, outstanding_after, is_partial_payment,
                location, device_id, remarks, status, collected_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&entry.transaction_id)
        .bind(&entry.customer_id)
        .bind(&entry.agent_id)
        .bind(&entry.loan_id)
        .bind(entry.collection_amount)
        .bind(&entry.payment_mode)
        .bind(entry.emi_due)
        .bind(entry.penalty_paid)
        .bind(entry.principal_paid)
        .bind(entry.outstanding_before)
        .bind(entry.outstanding_after)
        .bind(entry.is_partial_payment)
        .bind(&entry.location)
        .bind(&entry.device_id)
        .bind(&entry.remarks)
        .bind(&entry.status)
        .bind(entry.collected_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::conflict(format!(
                        "Transaction ID '{}' already exists",
                        entry.transaction_id
                    ));
                }
            }
            AppError::Database(e)
        })?;

        Ok(())
    }

    /// Find entry by ID
    ///
    /// # Arguments
    /// * `id` - Entry ID
    ///
    /// # Returns
    /// * `Result<Option<CollectionEntry>>` - Entry if found
    pub async fn find_by_id(&self, id: &str) -> Result<Option<CollectionEntry>> {
        let sql = format!(
            "SELECT {} FROM collection_entries WHERE id = ?",
            ENTRY_COLUMNS
        );

        let entry = sqlx::query_as::<_, CollectionEntry>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(entry)
    }

    /// Find entry by ID with an exclusive row lock
    ///
    /// Serializes void attempts on the same entry; must run inside a
    /// transaction.
    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<Option<CollectionEntry>> {
        let sql = format!(
            "SELECT {} FROM collection_entries WHERE id = ? FOR UPDATE",
            ENTRY_COLUMNS
        );

        let entry = sqlx::query_as::<_, CollectionEntry>(&sql)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(AppError::Database)?;

        Ok(entry)
    }

    /// Persist a void transition within an existing transaction
    ///
    /// Guarded by `status = 'completed'` so a concurrent void that committed
    /// first leaves this one with zero affected rows; the caller must treat
    /// that as a conflict and roll back.
    ///
    /// # Returns
    /// * `Result<u64>` - Number of rows updated (0 or 1)
    pub async fn mark_voided_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        entry: &CollectionEntry,
    ) -> Result<u64> {
        let id = entry
            .id
            .as_ref()
            .ok_or_else(|| AppError::Internal("Entry ID is required for void".to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE collection_entries
            SET status = ?,
                voided_by = ?,
                voided_at = ?,
                void_reason = ?
            WHERE id = ? AND status = 'completed'
            "#,
        )
        .bind(&entry.status)
        .bind(&entry.voided_by)
        .bind(entry.voided_at)
        .bind(&entry.void_reason)
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// Replace the remarks of a non-voided entry
    ///
    /// # Returns
    /// * `Result<u64>` - Number of rows updated (0 when the entry is missing
    ///   or already voided)
    pub async fn update_remarks(&self, id: &str, remarks: &str) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE collection_entries
            SET remarks = ?
            WHERE id = ? AND status != 'voided'
            "#,
        )
        .bind(remarks)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected())
    }

    /// Page through a customer's collection history, newest first
    ///
    /// # Arguments
    /// * `customer_id` - Customer ID
    /// * `include_voided` - Audit flag; voided entries are hidden by default
    /// * `limit` - Page size
    /// * `offset` - Page start
    pub async fn list_by_customer(
        &self,
        customer_id: &str,
        include_voided: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CollectionEntry>> {
        let status_filter = if include_voided {
            ""
        } else {
            "AND status != 'voided'"
        };

        let sql = format!(
            r#"
            SELECT {}
            FROM collection_entries
            WHERE customer_id = ? {}
            ORDER BY collected_at DESC
            LIMIT ? OFFSET ?
            "#,
            ENTRY_COLUMNS, status_filter
        );

        let entries = sqlx::query_as::<_, CollectionEntry>(&sql)
            .bind(customer_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(entries)
    }

    /// Count a customer's collection entries under the same filter as
    /// [`list_by_customer`]
    pub async fn count_by_customer(&self, customer_id: &str, include_voided: bool) -> Result<i64> {
        let status_filter = if include_voided {
            ""
        } else {
            "AND status != 'voided'"
        };

        let sql = format!(
            "SELECT COUNT(*) FROM collection_entries WHERE customer_id = ? {}",
            status_filter
        );

        let row: (i64,) = sqlx::query_as(&sql)
            .bind(customer_id)
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(row.0)
    }
}
