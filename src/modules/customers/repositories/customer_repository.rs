use super::super::models::CustomerAccount;
use crate::core::{AppError, Result};
use sqlx::{MySql, MySqlPool, Transaction};

/// Repository for customer balance persistence
///
/// The balance row is the shared mutable resource of the whole service.
/// Both workflows load it with `find_by_id_for_update` inside a database
/// transaction so concurrent mutations of one customer serialize at the row
/// lock while different customers proceed independently.
pub struct CustomerRepository {
    pool: MySqlPool,
}

impl CustomerRepository {
    /// Create a new CustomerRepository
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

    /// Create a customer account row
    ///
    /// Used by the provisioning path and by integration tests; the collection
    /// workflows never create customers.
    pub async fn create(&self, account: &CustomerAccount) -> Result<CustomerAccount> {
        let id = account.id.as_ref().ok_or_else(|| {
            AppError::Internal("Customer ID is required for creation".to_string())
        })?;

        sqlx::query(
            r#"
            INSERT INTO customer_accounts (
                id, loan_id, assigned_agent_id, outstanding_amount,
                penalty_amount, total_paid, emi_amount, status,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&account.loan_id)
        .bind(&account.assigned_agent_id)
        .bind(account.outstanding_amount)
        .bind(account.penalty_amount)
        .bind(account.total_paid)
        .bind(account.emi_amount)
        .bind(&account.status)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Internal("Customer account was created but not found".to_string())
        })
    }

    /// Find customer account by ID
    ///
    /// # Arguments
    /// * `id` - Customer ID
    ///
    /// # Returns
    /// * `Result<Option<CustomerAccount>>` - Account if found
    pub async fn find_by_id(&self, id: &str) -> Result<Option<CustomerAccount>> {
        let account = sqlx::query_as::<_, CustomerAccount>(
            r#"
            SELECT
                id, loan_id, assigned_agent_id, outstanding_amount,
                penalty_amount, total_paid, emi_amount, status,
                created_at, updated_at
            FROM customer_accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(account)
    }

    /// Find customer account by ID with an exclusive row lock
    ///
    /// Must run inside a transaction; the lock is held until commit or
    /// rollback and is what serializes same-customer balance updates.
    pub async fn find_by_id_for_update(
        &self,
        tx: &mut Transaction<'_, MySql>,
        id: &str,
    ) -> Result<Option<CustomerAccount>> {
        let account = sqlx::query_as::<_, CustomerAccount>(
            r#"
            SELECT
                id, loan_id, assigned_agent_id, outstanding_amount,
                penalty_amount, total_paid, emi_amount, status,
                created_at, updated_at
            FROM customer_accounts
            WHERE id = ?
            FOR UPDATE
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        Ok(account)
    }

    /// Persist the mutated balance aggregate within an existing transaction
    ///
    /// # Arguments
    /// * `tx` - Open transaction holding the row lock
    /// * `account` - Account with updated balances and status
    pub async fn update_balances_with_tx(
        &self,
        tx: &mut Transaction<'_, MySql>,
        account: &CustomerAccount,
    ) -> Result<()> {
        let id = account.id.as_ref().ok_or_else(|| {
            AppError::Internal("Customer ID is required for balance update".to_string())
        })?;

        let result = sqlx::query(
            r#"
            UPDATE customer_accounts
            SET outstanding_amount = ?,
                penalty_amount = ?,
                total_paid = ?,
                status = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(account.outstanding_amount)
        .bind(account.penalty_amount)
        .bind(account.total_paid)
        .bind(&account.status)
        .bind(account.updated_at)
        .bind(id)
        .execute(&mut **tx)
        .await
        .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Customer with id '{}' not found",
                id
            )));
        }

        Ok(())
    }
}
