use super::super::models::{
    CollectionEntry, CollectionHistoryResponse, PaymentMode, RecordCollectionRequest,
    RecordCollectionResponse,
};
use super::super::repositories::CollectionRepository;
use super::allocation::PaymentAllocator;
use crate::core::{AppError, CallerContext, Result};
use crate::modules::customers::models::BalanceSnapshot;
use crate::modules::customers::repositories::CustomerRepository;
use std::str::FromStr;

/// Collection service for the recording and void workflows
///
/// Both workflows run inside one database transaction and take the
/// customer's row lock first, so concurrent operations against the same
/// customer serialize instead of overwriting each other's balance update.
/// Operations against different customers never contend.
pub struct CollectionService {
    collection_repo: CollectionRepository,
    customer_repo: CustomerRepository,
}

impl CollectionService {
    /// Create a new CollectionService
    ///
    /// # Arguments
    /// * `collection_repo` - Ledger entry repository
    /// * `customer_repo` - Customer balance repository
    pub fn new(collection_repo: CollectionRepository, customer_repo: CustomerRepository) -> Self {
        Self {
            collection_repo,
            customer_repo,
        }
    }

    /// Record a field collection against a customer
    ///
    /// Sequencing: resolve and lock the customer, authorize the caller,
    /// validate the payment mode, allocate penalty-first, insert the ledger
    /// entry, then apply the balance update, all before a single commit. The
    /// ledger insert goes first so a failure at any later step rolls the
    /// whole collection back rather than leaving a balance with no entry.
    ///
    /// # Arguments
    /// * `customer_id` - Customer to collect from
    /// * `request` - Amount, payment mode and capture metadata
    /// * `caller` - Resolved caller identity
    ///
    /// # Returns
    /// * `Result<RecordCollectionResponse>` - The created entry plus the
    ///   customer's balances after the update
    pub async fn record_collection(
        &self,
        customer_id: &str,
        request: RecordCollectionRequest,
        caller: &CallerContext,
    ) -> Result<RecordCollectionResponse> {
        let mut tx = self
            .customer_repo
            .pool()
            .begin()
            .await
            .map_err(AppError::Database)?;

        let mut customer = self
            .customer_repo
            .find_by_id_for_update(&mut tx, customer_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer '{}' not found", customer_id)))?;

        if !caller.can_access_customer(&customer.assigned_agent_id) {
            tracing::warn!(
                agent_id = %caller.agent_id,
                customer_id = %customer_id,
                "Collection attempt on a customer not assigned to this agent"
            );
            return Err(AppError::forbidden(
                "Customer is not assigned to this agent",
            ));
        }

        let payment_mode =
            PaymentMode::from_str(&request.payment_mode).map_err(AppError::validation)?;

        let allocation = PaymentAllocator::allocate(
            request.amount,
            customer.outstanding_amount,
            customer.penalty_amount,
            customer.emi_amount,
        )?;

        let location = request
            .location
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| AppError::validation(format!("Invalid location payload: {}", e)))?;

        let entry = CollectionEntry::new(
            customer_id.to_string(),
            caller.agent_id.clone(),
            customer.loan_id.clone(),
            request.amount,
            payment_mode,
            customer.emi_amount,
            &allocation,
            customer.outstanding_amount,
            request.transaction_id,
            location,
            request.device_id,
            request.remarks,
        )?;

        // Ledger first: a crash after this insert but before the balance
        // update rolls back with the transaction; if the store ever loses
        // atomicity the orphan entry is detectable and replayable.
        self.collection_repo.insert_with_tx(&mut tx, &entry).await?;

        customer.apply_collection(&allocation)?;
        self.customer_repo
            .update_balances_with_tx(&mut tx, &customer)
            .await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            transaction_id = %entry.transaction_id,
            customer_id = %customer_id,
            agent_id = %caller.agent_id,
            amount = %entry.collection_amount,
            penalty_paid = %entry.penalty_paid,
            principal_paid = %entry.principal_paid,
            partial = entry.is_partial_payment,
            "Collection recorded"
        );

        Ok(RecordCollectionResponse {
            entry,
            balances: BalanceSnapshot::from(&customer),
        })
    }

    /// Void a completed collection and reverse its balance effect
    ///
    /// Elevated roles only. The reversal restores the customer's balances
    /// from the entry's stored split; nothing is recomputed, so the entry is
    /// reversed exactly as it was recorded. Voiding anything but a
    /// `completed` entry fails with a conflict and changes nothing.
    ///
    /// # Arguments
    /// * `entry_id` - Ledger entry to void
    /// * `reason` - Optional reason; a default placeholder is recorded when
    ///   absent
    /// * `caller` - Resolved caller identity
    pub async fn void_collection(
        &self,
        entry_id: &str,
        reason: Option<String>,
        caller: &CallerContext,
    ) -> Result<CollectionEntry> {
        if !caller.role.is_elevated() {
            tracing::warn!(
                agent_id = %caller.agent_id,
                entry_id = %entry_id,
                "Void attempt without an elevated role"
            );
            return Err(AppError::forbidden(
                "Only supervisors and admins may void collections",
            ));
        }

        let mut tx = self
            .collection_repo
            .pool()
            .begin()
            .await
            .map_err(AppError::Database)?;

        let mut entry = self
            .collection_repo
            .find_by_id_for_update(&mut tx, entry_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Collection entry '{}' not found", entry_id))
            })?;

        entry.mark_voided(caller.agent_id.clone(), reason)?;

        let mut customer = self
            .customer_repo
            .find_by_id_for_update(&mut tx, &entry.customer_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Customer '{}' referenced by entry '{}' is missing",
                    entry.customer_id, entry_id
                ))
            })?;

        let updated = self.collection_repo.mark_voided_with_tx(&mut tx, &entry).await?;
        if updated == 0 {
            // Guarded update found the row no longer completed
            return Err(AppError::conflict(format!(
                "Collection '{}' is already voided",
                entry.transaction_id
            )));
        }

        customer.reverse_collection(&entry)?;
        self.customer_repo
            .update_balances_with_tx(&mut tx, &customer)
            .await?;

        tx.commit().await.map_err(AppError::Database)?;

        tracing::info!(
            transaction_id = %entry.transaction_id,
            customer_id = %entry.customer_id,
            voided_by = %caller.agent_id,
            penalty_reversed = %entry.penalty_paid,
            principal_reversed = %entry.principal_paid,
            "Collection voided"
        );

        Ok(entry)
    }

    /// Replace the remarks on a non-voided entry
    ///
    /// Elevated roles only; voided entries are frozen for audit.
    pub async fn update_remarks(
        &self,
        entry_id: &str,
        remarks: String,
        caller: &CallerContext,
    ) -> Result<CollectionEntry> {
        if !caller.role.is_elevated() {
            return Err(AppError::forbidden(
                "Only supervisors and admins may edit remarks",
            ));
        }

        if remarks.trim().is_empty() {
            return Err(AppError::validation("Remarks cannot be empty".to_string()));
        }

        let mut entry = self
            .collection_repo
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Collection entry '{}' not found", entry_id))
            })?;

        entry.update_remarks(remarks.clone())?;

        let updated = self.collection_repo.update_remarks(entry_id, &remarks).await?;
        if updated == 0 {
            return Err(AppError::conflict(format!(
                "Collection '{}' can no longer be edited",
                entry.transaction_id
            )));
        }

        Ok(entry)
    }

    /// Fetch one ledger entry
    ///
    /// Field agents may only see entries of customers assigned to them.
    pub async fn get_entry(&self, entry_id: &str, caller: &CallerContext) -> Result<CollectionEntry> {
        let entry = self
            .collection_repo
            .find_by_id(entry_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(format!("Collection entry '{}' not found", entry_id))
            })?;

        self.authorize_read(&entry.customer_id, caller).await?;

        Ok(entry)
    }

    /// Paginated history for one customer, newest first
    ///
    /// Voided entries are hidden unless the audit flag asks for them; they
    /// remain queryable forever either way.
    pub async fn list_customer_collections(
        &self,
        customer_id: &str,
        include_voided: bool,
        limit: i64,
        offset: i64,
        caller: &CallerContext,
    ) -> Result<CollectionHistoryResponse> {
        if limit <= 0 {
            return Err(AppError::validation("Limit must be positive".to_string()));
        }

        if offset < 0 {
            return Err(AppError::validation("Offset cannot be negative".to_string()));
        }

        let customer = self
            .customer_repo
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Customer '{}' not found", customer_id)))?;

        if !caller.can_access_customer(&customer.assigned_agent_id) {
            return Err(AppError::forbidden(
                "Customer is not assigned to this agent",
            ));
        }

        let entries = self
            .collection_repo
            .list_by_customer(customer_id, include_voided, limit, offset)
            .await?;
        let total = self
            .collection_repo
            .count_by_customer(customer_id, include_voided)
            .await?;

        Ok(CollectionHistoryResponse {
            entries,
            total,
            limit,
            offset,
        })
    }

    async fn authorize_read(&self, customer_id: &str, caller: &CallerContext) -> Result<()> {
        if caller.role.is_elevated() {
            return Ok(());
        }

        let customer = self
            .customer_repo
            .find_by_id(customer_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Customer '{}' is missing", customer_id))
            })?;

        if !caller.can_access_customer(&customer.assigned_agent_id) {
            return Err(AppError::forbidden(
                "Customer is not assigned to this agent",
            ));
        }

        Ok(())
    }
}
