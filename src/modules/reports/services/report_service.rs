use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::core::timezone::BusinessTimezone;
use crate::core::{AppError, CallerContext, Result};
use crate::modules::collections::models::PaymentMode;
use crate::modules::customers::repositories::CustomerRepository;
use crate::modules::reports::models::{CustomerSummary, DailyCollectionReport};
use crate::modules::reports::repositories::ReportRepository;

/// Service for read-side projections over the collection ledger
pub struct ReportService {
    report_repo: Arc<dyn ReportRepository>,
    customer_repo: CustomerRepository,
}

impl ReportService {
    /// Create a new report service
    pub fn new(report_repo: Arc<dyn ReportRepository>, customer_repo: CustomerRepository) -> Self {
        Self {
            report_repo,
            customer_repo,
        }
    }

    /// Daily collection totals grouped by payment mode
    ///
    /// The day is an IST business day, converted to UTC bounds for the range
    /// query. Supervisors and admins only; the branch day book is not an
    /// agent-facing view.
    ///
    /// # Arguments
    /// * `date` - Business date to report on; must not be in the future
    /// * `mode` - Optional single-mode filter
    /// * `caller` - Resolved caller identity
    pub async fn daily_report(
        &self,
        date: NaiveDate,
        mode: Option<PaymentMode>,
        caller: &CallerContext,
    ) -> Result<DailyCollectionReport> {
        if !caller.role.is_elevated() {
            return Err(AppError::forbidden(
                "Only supervisors and admins may view daily reports",
            ));
        }

        let today = BusinessTimezone::business_date(Utc::now());
        if date > today {
            return Err(AppError::validation(format!(
                "Report date {} is in the future (today is {})",
                date, today
            )));
        }

        let (start, end) = BusinessTimezone::day_bounds_utc(date);
        let mode_filter = mode.map(|m| m.to_string());

        let by_mode = self
            .report_repo
            .mode_breakdown(start, end, mode_filter.as_deref())
            .await?;

        let report = DailyCollectionReport::new(date, by_mode);

        if report.is_empty() {
            warn!(date = %date, "No completed collections for daily report");
        } else {
            info!(
                date = %date,
                total = %report.total_amount,
                count = report.total_count,
                "Daily report generated"
            );
        }

        Ok(report)
    }

    /// Per-customer summary: live balances plus lifetime ledger figures
    ///
    /// Field agents may only see customers assigned to them.
    pub async fn customer_summary(
        &self,
        customer_id: &str,
        caller: &CallerContext,
    ) -> Result<CustomerSummary> {
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

        let stats = self.report_repo.customer_collection_stats(customer_id).await?;

        Ok(CustomerSummary::from_parts(&customer, stats))
    }
}
