use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::reports::models::{CollectionStats, ModeBreakdown};

/// Repository for read-side aggregations over the collection ledger
///
/// Queries here never mutate; they filter on entry status so voided
/// collections stay out of every sum.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Per-mode totals for completed collections in a UTC time range
    ///
    /// The range is half-open `[start, end)`; callers derive it from an IST
    /// business day.
    async fn mode_breakdown(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: Option<&str>,
    ) -> Result<Vec<ModeBreakdown>>;

    /// Lifetime ledger figures for one customer
    async fn customer_collection_stats(&self, customer_id: &str) -> Result<CollectionStats>;
}

pub struct MySqlReportRepository {
    pool: MySqlPool,
}

impl MySqlReportRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for MySqlReportRepository {
    async fn mode_breakdown(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        mode: Option<&str>,
    ) -> Result<Vec<ModeBreakdown>> {
        let mode_filter = if mode.is_some() {
            "AND payment_mode = ?"
        } else {
            ""
        };

        let sql = format!(
            r#"
            SELECT payment_mode, SUM(collection_amount), COUNT(*)
            FROM collection_entries
            WHERE status = 'completed'
              AND collected_at >= ?
              AND collected_at < ?
              {}
            GROUP BY payment_mode
            ORDER BY payment_mode
            "#,
            mode_filter
        );

        let mut query = sqlx::query_as::<_, (String, Decimal, i64)>(&sql)
            .bind(start)
            .bind(end);

        if let Some(mode) = mode {
            query = query.bind(mode);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(rows
            .into_iter()
            .map(|(payment_mode, total_amount, collection_count)| {
                ModeBreakdown::new(payment_mode, total_amount, collection_count)
            })
            .collect())
    }

    async fn customer_collection_stats(&self, customer_id: &str) -> Result<CollectionStats> {
        let row: (Option<Decimal>, i64, i64, Option<DateTime<Utc>>) = sqlx::query_as(
            r#"
            SELECT
                SUM(CASE WHEN status = 'completed' THEN collection_amount END),
                COUNT(CASE WHEN status = 'completed' THEN 1 END),
                COUNT(CASE WHEN status = 'voided' THEN 1 END),
                MAX(CASE WHEN status = 'completed' THEN collected_at END)
            FROM collection_entries
            WHERE customer_id = ?
            "#,
        )
        .bind(customer_id)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(CollectionStats {
            lifetime_collected: row.0.unwrap_or_default(),
            completed_count: row.1,
            voided_count: row.2,
            last_collection_at: row.3,
        })
    }
}
