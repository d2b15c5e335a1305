use std::str::FromStr;
use std::sync::Arc;

use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::core::error::AppError;
use crate::core::timezone::BusinessTimezone;
use crate::core::CallerContext;
use crate::modules::collections::models::PaymentMode;
use crate::modules::reports::services::ReportService;

/// Query parameters for the daily report endpoint
#[derive(Debug, Deserialize)]
pub struct DailyReportQuery {
    /// Business date (YYYY-MM-DD); defaults to the current business day
    #[serde(default)]
    pub date: Option<String>,
    /// Optional payment mode filter (cash, upi, qr, card)
    #[serde(default)]
    pub mode: Option<String>,
}

/// Daily collection totals by payment mode
/// GET /reports/daily
pub async fn get_daily_report(
    service: web::Data<Arc<ReportService>>,
    caller: CallerContext,
    query: web::Query<DailyReportQuery>,
) -> Result<HttpResponse, AppError> {
    let date = match &query.date {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            AppError::validation(format!(
                "Invalid date '{}'. Expected YYYY-MM-DD",
                raw
            ))
        })?,
        None => BusinessTimezone::business_date(Utc::now()),
    };

    let mode = query
        .mode
        .as_deref()
        .map(PaymentMode::from_str)
        .transpose()
        .map_err(AppError::validation)?;

    let report = service.daily_report(date, mode, &caller).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// Per-customer balances and lifetime collection figures
/// GET /customers/{id}/summary
pub async fn get_customer_summary(
    service: web::Data<Arc<ReportService>>,
    caller: CallerContext,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let customer_id = path.into_inner();
    let summary = service.customer_summary(&customer_id, &caller).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Configure report routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/reports").route("/daily", web::get().to(get_daily_report)))
        .route(
            "/customers/{id}/summary",
            web::get().to(get_customer_summary),
        );
}
