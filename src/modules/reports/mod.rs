// Reports module
//
// Read-side projections over the collection ledger: daily totals by payment
// mode and per-customer summaries. Never mutates; voided entries are
// excluded from every sum.

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{CustomerSummary, DailyCollectionReport, ModeBreakdown};
pub use repositories::{MySqlReportRepository, ReportRepository};
pub use services::ReportService;
