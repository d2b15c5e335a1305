//! KistPay Field Collection Platform Library
//!
//! Core of the field-collection service for microfinance loan agents:
//! recording EMI and penalty collections, allocating payments penalty-first,
//! keeping customer balances consistent with the collection ledger, and
//! voiding entries with exact reversal.

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;

// Re-export commonly used types
pub use modules::collections;
pub use modules::customers;
pub use modules::reports;
