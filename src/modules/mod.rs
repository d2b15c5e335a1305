pub mod collections;
pub mod customers;
pub mod reports;
