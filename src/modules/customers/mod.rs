// Customers module
//
// Owns the customer balance aggregate. The collection workflows are the only
// writers; customer profile CRUD lives with the external profile service.

pub mod models;
pub mod repositories;

pub use models::{AccountStatus, BalanceSnapshot, CustomerAccount};
pub use repositories::CustomerRepository;
