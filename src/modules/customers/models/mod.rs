mod customer_account;

pub use customer_account::{AccountStatus, BalanceSnapshot, CustomerAccount};
