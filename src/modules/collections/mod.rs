// Collections module
//
// The collection ledger and the two workflows that move money: recording
// (allocate, append entry, update balances) and void (mark entry, reverse
// balances). Everything else in the service reads what this module writes.

pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{CollectionEntry, EntryStatus, PaymentMode, RecordCollectionRequest};
pub use repositories::CollectionRepository;
pub use services::{Allocation, CollectionService, PaymentAllocator};
