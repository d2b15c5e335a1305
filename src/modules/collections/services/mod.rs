pub mod allocation;
pub mod collection_service;

pub use allocation::{Allocation, PaymentAllocator};
pub use collection_service::CollectionService;
