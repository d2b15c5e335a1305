mod collection_entry;

pub use collection_entry::{
    CollectionEntry, CollectionHistoryResponse, EntryStatus, LocationSnapshot, PaymentMode,
    RecordCollectionRequest, RecordCollectionResponse, UpdateRemarksRequest,
    VoidCollectionRequest, DEFAULT_VOID_REASON,
};
