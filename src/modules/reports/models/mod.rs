mod collection_report;

pub use collection_report::{
    CollectionStats, CustomerSummary, DailyCollectionReport, ModeBreakdown,
};
