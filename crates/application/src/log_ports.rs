mod publisher;
mod repository;

pub use publisher::LogPublisher;
pub use repository::{DEFAULT_RECENT_LIMIT, LogRecordQuery, LogRecordRepository};
