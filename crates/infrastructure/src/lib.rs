//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod broadcast_log_publisher;
mod csv_record_archiver;
mod in_memory_log_record_repository;
mod sqlite_log_record_repository;
mod yaml_retention_config_repository;

pub use broadcast_log_publisher::{BroadcastLogPublisher, DEFAULT_BROADCAST_CAPACITY};
pub use csv_record_archiver::CsvRecordArchiver;
pub use in_memory_log_record_repository::InMemoryLogRecordRepository;
pub use sqlite_log_record_repository::{MIGRATOR, SqliteLogRecordRepository, connect_sqlite};
pub use yaml_retention_config_repository::YamlRetentionConfigRepository;
