mod archiver;
mod config_repository;

pub use archiver::RecordArchiver;
pub use config_repository::RetentionConfigRepository;
