use logtrail_domain::LogRecord;

/// Fan-out port for freshly ingested records.
///
/// Publishing must not block ingestion; subscribers that fall behind lose
/// records rather than slowing the writer.
pub trait LogPublisher: Send + Sync {
    /// Publishes one stored record to current subscribers.
    fn publish(&self, record: &LogRecord);
}
