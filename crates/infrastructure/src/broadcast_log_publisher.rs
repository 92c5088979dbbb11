use tokio::sync::broadcast;

use logtrail_application::LogPublisher;
use logtrail_domain::LogRecord;

/// Default number of records buffered per subscriber before it lags.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 1024;

/// Publishes stored records on a tokio broadcast channel.
///
/// Subscribers that fall more than the channel capacity behind skip the
/// records they missed.
#[derive(Debug, Clone)]
pub struct BroadcastLogPublisher {
    sender: broadcast::Sender<LogRecord>,
}

impl BroadcastLogPublisher {
    /// Creates a publisher buffering up to `capacity` records per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to records published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LogRecord> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastLogPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_BROADCAST_CAPACITY)
    }
}

impl LogPublisher for BroadcastLogPublisher {
    fn publish(&self, record: &LogRecord) {
        // No subscribers is not an error.
        let _ = self.sender.send(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use logtrail_application::LogPublisher;
    use logtrail_domain::{LogLevel, LogRecordId, NewLogRecord};

    use super::BroadcastLogPublisher;

    fn record() -> logtrail_domain::LogRecord {
        let record = NewLogRecord::new(1.0, "app", LogLevel::Info, "hello");
        assert!(record.is_ok());
        record
            .unwrap_or_else(|_| unreachable!())
            .into_record(LogRecordId::new(1))
    }

    #[tokio::test]
    async fn subscribers_receive_published_records() {
        let publisher = BroadcastLogPublisher::new(4);
        let mut receiver = publisher.subscribe();
        let record = record();

        publisher.publish(&record);

        assert_eq!(receiver.recv().await.ok(), Some(record));
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let publisher = BroadcastLogPublisher::default();

        publisher.publish(&record());
    }
}
