//! Datagram ingestion for emitters that cannot hold an HTTP connection.
//!
//! Each datagram carries a 4-byte big-endian payload length followed by a
//! JSON object with the same fields `POST /log` accepts.

use std::net::SocketAddr;

use chrono::Utc;
use logtrail_application::{LogEventSource, LogIngestService, parse_log_event};
use logtrail_core::{AppError, AppResult};
use logtrail_domain::datetime_to_timestamp;
use serde_json::{Map, Value};
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MAX_DATAGRAM_BYTES: usize = 65_535;
const LENGTH_PREFIX_BYTES: usize = 4;

pub struct UdpLogListener {
    socket: UdpSocket,
    ingest_service: LogIngestService,
}

impl UdpLogListener {
    pub async fn bind(address: SocketAddr, ingest_service: LogIngestService) -> AppResult<Self> {
        let socket = UdpSocket::bind(address).await.map_err(|error| {
            AppError::Internal(format!("failed to bind UDP listener on {address}: {error}"))
        })?;

        Ok(Self {
            socket,
            ingest_service,
        })
    }

    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|error| AppError::Internal(format!("failed to read UDP address: {error}")))
    }

    /// Receives datagrams until `cancellation` fires.
    pub async fn run(self, cancellation: CancellationToken) {
        let mut buffer = vec![0_u8; MAX_DATAGRAM_BYTES];
        if let Ok(address) = self.local_addr() {
            info!(%address, "UDP log listener started");
        }

        loop {
            tokio::select! {
                _ = cancellation.cancelled() => {
                    info!("UDP log listener received shutdown signal");
                    break;
                }
                received = self.socket.recv_from(&mut buffer) => {
                    match received {
                        Ok((length, peer)) => self.handle_datagram(&buffer[..length], peer).await,
                        Err(error) => warn!(error = %error, "UDP receive failed"),
                    }
                }
            }
        }
    }

    async fn handle_datagram(&self, datagram: &[u8], peer: SocketAddr) {
        debug!(%peer, bytes = datagram.len(), "datagram received");

        let fields = match decode_frame(datagram) {
            Ok(fields) => fields,
            Err(error) => {
                warn!(%peer, error = %error, "dropping malformed datagram");
                return;
            }
        };

        let mut sender = Map::new();
        sender.insert(
            "udp_client_host".to_owned(),
            Value::String(peer.ip().to_string()),
        );
        sender.insert("udp_client_port".to_owned(), Value::from(peer.port()));

        let outcome = match parse_log_event(
            LogEventSource::Datagram,
            fields,
            sender,
            datetime_to_timestamp(Utc::now()),
        ) {
            Ok(record) => self.ingest_service.ingest(record).await.map(|_| ()),
            Err(error) => Err(error),
        };

        if let Err(error) = outcome {
            warn!(%peer, error = %error, "failed to store datagram record");
        }
    }
}

/// Splits the length prefix from a datagram and decodes the JSON payload.
///
/// Bytes past the declared length are ignored.
pub fn decode_frame(datagram: &[u8]) -> AppResult<Map<String, Value>> {
    let Some((prefix, rest)) = datagram.split_first_chunk::<LENGTH_PREFIX_BYTES>() else {
        return Err(AppError::Validation(format!(
            "datagram too short: {} bytes",
            datagram.len()
        )));
    };

    let declared = u32::from_be_bytes(*prefix) as usize;
    let Some(payload) = rest.get(..declared) else {
        return Err(AppError::Validation(format!(
            "length mismatch: declared {declared} bytes, received {}",
            rest.len()
        )));
    };

    match serde_json::from_slice::<Value>(payload) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(AppError::Validation(
            "datagram payload must be a JSON object".to_owned(),
        )),
        Err(error) => Err(AppError::Validation(format!(
            "invalid datagram payload: {error}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use logtrail_application::{LogIngestService, LogRecordQuery, LogRecordRepository};
    use logtrail_domain::LogLevel;
    use logtrail_infrastructure::InMemoryLogRecordRepository;
    use serde_json::json;
    use tokio::net::UdpSocket;
    use tokio_util::sync::CancellationToken;

    use super::{UdpLogListener, decode_frame};

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut datagram = (payload.len() as u32).to_be_bytes().to_vec();
        datagram.extend_from_slice(payload);
        datagram
    }

    #[test]
    fn decodes_length_prefixed_json() {
        let payload = json!({"name": "worker", "msg": "ready"}).to_string();
        let mut datagram = frame(payload.as_bytes());
        datagram.extend_from_slice(b"trailing");

        let fields = decode_frame(&datagram);
        assert!(fields.is_ok());
        let fields = fields.unwrap_or_else(|_| unreachable!());

        assert_eq!(fields.get("name"), Some(&json!("worker")));
    }

    #[test]
    fn rejects_short_and_truncated_datagrams() {
        assert!(decode_frame(&[0, 0]).is_err());

        let mut truncated = frame(br#"{"msg": "cut"}"#);
        truncated.truncate(8);
        assert!(decode_frame(&truncated).is_err());

        assert!(decode_frame(&frame(b"[1, 2]")).is_err());
    }

    #[tokio::test]
    async fn listener_stores_records_until_cancelled() {
        let records = Arc::new(InMemoryLogRecordRepository::new());
        let bind_address = SocketAddr::from(([127, 0, 0, 1], 0));
        let listener =
            match UdpLogListener::bind(bind_address, LogIngestService::new(records.clone())).await {
                Ok(listener) => listener,
                Err(error) => panic!("failed to bind UDP listener: {error}"),
            };
        let address = listener.local_addr();
        assert!(address.is_ok());
        let address = address.unwrap_or_else(|_| unreachable!());

        let cancellation = CancellationToken::new();
        let task = tokio::spawn(listener.run(cancellation.clone()));

        let sender = UdpSocket::bind("127.0.0.1:0").await;
        assert!(sender.is_ok());
        let sender = sender.unwrap_or_else(|_| unreachable!());
        let malformed = sender.send_to(&[1, 2], address).await;
        assert!(malformed.is_ok());
        let payload =
            json!({"name": "worker", "levelname": "TRACE", "msg": "ready", "thread": 7}).to_string();
        let sent = sender.send_to(&frame(payload.as_bytes()), address).await;
        assert!(sent.is_ok());

        let mut stored = Vec::new();
        for _ in 0..50 {
            stored = records
                .list_recent(LogRecordQuery::default())
                .await
                .unwrap_or_default();
            if !stored.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].level, LogLevel::Info);
        let metadata = stored[0].metadata.clone().unwrap_or_default();
        assert_eq!(metadata["udp_client_host"], json!("127.0.0.1"));
        assert!(metadata.get("thread").is_none());

        cancellation.cancel();
        assert!(task.await.is_ok());
    }
}
