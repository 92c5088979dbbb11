use std::collections::HashMap;
use std::convert::Infallible;

use axum::Json;
use axum::body::to_bytes;
use axum::extract::{Form, FromRequest, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::sse::{Event, KeepAlive, Sse};
use chrono::Utc;
use logtrail_application::{LogEventSource, LogRecordQuery, parse_log_event};
use logtrail_core::AppError;
use logtrail_domain::datetime_to_timestamp;
use serde_json::{Map, Value};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::dto::{IngestResponse, LogQueryParams, LogRecordResponse};
use crate::error::ApiResult;
use crate::state::AppState;

const MAX_EVENT_BYTES: usize = 1024 * 1024;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const STREAM_BUFFER: usize = 64;

/// Accepts one record from a Python `logging.handlers.HTTPHandler`.
///
/// Query parameters are attached as metadata and override body keys.
pub async fn ingest_log_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    request: Request,
) -> ApiResult<Json<IngestResponse>> {
    let fields = read_event_fields(request).await?;
    let query_metadata = params
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();

    let record = parse_log_event(
        LogEventSource::Http,
        fields,
        query_metadata,
        datetime_to_timestamp(Utc::now()),
    )?;
    let stored = state.ingest_service.ingest(record).await?;

    Ok(Json(IngestResponse {
        status: "success",
        id: stored.id.as_i64(),
    }))
}

pub async fn list_logs_handler(
    State(state): State<AppState>,
    Query(params): Query<LogQueryParams>,
) -> ApiResult<Json<Vec<LogRecordResponse>>> {
    let query = LogRecordQuery::try_from(params)?;
    let records = state.ingest_service.list_recent(query).await?;

    Ok(Json(
        records.into_iter().map(LogRecordResponse::from).collect(),
    ))
}

/// Streams newly stored records as `new_log` server-sent events.
///
/// The stream ends when the server begins shutting down.
pub async fn stream_logs_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut subscription = state.publisher.subscribe();
    let shutdown = state.shutdown.clone();
    let (sender, receiver) = mpsc::channel::<Event>(STREAM_BUFFER);

    tokio::spawn(async move {
        loop {
            let record = tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = sender.closed() => break,
                received = subscription.recv() => match received {
                    Ok(record) => record,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "live log subscriber lagged, skipping records");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            let Ok(event) = Event::default()
                .event("new_log")
                .json_data(LogRecordResponse::from(record))
            else {
                continue;
            };
            if sender.send(event).await.is_err() {
                break;
            }
        }
    });

    Sse::new(ReceiverStream::new(receiver).map(Ok)).keep_alive(KeepAlive::default())
}

async fn read_event_fields(request: Request) -> ApiResult<Map<String, Value>> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains(FORM_CONTENT_TYPE));

    if is_form {
        let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .map_err(|rejection| {
                AppError::Validation(format!("invalid form body: {}", rejection.body_text()))
            })?;

        return Ok(fields
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect());
    }

    let body = to_bytes(request.into_body(), MAX_EVENT_BYTES)
        .await
        .map_err(|error| AppError::Validation(format!("failed to read request body: {error}")))?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }

    match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(AppError::Validation("log event must be a JSON object".to_owned()).into()),
        Err(error) => Err(AppError::Validation(format!("invalid JSON body: {error}")).into()),
    }
}
