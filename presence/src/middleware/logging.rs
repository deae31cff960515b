use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Records method, uri, status and latency whenever a handler returns an
/// HTTP status in the 4xx or 5xx range.
pub async fn log_error_responses(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;
    let status = response.status();
    let latency_ms = start.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            %method,
            %uri,
            status = status.as_u16(),
            latency_ms,
            "Request completed with error status"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            %method,
            %uri,
            status = status.as_u16(),
            latency_ms,
            "Request completed with error status"
        );
    }
    response
}
