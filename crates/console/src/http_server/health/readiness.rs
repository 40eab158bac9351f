use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tokio::time::timeout;

use super::data_source::*;

const READINESS_TIMEOUT: Duration = Duration::from_secs(5);

#[tracing::instrument]
pub async fn handler(data_src: StateDataSource) -> Response {
    match timeout(READINESS_TIMEOUT, data_src.is_ready()).await {
        Ok(Ok(())) => (StatusCode::OK, Json(serde_json::json!({"status": "ok"}))).into_response(),
        Ok(Err(DataSourceError::DependencyFailure)) => unavailable("storage server unreachable"),
        Err(_) => unavailable("readiness check timed out"),
    }
}

fn unavailable(message: &str) -> Response {
    let body = serde_json::json!({"status": "failure", "message": message});
    (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
}
