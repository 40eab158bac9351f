use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use storage::{with_deadline, StorageApi, StorageError, DEFAULT_REGION};
use url::Url;

use super::{bad_request, remote_error_response, REMOTE_CALL_TIMEOUT};
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::session::Principal;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct MakeBucketRequest {
    /// Name of the bucket to create
    #[arg(long)]
    pub name: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    principal: Principal,
    body: Option<Json<MakeBucketRequest>>,
) -> Result<impl IntoResponse, MakeBucketError> {
    let Json(req) = body.ok_or(MakeBucketError::MissingBody)?;
    if req.name.trim().is_empty() {
        return Err(MakeBucketError::MissingName);
    }

    let client = state.clients().storage_client(&principal);
    make_bucket(client.as_ref(), &req.name).await?;

    tracing::info!(bucket = %req.name, access_key = principal.access_key(), "bucket created");
    Ok(http::StatusCode::CREATED)
}

/// Create `name` in the fixed default region.
pub async fn make_bucket(client: &dyn StorageApi, name: &str) -> Result<(), MakeBucketError> {
    with_deadline(REMOTE_CALL_TIMEOUT, client.make_bucket(name, DEFAULT_REGION)).await?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum MakeBucketError {
    #[error("error bucket body not in request")]
    MissingBody,
    #[error("error: bucket name not present")]
    MissingName,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for MakeBucketError {
    fn into_response(self) -> Response {
        match self {
            MakeBucketError::MissingBody | MakeBucketError::MissingName => {
                tracing::warn!("{}", self);
                bad_request(self.to_string())
            }
            MakeBucketError::Storage(e) => {
                tracing::error!(error = %e, "error making bucket");
                remote_error_response(&e)
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for MakeBucketRequest {
    type Response = ();

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v1/buckets")?;
        Ok(client.post(full_url).json(&self))
    }
}
