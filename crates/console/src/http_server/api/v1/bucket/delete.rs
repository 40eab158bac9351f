use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use storage::{with_deadline, StorageApi, StorageError};
use url::Url;

use super::{bad_request, bucket_url, remote_error_response, REMOTE_CALL_TIMEOUT};
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::session::Principal;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct DeleteBucketRequest {
    /// Name of the bucket to delete
    #[arg(long)]
    pub name: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    principal: Principal,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, DeleteBucketError> {
    if name.is_empty() {
        return Err(DeleteBucketError::MissingName);
    }

    let client = state.clients().storage_client(&principal);
    remove_bucket(client.as_ref(), &name).await?;

    tracing::info!(bucket = %name, access_key = principal.access_key(), "bucket deleted");
    Ok(http::StatusCode::NO_CONTENT)
}

pub async fn remove_bucket(client: &dyn StorageApi, name: &str) -> Result<(), DeleteBucketError> {
    with_deadline(REMOTE_CALL_TIMEOUT, client.remove_bucket(name)).await?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum DeleteBucketError {
    #[error("error bucket name not in request")]
    MissingName,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for DeleteBucketError {
    fn into_response(self) -> Response {
        match self {
            DeleteBucketError::MissingName => {
                tracing::warn!("{}", self);
                bad_request(self.to_string())
            }
            DeleteBucketError::Storage(e) => {
                tracing::error!(error = %e, "error deleting bucket");
                remote_error_response(&e)
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for DeleteBucketRequest {
    type Response = ();

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = bucket_url(base_url, &self.name, None)?;
        Ok(client.delete(full_url))
    }
}
