use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use storage::policy::{get_policy, BucketAccessPolicy, BucketPolicy};
use storage::{with_deadline, StorageApi, StorageError};
use url::Url;

use super::{bucket_url, remote_error_response, Bucket, REMOTE_CALL_TIMEOUT};
use crate::access::{policy_to_access, BucketAccess};
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::session::Principal;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct BucketInfoRequest {
    /// Name of the bucket to inspect
    #[arg(long)]
    pub name: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    principal: Principal,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, InfoError> {
    let client = state.clients().storage_client(&principal);
    let bucket = get_bucket_info(client.as_ref(), &name).await?;
    Ok((http::StatusCode::OK, Json(bucket)))
}

/// Name and access level of `name`.
///
/// Creation date and size are not looked up here.
pub async fn get_bucket_info(client: &dyn StorageApi, name: &str) -> Result<Bucket, StorageError> {
    let document = with_deadline(REMOTE_CALL_TIMEOUT, client.get_bucket_policy(name)).await?;

    let policy = if document.is_empty() {
        BucketPolicy::None
    } else {
        let parsed = BucketAccessPolicy::from_json(&document)?;
        get_policy(&parsed.statements, name, "")
    };

    let mut access = policy_to_access(policy);
    // some policy exists, it just isn't one of ours
    if access == BucketAccess::Private && !document.is_empty() {
        access = BucketAccess::Custom;
    }

    Ok(Bucket {
        access: Some(access),
        ..Bucket::named(name)
    })
}

#[derive(Debug, thiserror::Error)]
pub enum InfoError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for InfoError {
    fn into_response(self) -> Response {
        match self {
            InfoError::Storage(e) => {
                tracing::error!(error = %e, "error getting bucket's info");
                remote_error_response(&e)
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for BucketInfoRequest {
    type Response = Bucket;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = bucket_url(base_url, &self.name, None)?;
        Ok(client.get(full_url))
    }
}
