use axum::extract::{Json, State};
use axum::response::{IntoResponse, Response};
use chrono::SecondsFormat;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use storage::{with_deadline, AdminApi, BucketUsageInfo, StorageError};
use url::Url;

use super::{remote_error_response, Bucket, REMOTE_CALL_TIMEOUT};
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::session::Principal;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize, clap::Args)]
pub struct ListBucketsRequest {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBucketsResponse {
    pub buckets: Vec<Bucket>,
    pub total: i64,
}

pub async fn handler(
    State(state): State<ServiceState>,
    principal: Principal,
) -> Result<impl IntoResponse, ListError> {
    let admin = state.clients().admin_client(&principal);
    let response = list_buckets(admin.as_ref()).await?;
    tracing::debug!(
        access_key = principal.access_key(),
        total = response.total,
        "listed buckets"
    );
    Ok((http::StatusCode::OK, Json(response)))
}

/// Every bucket the account can see, with creation date and size.
pub async fn list_buckets(admin: &dyn AdminApi) -> Result<ListBucketsResponse, ListError> {
    let info = with_deadline(REMOTE_CALL_TIMEOUT, admin.account_usage_info()).await?;

    let buckets: Vec<Bucket> = info.buckets.into_iter().map(to_bucket).collect();
    let total = buckets.len() as i64;
    Ok(ListBucketsResponse { buckets, total })
}

fn to_bucket(usage: BucketUsageInfo) -> Bucket {
    Bucket {
        creation_date: usage.created.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        // sizes past i64::MAX are reported as i64::MAX
        size: i64::try_from(usage.size).unwrap_or(i64::MAX),
        ..Bucket::named(usage.name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ListError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for ListError {
    fn into_response(self) -> Response {
        match self {
            ListError::Storage(e) => {
                tracing::error!(error = %e, "error listing buckets");
                remote_error_response(&e)
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for ListBucketsRequest {
    type Response = ListBucketsResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join("/api/v1/buckets")?;
        Ok(client.get(full_url))
    }
}
