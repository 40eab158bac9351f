use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use storage::policy::{set_policy, BucketAccessPolicy};
use storage::{with_deadline, StorageApi, StorageError};
use url::Url;

use super::info::get_bucket_info;
use super::{bad_request, bucket_url, remote_error_response, Bucket, REMOTE_CALL_TIMEOUT};
use crate::access::{access_to_policy, BucketAccess};
use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::session::Principal;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetBucketPolicyRequest {
    /// Requested access, validated by the handler
    #[serde(default)]
    pub access: String,
}

/// CLI/client form of a set-policy call.
#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct SetBucketAccessRequest {
    /// Name of the bucket
    #[arg(long)]
    pub name: String,
    /// New access level
    #[arg(long, value_enum)]
    pub access: BucketAccess,
}

pub async fn handler(
    State(state): State<ServiceState>,
    principal: Principal,
    Path(name): Path<String>,
    body: Option<Json<SetBucketPolicyRequest>>,
) -> Result<impl IntoResponse, SetPolicyError> {
    let requested = body.map(|Json(req)| req.access).unwrap_or_default();
    let access = validate(&name, &requested)?;

    let client = state.clients().storage_client(&principal);
    let bucket = set_bucket_access(client.as_ref(), &name, access).await?;

    tracing::info!(bucket = %name, %access, access_key = principal.access_key(), "bucket access updated");
    Ok((http::StatusCode::OK, Json(bucket)))
}

/// Checks run before any storage client is built.
pub fn validate(name: &str, access: &str) -> Result<BucketAccess, SetPolicyError> {
    if name.trim().is_empty() {
        return Err(SetPolicyError::MissingName);
    }
    if access.trim().is_empty() {
        return Err(SetPolicyError::MissingAccess);
    }
    match access.parse::<BucketAccess>() {
        Ok(level @ (BucketAccess::Private | BucketAccess::Public)) => Ok(level),
        _ => Err(SetPolicyError::Unsupported(access.to_string())),
    }
}

/// Write the canned policy for `access` and read the bucket back.
pub async fn set_bucket_access(
    client: &dyn StorageApi,
    name: &str,
    access: BucketAccess,
) -> Result<Bucket, SetPolicyError> {
    let statements = set_policy(Vec::new(), access_to_policy(access), name, "");

    // nothing to grant: clear the policy rather than store an empty one
    let document = if statements.is_empty() {
        String::new()
    } else {
        BucketAccessPolicy::new(statements)
            .to_json()
            .map_err(StorageError::from)?
    };

    with_deadline(REMOTE_CALL_TIMEOUT, client.set_bucket_policy(name, &document)).await?;

    Ok(get_bucket_info(client, name).await?)
}

#[derive(Debug, thiserror::Error)]
pub enum SetPolicyError {
    #[error("error: bucket name not present")]
    MissingName,
    #[error("error: bucket access not present")]
    MissingAccess,
    #[error("access: `{0}` not supported")]
    Unsupported(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for SetPolicyError {
    fn into_response(self) -> Response {
        match self {
            SetPolicyError::Storage(e) => {
                tracing::error!(error = %e, "error setting bucket access policy");
                remote_error_response(&e)
            }
            other => {
                tracing::warn!("{}", other);
                bad_request(other.to_string())
            }
        }
    }
}

// Client implementation - builds request for this operation
impl ApiRequest for SetBucketAccessRequest {
    type Response = Bucket;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = bucket_url(base_url, &self.name, Some("set-policy"))?;
        let body = SetBucketPolicyRequest {
            access: self.access.to_string(),
        };
        Ok(client.put(full_url).json(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_server::api::v1::bucket::tests::MockStorage;

    #[test]
    fn test_validate_messages() {
        assert_eq!(
            validate(" ", "PUBLIC").unwrap_err().to_string(),
            "error: bucket name not present"
        );
        assert_eq!(
            validate("demo", "").unwrap_err().to_string(),
            "error: bucket access not present"
        );
        assert_eq!(
            validate("demo", "CUSTOM").unwrap_err().to_string(),
            "access: `CUSTOM` not supported"
        );
        assert_eq!(
            validate("demo", "public").unwrap_err().to_string(),
            "access: `public` not supported"
        );
        assert_eq!(validate("demo", "PUBLIC").unwrap(), BucketAccess::Public);
        assert_eq!(validate("demo", "PRIVATE").unwrap(), BucketAccess::Private);
    }

    #[tokio::test]
    async fn test_public_writes_read_write_document() {
        let storage = MockStorage::default();
        let bucket = set_bucket_access(&storage, "demo", BucketAccess::Public)
            .await
            .unwrap();

        assert_eq!(bucket.access, Some(BucketAccess::Public));
        assert_eq!(
            storage.calls(),
            vec!["set_bucket_policy demo", "get_bucket_policy demo"]
        );

        let written = storage.policy.lock().unwrap().clone();
        let document = BucketAccessPolicy::from_json(&written).unwrap();
        assert_eq!(document.version, "2012-10-17");
        assert_eq!(document.statements.len(), 2);
        assert!(document.statements.iter().all(|s| s.allows_everyone()));
    }

    #[tokio::test]
    async fn test_private_clears_policy() {
        let storage = MockStorage::with_policy(r#"{"Version":"2012-10-17","Statement":[]}"#);
        let bucket = set_bucket_access(&storage, "demo", BucketAccess::Private)
            .await
            .unwrap();

        assert_eq!(storage.policy.lock().unwrap().as_str(), "");
        assert_eq!(bucket.access, Some(BucketAccess::Private));
    }

    #[tokio::test]
    async fn test_write_failure_skips_read_back() {
        let storage = MockStorage::failing("AccessDenied", "Access Denied.");
        let err = set_bucket_access(&storage, "demo", BucketAccess::Public)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Access Denied.");
        assert_eq!(storage.calls(), vec!["set_bucket_policy demo"]);
    }
}
