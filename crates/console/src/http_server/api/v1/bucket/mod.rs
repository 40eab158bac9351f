//! Bucket management endpoints.
//!
//! Every handler builds a storage client scoped to the calling principal,
//! runs one or two remote calls under [`REMOTE_CALL_TIMEOUT`] and maps the
//! result to JSON. Request-shape problems are rejected before a client is
//! built.

use std::time::Duration;

use axum::response::Response;
use axum::routing::{get, put};
use axum::Router;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use storage::StorageError;
use url::Url;

use crate::access::BucketAccess;
use crate::http_server::api::client::ApiError;
use crate::http_server::api::error::error_response;
use crate::ServiceState;

pub mod create;
pub mod delete;
pub mod info;
pub mod list;
pub mod set_policy;

pub use create::MakeBucketRequest;
pub use delete::DeleteBucketRequest;
pub use info::{get_bucket_info, BucketInfoRequest};
pub use list::{ListBucketsRequest, ListBucketsResponse};
pub use set_policy::{SetBucketAccessRequest, SetBucketPolicyRequest};

/// Deadline for every call to the storage server.
pub const REMOTE_CALL_TIMEOUT: Duration = Duration::from_secs(20);

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/", get(list::handler).post(create::handler))
        .route("/:name", get(info::handler).delete(delete::handler))
        .route("/:name/set-policy", put(set_policy::handler))
        .with_state(state)
}

/// A bucket as the console reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creation_date: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<BucketAccess>,
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Bucket {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            creation_date: String::new(),
            size: 0,
            access: None,
        }
    }
}

/// Remote failures all surface as a 500 with the error text.
pub(crate) fn remote_error_response(err: &StorageError) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// `/api/v1/buckets/<name>[/<action>]`, with `name` percent-encoded.
pub(crate) fn bucket_url(base_url: &Url, name: &str, action: Option<&str>) -> Result<Url, ApiError> {
    let mut url = base_url.join("/api/v1/buckets")?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?;
        segments.push(name);
        if let Some(action) = action {
            segments.push(action);
        }
    }
    Ok(url)
}

pub(crate) fn bad_request(message: impl Into<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, message)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use storage::{
        AccountUsageInfo, AdminApi, BucketAccessInfo, BucketUsageInfo, Result, StorageApi,
    };

    use super::*;

    /// In-memory storage server that records writes.
    #[derive(Default)]
    pub(crate) struct MockStorage {
        pub policy: Mutex<String>,
        pub calls: Mutex<Vec<String>>,
        pub fail_with: Option<(&'static str, &'static str)>,
    }

    impl MockStorage {
        pub fn with_policy(policy: &str) -> Self {
            Self {
                policy: Mutex::new(policy.to_string()),
                ..Self::default()
            }
        }

        pub fn failing(code: &'static str, message: &'static str) -> Self {
            Self {
                fail_with: Some((code, message)),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> Result<()> {
            self.calls.lock().unwrap().push(call);
            match self.fail_with {
                Some((code, message)) => Err(StorageError::Remote {
                    status: StatusCode::CONFLICT,
                    code: code.to_string(),
                    message: message.to_string(),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl StorageApi for MockStorage {
        async fn make_bucket(&self, bucket: &str, region: &str) -> Result<()> {
            self.record(format!("make_bucket {} {}", bucket, region))
        }

        async fn remove_bucket(&self, bucket: &str) -> Result<()> {
            self.record(format!("remove_bucket {}", bucket))
        }

        async fn get_bucket_policy(&self, bucket: &str) -> Result<String> {
            self.record(format!("get_bucket_policy {}", bucket))?;
            Ok(self.policy.lock().unwrap().clone())
        }

        async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
            self.record(format!("set_bucket_policy {}", bucket))?;
            *self.policy.lock().unwrap() = policy.to_string();
            Ok(())
        }
    }

    /// Admin API stub; `None` answers every call with AccessDenied.
    pub(crate) struct MockAdmin(pub Option<AccountUsageInfo>);

    impl MockAdmin {
        pub fn with_buckets(names: &[&str]) -> Self {
            let created = Utc.with_ymd_and_hms(2020, 4, 20, 18, 9, 37).unwrap();
            let buckets = names
                .iter()
                .enumerate()
                .map(|(i, name)| BucketUsageInfo {
                    name: name.to_string(),
                    created,
                    size: (i as u64 + 1) * 1024,
                    access: BucketAccessInfo {
                        read: true,
                        write: true,
                    },
                })
                .collect();
            Self(Some(AccountUsageInfo {
                account_name: "console".to_string(),
                buckets,
            }))
        }
    }

    #[async_trait]
    impl AdminApi for MockAdmin {
        async fn account_usage_info(&self) -> Result<AccountUsageInfo> {
            match &self.0 {
                Some(info) => Ok(info.clone()),
                None => Err(StorageError::Remote {
                    status: StatusCode::FORBIDDEN,
                    code: "AccessDenied".to_string(),
                    message: "Access Denied.".to_string(),
                }),
            }
        }
    }

    #[test]
    fn test_bucket_omits_placeholders() {
        let bucket = Bucket {
            access: Some(BucketAccess::Private),
            ..Bucket::named("demo")
        };
        assert_eq!(
            serde_json::to_value(&bucket).unwrap(),
            serde_json::json!({"name": "demo", "access": "PRIVATE"})
        );
    }
}
