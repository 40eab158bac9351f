use std::time::SystemTime;

use async_trait::async_trait;
use aws_sigv4::http_request::{
    sign, PayloadChecksumKind, SignableBody, SignableRequest, SigningSettings,
};
use aws_sigv4::sign::v4;
use chrono::{DateTime, Utc};
use http::{Method, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::api::AdminApi;
use crate::config::StorageConfig;
use crate::credentials::Credentials;
use crate::error::{Result, StorageError};

const ADMIN_PREFIX: &str = "/minio/admin/v3";
const SIGNING_NAME: &str = "s3";

/// Account-level usage as reported by the admin API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountUsageInfo {
    #[serde(default)]
    pub account_name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub buckets: Vec<BucketUsageInfo>,
}

// the server sends `null` for accounts without buckets
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<BucketUsageInfo>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<BucketUsageInfo>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketUsageInfo {
    pub name: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub access: BucketAccessInfo,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketAccessInfo {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
}

/// Admin API client for one principal's credentials.
#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    endpoint: Url,
    region: String,
    credentials: Credentials,
}

impl AdminClient {
    pub fn new(http: reqwest::Client, config: &StorageConfig, credentials: Credentials) -> Self {
        Self {
            http,
            endpoint: config.endpoint.clone(),
            region: config.region.clone(),
            credentials,
        }
    }

    /// SigV4 headers for a body-less request to `url`.
    fn signing_headers(
        &self,
        method: &Method,
        url: &Url,
        now: SystemTime,
    ) -> Result<Vec<(String, String)>> {
        let mut settings = SigningSettings::default();
        // the admin API rejects requests without a payload hash
        settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;

        let identity = self.credentials.to_sdk().into();
        let params = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SIGNING_NAME)
            .time(now)
            .settings(settings)
            .build()
            .map_err(|e| StorageError::Signing(e.to_string()))?
            .into();

        let signable = SignableRequest::new(
            method.as_str(),
            url.as_str(),
            std::iter::empty(),
            SignableBody::Bytes(&[]),
        )
        .map_err(|e| StorageError::Signing(e.to_string()))?;
        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| StorageError::Signing(e.to_string()))?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response> {
        let url = self.endpoint.join(path)?;
        let mut request = self.http.get(url.clone());
        for (name, value) in self.signing_headers(&Method::GET, &url, SystemTime::now())? {
            request = request.header(name, value);
        }

        tracing::debug!(%url, "admin request");
        let response = request.send().await?;
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response.text().await?;
        Err(parse_error_body(status, &body))
    }
}

#[async_trait]
impl AdminApi for AdminClient {
    async fn account_usage_info(&self) -> Result<AccountUsageInfo> {
        let path = format!("{}/accountusageinfo", ADMIN_PREFIX);
        let body = self.get(&path).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| StorageError::Decode(e.to_string()))
    }
}

/// Error document returned by the admin API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorResponse {
    code: String,
    #[serde(default)]
    message: String,
}

fn parse_error_body(status: StatusCode, body: &str) -> StorageError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => {
            let message = if err.message.is_empty() {
                err.code.clone()
            } else {
                err.message
            };
            StorageError::Remote {
                status,
                code: err.code,
                message,
            }
        }
        Err(_) => StorageError::Remote {
            status,
            code: status
                .canonical_reason()
                .unwrap_or("UnknownError")
                .replace(' ', ""),
            message: format!("unexpected response status {}", status),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_account_usage_info() {
        let body = r#"{
            "AccountName": "console",
            "Buckets": [
                {"Name": "demo", "Created": "2020-04-20T18:09:37.113Z", "Size": 1024, "Access": {"Read": true, "Write": true}},
                {"Name": "logs", "Created": "2020-05-01T00:00:00Z", "Size": 0, "Access": {"Read": true, "Write": false}}
            ]
        }"#;
        let info: AccountUsageInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.account_name, "console");
        assert_eq!(info.buckets.len(), 2);
        assert_eq!(info.buckets[0].name, "demo");
        assert_eq!(info.buckets[0].size, 1024);
        assert!(info.buckets[0].access.write);
        assert!(!info.buckets[1].access.write);
    }

    #[test]
    fn test_decode_account_without_buckets() {
        let info: AccountUsageInfo = serde_json::from_str(r#"{"AccountName": "x"}"#).unwrap();
        assert!(info.buckets.is_empty());

        let info: AccountUsageInfo =
            serde_json::from_str(r#"{"AccountName": "x", "Buckets": null}"#).unwrap();
        assert!(info.buckets.is_empty());
    }

    #[test]
    fn test_signing_headers() {
        let config = StorageConfig::new("http://localhost:9000".parse().unwrap());
        let admin = AdminClient::new(
            reqwest::Client::new(),
            &config,
            Credentials::new("minioadmin", "minioadmin").with_session_token("sts-token"),
        );
        let url: Url = "http://localhost:9000/minio/admin/v3/accountusageinfo"
            .parse()
            .unwrap();

        let headers: std::collections::HashMap<_, _> = admin
            .signing_headers(&Method::GET, &url, SystemTime::UNIX_EPOCH)
            .unwrap()
            .into_iter()
            .collect();

        let authorization = &headers["authorization"];
        assert!(authorization
            .starts_with("AWS4-HMAC-SHA256 Credential=minioadmin/19700101/us-east-1/s3/aws4_request"));
        assert!(authorization.contains("x-amz-security-token"));
        assert_eq!(headers["x-amz-date"], "19700101T000000Z");
        assert_eq!(headers["x-amz-security-token"], "sts-token");
        // sha256 of the empty body
        assert_eq!(
            headers["x-amz-content-sha256"],
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_parse_json_error_body() {
        let body = r#"{"Code":"XMinioAdminNotImplemented","Message":"not implemented","Resource":"/minio/admin/v3/accountusageinfo"}"#;
        let err = parse_error_body(StatusCode::NOT_IMPLEMENTED, body);
        assert_eq!(err.code(), Some("XMinioAdminNotImplemented"));
        assert_eq!(err.to_string(), "not implemented");
    }

    #[test]
    fn test_parse_empty_error_body() {
        let err = parse_error_body(StatusCode::FORBIDDEN, "");
        assert_eq!(err.code(), Some("Forbidden"));
    }
}
