use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use url::Url;

use super::error::ApiError;
use super::ApiRequest;
use crate::http_server::api::error::ErrorPayload;

/// Client for a running console API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url, session_token: Option<&str>) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = session_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ApiError::InvalidToken)?;
            value.set_sensitive(true);
            default_headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status.is_success() {
            // 201/204 carry no body
            let body: &[u8] = if body.is_empty() { b"null" } else { &body };
            return serde_json::from_slice(body)
                .map_err(|e| ApiError::HttpStatus(status, format!("invalid response body: {}", e)));
        }

        match serde_json::from_slice::<ErrorPayload>(&body) {
            Ok(payload) => Err(ApiError::Api(status, payload)),
            Err(_) => Err(ApiError::HttpStatus(
                status,
                String::from_utf8_lossy(&body).into_owned(),
            )),
        }
    }
}
