use reqwest::{Client, RequestBuilder};
use url::Url;

#[allow(clippy::module_inception)]
mod client;
mod error;

pub use client::ApiClient;
pub use error::ApiError;

/// A request the console API client knows how to send.
pub trait ApiRequest {
    type Response: serde::de::DeserializeOwned;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError>;
}
