use serde::{Deserialize, Serialize};
use url::Url;

/// Region used when none is configured, and the one buckets are created in.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Where the storage server lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Storage server endpoint (e.g., "http://localhost:9000")
    pub endpoint: Url,
    /// Region requests are signed for
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl StorageConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            region: default_region(),
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_defaults_when_missing() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"endpoint": "http://localhost:9000"}"#).unwrap();
        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.endpoint.port(), Some(9000));
    }
}
