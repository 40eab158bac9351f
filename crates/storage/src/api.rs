use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::admin::AccountUsageInfo;
use crate::error::{Result, StorageError};

/// Administrative calls against the storage server.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Usage information for every bucket the caller's account can see.
    async fn account_usage_info(&self) -> Result<AccountUsageInfo>;
}

/// S3 calls against the storage server.
#[async_trait]
pub trait StorageApi: Send + Sync {
    /// Create `bucket` in `region`.
    async fn make_bucket(&self, bucket: &str, region: &str) -> Result<()>;

    /// Delete an (empty) bucket.
    async fn remove_bucket(&self, bucket: &str) -> Result<()>;

    /// Raw bucket policy document, or an empty string when none is set.
    async fn get_bucket_policy(&self, bucket: &str) -> Result<String>;

    /// Replace the bucket policy. An empty `policy` clears it.
    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()>;
}

/// Run a storage call under a deadline.
///
/// Expiry surfaces as [`StorageError::DeadlineExceeded`]; the pending call is dropped.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::DeadlineExceeded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_with_deadline_expires() {
        let result: Result<()> = with_deadline(Duration::from_secs(20), async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(StorageError::DeadlineExceeded)));
    }

    #[tokio::test]
    async fn test_with_deadline_passes_errors_through() {
        let result: Result<()> = with_deadline(Duration::from_secs(20), async {
            Err(StorageError::Decode("bad body".into()))
        })
        .await;
        assert!(matches!(result, Err(StorageError::Decode(_))));
    }
}
