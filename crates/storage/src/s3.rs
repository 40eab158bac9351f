use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{BehaviorVersion, Region};
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use aws_sdk_s3::Client;

use crate::api::StorageApi;
use crate::config::{StorageConfig, DEFAULT_REGION};
use crate::credentials::Credentials;
use crate::error::Result;

const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";

/// S3 client for one principal's credentials.
#[derive(Debug, Clone)]
pub struct S3Client {
    client: Client,
    region: String,
}

impl S3Client {
    pub fn new(config: &StorageConfig, credentials: Credentials) -> Self {
        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.as_str().trim_end_matches('/'))
            .credentials_provider(credentials.to_sdk())
            .force_path_style(true)
            // failures go straight back to the caller
            .retry_config(RetryConfig::disabled())
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            region: config.region.clone(),
        }
    }
}

#[async_trait]
impl StorageApi for S3Client {
    async fn make_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        // us-east-1 is implied when no location constraint is sent
        if !region.is_empty() && region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        if region.is_empty() || region == self.region {
            request.send().await?;
        } else {
            request
                .customize()
                .config_override(
                    aws_sdk_s3::config::Builder::default().region(Region::new(region.to_string())),
                )
                .send()
                .await?;
        }

        tracing::debug!(bucket, region, "bucket created");
        Ok(())
    }

    async fn remove_bucket(&self, bucket: &str) -> Result<()> {
        self.client.delete_bucket().bucket(bucket).send().await?;
        tracing::debug!(bucket, "bucket removed");
        Ok(())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> Result<String> {
        match self.client.get_bucket_policy().bucket(bucket).send().await {
            Ok(output) => Ok(output.policy().unwrap_or_default().to_string()),
            Err(e) if e.code() == Some(NO_SUCH_BUCKET_POLICY) => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        if policy.is_empty() {
            self.client
                .delete_bucket_policy()
                .bucket(bucket)
                .send()
                .await?;
        } else {
            self.client
                .put_bucket_policy()
                .bucket(bucket)
                .policy(policy)
                .send()
                .await?;
        }
        Ok(())
    }
}
