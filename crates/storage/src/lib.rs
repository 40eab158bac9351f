//! Storage-server collaborators for the bucket console.
//!
//! This crate provides everything the console needs to talk to an
//! S3-compatible object-storage server (MinIO):
//!
//! - [`AdminApi`] and [`StorageApi`], the seams the console handlers call
//! - [`S3Client`], built on the AWS SDK with path-style addressing, and
//!   [`AdminClient`], which signs its requests with AWS Signature V4
//! - [`policy`], the bucket policy document model and the canned-policy
//!   helpers used to derive and classify statement sets
//!
//! # Example
//!
//! ```rust,no_run
//! use storage::{Credentials, S3Client, StorageApi, StorageConfig};
//!
//! # async fn example() -> Result<(), storage::StorageError> {
//! let config = StorageConfig::new("http://localhost:9000".parse()?);
//! let credentials = Credentials::new("minioadmin", "minioadmin");
//! let client = S3Client::new(&config, credentials);
//!
//! let policy = client.get_bucket_policy("demo").await?;
//! println!("policy: {policy:?}");
//! # Ok(())
//! # }
//! ```

mod admin;
mod api;
mod config;
mod credentials;
mod error;
pub mod policy;
mod s3;

pub use admin::{AccountUsageInfo, AdminClient, BucketAccessInfo, BucketUsageInfo};
pub use api::{with_deadline, AdminApi, StorageApi};
pub use config::{StorageConfig, DEFAULT_REGION};
pub use credentials::Credentials;
pub use error::{Result, StorageError};
pub use s3::S3Client;
