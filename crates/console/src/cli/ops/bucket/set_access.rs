use console::http_server::api::client::ApiError;
use console::http_server::api::v1::bucket::{Bucket, SetBucketAccessRequest};

use super::info::describe;

#[async_trait::async_trait]
impl crate::cli::op::Op for SetBucketAccessRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bucket: Bucket = ctx.client.call(self.clone()).await?;
        Ok(format!("Updated {}", describe(&bucket)))
    }
}
