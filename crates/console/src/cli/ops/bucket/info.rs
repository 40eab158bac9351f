use console::http_server::api::client::ApiError;
use console::http_server::api::v1::bucket::{Bucket, BucketInfoRequest};

pub(super) fn describe(bucket: &Bucket) -> String {
    match bucket.access {
        Some(access) => format!("{} (access: {})", bucket.name, access),
        None => bucket.name.clone(),
    }
}

#[async_trait::async_trait]
impl crate::cli::op::Op for BucketInfoRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let bucket: Bucket = ctx.client.call(self.clone()).await?;
        Ok(describe(&bucket))
    }
}
