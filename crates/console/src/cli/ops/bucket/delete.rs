use console::http_server::api::client::ApiError;
use console::http_server::api::v1::bucket::DeleteBucketRequest;

#[async_trait::async_trait]
impl crate::cli::op::Op for DeleteBucketRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.client.call(self.clone()).await?;
        Ok(format!("Deleted bucket: {}", self.name))
    }
}
