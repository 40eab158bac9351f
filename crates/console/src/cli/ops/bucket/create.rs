use console::http_server::api::client::ApiError;
use console::http_server::api::v1::bucket::MakeBucketRequest;

#[async_trait::async_trait]
impl crate::cli::op::Op for MakeBucketRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        ctx.client.call(self.clone()).await?;
        Ok(format!("Created bucket: {}", self.name))
    }
}
