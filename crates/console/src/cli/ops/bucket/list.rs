use console::http_server::api::client::ApiError;
use console::http_server::api::v1::bucket::{ListBucketsRequest, ListBucketsResponse};

#[async_trait::async_trait]
impl crate::cli::op::Op for ListBucketsRequest {
    type Error = ApiError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let response: ListBucketsResponse = ctx.client.call(self.clone()).await?;

        if response.buckets.is_empty() {
            return Ok("No buckets found".to_string());
        }

        let mut lines: Vec<String> = response
            .buckets
            .iter()
            .map(|b| format!("{}\t{}\t{} bytes", b.name, b.creation_date, b.size))
            .collect();
        lines.push(format!("{} bucket(s)", response.total));
        Ok(lines.join("\n"))
    }
}
