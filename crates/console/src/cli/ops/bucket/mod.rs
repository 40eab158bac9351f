use clap::{Args, Subcommand};

pub mod create;
pub mod delete;
pub mod info;
pub mod list;
pub mod set_access;

use crate::cli::op::Op;
use console::http_server::api::v1::bucket::{
    BucketInfoRequest, DeleteBucketRequest, ListBucketsRequest, MakeBucketRequest,
    SetBucketAccessRequest,
};

crate::command_enum! {
    (List, ListBucketsRequest),
    (Create, MakeBucketRequest),
    (Delete, DeleteBucketRequest),
    (Info, BucketInfoRequest),
    (SetAccess, SetBucketAccessRequest),
}

pub type BucketCommand = Command;

#[derive(Args, Debug, Clone)]
pub struct Bucket {
    #[command(subcommand)]
    pub command: BucketCommand,
}

#[async_trait::async_trait]
impl Op for Bucket {
    type Error = OpError;
    type Output = OpOutput;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}
