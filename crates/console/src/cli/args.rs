pub use clap::Parser;

use std::path::PathBuf;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "console")]
#[command(about = "Bucket management console for S3-compatible storage")]
pub struct Args {
    /// Console API to talk to
    #[arg(long, global = true, default_value = "http://localhost:9090")]
    pub remote: Url,

    /// Session token (see `console session`)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Path to the console config directory (defaults to ~/.console)
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: crate::Command,
}
