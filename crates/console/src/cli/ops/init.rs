use std::net::SocketAddr;

use clap::Args;
use url::Url;

use console::state::{AppConfig, AppState, StateError};
use storage::StorageConfig;

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Console API listen address
    #[arg(long, default_value = "0.0.0.0:9090")]
    pub listen_addr: SocketAddr,

    /// Storage server endpoint
    #[arg(long, default_value = "http://localhost:9000")]
    pub storage_endpoint: Url,

    /// Region requests are signed for
    #[arg(long, default_value = storage::DEFAULT_REGION)]
    pub region: String,

    /// Session lifetime in hours
    #[arg(long, default_value_t = 12)]
    pub session_lifetime_hours: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig {
            listen_addr: self.listen_addr,
            storage: StorageConfig::new(self.storage_endpoint.clone())
                .with_region(self.region.clone()),
            ..AppConfig::default()
        };
        config.session.lifetime_hours = self.session_lifetime_hours;

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        Ok(format!(
            "Initialized console directory at: {}\n\
             - Config: {}\n\
             - Listen address: {}\n\
             - Storage endpoint: {} ({})",
            state.console_dir.display(),
            state.config_path.display(),
            state.config.listen_addr,
            state.config.storage.endpoint,
            state.config.storage.region,
        ))
    }
}
