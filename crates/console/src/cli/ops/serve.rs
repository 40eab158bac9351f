use std::net::SocketAddr;

use clap::Args;

use console::process::ServiceError;
use console::spawn_service;
use console::state::{AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Override the listen address (default from config)
    #[arg(long)]
    pub listen_addr: Option<SocketAddr>,

    /// Override the log level (default from config)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error("service failed: {0}")]
    Service(#[from] ServiceError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;

        let mut config = state.config;
        if let Some(addr) = self.listen_addr {
            config.listen_addr = addr;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }

        spawn_service(&config).await?;
        Ok("console stopped".to_string())
    }
}
