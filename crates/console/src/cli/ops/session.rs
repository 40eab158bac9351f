use clap::Args;

use console::session::SessionError;
use console::state::{AppState, StateError};
use console::SessionManager;
use storage::Credentials;

/// Mint a session token for a set of storage credentials.
#[derive(Args, Debug, Clone)]
pub struct Session {
    /// Storage access key
    #[arg(long)]
    pub access_key: String,

    /// Storage secret key
    #[arg(long)]
    pub secret_key: String,

    /// STS session token, for temporary credentials
    #[arg(long)]
    pub session_token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionOpError {
    #[error("state error: {0}")]
    State(#[from] StateError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Session {
    type Error = SessionOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = AppState::load(ctx.config_path.clone())?;
        let sessions = SessionManager::new(
            &state.config.session.secret,
            state.config.session.lifetime_hours,
        );

        let mut credentials = Credentials::new(&self.access_key, &self.secret_key);
        credentials.session_token = self.session_token.clone();

        Ok(sessions.issue(&credentials)?)
    }
}
