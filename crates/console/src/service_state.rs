use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::FromRef;
use storage::{AdminApi, AdminClient, S3Client, StorageApi, StorageConfig, StorageError};

use crate::session::{Principal, SessionManager};
use crate::state::AppConfig;

const LIVENESS_PATH: &str = "/minio/health/live";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds storage clients scoped to a principal.
#[async_trait]
pub trait ClientProvider: Send + Sync {
    fn admin_client(&self, principal: &Principal) -> Box<dyn AdminApi>;

    fn storage_client(&self, principal: &Principal) -> Box<dyn StorageApi>;

    /// Whether the storage server is reachable at all.
    async fn ping(&self) -> Result<(), StorageError>;
}

/// Provider backed by the clients in `storage`.
///
/// The admin `reqwest::Client` (and its connection pool) is shared; the
/// credentialed clients built from it live for one request.
#[derive(Debug, Clone)]
pub struct MinioClientProvider {
    http: reqwest::Client,
    config: StorageConfig,
}

impl MinioClientProvider {
    pub fn new(config: StorageConfig) -> Result<Self, StateSetupError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl ClientProvider for MinioClientProvider {
    fn admin_client(&self, principal: &Principal) -> Box<dyn AdminApi> {
        Box::new(AdminClient::new(
            self.http.clone(),
            &self.config,
            principal.credentials().clone(),
        ))
    }

    fn storage_client(&self, principal: &Principal) -> Box<dyn StorageApi> {
        Box::new(S3Client::new(&self.config, principal.credentials().clone()))
    }

    async fn ping(&self) -> Result<(), StorageError> {
        let url = self.config.endpoint.join(LIVENESS_PATH)?;
        self.http.get(url).send().await?.error_for_status()?;
        Ok(())
    }
}

/// Main service state
#[derive(Clone)]
pub struct State {
    clients: Arc<dyn ClientProvider>,
    sessions: SessionManager,
}

impl State {
    pub fn from_config(config: &AppConfig) -> Result<Self, StateSetupError> {
        if config.session.secret.is_empty() {
            return Err(StateSetupError::MissingSessionSecret);
        }

        tracing::info!(endpoint = %config.storage.endpoint, region = %config.storage.region, "storage server");
        let clients = MinioClientProvider::new(config.storage.clone())?;
        let sessions = SessionManager::new(&config.session.secret, config.session.lifetime_hours);

        Ok(Self::new(Arc::new(clients), sessions))
    }

    pub fn new(clients: Arc<dyn ClientProvider>, sessions: SessionManager) -> Self {
        Self { clients, sessions }
    }

    pub fn clients(&self) -> &dyn ClientProvider {
        self.clients.as_ref()
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }
}

impl FromRef<State> for SessionManager {
    fn from_ref(state: &State) -> Self {
        state.sessions.clone()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("session secret is not configured")]
    MissingSessionSecret,
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
