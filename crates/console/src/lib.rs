// Service modules (console functionality)
pub mod access;
pub mod http_server;
pub mod process;
pub mod service_state;
pub mod session;
pub mod version;

// App state (configuration, paths)
pub mod state;

// Re-exports for consumers
pub use access::BucketAccess;
pub use process::spawn_service;
pub use service_state::{ClientProvider, MinioClientProvider, State as ServiceState};
pub use session::{Principal, SessionManager};
pub use state::{AppConfig, AppState, StateError};
