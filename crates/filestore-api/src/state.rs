//! Shared application state passed to all handlers.

use std::sync::Arc;

use filestore_auth::Authenticator;
use filestore_core::config::AppConfig;
use filestore_core::offload::PersistencePool;
use filestore_database::store::UserStore;
use filestore_service::{AdminUserService, EventLedger, FileRegistry, UserService};
use filestore_storage::LocalObjectStore;

/// Application state shared across all request handlers.
///
/// Cloned cheaply for each request: every field is an `Arc` or a handle.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Bearer token to identity resolution.
    pub authenticator: Arc<Authenticator>,
    /// Registration, login and profile.
    pub users: Arc<UserService>,
    /// Administrative user management.
    pub admin: Arc<AdminUserService>,
    /// File registry.
    pub files: Arc<FileRegistry>,
    /// Audit trail queries.
    pub events: Arc<EventLedger>,
    /// Credential store, used for health checks.
    pub user_store: Arc<dyn UserStore>,
    /// Persistence worker pool.
    pub pool: PersistencePool,
    /// Set when objects live on the local filesystem and are served by
    /// `GET /storage/{*key}`.
    pub local_objects: Option<Arc<LocalObjectStore>>,
}
