use std::sync::Arc;

use crate::bolt::ExcludeList;
use crate::config::AppConfig;
use crate::db::Database;
use crate::llm::{ChatModel, ModelRegistry, OpenAiCompatClient};
use crate::session::{GenerationRegistry, SessionRegistry, SyncQueue};
use crate::storage::ObjectStore;
use crate::upstream::{IdemClient, IdentityVerifier, ProjectSource};

/// Outbound services, swappable in tests.
#[derive(Clone)]
pub struct Backends {
    pub llm: Arc<dyn ChatModel>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub projects: Arc<dyn ProjectSource>,
}

/// Shared application state for the API server
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub sessions: SessionRegistry,
    pub generations: GenerationRegistry,
    pub sync_queue: Arc<SyncQueue>,
    pub store: ObjectStore,
    pub models: Arc<ModelRegistry>,
    pub llm: Arc<dyn ChatModel>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub projects: Arc<dyn ProjectSource>,
}

impl AppState {
    pub fn new(
        db: Database,
        models: ModelRegistry,
        exclude: ExcludeList,
        public_url: &str,
        backends: Backends,
    ) -> Self {
        Self {
            store: ObjectStore::new(db.clone(), public_url),
            db,
            sessions: SessionRegistry::new(exclude),
            generations: GenerationRegistry::new(),
            sync_queue: Arc::new(SyncQueue::new()),
            models: Arc::new(models),
            llm: backends.llm,
            identity: backends.identity,
            projects: backends.projects,
        }
    }

    /// Wire the HTTP-backed services described by `config`.
    pub fn from_config(db: Database, config: &AppConfig) -> Self {
        let models = config.model_registry();
        let idem = Arc::new(IdemClient::new(config.idem_api_base_url.clone()));
        let backends = Backends {
            llm: Arc::new(OpenAiCompatClient::new(models.clone())),
            identity: idem.clone(),
            projects: idem,
        };
        Self::new(db, models, config.exclude_list(), &config.public_url, backends)
    }
}
