//! Application State
//! Mission: One struct wiring config, cache, token service, and every store

use crate::auth::middleware::GateState;
use crate::auth::{AuthStore, Resolver, TokenService};
use crate::cache::{Brain, MemoryBackend};
use crate::categories::CategoryStore;
use crate::config::AppConfig;
use crate::features::FeatureStore;
use crate::inspections::InspectionStore;
use crate::inspectors::InspectorStore;
use crate::minesites::MinesiteStore;
use crate::rmb_staff::RmbStaffStore;
use crate::sections::SectionStore;
use anyhow::Result;
use std::sync::Arc;

/// Everything handlers need, built once at startup and cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub brain: Brain,
    pub tokens: Arc<TokenService>,
    pub auth_store: Arc<AuthStore>,
    pub resolver: Arc<Resolver>,
    pub minesites: Arc<MinesiteStore>,
    pub sections: Arc<SectionStore>,
    pub categories: Arc<CategoryStore>,
    pub features: Arc<FeatureStore>,
    pub inspectors: Arc<InspectorStore>,
    pub rmb_staff: Arc<RmbStaffStore>,
    pub inspections: Arc<InspectionStore>,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let backend = Arc::new(MemoryBackend::new());
        let brain = Brain::new(backend, &config.cache_namespace);
        let tokens = Arc::new(TokenService::new(config.secret_key.clone()));
        let auth_store = Arc::new(AuthStore::new(&config.db_path)?);
        let resolver = Arc::new(Resolver::new(
            brain.clone(),
            auth_store.clone(),
            tokens.clone(),
        ));

        Ok(Self {
            brain,
            tokens,
            auth_store,
            resolver,
            minesites: Arc::new(MinesiteStore::new(&config.db_path)?),
            sections: Arc::new(SectionStore::new(&config.db_path)?),
            categories: Arc::new(CategoryStore::new(&config.db_path)?),
            features: Arc::new(FeatureStore::new(&config.db_path)?),
            inspectors: Arc::new(InspectorStore::new(&config.db_path)?),
            rmb_staff: Arc::new(RmbStaffStore::new(&config.db_path)?),
            inspections: Arc::new(InspectionStore::new(&config.db_path)?),
        })
    }

    pub fn gates(&self) -> GateState {
        GateState {
            tokens: self.tokens.clone(),
            resolver: self.resolver.clone(),
        }
    }
}
