//! Shared application state

use std::sync::Arc;

use veneer::config::Settings;
use veneer::es::SearchBackend;
use veneer::synonyms::SynonymCache;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn SearchBackend>,
    pub settings: Arc<Settings>,
    pub synonyms: Arc<SynonymCache>,
}

impl AppState {
    pub fn new(backend: Arc<dyn SearchBackend>, settings: Arc<Settings>) -> Self {
        let synonyms = Arc::new(SynonymCache::from_settings(&settings));
        Self { backend, settings, synonyms }
    }
}
