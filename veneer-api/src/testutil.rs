//! Test doubles shared by the endpoint tests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

use veneer::config::Settings;
use veneer::error::{Error, Result};
use veneer::es::SearchBackend;

use crate::state::AppState;

/// Scripted backend: canned responses, captured requests
pub struct StubBackend {
    search_response: Value,
    doc: Option<Value>,
    fail: bool,
    captured: Mutex<Vec<(String, Value)>>,
}

impl StubBackend {
    /// Every call succeeds: searches see an empty result set, lookups find
    /// a minimal document
    pub fn ok() -> Self {
        Self {
            search_response: json!({
                "took": 1,
                "timed_out": false,
                "hits": {"total": {"value": 0, "relation": "eq"}, "max_score": null, "hits": []}
            }),
            doc: Some(json!({"found": true, "_id": "stub", "_source": {"name": "stub"}})),
            fail: false,
            captured: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails the way an unreachable cluster would
    pub fn failing() -> Self {
        Self { fail: true, ..Self::ok() }
    }

    pub fn with_search_response(mut self, resp: Value) -> Self {
        self.search_response = resp;
        self
    }

    pub fn with_doc(mut self, doc: Option<Value>) -> Self {
        self.doc = doc;
        self
    }

    /// Body of the most recent search dispatched to the given index
    pub fn last_search(&self, index: &str) -> Option<Value> {
        self.captured
            .lock()
            .iter()
            .rev()
            .find(|(seen, _)| seen == index)
            .map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl SearchBackend for StubBackend {
    async fn search(&self, index: &str, body: &Value, _ignore: bool) -> Result<Value> {
        if self.fail {
            return Err(Error::Upstream("stub backend down".to_string()));
        }
        self.captured.lock().push((index.to_string(), body.clone()));
        Ok(self.search_response.clone())
    }

    async fn get_doc(&self, _index: &str, _id: &str) -> Result<Option<Value>> {
        if self.fail {
            return Err(Error::Upstream("stub backend down".to_string()));
        }
        Ok(self.doc.clone())
    }

    async fn ping(&self) -> bool {
        !self.fail
    }
}

/// AppState over a stub backend with default settings; the backend handle
/// comes back too so tests can assert on captured requests
pub fn state_with(backend: StubBackend) -> (AppState, Arc<StubBackend>) {
    let backend = Arc::new(backend);
    let state = AppState::new(backend.clone(), Arc::new(Settings::default()));
    (state, backend)
}
