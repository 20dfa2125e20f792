//! HTTP client for the Elasticsearch cluster
//!
//! Everything goes through the [`SearchBackend`] trait so the search
//! pipeline and the API handlers can be exercised against in-memory fakes.
//! The real client collapses every transport, status and decode failure
//! into [`Error::Upstream`]; the caller decides what the portal gets to
//! see, which is never the detail.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::Duration;

use crate::config::EsSettings;
use crate::error::{Error, Result};

/// Seam between the search pipeline and the real cluster
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Execute a search request against a single index
    async fn search(&self, index: &str, body: &Value, ignore_unavailable: bool) -> Result<Value>;

    /// Fetch one document by `_id`, returning the full GET envelope.
    /// `Ok(None)` means the document does not exist; errors are reserved
    /// for transport failures.
    async fn get_doc(&self, index: &str, id: &str) -> Result<Option<Value>>;

    /// Liveness probe; any failure reads as "down"
    async fn ping(&self) -> bool;
}

enum Auth {
    Anonymous,
    Basic { username: String, password: String },
    ApiKey(String),
}

/// reqwest-backed Elasticsearch client
pub struct EsClient {
    http: Client,
    base_url: String,
    auth: Auth,
}

impl EsClient {
    pub fn from_settings(settings: &EsSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("cannot build HTTP client: {e}")))?;

        let auth = if let Some(key) = &settings.api_key {
            Auth::ApiKey(key.clone())
        } else if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            Auth::Basic {
                username: username.clone(),
                password: password.clone(),
            }
        } else {
            Auth::Anonymous
        };

        Ok(Self {
            http,
            base_url: settings.url.trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            Auth::Anonymous => req,
            Auth::Basic { username, password } => req.basic_auth(username, Some(password)),
            Auth::ApiKey(key) => req.header("Authorization", format!("ApiKey {key}")),
        }
    }
}

#[async_trait]
impl SearchBackend for EsClient {
    async fn search(&self, index: &str, body: &Value, ignore_unavailable: bool) -> Result<Value> {
        let mut url = format!("{}/{}/_search", self.base_url, index);
        if ignore_unavailable {
            url.push_str("?ignore_unavailable=true");
        }

        let response = self
            .authed(self.http.post(&url))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("search returned {status}: {detail}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Upstream(format!("cannot decode search response: {e}")))
    }

    async fn get_doc(&self, index: &str, id: &str) -> Result<Option<Value>> {
        let url = format!("{}/{}/_doc/{}", self.base_url, index, id);

        let response = self
            .authed(self.http.get(&url))
            .send()
            .await
            .map_err(|e| Error::Upstream(e.to_string()))?;

        // a GET on a missing id is a plain 404 with found:false, not an error
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!("get returned {status}: {detail}")));
        }

        let doc: Value = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("cannot decode get response: {e}")))?;
        if doc.get("found").and_then(Value::as_bool).unwrap_or(false) {
            Ok(Some(doc))
        } else {
            Ok(None)
        }
    }

    async fn ping(&self) -> bool {
        match self.authed(self.http.get(&self.base_url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
