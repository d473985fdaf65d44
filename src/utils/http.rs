// src/utils/http.rs

//! HTTP transport used by the login handshake and the data operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use reqwest_cookie_store::CookieStoreMutex;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{FormPayload, PortalConfig};

/// A fetched page after redirects have been followed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    pub status: u16,
    /// Final URL
    pub url: String,
    pub body: String,
}

impl PageResponse {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// The network seam. One transport owns one cookie store.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<PageResponse>;

    async fn post_form(
        &self,
        url: &Url,
        form: &FormPayload,
        timeout: Duration,
    ) -> Result<PageResponse>;

    /// Whether the cookie store holds any unexpired cookie, whatever its
    /// domain or path.
    fn has_cookies(&self) -> bool;
}

/// Creates a fresh transport for every login attempt.
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn Transport>>;
}

// --- reqwest ---

/// Async reqwest client with its own cookie store.
pub struct HttpTransport {
    client: reqwest::Client,
    cookies: Arc<CookieStoreMutex>,
}

impl HttpTransport {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let cookies = Arc::new(CookieStoreMutex::default());
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .cookie_provider(Arc::clone(&cookies))
            .build()?;
        Ok(Self { client, cookies })
    }

    async fn read(response: reqwest::Response) -> Result<PageResponse> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await?;
        Ok(PageResponse { status, url, body })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<PageResponse> {
        log::debug!("GET {url}");
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await?;
        Self::read(response).await
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &FormPayload,
        timeout: Duration,
    ) -> Result<PageResponse> {
        log::debug!("POST {url} ({} fields)", form.len());
        let response = self
            .client
            .post(url.clone())
            .form(form)
            .timeout(timeout)
            .send()
            .await?;
        Self::read(response).await
    }

    fn has_cookies(&self) -> bool {
        let store = self.cookies.lock().unwrap_or_else(|e| e.into_inner());
        let any = store.iter_unexpired().next().is_some();
        any
    }
}

/// Connector producing [`HttpTransport`]s.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    config: PortalConfig,
}

impl HttpConnector {
    pub fn new(config: PortalConfig) -> Self {
        Self { config }
    }
}

impl Connector for HttpConnector {
    fn connect(&self) -> Result<Arc<dyn Transport>> {
        Ok(Arc::new(HttpTransport::new(&self.config)?))
    }
}

// --- Scripted ---

/// Canned reply served by a [`ScriptedTransport`].
#[derive(Debug, Clone)]
pub struct ScriptedResponse {
    pub status: u16,
    /// Final URL after an imagined redirect; defaults to the request URL
    pub final_url: Option<String>,
    pub body: String,
    /// Serving this reply stores a cookie
    pub sets_cookie: bool,
    /// Fail the request with a transport error instead of answering
    pub failure: Option<String>,
}

impl ScriptedResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            final_url: None,
            body: body.into(),
            sets_cookie: false,
            failure: None,
        }
    }

    /// A request that never gets an answer, like a refused connection.
    pub fn transport_error(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::status(0, "")
        }
    }

    pub fn redirected_to(mut self, url: impl Into<String>) -> Self {
        self.final_url = Some(url.into());
        self
    }

    pub fn with_cookie(mut self) -> Self {
        self.sets_cookie = true;
        self
    }
}

/// A request observed by a [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub form: Option<FormPayload>,
}

#[derive(Default)]
struct Script {
    routes: HashMap<(&'static str, String), Vec<ScriptedResponse>>,
    requests: Vec<RecordedRequest>,
    has_cookie: bool,
}

/// In-memory transport replaying canned responses keyed by method and URL.
///
/// Each route serves its replies in order and keeps repeating the last one.
/// Unscripted URLs answer 404. Every request is recorded, failed ones too.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_get(&self, url: &str, response: ScriptedResponse) -> &Self {
        self.route("GET", url, response)
    }

    pub fn on_post(&self, url: &str, response: ScriptedResponse) -> &Self {
        self.route("POST", url, response)
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    fn route(&self, method: &'static str, url: &str, response: ScriptedResponse) -> &Self {
        self.lock()
            .routes
            .entry((method, url.to_string()))
            .or_default()
            .push(response);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn serve(
        &self,
        method: &'static str,
        url: &Url,
        form: Option<&FormPayload>,
    ) -> Result<PageResponse> {
        let mut script = self.lock();
        script.requests.push(RecordedRequest {
            method,
            url: url.to_string(),
            form: form.cloned(),
        });

        let reply = match script.routes.get_mut(&(method, url.to_string())) {
            Some(queue) if queue.len() > 1 => Some(queue.remove(0)),
            Some(queue) => queue.first().cloned(),
            None => None,
        };

        let Some(reply) = reply else {
            return Ok(PageResponse {
                status: 404,
                url: url.to_string(),
                body: String::new(),
            });
        };
        if let Some(message) = reply.failure {
            return Err(AppError::transport(format!("{method} {url}: {message}")));
        }
        script.has_cookie |= reply.sets_cookie;
        Ok(PageResponse {
            status: reply.status,
            url: reply.final_url.unwrap_or_else(|| url.to_string()),
            body: reply.body,
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &Url, _timeout: Duration) -> Result<PageResponse> {
        self.serve("GET", url, None)
    }

    async fn post_form(
        &self,
        url: &Url,
        form: &FormPayload,
        _timeout: Duration,
    ) -> Result<PageResponse> {
        self.serve("POST", url, Some(form))
    }

    fn has_cookies(&self) -> bool {
        self.lock().has_cookie
    }
}

/// Connector handing out one shared [`ScriptedTransport`].
#[derive(Clone)]
pub struct ScriptedConnector {
    transport: Arc<ScriptedTransport>,
}

impl ScriptedConnector {
    pub fn new(transport: Arc<ScriptedTransport>) -> Self {
        Self { transport }
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self) -> Result<Arc<dyn Transport>> {
        Ok(self.transport.clone())
    }
}
