// src/services/session.rs

//! Authenticated session and its lifecycle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::PortalConfig;
use crate::utils::http::{PageResponse, Transport};

/// Cookies and base URL established by a successful login.
pub struct Session {
    transport: Arc<dyn Transport>,
    base_url: Url,
    created_at: DateTime<Utc>,
    timeout: Duration,
    logout_timeout: Duration,
}

impl Session {
    pub fn new(transport: Arc<dyn Transport>, base_url: Url, config: &PortalConfig) -> Self {
        Self {
            transport,
            base_url,
            created_at: Utc::now(),
            timeout: config.timeout(),
            logout_timeout: config.logout_timeout(),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Resolve a portal path against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// GET a URL, whatever status it answers with.
    pub async fn get_url(&self, url: &Url) -> Result<PageResponse> {
        self.transport.get(url, self.timeout).await
    }

    /// GET a path, whatever status it answers with.
    pub async fn get(&self, path: &str) -> Result<PageResponse> {
        let url = self.url_for(path)?;
        self.get_url(&url).await
    }

    /// GET a path, turning an error status into [`AppError::UpstreamHttp`].
    pub async fn fetch(&self, path: &str) -> Result<(Url, PageResponse)> {
        let url = self.url_for(path)?;
        let page = self.get_url(&url).await?;
        if page.is_error() {
            return Err(AppError::upstream(page.status, url.as_str()));
        }
        Ok((url, page))
    }

    /// Best-effort visit of the logout endpoint.
    pub async fn close(self, logout_path: &str) {
        let url = match self.url_for(logout_path) {
            Ok(url) => url,
            Err(e) => {
                log::warn!("Logout request skipped: {e}");
                return;
            }
        };
        match self.transport.get(&url, self.logout_timeout).await {
            Ok(page) => log::debug!("Logout answered {}", page.status),
            Err(e) => log::warn!("Logout request failed: {e}"),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Lifecycle state of the [`SessionHandle`].
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated(Session),
}

/// Holds at most one session.
///
/// `Unauthenticated -> Authenticating -> Authenticated -> Unauthenticated`,
/// or back from `Authenticating` when the login is rejected. Data operations
/// are only allowed while authenticated.
#[derive(Debug, Default)]
pub struct SessionHandle {
    state: SessionState,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Enter `Authenticating`, dropping any previous session.
    pub fn begin_login(&mut self) {
        if matches!(self.state, SessionState::Authenticated(_)) {
            log::info!("Discarding previous session");
        }
        self.state = SessionState::Authenticating;
    }

    pub fn establish(&mut self, session: Session) {
        self.state = SessionState::Authenticated(session);
    }

    /// Return to `Unauthenticated` after a rejected login.
    pub fn abandon(&mut self) {
        self.state = SessionState::Unauthenticated;
    }

    pub fn session(&self) -> Result<&Session> {
        match &self.state {
            SessionState::Authenticated(session) => Ok(session),
            _ => Err(AppError::NotAuthenticated),
        }
    }

    /// Move the session out, leaving the handle unauthenticated.
    pub fn take(&mut self) -> Option<Session> {
        match std::mem::take(&mut self.state) {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}
