// src/services/prober.rs

//! Candidate path probing for pages whose location varies by deployment.

use url::Url;

use crate::error::{AppError, Result};
use crate::models::TableSet;
use crate::services::extractor::parse_tables;
use crate::services::session::Session;
use crate::utils::http::PageResponse;

/// Tries candidate paths in order under an authenticated session.
pub struct CandidateProber<'a> {
    session: &'a Session,
}

impl<'a> CandidateProber<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Extract from the first candidate that answers without an error status.
    ///
    /// Error statuses and transport failures move on to the next candidate;
    /// when all fail the last error is returned.
    pub async fn probe_with<T, F>(&self, candidates: &[String], extract: F) -> Result<T>
    where
        F: FnOnce(&Url, &PageResponse) -> T,
    {
        let mut last_error = None;

        for path in candidates {
            let url = match self.session.url_for(path) {
                Ok(url) => url,
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            };

            match self.session.get_url(&url).await {
                Ok(page) if page.is_error() => {
                    log::debug!("Candidate {path} answered {}", page.status);
                    last_error = Some(AppError::upstream(page.status, url.as_str()));
                }
                Ok(page) => {
                    log::info!("Using candidate {path}");
                    return Ok(extract(&url, &page));
                }
                Err(e) => {
                    log::debug!("Candidate {path} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::NotFound("no candidate paths".to_string())))
    }

    /// All tables of the first reachable candidate.
    pub async fn probe_tables(&self, candidates: &[String]) -> Result<TableSet> {
        self.probe_with(candidates, |url, page| TableSet {
            url: url.to_string(),
            tables: parse_tables(&page.body),
        })
        .await
    }
}
