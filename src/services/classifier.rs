// src/services/classifier.rs

//! Login outcome classification.
//!
//! The portal has no authoritative "logged in" signal. Success requires all
//! of the gate checks and at least one of the evidence checks:
//!
//! - gates: cookies present, postback status in `200..400`, login banner gone
//! - evidence: redirected away from the login URL, probe page lacks the login
//!   form, probe page shows the student panel

use crate::models::{LoginConfig, LoginEvidence, LoginOutcome};
use crate::utils::http::PageResponse;

/// Observations gathered by the handshake.
#[derive(Debug, Clone, Copy)]
pub struct LoginSignals<'a> {
    pub login_url: &'a str,
    pub post_url: &'a str,
    pub post: &'a PageResponse,
    pub probe: &'a PageResponse,
    pub has_cookies: bool,
}

/// Applies the login heuristic for one form layout.
pub struct LoginOutcomeClassifier<'a> {
    config: &'a LoginConfig,
    username_field: &'a str,
    password_field: &'a str,
    success_text: Option<&'a str>,
}

impl<'a> LoginOutcomeClassifier<'a> {
    pub fn new(config: &'a LoginConfig, username_field: &'a str, password_field: &'a str) -> Self {
        Self {
            config,
            username_field,
            password_field,
            success_text: None,
        }
    }

    /// Accept an extra panel marker on the probe page.
    pub fn with_success_text(mut self, text: Option<&'a str>) -> Self {
        self.success_text = text.filter(|t| !t.is_empty());
        self
    }

    pub fn classify(&self, signals: &LoginSignals<'_>) -> LoginOutcome {
        let login_form_markers = [
            self.config.login_banner.as_str(),
            self.username_field,
            self.password_field,
        ];
        let panel_markers: Vec<&str> = self
            .config
            .panel_markers
            .iter()
            .map(String::as_str)
            .chain(self.success_text)
            .collect();

        let evidence = LoginEvidence {
            login_url: signals.login_url.to_string(),
            post_url: signals.post_url.to_string(),
            post_status: signals.post.status,
            post_final_url: signals.post.url.clone(),
            probe_status: signals.probe.status,
            probe_final_url: signals.probe.url.clone(),
            has_cookies: signals.has_cookies,
            ok_status: ok_status(signals.post.status),
            login_banner_gone: login_banner_gone(&signals.post.body, &self.config.login_banner),
            redirected_away: redirected_away(
                &signals.post.url,
                signals.login_url,
                &self.config.authenticated_path_fragments,
            ),
            probe_lacks_login_form: probe_lacks_login_form(
                &signals.probe.body,
                &login_form_markers,
            ),
            probe_shows_panel: probe_shows_panel(
                &signals.probe.body,
                &signals.probe.url,
                signals.login_url,
                &panel_markers,
            ),
        };

        LoginOutcome {
            success: decide(&evidence),
            evidence,
        }
    }
}

/// Combine the named checks.
pub fn decide(evidence: &LoginEvidence) -> bool {
    let gates = evidence.has_cookies && evidence.ok_status && evidence.login_banner_gone;
    let corroborated = evidence.redirected_away
        || evidence.probe_lacks_login_form
        || evidence.probe_shows_panel;
    gates && corroborated
}

pub fn ok_status(status: u16) -> bool {
    (200..400).contains(&status)
}

pub fn login_banner_gone(post_body: &str, banner: &str) -> bool {
    !post_body.contains(banner)
}

pub fn redirected_away(final_url: &str, login_url: &str, fragments: &[String]) -> bool {
    final_url != login_url || fragments.iter().any(|f| final_url.contains(f.as_str()))
}

pub fn probe_lacks_login_form(probe_body: &str, markers: &[&str]) -> bool {
    !markers.iter().any(|m| probe_body.contains(m))
}

pub fn probe_shows_panel(
    probe_body: &str,
    probe_final_url: &str,
    login_url: &str,
    markers: &[&str],
) -> bool {
    markers.iter().any(|m| probe_body.contains(m)) || probe_final_url != login_url
}
