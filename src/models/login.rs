//! Login outcome and its evidentiary record.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::{FormPayload, HiddenFieldSet};

/// Result of a login attempt, with the evidence behind the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub success: bool,
    pub evidence: LoginEvidence,
}

/// Every signal the classifier looked at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoginEvidence {
    /// URL the login page was requested from
    pub login_url: String,

    /// URL the postback was submitted to
    pub post_url: String,

    /// Status of the postback response
    pub post_status: u16,

    /// URL the postback ended on after redirects
    pub post_final_url: String,

    /// Status of the authenticated-area probe
    pub probe_status: u16,

    /// URL the probe ended on after redirects
    pub probe_final_url: String,

    /// The cookie jar is non-empty after the postback
    pub has_cookies: bool,

    /// Postback status is within 200..400
    pub ok_status: bool,

    /// Postback body no longer shows the login banner
    pub login_banner_gone: bool,

    /// Postback left the login URL or landed in the authenticated area
    pub redirected_away: bool,

    /// Probe body carries none of the login form markers
    pub probe_lacks_login_form: bool,

    /// Probe body shows a panel banner, or the probe left the login URL
    pub probe_shows_panel: bool,
}

/// Extra knobs accepted by the debug login.
#[derive(Debug, Clone, Default)]
pub struct LoginOptions {
    /// Probe path replacing the configured one
    pub check_path: Option<String>,

    /// Additional panel marker the probe may contain
    pub success_text: Option<String>,

    /// Fields merged into the payload before the credentials
    pub extra_fields: BTreeMap<String, String>,
}

/// Detailed report returned by the debug login.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginReport {
    pub ok: bool,
    pub error: Option<String>,
    pub base_url: String,
    pub username: String,
    pub login_path: String,
    pub username_field: String,
    pub password_field: String,
    pub check_path: String,
    pub success_text: Option<String>,
    pub login_url: Option<String>,
    pub login_page_status: Option<u16>,
    pub form_action: Option<String>,
    pub post_url: Option<String>,
    pub hidden_fields: HiddenFieldSet,
    pub form_payload: FormPayload,
    pub evidence: Option<LoginEvidence>,
}
