// src/services/auth.rs

//! Login handshake driver.
//!
//! GET the login page, harvest its hidden fields, post the form, then probe
//! an authenticated page and classify the outcome. Every step is recorded in
//! a [`Handshake`] so a failed attempt can still be inspected.

use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    Config, Credentials, FormPayload, HiddenFieldSet, LoginOptions, LoginOutcome,
};
use crate::services::classifier::{LoginOutcomeClassifier, LoginSignals};
use crate::services::harvester::LoginPage;
use crate::services::payload::{FormPayloadBuilder, submit_url};
use crate::utils::http::Transport;

/// Everything observed during one login attempt.
#[derive(Debug, Default)]
pub struct Handshake {
    pub login_url: Option<Url>,
    pub login_page_status: Option<u16>,
    pub form_action: Option<String>,
    pub post_url: Option<Url>,
    pub probe_path: String,
    pub hidden_fields: HiddenFieldSet,
    pub payload: FormPayload,
    pub outcome: Option<LoginOutcome>,
    pub error: Option<AppError>,
}

impl Handshake {
    pub fn succeeded(&self) -> bool {
        self.outcome.as_ref().is_some_and(|o| o.success)
    }
}

/// Runs the login handshake over a transport.
pub struct Authenticator<'a> {
    config: &'a Config,
}

impl<'a> Authenticator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub async fn authenticate(
        &self,
        transport: &dyn Transport,
        credentials: &Credentials,
        options: &LoginOptions,
    ) -> Handshake {
        let mut handshake = Handshake {
            probe_path: options
                .check_path
                .clone()
                .unwrap_or_else(|| self.config.login.probe_path.clone()),
            ..Handshake::default()
        };

        if let Err(e) = self
            .drive(&mut handshake, transport, credentials, options)
            .await
        {
            log::error!("Login handshake for {} failed: {e}", credentials.username);
            handshake.error = Some(e);
        }
        handshake
    }

    async fn drive(
        &self,
        handshake: &mut Handshake,
        transport: &dyn Transport,
        credentials: &Credentials,
        options: &LoginOptions,
    ) -> Result<()> {
        let timeout = self.config.portal.timeout();

        let login_url = credentials.login_url()?;
        handshake.login_url = Some(login_url.clone());

        log::info!("Fetching login page {login_url}");
        let page = transport.get(&login_url, timeout).await?;
        handshake.login_page_status = Some(page.status);
        if page.is_error() {
            return Err(AppError::upstream(page.status, login_url.as_str()));
        }

        let login_page = LoginPage::parse(&page.body, &self.config.login.preferred_hidden_fields);
        handshake.form_action = login_page.form_action.clone();
        handshake.hidden_fields = login_page.hidden_fields;

        let payload = FormPayloadBuilder::new(&self.config.login).build(
            credentials,
            &handshake.hidden_fields,
            &options.extra_fields,
        );
        handshake.payload = payload;

        let page_url = Url::parse(&page.url).unwrap_or_else(|_| login_url.clone());
        let post_url = submit_url(
            &credentials.base_url,
            &page_url,
            &login_url,
            login_page.form_action.as_deref(),
        )?;
        handshake.post_url = Some(post_url.clone());

        log::info!("Posting login form to {post_url}");
        let post = transport
            .post_form(&post_url, &handshake.payload, timeout)
            .await?;
        let has_cookies = transport.has_cookies();

        let probe_url = credentials.base_url.join(&handshake.probe_path)?;
        let probe = transport.get(&probe_url, timeout).await?;

        let classifier = LoginOutcomeClassifier::new(
            &self.config.login,
            &credentials.username_field,
            &credentials.password_field,
        )
        .with_success_text(options.success_text.as_deref());

        let outcome = classifier.classify(&LoginSignals {
            login_url: login_url.as_str(),
            post_url: post_url.as_str(),
            post: &post,
            probe: &probe,
            has_cookies,
        });
        log::debug!("Login evidence: {:?}", outcome.evidence);
        handshake.outcome = Some(outcome);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::models::LoginConfig;
    use crate::utils::http::{ScriptedResponse, ScriptedTransport};

    const BASE: &str = "https://obs.example.edu.tr";

    const LOGIN_HTML: &str = r#"
        <html><body><h2>Öğrenci Girişi</h2>
        <form method="post" action="/Login.aspx">
          <input type="hidden" name="__VIEWSTATE" value="abc" />
          <input type="text" name="textKulID" />
          <input type="password" name="textSifre" />
        </form></body></html>"#;

    fn credentials() -> Credentials {
        Credentials::new(BASE, "20231234", "s3cret", &LoginConfig::default()).unwrap()
    }

    fn scripted_portal() -> ScriptedTransport {
        let transport = ScriptedTransport::new();
        transport
            .on_get(&format!("{BASE}/"), ScriptedResponse::ok(LOGIN_HTML))
            .on_post(
                &format!("{BASE}/Login.aspx"),
                ScriptedResponse::ok("<p>Yönlendiriliyor</p>")
                    .redirected_to(format!("{BASE}/Birimler/Ogrenci/"))
                    .with_cookie(),
            )
            .on_get(
                &format!("{BASE}/Birimler/Ogrenci/"),
                ScriptedResponse::ok("<h1>Hoşgeldiniz</h1>"),
            );
        transport
    }

    #[tokio::test]
    async fn test_successful_handshake_records_every_step() {
        let config = Config::default();
        let transport = scripted_portal();
        let handshake = Authenticator::new(&config)
            .authenticate(&transport, &credentials(), &LoginOptions::default())
            .await;

        assert!(handshake.succeeded(), "{:?}", handshake.error);
        assert_eq!(handshake.login_page_status, Some(200));
        assert_eq!(handshake.form_action.as_deref(), Some("/Login.aspx"));
        assert_eq!(
            handshake.post_url.as_ref().map(Url::as_str),
            Some("https://obs.example.edu.tr/Login.aspx")
        );
        assert_eq!(handshake.hidden_fields.get("__VIEWSTATE"), Some("abc"));

        let requests = transport.requests();
        let posted = requests[1].form.as_ref().unwrap();
        assert_eq!(posted.get("__VIEWSTATE"), Some("abc"));
        assert_eq!(posted.get("textSifre"), Some("s3cret"));
        assert_eq!(requests[2].url, "https://obs.example.edu.tr/Birimler/Ogrenci/");
    }

    #[tokio::test]
    async fn test_login_page_error_status_stops_handshake() {
        let config = Config::default();
        let transport = ScriptedTransport::new();
        transport.on_get(&format!("{BASE}/"), ScriptedResponse::status(503, ""));

        let handshake = Authenticator::new(&config)
            .authenticate(&transport, &credentials(), &LoginOptions::default())
            .await;
        assert!(!handshake.succeeded());
        assert_eq!(handshake.login_page_status, Some(503));
        assert_eq!(
            handshake.error.as_ref().map(AppError::kind),
            Some(ErrorKind::UpstreamHttpError)
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_check_path_override_is_probed() {
        let config = Config::default();
        let transport = scripted_portal();
        let options = LoginOptions {
            check_path: Some("/Birimler/Ogrenci/Bilgilerim.aspx".to_string()),
            ..LoginOptions::default()
        };
        let handshake = Authenticator::new(&config)
            .authenticate(&transport, &credentials(), &options)
            .await;

        assert_eq!(handshake.probe_path, "/Birimler/Ogrenci/Bilgilerim.aspx");
        let requests = transport.requests();
        assert_eq!(
            requests[2].url,
            "https://obs.example.edu.tr/Birimler/Ogrenci/Bilgilerim.aspx"
        );
        // The unscripted probe answers 404 but the redirect alone corroborates.
        assert!(handshake.succeeded());
    }

    #[tokio::test]
    async fn test_probe_transport_failure_fails_login() {
        let config = Config::default();
        let transport = scripted_portal();
        transport.on_get(
            &format!("{BASE}/Birimler/Ogrenci/Bilgilerim.aspx"),
            ScriptedResponse::transport_error("connection reset"),
        );
        let options = LoginOptions {
            check_path: Some("/Birimler/Ogrenci/Bilgilerim.aspx".to_string()),
            ..LoginOptions::default()
        };

        let handshake = Authenticator::new(&config)
            .authenticate(&transport, &credentials(), &options)
            .await;
        assert!(!handshake.succeeded());
        assert!(handshake.outcome.is_none());
        assert_eq!(
            handshake.error.as_ref().map(AppError::kind),
            Some(ErrorKind::TransportError)
        );
        assert_eq!(transport.requests().len(), 3);
    }
}
