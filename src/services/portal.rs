// src/services/portal.rs

//! Portal client facade.
//!
//! Owns the configuration, the transport connector and the single session
//! handle. Every data operation requires an authenticated session.

use chrono::Local;
use serde::Serialize;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    AnnouncementBoard, AnnouncementList, AnnouncementRecord, Config, Credentials, ExtractedTable,
    Feature, KeyValueRecord, LinkList, LoginOptions, LoginReport, Operation, PageSnapshot,
    RecordSet, StudentInfo, TableSet,
};
use crate::services::auth::{Authenticator, Handshake};
use crate::services::extractor::{HeuristicExtractor, parse_tables};
use crate::services::prober::CandidateProber;
use crate::services::session::{Session, SessionHandle};
use crate::utils::http::{Connector, HttpConnector};
use crate::utils::preview;

/// Default number of announcements returned.
pub const DEFAULT_ANNOUNCEMENT_LIMIT: usize = 10;

/// Client for one student portal.
pub struct Portal {
    config: Config,
    connector: Box<dyn Connector>,
    handle: SessionHandle,
}

impl Portal {
    /// Create a portal client that talks HTTP.
    pub fn new(config: Config) -> Self {
        let connector = HttpConnector::new(config.portal.clone());
        Self::with_connector(config, connector)
    }

    /// Create a portal client over a custom connector.
    pub fn with_connector(config: Config, connector: impl Connector + 'static) -> Self {
        Self {
            config,
            connector: Box::new(connector),
            handle: SessionHandle::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn is_authenticated(&self) -> bool {
        self.handle.is_authenticated()
    }

    /// The active session, or [`AppError::NotAuthenticated`].
    pub fn session(&self) -> Result<&Session> {
        self.handle.session()
    }

    fn extractor(&self) -> HeuristicExtractor<'_> {
        HeuristicExtractor::new(&self.config.extraction)
    }

    // --- Login lifecycle ---

    /// Log in. `Ok(false)` means the portal rejected the attempt.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<bool> {
        let handshake = self.attempt(credentials, &LoginOptions::default()).await;
        let success = handshake.succeeded();
        match handshake.error {
            Some(e) => Err(e),
            None => Ok(success),
        }
    }

    /// Log in and report every step. A successful attempt also establishes the session.
    pub async fn login_debug(
        &mut self,
        credentials: &Credentials,
        options: &LoginOptions,
    ) -> LoginReport {
        let handshake = self.attempt(credentials, options).await;

        LoginReport {
            ok: handshake.succeeded(),
            error: handshake.error.as_ref().map(ToString::to_string),
            base_url: credentials.base_url.to_string(),
            username: credentials.username.clone(),
            login_path: credentials.login_path.clone(),
            username_field: credentials.username_field.clone(),
            password_field: credentials.password_field.clone(),
            check_path: handshake.probe_path.clone(),
            success_text: options.success_text.clone(),
            login_url: handshake.login_url.as_ref().map(Url::to_string),
            login_page_status: handshake.login_page_status,
            form_action: handshake.form_action.clone(),
            post_url: handshake.post_url.as_ref().map(Url::to_string),
            form_payload: handshake.payload.masked(&credentials.password_field),
            hidden_fields: handshake.hidden_fields,
            evidence: handshake.outcome.map(|o| o.evidence),
        }
    }

    async fn attempt(&mut self, credentials: &Credentials, options: &LoginOptions) -> Handshake {
        self.handle.begin_login();

        let transport = match self.connector.connect() {
            Ok(transport) => transport,
            Err(e) => {
                log::error!("Could not create transport: {e}");
                self.handle.abandon();
                return Handshake {
                    error: Some(e),
                    ..Handshake::default()
                };
            }
        };

        let handshake = Authenticator::new(&self.config)
            .authenticate(transport.as_ref(), credentials, options)
            .await;

        if handshake.succeeded() {
            log::info!("Login succeeded for {}", credentials.username);
            self.handle.establish(Session::new(
                transport,
                credentials.base_url.clone(),
                &self.config.portal,
            ));
        } else {
            log::error!("Login failed for {}", credentials.username);
            self.handle.abandon();
        }
        handshake
    }

    /// End the session. Always reports success.
    pub async fn logout(&mut self) -> bool {
        if let Some(session) = self.handle.take() {
            session.close(&self.config.login.logout_path).await;
        }
        log::info!("Logged out");
        true
    }

    // --- Data operations ---

    /// Raw view of any page, truncated for display.
    pub async fn navigate(&self, path: &str) -> Result<PageSnapshot> {
        let page = self.session()?.get(path).await?;
        Ok(PageSnapshot {
            status_code: page.status,
            content: preview(&page.body, self.config.extraction.preview_chars),
            url: page.url,
        })
    }

    /// Parsed student information page.
    pub async fn student_info(&self, path: Option<&str>) -> Result<StudentInfo> {
        let session = self.session()?;
        let path = path.unwrap_or(&self.config.pages.student_info);
        let (url, page) = session.fetch(path).await?;

        let mut info = self.extractor().student_info(&page.body, Some(session.base_url()));
        info.source_url = Some(url.to_string());
        info.parsed_at = Some(Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        Ok(info)
    }

    /// Announcements shown inside the student area.
    pub async fn announcements(
        &self,
        path: Option<&str>,
        limit: Option<usize>,
    ) -> Result<AnnouncementList> {
        let path = path.unwrap_or(&self.config.pages.student_info);
        self.announcements_at(path, &self.config.extraction.student_announcements, limit)
            .await
    }

    /// Announcements of the portal's public home page.
    pub async fn home_announcements(
        &self,
        path: Option<&str>,
        limit: Option<usize>,
    ) -> Result<AnnouncementList> {
        let path = path.unwrap_or(&self.config.pages.home);
        self.announcements_at(path, &self.config.extraction.home_announcements, limit)
            .await
    }

    async fn announcements_at(
        &self,
        path: &str,
        board: &AnnouncementBoard,
        limit: Option<usize>,
    ) -> Result<AnnouncementList> {
        let session = self.session()?;
        let (_, page) = session.fetch(path).await?;

        let limit = limit.unwrap_or(DEFAULT_ANNOUNCEMENT_LIMIT);
        let records =
            self.extractor()
                .announcements(&page.body, Some(session.base_url()), board, limit);
        Ok(AnnouncementList::new(records, board.source.as_str()))
    }

    /// Header-keyed records of the "my courses" page.
    pub async fn courses(&self, path: Option<&str>) -> Result<RecordSet> {
        self.records_at(path.unwrap_or(&self.config.pages.my_courses), 1)
            .await
    }

    /// Tables of the term courses page.
    pub async fn term_courses(&self, path: Option<&str>) -> Result<TableSet> {
        let (url, page) = self
            .session()?
            .fetch(path.unwrap_or(&self.config.pages.term_courses))
            .await?;
        Ok(TableSet {
            url: url.to_string(),
            tables: parse_tables(&page.body),
        })
    }

    /// Message rows; only tables with a header and at least one row count.
    pub async fn messages(&self, path: Option<&str>) -> Result<RecordSet> {
        self.records_at(path.unwrap_or(&self.config.pages.messages), 2)
            .await
    }

    async fn records_at(&self, path: &str, min_rows: usize) -> Result<RecordSet> {
        let (url, page) = self.session()?.fetch(path).await?;
        Ok(RecordSet {
            url: url.to_string(),
            records: self.extractor().records(&page.body, min_rows),
        })
    }

    /// Links to the online education platforms.
    pub async fn online_education_links(&self, path: Option<&str>) -> Result<LinkList> {
        let session = self.session()?;
        let (_, page) = session
            .fetch(path.unwrap_or(&self.config.pages.student_home))
            .await?;
        let links = self.extractor().links_matching(
            &page.body,
            Some(session.base_url()),
            &self.config.extraction.online_education_keywords,
        );
        Ok(LinkList {
            url: page.url,
            links,
        })
    }

    /// Tables of a probed feature page. An override path replaces the candidates.
    pub async fn feature_tables(&self, feature: Feature, path: Option<&str>) -> Result<TableSet> {
        let session = self.session()?;
        let override_path;
        let candidates = match path {
            Some(p) => {
                override_path = [p.to_string()];
                &override_path[..]
            }
            None => self.config.pages.candidates(feature),
        };
        log::info!("Probing {} candidate(s) for {feature}", candidates.len());
        CandidateProber::new(session).probe_tables(candidates).await
    }

    /// Run a named operation and serialize its result.
    pub async fn run(
        &self,
        operation: Operation,
        path: Option<&str>,
        limit: Option<usize>,
    ) -> Result<serde_json::Value> {
        match operation {
            Operation::Profile => to_value(self.student_info(path).await?),
            Operation::Announcements => to_value(self.announcements(path, limit).await?),
            Operation::HomeAnnouncements => {
                to_value(self.home_announcements(path, limit).await?)
            }
            Operation::Courses => to_value(self.courses(path).await?),
            Operation::TermCourses => to_value(self.term_courses(path).await?),
            Operation::Messages => to_value(self.messages(path).await?),
            Operation::OnlineLinks => to_value(self.online_education_links(path).await?),
            Operation::Page => to_value(self.navigate(path.unwrap_or("/")).await?),
            Operation::Tables(feature) => to_value(self.feature_tables(feature, path).await?),
        }
    }

    // --- Offline re-parse ---

    pub fn parse_student_info(&self, html: &str, base_url: Option<&Url>) -> StudentInfo {
        self.extractor().student_info(html, base_url)
    }

    pub fn parse_announcements(
        &self,
        html: &str,
        base_url: Option<&Url>,
        limit: Option<usize>,
    ) -> Vec<AnnouncementRecord> {
        self.extractor().announcements(
            html,
            base_url,
            &self.config.extraction.student_announcements,
            limit.unwrap_or(DEFAULT_ANNOUNCEMENT_LIMIT),
        )
    }

    pub fn parse_home_announcements(
        &self,
        html: &str,
        base_url: Option<&Url>,
        limit: Option<usize>,
    ) -> Vec<AnnouncementRecord> {
        self.extractor().announcements(
            html,
            base_url,
            &self.config.extraction.home_announcements,
            limit.unwrap_or(DEFAULT_ANNOUNCEMENT_LIMIT),
        )
    }

    pub fn parse_records(&self, html: &str) -> Vec<KeyValueRecord> {
        self.extractor().records(html, 1)
    }

    pub fn parse_tables(&self, html: &str) -> Vec<ExtractedTable> {
        parse_tables(html)
    }
}

fn to_value<T: Serialize>(data: T) -> Result<serde_json::Value> {
    serde_json::to_value(data).map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ErrorKind;
    use crate::utils::http::{ScriptedConnector, ScriptedResponse, ScriptedTransport};

    const BASE: &str = "https://obs.example.edu.tr";

    fn credentials(config: &Config) -> Credentials {
        Credentials::new(BASE, "20231234", "s3cret", &config.login).unwrap()
    }

    fn logged_in_transport() -> Arc<ScriptedTransport> {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on_get(
                &format!("{BASE}/"),
                ScriptedResponse::ok(
                    r#"<form action="/"><input type="hidden" name="__VIEWSTATE" value="v" /></form>"#,
                ),
            )
            .on_post(
                &format!("{BASE}/"),
                ScriptedResponse::ok("")
                    .redirected_to(format!("{BASE}/Birimler/Ogrenci/"))
                    .with_cookie(),
            )
            .on_get(
                &format!("{BASE}/Birimler/Ogrenci/"),
                ScriptedResponse::ok(
                    r#"<h1>Öğrenci Paneli</h1><a href="https://moodle.example.edu.tr/">Moodle</a>"#,
                ),
            );
        transport
    }

    async fn portal_with(transport: Arc<ScriptedTransport>) -> Portal {
        let config = Config::default();
        let creds = credentials(&config);
        let mut portal = Portal::with_connector(config, ScriptedConnector::new(transport));
        assert!(portal.login(&creds).await.unwrap());
        portal
    }

    #[tokio::test]
    async fn test_operations_require_login() {
        let portal = Portal::with_connector(
            Config::default(),
            ScriptedConnector::new(Arc::new(ScriptedTransport::new())),
        );
        let err = portal.courses(None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
        let err = portal
            .run(Operation::Tables(Feature::Fees), None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_logout_always_succeeds_and_clears() {
        let mut portal = portal_with(logged_in_transport()).await;
        assert!(portal.is_authenticated());
        assert!(portal.logout().await);
        assert!(!portal.is_authenticated());
        assert!(portal.logout().await);
        assert!(portal.navigate("/").await.is_err());
    }

    #[tokio::test]
    async fn test_rejected_login_leaves_no_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on_get(&format!("{BASE}/"), ScriptedResponse::ok("<h2>Öğrenci Girişi</h2>"))
            .on_post(
                &format!("{BASE}/"),
                ScriptedResponse::ok("<h2>Öğrenci Girişi</h2> Hatalı şifre").with_cookie(),
            );
        let config = Config::default();
        let creds = credentials(&config);
        let mut portal = Portal::with_connector(config, ScriptedConnector::new(transport));

        assert!(!portal.login(&creds).await.unwrap());
        assert!(!portal.is_authenticated());
    }

    #[tokio::test]
    async fn test_debug_report_masks_password() {
        let transport = logged_in_transport();
        let config = Config::default();
        let creds = credentials(&config);
        let mut portal = Portal::with_connector(config, ScriptedConnector::new(transport));

        let report = portal.login_debug(&creds, &LoginOptions::default()).await;
        assert!(report.ok);
        assert!(portal.is_authenticated());
        assert_eq!(report.form_payload.get("textSifre"), Some("********"));
        assert_eq!(report.hidden_fields.get("__VIEWSTATE"), Some("v"));
        assert_eq!(report.check_path, "/Birimler/Ogrenci/");
        let json = serde_json::to_string(&report).unwrap();
        assert!(!json.contains("s3cret"));
    }

    #[tokio::test]
    async fn test_navigate_truncates_content() {
        let transport = logged_in_transport();
        transport.on_get(&format!("{BASE}/long"), ScriptedResponse::ok("x".repeat(1500)));
        let portal = portal_with(transport).await;

        let snapshot = portal.navigate("/long").await.unwrap();
        assert_eq!(snapshot.status_code, 200);
        assert_eq!(snapshot.content.chars().count(), 1003);
        assert!(snapshot.content.ends_with("..."));
    }

    #[tokio::test]
    async fn test_feature_path_override_replaces_candidates() {
        let transport = logged_in_transport();
        transport.on_get(
            &format!("{BASE}/Ogrenci/Harc.aspx"),
            ScriptedResponse::ok("<table><tr><td>Harç</td><td>0 TL</td></tr></table>"),
        );
        let portal = portal_with(transport.clone()).await;
        let before = transport.requests().len();

        let set = portal
            .feature_tables(Feature::Fees, Some("/Ogrenci/Harc.aspx"))
            .await
            .unwrap();
        assert_eq!(set.tables.len(), 1);
        assert_eq!(transport.requests().len(), before + 1);
    }

    #[tokio::test]
    async fn test_home_announcements_use_home_board() {
        let transport = logged_in_transport();
        transport.on_get(
            &format!("{BASE}/Duyurular.aspx"),
            ScriptedResponse::ok(
                r#"<table id="Duyurular1_gridDuyuru">
                     <tr><td><a id="h1" href="Duyuru.aspx?id=9">Kayıt takvimi</a></td>
                         <td><span>2024-02-01</span></td></tr>
                   </table>"#,
            ),
        );
        let portal = portal_with(transport).await;

        let list = portal
            .home_announcements(Some("/Duyurular.aspx"), None)
            .await
            .unwrap();
        assert_eq!(list.count, 1);
        assert_eq!(list.source, "OBS Ana Sayfa");
        assert_eq!(list.announcements[0].source_tag, "OBS Ana Sayfa");
        assert_eq!(
            list.announcements[0].url,
            "https://obs.example.edu.tr/Duyuru.aspx?id=9"
        );

        let value = portal
            .run(Operation::HomeAnnouncements, Some("/Duyurular.aspx"), Some(5))
            .await
            .unwrap();
        assert_eq!(value["announcements"][0]["source_tag"], "OBS Ana Sayfa");
    }

    #[tokio::test]
    async fn test_online_links_and_run_dispatch() {
        let portal = portal_with(logged_in_transport()).await;
        let value = portal.run(Operation::OnlineLinks, None, None).await.unwrap();
        assert_eq!(value["links"][0]["text"], "Moodle");
        assert_eq!(value["links"][0]["href"], "https://moodle.example.edu.tr/");
    }

    #[test]
    fn test_offline_parse_matches_extractor() {
        let portal = Portal::new(Config::default());
        let html = r#"<table><tr><th>Ders</th></tr><tr><td>Fizik</td></tr></table>"#;
        let home = r#"<table id="Duyurular1_gridDuyuru"><tr><td><a href="/d">Tatil</a></td></tr></table>"#;
        assert_eq!(
            portal.parse_home_announcements(home, None, None)[0].source_tag,
            "OBS Ana Sayfa"
        );
        let records = portal.parse_records(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Ders").map(String::as_str), Some("Fizik"));
        assert_eq!(portal.parse_tables(html).len(), 1);
    }
}
