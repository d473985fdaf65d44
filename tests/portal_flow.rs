//! End-to-end flows against a scripted portal.

use std::sync::Arc;

use portal::Portal;
use portal::error::ErrorKind;
use portal::models::{Config, Credentials, Feature, LoginOptions, Operation, Reply};
use portal::utils::http::{ScriptedConnector, ScriptedResponse, ScriptedTransport};

const BASE: &str = "https://obs.example.edu.tr";

const LOGIN_PAGE: &str = r#"<!DOCTYPE html>
<html><body>
  <h2>Öğrenci Girişi</h2>
  <form method="post" action="/Login.aspx" id="form1">
    <input type="hidden" name="__VIEWSTATE" value="abc" />
    <input type="hidden" name="__VIEWSTATEGENERATOR" value="C2EE9ABB" />
    <input type="hidden" name="textKulID" value="prefilled" />
    <input type="text" name="textKulID" id="textKulID" />
    <input type="password" name="textSifre" id="textSifre" />
    <input type="submit" name="buttonTamam" value="Giriş" />
  </form>
</body></html>"#;

const STUDENT_PAGE: &str = r#"<html><body>
  <div id="anamenu"><a href="Derslerim.aspx" tabindex="1">Derslerim</a></div>
  <span id="ctl00_ContentPlaceHolder1_OgrenciTemelBilgiler1_textOgrenciNo">2023123456</span>
  <span id="ctl00_ContentPlaceHolder1_OgrenciTemelBilgiler1_textAdi">Ayşe</span>
  <table id="grid">
    <tr><td><a id="d1" href="Duyuru.aspx?id=1">Exam Schedule</a></td><td><span>2024-01-01</span></td></tr>
  </table>
</body></html>"#;

fn url(path: &str) -> String {
    format!("{BASE}{path}")
}

fn config() -> Config {
    let mut config = Config::default();
    config.extraction.student_announcements.table_ids = vec!["grid".to_string()];
    config
}

fn credentials(config: &Config) -> Credentials {
    Credentials::new(BASE, "20231234", "s3cret", &config.login).unwrap()
}

/// Login page, postback that sets a cookie, and a probe without the login form.
fn portal_transport() -> Arc<ScriptedTransport> {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .on_get(&url("/"), ScriptedResponse::ok(LOGIN_PAGE))
        .on_post(
            &url("/Login.aspx"),
            ScriptedResponse::ok("<p>Lütfen bekleyin</p>").with_cookie(),
        )
        .on_get(
            &url("/Birimler/Ogrenci/"),
            ScriptedResponse::ok("<h1>Ana sayfa</h1>"),
        )
        .on_get(
            &url("/Birimler/Ogrenci/Bilgilerim.aspx"),
            ScriptedResponse::ok(STUDENT_PAGE),
        );
    transport
}

async fn logged_in(transport: Arc<ScriptedTransport>) -> Portal {
    let config = config();
    let creds = credentials(&config);
    let mut portal = Portal::with_connector(config, ScriptedConnector::new(transport));
    assert!(portal.login(&creds).await.unwrap());
    portal
}

#[tokio::test]
async fn login_with_viewstate_and_rooted_action_succeeds() {
    let transport = portal_transport();
    let config = config();
    let creds = credentials(&config);
    let mut portal = Portal::with_connector(config, ScriptedConnector::new(transport.clone()));

    let report = portal.login_debug(&creds, &LoginOptions::default()).await;

    assert!(report.ok, "{:?}", report.error);
    assert_eq!(report.post_url.as_deref(), Some("https://obs.example.edu.tr/Login.aspx"));
    let evidence = report.evidence.unwrap();
    assert!(evidence.has_cookies);
    assert!(evidence.probe_lacks_login_form);

    let requests = transport.requests();
    assert_eq!(requests[1].method, "POST");
    let posted = requests[1].form.as_ref().unwrap();
    assert_eq!(posted.get("__VIEWSTATE"), Some("abc"));
    assert_eq!(posted.get("__VIEWSTATEGENERATOR"), Some("C2EE9ABB"));
    assert_eq!(posted.get("textKulID"), Some("20231234"));
    assert_eq!(posted.get("textSifre"), Some("s3cret"));
    assert_eq!(posted.get("__EVENTTARGET"), Some("buttonTamam"));
}

#[tokio::test]
async fn login_without_cookies_fails_even_on_panel_page() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .on_get(&url("/"), ScriptedResponse::ok(LOGIN_PAGE))
        .on_post(
            &url("/Login.aspx"),
            ScriptedResponse::ok("").redirected_to(url("/Birimler/Ogrenci/")),
        )
        .on_get(
            &url("/Birimler/Ogrenci/"),
            ScriptedResponse::ok("<h1>Öğrenci Paneli</h1> Hoşgeldiniz"),
        );
    let config = config();
    let creds = credentials(&config);
    let mut portal = Portal::with_connector(config, ScriptedConnector::new(transport));

    assert!(!portal.login(&creds).await.unwrap());
    let err = portal.student_info(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
}

#[tokio::test]
async fn announcements_grid_yields_exam_schedule() {
    let portal = logged_in(portal_transport()).await;
    let list = portal.announcements(None, None).await.unwrap();

    assert_eq!(list.count, 1);
    let record = &list.announcements[0];
    assert_eq!(record.title, "Exam Schedule");
    assert_eq!(record.date_text, "2024-01-01");
    assert_eq!(record.url, "https://obs.example.edu.tr/Duyuru.aspx?id=1");
}

#[tokio::test]
async fn student_info_is_stamped_with_source() {
    let portal = logged_in(portal_transport()).await;
    let info = portal.student_info(None).await.unwrap();

    assert_eq!(info.fields.get("student_id").map(String::as_str), Some("2023123456"));
    assert_eq!(info.fields.get("first_name").map(String::as_str), Some("Ayşe"));
    assert!(!info.fields.contains_key("faculty"));
    assert_eq!(
        info.source_url.as_deref(),
        Some("https://obs.example.edu.tr/Birimler/Ogrenci/Bilgilerim.aspx")
    );
    assert!(info.parsed_at.is_some());
    assert_eq!(
        info.menu_links[0].href,
        "https://obs.example.edu.tr/Derslerim.aspx"
    );
}

#[tokio::test]
async fn prober_returns_first_reachable_candidate_only() {
    let transport = portal_transport();
    transport
        .on_get(
            &url("/Birimler/Ogrenci/DersProgrami.aspx"),
            ScriptedResponse::status(404, "yok"),
        )
        .on_get(
            &url("/Birimler/Ogrenci/DersProgram.aspx"),
            ScriptedResponse::ok("<table><tr><th>Gün</th></tr><tr><td>Pazartesi</td></tr></table>"),
        )
        .on_get(
            &url("/Birimler/Ogrenci/Program.aspx"),
            ScriptedResponse::ok("<table><tr><td>başka</td></tr></table>"),
        );
    let portal = logged_in(transport.clone()).await;

    let set = portal
        .feature_tables(Feature::WeeklySchedule, None)
        .await
        .unwrap();
    assert_eq!(set.url, "https://obs.example.edu.tr/Birimler/Ogrenci/DersProgram.aspx");
    assert_eq!(set.tables[0].rows()[1], vec!["Pazartesi".to_string()]);

    let probed: Vec<String> = transport
        .requests()
        .into_iter()
        .map(|r| r.url)
        .filter(|u| u.contains("Program"))
        .collect();
    assert_eq!(probed.len(), 2);
}

#[tokio::test]
async fn unreachable_feature_reports_error_payload() {
    let portal = logged_in(portal_transport()).await;
    let reply = Reply::from(portal.run(Operation::Tables(Feature::Thesis), None, None).await);
    assert!(reply.is_error());

    let json = serde_json::to_value(&reply).unwrap();
    assert_eq!(json["kind"], "upstream_http_error");
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("TezBasvurulari.aspx")
    );
}

#[tokio::test]
async fn logout_clears_session_and_hits_logout_endpoint() {
    let transport = portal_transport();
    let mut portal = logged_in(transport.clone()).await;

    assert!(portal.logout().await);
    assert!(!portal.is_authenticated());
    let last = transport.requests().pop().unwrap();
    assert_eq!(last.url, url("/Birimler/Ogrenci/Cikis.aspx"));

    let err = portal.courses(None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotAuthenticated);
}

#[tokio::test]
async fn messages_drop_legacy_td_header_row() {
    let transport = portal_transport();
    transport.on_get(
        &url("/Birimler/Ogrenci/Mesajlarim.aspx"),
        ScriptedResponse::ok(
            "<table><tr><td>Konu</td><td>Tarih</td></tr>\
             <tr><td>Sınav yeri</td><td>2024-01-08</td></tr></table>",
        ),
    );
    let portal = logged_in(transport).await;

    let set = portal.messages(None).await.unwrap();
    assert_eq!(set.records.len(), 1);
    assert_eq!(set.records[0].get("col_0").map(String::as_str), Some("Sınav yeri"));
    assert!(set.records.iter().all(|r| r.get("col_0").map(String::as_str) != Some("Konu")));
}

#[test]
fn offline_reparse_is_deterministic() {
    let portal = Portal::new(config());
    let html = r#"<table>
        <tr><th>Ders Kodu</th><th>Ders Adı</th><th>Kredi</th></tr>
        <tr><td>BİL101</td><td>Programlamaya Giriş</td><td>4</td></tr>
        <tr><td>MAT101</td><td>Analiz I</td></tr>
    </table>"#;

    let first = portal.parse_records(html);
    let second = portal.parse_records(html);
    assert_eq!(first, second);
    assert_eq!(first[0].get("Ders Adı").map(String::as_str), Some("Programlamaya Giriş"));
    assert!(first[1].contains_key("col_0"));
    assert!(first[1].contains_key("col_1"));
    assert!(!first[1].contains_key("col_2"));

    let base = url::Url::parse(BASE).ok();
    let records = portal.parse_announcements(STUDENT_PAGE, base.as_ref(), None);
    assert_eq!(records, portal.parse_announcements(STUDENT_PAGE, base.as_ref(), None));
}
