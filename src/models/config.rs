//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Feature;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP behavior settings
    #[serde(default)]
    pub portal: PortalConfig,

    /// Login form and success heuristics
    #[serde(default)]
    pub login: LoginConfig,

    /// Element identifiers and keywords used by the extractor
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Page paths and candidate lists
    #[serde(default)]
    pub pages: PagesConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.portal.user_agent.trim().is_empty() {
            return Err(AppError::validation("portal.user_agent is empty"));
        }
        if self.portal.timeout_secs == 0 {
            return Err(AppError::validation("portal.timeout_secs must be > 0"));
        }
        if self.portal.logout_timeout_secs == 0 {
            return Err(AppError::validation(
                "portal.logout_timeout_secs must be > 0",
            ));
        }
        if self.login.username_field.trim().is_empty() || self.login.password_field.trim().is_empty()
        {
            return Err(AppError::validation("login field names must not be empty"));
        }
        if self.login.probe_path.trim().is_empty() {
            return Err(AppError::validation("login.probe_path is empty"));
        }
        if self.extraction.profile_fields.is_empty() {
            return Err(AppError::validation("No profile fields defined"));
        }
        for feature in Feature::ALL {
            if self.pages.candidates(feature).is_empty() {
                return Err(AppError::validation(format!(
                    "pages.{} has no candidate paths",
                    feature.as_str().replace('-', "_")
                )));
            }
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Shorter timeout for the logout request
    #[serde(default = "defaults::logout_timeout")]
    pub logout_timeout_secs: u64,
}

impl PortalConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn logout_timeout(&self) -> Duration {
        Duration::from_secs(self.logout_timeout_secs)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            logout_timeout_secs: defaults::logout_timeout(),
        }
    }
}

/// Login form layout and the markers used to judge the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginConfig {
    /// Default path of the login page
    #[serde(default = "defaults::login_path")]
    pub login_path: String,

    /// Default `name` of the username input
    #[serde(default = "defaults::username_field")]
    pub username_field: String,

    /// Default `name` of the password input
    #[serde(default = "defaults::password_field")]
    pub password_field: String,

    /// Control named in `__EVENTTARGET`
    #[serde(default = "defaults::event_target")]
    pub event_target: String,

    /// Submit button name
    #[serde(default = "defaults::submit_name")]
    pub submit_name: String,

    /// Submit button value
    #[serde(default = "defaults::submit_value")]
    pub submit_value: String,

    /// Banner text shown only on the login page
    #[serde(default = "defaults::login_banner")]
    pub login_banner: String,

    /// Authenticated-area page fetched after the POST
    #[serde(default = "defaults::probe_path")]
    pub probe_path: String,

    /// URL fragments that identify the authenticated area
    #[serde(default = "defaults::authenticated_path_fragments")]
    pub authenticated_path_fragments: Vec<String>,

    /// Banner strings shown only inside the authenticated area
    #[serde(default = "defaults::panel_markers")]
    pub panel_markers: Vec<String>,

    /// Logout endpoint
    #[serde(default = "defaults::logout_path")]
    pub logout_path: String,

    /// Hidden fields whose later occurrences replace earlier ones
    #[serde(default = "defaults::preferred_hidden_fields")]
    pub preferred_hidden_fields: Vec<String>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            login_path: defaults::login_path(),
            username_field: defaults::username_field(),
            password_field: defaults::password_field(),
            event_target: defaults::event_target(),
            submit_name: defaults::submit_name(),
            submit_value: defaults::submit_value(),
            login_banner: defaults::login_banner(),
            probe_path: defaults::probe_path(),
            authenticated_path_fragments: defaults::authenticated_path_fragments(),
            panel_markers: defaults::panel_markers(),
            logout_path: defaults::logout_path(),
            preferred_hidden_fields: defaults::preferred_hidden_fields(),
        }
    }
}

/// A logical profile field and the control id that renders it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Key in the extracted record
    pub name: String,

    /// Control id without the naming-container prefix
    pub id: String,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
        }
    }
}

/// An announcement grid: the table ids it renders under and the source tag
/// stamped on its rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementBoard {
    /// Table ids, tried in order
    pub table_ids: Vec<String>,

    pub source: String,
}

impl AnnouncementBoard {
    pub fn new(table_ids: &[&str], source: impl Into<String>) -> Self {
        Self {
            table_ids: table_ids.iter().map(|s| s.to_string()).collect(),
            source: source.into(),
        }
    }
}

/// Identifiers and keywords for heuristic extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Public home page announcements
    #[serde(default = "defaults::home_announcements")]
    pub home_announcements: AnnouncementBoard,

    /// Announcements inside the student area
    #[serde(default = "defaults::student_announcements")]
    pub student_announcements: AnnouncementBoard,

    /// Keyword that marks an announcement table when no id matches
    #[serde(default = "defaults::announcement_keyword")]
    pub announcement_keyword: String,

    /// Naming-container prefix of the profile controls
    #[serde(default = "defaults::profile_id_prefix")]
    pub profile_id_prefix: String,

    /// Profile fields to extract
    #[serde(default = "defaults::profile_fields")]
    pub profile_fields: Vec<FieldSpec>,

    /// Id of the academic records grid
    #[serde(default = "defaults::academic_table_id")]
    pub academic_table_id: String,

    /// Id of the main menu container
    #[serde(default = "defaults::menu_container_id")]
    pub menu_container_id: String,

    /// Link-text keywords of online education platforms
    #[serde(default = "defaults::online_education_keywords")]
    pub online_education_keywords: Vec<String>,

    /// Rows whose every cell is shorter than this are discarded
    #[serde(default = "defaults::min_meaningful_len")]
    pub min_meaningful_len: usize,

    /// Number of characters kept by page navigation
    #[serde(default = "defaults::preview_chars")]
    pub preview_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            home_announcements: defaults::home_announcements(),
            student_announcements: defaults::student_announcements(),
            announcement_keyword: defaults::announcement_keyword(),
            profile_id_prefix: defaults::profile_id_prefix(),
            profile_fields: defaults::profile_fields(),
            academic_table_id: defaults::academic_table_id(),
            menu_container_id: defaults::menu_container_id(),
            online_education_keywords: defaults::online_education_keywords(),
            min_meaningful_len: defaults::min_meaningful_len(),
            preview_chars: defaults::preview_chars(),
        }
    }
}

/// Page paths. Candidate lists are tried in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    #[serde(default = "defaults::home")]
    pub home: String,
    #[serde(default = "defaults::student_home")]
    pub student_home: String,
    #[serde(default = "defaults::student_info")]
    pub student_info: String,
    #[serde(default = "defaults::my_courses")]
    pub my_courses: String,
    #[serde(default = "defaults::term_courses")]
    pub term_courses: String,
    #[serde(default = "defaults::messages")]
    pub messages: String,

    #[serde(default = "defaults::weekly_schedule")]
    pub weekly_schedule: Vec<String>,
    #[serde(default = "defaults::attendance")]
    pub attendance: Vec<String>,
    #[serde(default = "defaults::fees")]
    pub fees: Vec<String>,
    #[serde(default = "defaults::library")]
    pub library: Vec<String>,
    #[serde(default = "defaults::registration")]
    pub registration: Vec<String>,
    #[serde(default = "defaults::thesis")]
    pub thesis: Vec<String>,
    #[serde(default = "defaults::internships")]
    pub internships: Vec<String>,
    #[serde(default = "defaults::petitions")]
    pub petitions: Vec<String>,
    #[serde(default = "defaults::materials")]
    pub materials: Vec<String>,
    #[serde(default = "defaults::events")]
    pub events: Vec<String>,
    #[serde(default = "defaults::transcript")]
    pub transcript: Vec<String>,
}

impl PagesConfig {
    /// Candidate paths configured for a probed feature.
    pub fn candidates(&self, feature: Feature) -> &[String] {
        match feature {
            Feature::WeeklySchedule => &self.weekly_schedule,
            Feature::Attendance => &self.attendance,
            Feature::Fees => &self.fees,
            Feature::Library => &self.library,
            Feature::Registration => &self.registration,
            Feature::Thesis => &self.thesis,
            Feature::Internships => &self.internships,
            Feature::Petitions => &self.petitions,
            Feature::Materials => &self.materials,
            Feature::Events => &self.events,
            Feature::Transcript => &self.transcript,
        }
    }
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            home: defaults::home(),
            student_home: defaults::student_home(),
            student_info: defaults::student_info(),
            my_courses: defaults::my_courses(),
            term_courses: defaults::term_courses(),
            messages: defaults::messages(),
            weekly_schedule: defaults::weekly_schedule(),
            attendance: defaults::attendance(),
            fees: defaults::fees(),
            library: defaults::library(),
            registration: defaults::registration(),
            thesis: defaults::thesis(),
            internships: defaults::internships(),
            petitions: defaults::petitions(),
            materials: defaults::materials(),
            events: defaults::events(),
            transcript: defaults::transcript(),
        }
    }
}

mod defaults {
    use super::{AnnouncementBoard, FieldSpec};

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // Portal defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn logout_timeout() -> u64 {
        10
    }

    // Login defaults
    pub fn login_path() -> String {
        "/".into()
    }
    pub fn username_field() -> String {
        "textKulID".into()
    }
    pub fn password_field() -> String {
        "textSifre".into()
    }
    pub fn event_target() -> String {
        "buttonTamam".into()
    }
    pub fn submit_name() -> String {
        "buttonTamam".into()
    }
    pub fn submit_value() -> String {
        "Giriş".into()
    }
    pub fn login_banner() -> String {
        "Öğrenci Girişi".into()
    }
    pub fn probe_path() -> String {
        "/Birimler/Ogrenci/".into()
    }
    pub fn authenticated_path_fragments() -> Vec<String> {
        paths(&["Birimler/Ogrenci/", "Ogrenci/"])
    }
    pub fn panel_markers() -> Vec<String> {
        paths(&["Öğrenci Paneli", "Hoşgeldiniz", "Profil"])
    }
    pub fn logout_path() -> String {
        "/Birimler/Ogrenci/Cikis.aspx".into()
    }
    pub fn preferred_hidden_fields() -> Vec<String> {
        paths(&[
            "__RequestVerificationToken",
            "csrfmiddlewaretoken",
            "__csrf",
            "_csrf",
            "csrf_token",
            "CSRFToken",
            "authenticity_token",
            "__VIEWSTATE",
            "__VIEWSTATEGENERATOR",
            "__EVENTVALIDATION",
        ])
    }

    // Extraction defaults
    pub fn home_announcements() -> AnnouncementBoard {
        AnnouncementBoard::new(&["Duyurular1_gridDuyuru"], "OBS Ana Sayfa")
    }
    pub fn student_announcements() -> AnnouncementBoard {
        AnnouncementBoard::new(
            &["ctl00_ContentPlaceHolder1_Duyurular1_gridDuyuru"],
            "OBS Öğrenci Sayfası",
        )
    }
    pub fn announcement_keyword() -> String {
        "duyuru".into()
    }
    pub fn profile_id_prefix() -> String {
        "ctl00_ContentPlaceHolder1_OgrenciTemelBilgiler1_".into()
    }
    pub fn profile_fields() -> Vec<FieldSpec> {
        [
            ("student_id", "textOgrenciNo"),
            ("first_name", "textAdi"),
            ("last_name", "textSoyadi"),
            ("tc_identity", "textTC"),
            ("faculty", "textFakulte"),
            ("department", "textBolum"),
            ("sub_program", "textAltProgram"),
            ("class_level", "textSinif"),
            ("education_type", "textOgretim"),
            ("section", "textSube"),
            ("advisor", "textDanisman"),
            ("status", "textDurum"),
            ("email", "textSDUMail"),
        ]
        .into_iter()
        .map(|(name, id)| FieldSpec::new(name, id))
        .collect()
    }
    pub fn academic_table_id() -> String {
        "ctl00_ContentPlaceHolder1_gridOgrenciKnt".into()
    }
    pub fn menu_container_id() -> String {
        "anamenu".into()
    }
    pub fn online_education_keywords() -> Vec<String> {
        paths(&[
            "uzaktan",
            "moodle",
            "lms",
            "uzem",
            "canvas",
            "online eğitim",
            "öğrenme",
        ])
    }
    pub fn min_meaningful_len() -> usize {
        3
    }
    pub fn preview_chars() -> usize {
        1000
    }

    // Page defaults
    pub fn home() -> String {
        "/".into()
    }
    pub fn student_home() -> String {
        "/Birimler/Ogrenci/".into()
    }
    pub fn student_info() -> String {
        "/Birimler/Ogrenci/Bilgilerim.aspx".into()
    }
    pub fn my_courses() -> String {
        "/Birimler/Ogrenci/Derslerim.aspx".into()
    }
    pub fn term_courses() -> String {
        "/Birimler/Ogrenci/DonemDersleri.aspx".into()
    }
    pub fn messages() -> String {
        "/Birimler/Ogrenci/Mesajlarim.aspx".into()
    }
    pub fn weekly_schedule() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/DersProgrami.aspx",
            "/Birimler/Ogrenci/DersProgram.aspx",
            "/Birimler/Ogrenci/Program.aspx",
        ])
    }
    pub fn attendance() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/Devamsizlik.aspx",
            "/Birimler/Ogrenci/Yoklama.aspx",
            "/Birimler/Ogrenci/DevamsizlikTakip.aspx",
        ])
    }
    pub fn fees() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/HarcBilgileri.aspx",
            "/Birimler/Ogrenci/Odemeler.aspx",
            "/Birimler/Ogrenci/MaliIsler.aspx",
        ])
    }
    pub fn library() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/Kutuphane.aspx",
            "/Birimler/Ogrenci/Malzeme.aspx",
            "/Birimler/Ogrenci/Material.aspx",
        ])
    }
    pub fn registration() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/KayitYenileme.aspx",
            "/Birimler/Ogrenci/DersKayit.aspx",
            "/Birimler/Ogrenci/DersEkleCikar.aspx",
        ])
    }
    pub fn thesis() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/BitirmeTezi.aspx",
            "/Birimler/Ogrenci/TezIslemleri.aspx",
            "/Birimler/Ogrenci/TezBasvurulari.aspx",
        ])
    }
    pub fn internships() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/ZorunluStajBasvuru.aspx",
            "/Birimler/Ogrenci/StajBasvurulari.aspx",
            "/Birimler/Ogrenci/Staj.aspx",
        ])
    }
    pub fn petitions() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/DilekceIslemleri.aspx",
            "/Birimler/Ogrenci/Dilekce.aspx",
        ])
    }
    pub fn materials() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/DersDokumanlari.aspx",
            "/Birimler/Ogrenci/Dokumanlar.aspx",
        ])
    }
    pub fn events() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/Etkinlikler.aspx",
            "/Birimler/Ogrenci/Etkinlik.aspx",
        ])
    }
    pub fn transcript() -> Vec<String> {
        paths(&[
            "/Birimler/Ogrenci/Transkript.aspx",
            "/Birimler/Ogrenci/NotDokumu.aspx",
        ])
    }
}
