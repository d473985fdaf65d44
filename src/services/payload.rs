// src/services/payload.rs

//! Postback payload assembly and submit URL resolution.

use std::collections::BTreeMap;

use url::Url;

use crate::error::Result;
use crate::models::{Credentials, FormPayload, HiddenFieldSet, LoginConfig};

/// Builds the WebForms postback for a login attempt.
pub struct FormPayloadBuilder<'a> {
    config: &'a LoginConfig,
}

impl<'a> FormPayloadBuilder<'a> {
    pub fn new(config: &'a LoginConfig) -> Self {
        Self { config }
    }

    /// Merge hidden fields, postback constants, extra fields and credentials.
    ///
    /// Later layers overwrite earlier ones, so the credential values always
    /// survive a same-named hidden or extra field.
    pub fn build(
        &self,
        credentials: &Credentials,
        hidden: &HiddenFieldSet,
        extra: &BTreeMap<String, String>,
    ) -> FormPayload {
        let mut payload = FormPayload::default();

        for (name, value) in hidden.iter() {
            payload.set(name, value);
        }

        payload.set("__EVENTTARGET", self.config.event_target.as_str());
        payload.set("__EVENTARGUMENT", "");
        payload.set("__LASTFOCUS", "");
        payload.set(
            self.config.submit_name.as_str(),
            self.config.submit_value.as_str(),
        );

        for (name, value) in extra {
            payload.set(name.as_str(), value.as_str());
        }

        payload.set(
            credentials.username_field.as_str(),
            credentials.username.as_str(),
        );
        payload.set(
            credentials.password_field.as_str(),
            credentials.password.as_str(),
        );
        payload
    }
}

/// Where the postback is sent.
///
/// An action starting with `/` is joined against the base URL, any other
/// action against the URL the login page was served from. Without a form the
/// login URL itself is used.
pub fn submit_url(
    base_url: &Url,
    page_url: &Url,
    login_url: &Url,
    form_action: Option<&str>,
) -> Result<Url> {
    let url = match form_action {
        None => login_url.clone(),
        Some(action) if action.starts_with('/') => base_url.join(action)?,
        Some(action) => page_url.join(action)?,
    };
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new(
            "https://obs.example.edu.tr",
            "20231234",
            "s3cret",
            &LoginConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_payload_contains_postback_constants() {
        let config = LoginConfig::default();
        let mut hidden = HiddenFieldSet::default();
        hidden.insert_first("__VIEWSTATE", "abc");

        let payload = FormPayloadBuilder::new(&config).build(&credentials(), &hidden, &BTreeMap::new());
        assert_eq!(payload.get("__VIEWSTATE"), Some("abc"));
        assert_eq!(payload.get("__EVENTTARGET"), Some("buttonTamam"));
        assert_eq!(payload.get("__EVENTARGUMENT"), Some(""));
        assert_eq!(payload.get("__LASTFOCUS"), Some(""));
        assert_eq!(payload.get("buttonTamam"), Some("Giriş"));
        assert_eq!(payload.get("textKulID"), Some("20231234"));
        assert_eq!(payload.get("textSifre"), Some("s3cret"));
    }

    #[test]
    fn test_credentials_override_hidden_and_extra_fields() {
        let config = LoginConfig::default();
        let mut hidden = HiddenFieldSet::default();
        hidden.insert_first("textKulID", "attacker");
        hidden.insert_first("textSifre", "prefilled");
        let mut extra = BTreeMap::new();
        extra.insert("textSifre".to_string(), "extra".to_string());
        extra.insert("chkBeniHatirla".to_string(), "on".to_string());

        let payload = FormPayloadBuilder::new(&config).build(&credentials(), &hidden, &extra);
        assert_eq!(payload.get("textKulID"), Some("20231234"));
        assert_eq!(payload.get("textSifre"), Some("s3cret"));
        assert_eq!(payload.get("chkBeniHatirla"), Some("on"));
    }

    #[test]
    fn test_submit_url_resolution() {
        let base = Url::parse("https://obs.example.edu.tr/").unwrap();
        let page = Url::parse("https://obs.example.edu.tr/Giris/Default.aspx").unwrap();
        let login = Url::parse("https://obs.example.edu.tr/Giris/").unwrap();

        let rooted = submit_url(&base, &page, &login, Some("/Login.aspx")).unwrap();
        assert_eq!(rooted.as_str(), "https://obs.example.edu.tr/Login.aspx");

        let relative = submit_url(&base, &page, &login, Some("./Default.aspx?x=1")).unwrap();
        assert_eq!(
            relative.as_str(),
            "https://obs.example.edu.tr/Giris/Default.aspx?x=1"
        );

        let missing = submit_url(&base, &page, &login, None).unwrap();
        assert_eq!(missing, login);
    }
}
