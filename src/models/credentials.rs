//! Login credentials.

use std::fmt;

use url::Url;

use crate::error::Result;
use crate::models::LoginConfig;

/// Everything needed for one login attempt.
#[derive(Clone)]
pub struct Credentials {
    pub base_url: Url,
    pub username: String,
    pub password: String,
    pub login_path: String,
    pub username_field: String,
    pub password_field: String,
}

impl Credentials {
    /// Create credentials using the form layout from `defaults`.
    pub fn new(
        base_url: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        defaults: &LoginConfig,
    ) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            username: username.into(),
            password: password.into(),
            login_path: defaults.login_path.clone(),
            username_field: defaults.username_field.clone(),
            password_field: defaults.password_field.clone(),
        })
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn with_username_field(mut self, name: impl Into<String>) -> Self {
        self.username_field = name.into();
        self
    }

    pub fn with_password_field(mut self, name: impl Into<String>) -> Self {
        self.password_field = name.into();
        self
    }

    /// Absolute URL of the login page.
    pub fn login_url(&self) -> Result<Url> {
        Ok(self.base_url.join(&self.login_path)?)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &"********")
            .field("login_path", &self.login_path)
            .field("username_field", &self.username_field)
            .field("password_field", &self.password_field)
            .finish()
    }
}
