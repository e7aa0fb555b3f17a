//! Channel credential resolution.
//!
//! Credentials are never stored in configuration; each channel names the
//! environment variables holding its username and password.

use super::PublishError;
use super::channel::RepositoryChannel;
use crate::config::ChannelSettings;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// Basic authentication credentials for one channel.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Create credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Read the credentials referenced by `settings` from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`PublishError::MissingCredentials`] if either variable is
    /// unset or empty.
    pub fn from_env(
        channel: RepositoryChannel,
        settings: &ChannelSettings,
    ) -> Result<Self, PublishError> {
        let read = |variable: &str| {
            std::env::var(variable)
                .ok()
                .filter(|value| !value.is_empty())
                .ok_or_else(|| PublishError::MissingCredentials {
                    channel,
                    detail: format!("environment variable {variable} is not set"),
                })
        };
        Ok(Self::new(
            read(&settings.username_env)?,
            read(&settings.password_env)?,
        ))
    }

    /// The username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Value for an HTTP `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        let token = STANDARD.encode(format!("{}:{}", self.username, self.password));
        format!("Basic {token}")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
