//! Repository transport.
//!
//! Uploads are plain HTTP `PUT` requests with basic authentication against a
//! Maven 2 layout repository; rollback uses `DELETE`. The [`RepositoryTransport`]
//! trait lets tests observe requests without network access.

use super::credentials::Credentials;
use std::time::Duration;

/// Transfers files to and from a remote repository.
///
/// # Examples
///
/// ```
/// use jarsmith::publish::transport::HttpTransport;
/// use std::time::Duration;
///
/// let transport = HttpTransport::new(Duration::from_secs(30));
/// // Use transport.put(url, body, &credentials) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait RepositoryTransport {
    /// Upload `body` to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    fn put(&self, url: &str, body: &[u8], credentials: &Credentials)
    -> Result<(), TransportError>;

    /// Delete the file at `url`. A file that is already absent counts as
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    fn delete(&self, url: &str, credentials: &Credentials) -> Result<(), TransportError>;
}

/// Errors arising from repository requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The request did not complete within the timeout.
    #[error("request to {url} timed out")]
    NetworkTimeout {
        /// The URL that was requested.
        url: String,
    },

    /// The server could not be reached.
    #[error("could not connect to {url}: {reason}")]
    Connection {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered with an error status.
    #[error("{url} rejected the request with HTTP {status}")]
    Rejected {
        /// The URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Any other request failure.
    #[error("request to {url} failed: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },
}

impl TransportError {
    /// Whether the failure is a network timeout worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkTimeout { .. } | Self::Connection { .. })
    }
}

/// HTTP transport using `ureq`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    agent: ureq::Agent,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl RepositoryTransport for HttpTransport {
    fn put(
        &self,
        url: &str,
        body: &[u8],
        credentials: &Credentials,
    ) -> Result<(), TransportError> {
        self.agent
            .put(url)
            .header("Authorization", &credentials.authorization_header())
            .send(body)
            .map(drop)
            .map_err(|e| map_ureq_error(url, e))
    }

    fn delete(&self, url: &str, credentials: &Credentials) -> Result<(), TransportError> {
        let response = self
            .agent
            .delete(url)
            .header("Authorization", &credentials.authorization_header())
            .call();
        deletion_result(url, response.map(drop))
    }
}

/// Rollback may target a file whose timed-out upload never landed.
fn deletion_result(url: &str, result: Result<(), ureq::Error>) -> Result<(), TransportError> {
    match result {
        Ok(()) | Err(ureq::Error::StatusCode(404)) => Ok(()),
        Err(e) => Err(map_ureq_error(url, e)),
    }
}

/// Map a ureq error to a [`TransportError`].
fn map_ureq_error(url: &str, err: ureq::Error) -> TransportError {
    let url = url.to_owned();
    match err {
        ureq::Error::StatusCode(status) => TransportError::Rejected { url, status },
        ureq::Error::Timeout(_) => TransportError::NetworkTimeout { url },
        ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => {
            TransportError::NetworkTimeout { url }
        }
        ureq::Error::Io(e) => TransportError::Connection {
            url,
            reason: e.to_string(),
        },
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
            TransportError::Connection {
                url,
                reason: err.to_string(),
            }
        }
        other => TransportError::Http {
            url,
            reason: other.to_string(),
        },
    }
}
