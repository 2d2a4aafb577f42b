//! Error types for the CircleCI client.

use thiserror::Error;

/// Failures talking to CircleCI.
///
/// Urls carried here are always redacted and `reqwest` errors are stripped
/// of their url, so none of these messages can leak the API token.
#[derive(Debug, Error)]
pub enum CircleError {
    /// Non-2xx response.
    #[error("http: remote server responded {status} for {url} (check https://status.circleci.com)")]
    Status { status: u16, url: String },

    /// DNS, connection, or body read failure.
    #[error("network error: {0}")]
    Network(reqwest::Error),

    /// The response body was not the JSON we expected.
    #[error("malformed response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The request url could not be assembled.
    #[error("invalid url: {0}")]
    Url(String),

    /// Writing the downloaded body failed.
    #[error("write error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for CircleError {
    fn from(err: reqwest::Error) -> Self {
        CircleError::Network(err.without_url())
    }
}

impl CircleError {
    /// Whether this is a payload problem rather than a transport problem.
    pub fn is_decode(&self) -> bool {
        matches!(self, CircleError::Decode { .. })
    }
}
