use std::path::PathBuf;

use http::StatusCode;
use thiserror::Error;

/// Possible errors when interacting with `waybackurls_lib`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Network error while sending a request to the CDX index
    #[error("Network error while querying the CDX index: {0}")]
    NetworkRequest(#[source] reqwest::Error),

    /// The response status was fine, but the body could not be read
    #[error("Error reading response body: {0}")]
    ReadResponseBody(#[source] reqwest::Error),

    /// The HTTP client could not be constructed
    #[error("Failed to create the HTTP client: {0}")]
    BuildRequestClient(#[source] reqwest::Error),

    /// The CDX index answered with a status code other than 2xx
    #[error("Rejected status code: {0}")]
    RejectedStatusCode(StatusCode),

    /// Every attempt failed with a retryable error
    #[error("Giving up after {attempts} attempt(s), last error: {last}")]
    RetriesExhausted {
        /// Number of attempts that were made
        attempts: u32,
        /// The failure of the final attempt
        #[source]
        last: Box<ErrorKind>,
    },

    /// The operation was aborted through its cancellation token
    #[error("Operation cancelled")]
    Cancelled,

    /// The retry ceiling must allow at least one attempt
    #[error("The number of attempts must be at least 1")]
    InvalidMaxAttempts,

    /// The rate limiter cannot run with an empty interval
    #[error("Request interval must not be zero")]
    ZeroRequestInterval,

    /// Only `wildcard` and `domain` are understood
    #[error("Unknown search type `{0}`, expected `wildcard` or `domain`")]
    UnknownSearchMode(String),

    /// The configured CDX endpoint is not a usable HTTP(S) URL
    #[error("Invalid CDX endpoint `{0}`: {1}")]
    InvalidEndpoint(String, String),

    /// The given user agent cannot be used as a header value
    #[error("Invalid User-Agent header: {0}")]
    InvalidUserAgent(#[from] http::header::InvalidHeaderValue),

    /// The sensitive pattern table did not compile
    #[error("Failed to compile sensitive pattern table: {0}")]
    InvalidPatternTable(#[from] regex::Error),

    /// The sensitive pattern table has no rules
    #[error("Sensitive pattern table is empty")]
    EmptyPatternTable,

    /// A pattern table file could not be read
    #[error("Cannot read pattern file `{path}`: {1}", path = .0.display())]
    ReadPatternFile(PathBuf, #[source] std::io::Error),

    /// A pattern table file is not valid TOML or has an unexpected shape
    #[error("Cannot parse pattern file `{path}`: {1}", path = .0.display())]
    ParsePatternFile(PathBuf, #[source] toml::de::Error),

    /// Writing results to the output failed
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

impl ErrorKind {
    /// Whether this error was caused by cancellation, directly or as the last
    /// failure of an exhausted retry loop
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::RetriesExhausted { last, .. } => last.is_cancelled(),
            _ => false,
        }
    }

    /// Whether this error concerns the configuration rather than a single domain
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMaxAttempts
                | Self::ZeroRequestInterval
                | Self::UnknownSearchMode(_)
                | Self::InvalidEndpoint(..)
                | Self::InvalidUserAgent(_)
                | Self::InvalidPatternTable(_)
                | Self::EmptyPatternTable
                | Self::ReadPatternFile(..)
                | Self::ParsePatternFile(..)
                | Self::BuildRequestClient(_)
        )
    }
}
