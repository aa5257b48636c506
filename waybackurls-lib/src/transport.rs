//! The HTTP layer below the retry loop.
//!
//! [`Transport`] performs exactly one GET request and never retries on its
//! own. The response body is read lazily through [`Reply::text`], so the
//! caller can look at status and headers before deciding what to do with
//! the body.

use std::fmt::{self, Debug};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::{FutureExt, TryFutureExt};
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use url::Url;

use crate::{ErrorKind, Result};

/// Default timeout in seconds before a request is deemed as failed, 30.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Default user agent, `waybackurls/<PKG_VERSION>`.
pub const DEFAULT_USER_AGENT: &str = concat!("waybackurls/", env!("CARGO_PKG_VERSION"));

// Constants currently not configurable by the user.
/// A timeout for only the connect phase of a request.
const CONNECT_TIMEOUT: u64 = 10;
/// TCP keepalive
/// See <https://tldp.org/HOWTO/TCP-Keepalive-HOWTO/overview.html> for more info
const TCP_KEEPALIVE: u64 = 60;

/// Status and headers of a response, with the body still to be read
pub struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: BoxFuture<'static, Result<String>>,
}

impl Reply {
    /// Assemble a reply from its parts. `body` is only polled by
    /// [`Reply::text`].
    pub fn new(
        status: StatusCode,
        headers: HeaderMap,
        body: impl Future<Output = Result<String>> + Send + 'static,
    ) -> Self {
        Self {
            status,
            headers,
            body: body.boxed(),
        }
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The announced body size, if the server sent a `Content-Length`
    #[must_use]
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
    }

    /// Read the whole body as text
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::ReadResponseBody`] if the connection breaks
    /// while reading.
    pub async fn text(self) -> Result<String> {
        self.body.await
    }
}

impl Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Something that can send a single GET request
#[async_trait]
pub trait Transport: Debug + Send + Sync {
    /// Send one GET request to `url`
    ///
    /// # Errors
    ///
    /// Fails if no response could be obtained at all. A response with an
    /// error status is still an `Ok`.
    async fn get(&self, url: &Url) -> Result<Reply>;
}

/// [`Transport`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    reqwest_client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport sending `user_agent` with every request.
    ///
    /// # Errors
    ///
    /// Returns an `Err` if:
    /// - The user-agent is invalid.
    /// - The request client cannot be created.
    ///   See [here](https://docs.rs/reqwest/latest/reqwest/struct.ClientBuilder.html#errors).
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_str(user_agent)?);

        let builder = reqwest::ClientBuilder::new()
            .gzip(true)
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT))
            .tcp_keepalive(Duration::from_secs(TCP_KEEPALIVE));

        let reqwest_client = (match timeout {
            Some(t) => builder.timeout(t),
            None => builder,
        })
        .build()
        .map_err(ErrorKind::BuildRequestClient)?;

        Ok(Self { reqwest_client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url) -> Result<Reply> {
        let response = self
            .reqwest_client
            .get(url.clone())
            .send()
            .await
            .map_err(ErrorKind::NetworkRequest)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().map_err(ErrorKind::ReadResponseBody);
        Ok(Reply::new(status, headers, body))
    }
}
