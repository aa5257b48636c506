//! Handler of per-domain lookups.
//!
//! This module defines two structs, [`Client`] and [`ClientBuilder`].
//! `Client` turns an input line into playback URLs written to an output.
//! `ClientBuilder` exposes a finer level of granularity for building
//! a `Client`.
#![allow(clippy::module_name_repetitions)]

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio_util::sync::CancellationToken;
use typed_builder::TypedBuilder;
use url::Url;

use crate::cdx::{self, CdxQuery, DEFAULT_CDX_ENDPOINT, SearchMode, response::ResponseStats};
use crate::fetch::Fetcher;
use crate::filter::SensitiveFilter;
use crate::ratelimit::{DEFAULT_REQUEST_INTERVAL, RateController};
use crate::retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_WAIT_TIME_SECS, RetryPolicy};
use crate::transport::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ReqwestTransport, Transport};
use crate::{Domain, Result};

/// Builder for [`Client`].
///
/// See crate-level documentation for usage example.
#[derive(TypedBuilder, Debug, Clone)]
#[builder(field_defaults(default, setter(into)))]
#[builder(builder_method(doc = "
Create a builder for building `ClientBuilder`.

On the builder call, call methods with same name as its fields to set their values.

Finally, call `.build()` to create the instance of `ClientBuilder`.
"))]
pub struct ClientBuilder {
    /// User-agent sent with every request to the CDX index.
    #[builder(default_code = "String::from(DEFAULT_USER_AGENT)")]
    user_agent: String,

    /// Response timeout per request.
    #[builder(default = Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))]
    timeout: Option<Duration>,

    /// Maximum number of attempts per domain, must be at least 1.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Base of the quadratic backoff between attempts.
    #[builder(default = Duration::from_secs(DEFAULT_RETRY_WAIT_TIME_SECS))]
    retry_wait_time: Duration,

    /// Initial interval between two requests. The server may slow us down
    /// further, but never speed us up.
    #[builder(default = DEFAULT_REQUEST_INTERVAL)]
    request_interval: Duration,

    /// Search the exact domain or all of its subdomains.
    search_mode: SearchMode,

    /// URL of the CDX search endpoint.
    ///
    /// Useful for mirrors and for testing.
    #[builder(default_code = "String::from(DEFAULT_CDX_ENDPOINT)")]
    cdx_endpoint: String,

    /// When set, only URLs whose original URL matches this filter are
    /// written.
    sensitive_filter: Option<SensitiveFilter>,

    /// Share an existing rate controller instead of creating one from
    /// [`ClientBuilder::request_interval`].
    rate_controller: Option<Arc<RateController>>,

    /// Replace the HTTP transport. [`ClientBuilder::user_agent`] and
    /// [`ClientBuilder::timeout`] are ignored if this is set.
    transport: Option<Arc<dyn Transport>>,
}

impl Default for ClientBuilder {
    #[must_use]
    #[inline]
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ClientBuilder {
    /// Instantiates a [`Client`].
    ///
    /// # Errors
    ///
    /// Returns an `Err` if:
    /// - `max_attempts` is zero.
    /// - `request_interval` is zero.
    /// - The CDX endpoint is not an HTTP(S) URL.
    /// - The user-agent is invalid.
    /// - The request client cannot be created.
    ///   See [here](https://docs.rs/reqwest/latest/reqwest/struct.ClientBuilder.html#errors).
    pub fn client(self) -> Result<Client> {
        let Self {
            user_agent,
            timeout,
            max_attempts,
            retry_wait_time,
            request_interval,
            search_mode,
            cdx_endpoint,
            sensitive_filter,
            rate_controller,
            transport,
        } = self;

        let policy = RetryPolicy::new(max_attempts)?.with_base_delay(retry_wait_time);
        let endpoint = cdx::parse_endpoint(&cdx_endpoint)?;

        let rate = match rate_controller {
            Some(rate) => rate,
            None => Arc::new(RateController::new(request_interval)?),
        };

        let transport: Arc<dyn Transport> = match transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&user_agent, timeout)?),
        };

        Ok(Client {
            fetcher: Fetcher::new(transport, rate, policy),
            endpoint,
            search_mode,
            sensitive_filter,
        })
    }
}

/// Looks up domains in the CDX index and writes their playback URLs.
///
/// See [`ClientBuilder`] which contains sane defaults for all configuration options.
#[derive(Debug, Clone)]
pub struct Client {
    /// Retry loop and rate limiting around the transport
    fetcher: Fetcher,
    /// Where to send CDX queries
    endpoint: Url,
    search_mode: SearchMode,
    /// Only write sensitive URLs, if set
    sensitive_filter: Option<SensitiveFilter>,
}

impl Client {
    /// The CDX query for `domain` under the configured endpoint and mode
    #[must_use]
    pub fn query(&self, domain: &Domain) -> CdxQuery {
        CdxQuery::new(&self.endpoint, domain, self.search_mode)
    }

    /// Process one input line: normalize it, fetch the CDX listing and
    /// write one playback URL per record to `out`.
    ///
    /// Returns `Ok(None)` for lines which hold no domain. Nothing is written
    /// for a domain before its whole listing has been received.
    ///
    /// # Errors
    ///
    /// Fails if the listing cannot be fetched (see [`Fetcher::fetch`]) or
    /// `out` cannot be written to. Malformed lines in the listing are not
    /// an error.
    pub async fn process<W: Write>(
        &self,
        line: &str,
        out: &mut W,
        cancel: &CancellationToken,
    ) -> Result<Option<ResponseStats>> {
        let Some(domain) = Domain::parse(line) else {
            debug!("Skipping empty input line");
            return Ok(None);
        };
        if domain.as_str() == line.trim() {
            info!("Processing domain: {domain}");
        } else {
            info!(
                "Processing domain: {domain} (normalized from: {})",
                line.trim()
            );
        }

        let query = self.query(&domain);
        info!("Fetching {query}");
        let body = self.fetcher.fetch(&query, cancel).await?;
        info!("Found {} lines in response", body.lines().count());

        let mut records = cdx::response::parse(&body);
        while let Some(record) = records.next() {
            if let Some(filter) = &self.sensitive_filter {
                if !filter.is_match(record.original) {
                    debug!("Not sensitive: {}", record.original);
                    continue;
                }
                debug!(
                    "Sensitive ({}): {}",
                    categories(filter, record.original),
                    record.original
                );
                records.record_sensitive();
            }
            writeln!(out, "{record}")?;
        }
        out.flush()?;

        let stats = records.stats();
        if self.sensitive_filter.is_some() {
            info!(
                "Finished {domain}: {} records, {} sensitive, {} malformed lines skipped",
                stats.records, stats.sensitive, stats.discarded
            );
        } else {
            info!(
                "Finished {domain}: {} records, {} malformed lines skipped",
                stats.records, stats.discarded
            );
        }
        Ok(Some(stats))
    }
}

fn categories(filter: &SensitiveFilter, original: &str) -> String {
    filter
        .matching_categories(original)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
