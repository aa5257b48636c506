//! Queries against the Wayback Machine CDX index.
//!
//! [`CdxQuery`] turns a [`Domain`] into the URL of a CDX index query and
//! [`response`] turns the plain-text answer into [`ArchiveRecord`]s.
//!
//! [`ArchiveRecord`]: crate::ArchiveRecord

use std::fmt::{self, Display};
use std::str::FromStr;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use strum::{Display as StrumDisplay, EnumString};
use url::Url;

use crate::{Domain, ErrorKind, Result};

pub mod response;

/// The public CDX search endpoint of the Internet Archive
pub const DEFAULT_CDX_ENDPOINT: &str = "https://web.archive.org/cdx/search/cdx";

/// Parameters sent with every query besides the target pattern.
/// Only timestamp and original URL are requested as plain text,
/// and captures of the same URL key are collapsed server-side.
const QUERY_PARAMETERS: &str = "output=text&fl=timestamp,original&collapse=urlkey";

/// Everything but ASCII alphanumerics and `-._~` gets escaped
const DOMAIN_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, StrumDisplay, EnumString)]
/// Which part of the archive to search for a domain
pub enum SearchMode {
    /// The host, all of its subdomains, and their paths
    #[strum(serialize = "wildcard", ascii_case_insensitive)]
    #[default]
    Wildcard,

    /// Only the exact host and its paths
    #[strum(serialize = "domain", ascii_case_insensitive)]
    Domain,
}

impl SearchMode {
    /// Parse a mode from user input.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::UnknownSearchMode`] for anything other than
    /// `wildcard` or `domain`.
    pub fn parse(value: &str) -> Result<Self> {
        Self::from_str(value).map_err(|_| ErrorKind::UnknownSearchMode(value.to_string()))
    }

    /// The `url` parameter for the given domain, with the domain already
    /// percent-encoded
    fn target(self, domain: &Domain) -> String {
        let encoded = utf8_percent_encode(domain.as_str(), DOMAIN_ESCAPE);
        match self {
            SearchMode::Wildcard => format!("*.{encoded}/*"),
            SearchMode::Domain => format!("{encoded}/*"),
        }
    }
}

/// Parse and check a CDX endpoint given by the user.
///
/// # Errors
///
/// Fails if `endpoint` is not an absolute `http` or `https` URL.
pub fn parse_endpoint(endpoint: &str) -> Result<Url> {
    let url = Url::parse(endpoint)
        .map_err(|e| ErrorKind::InvalidEndpoint(endpoint.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ErrorKind::InvalidEndpoint(
            endpoint.to_string(),
            format!("unsupported scheme `{}`", url.scheme()),
        ));
    }
    Ok(url)
}

/// A ready-to-send query against the CDX index for a single domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdxQuery {
    target: String,
    url: Url,
}

impl CdxQuery {
    /// Build the query for `domain` against `endpoint`.
    ///
    /// This does no I/O. Any query string already present on `endpoint`
    /// is replaced.
    #[must_use]
    pub fn new(endpoint: &Url, domain: &Domain, mode: SearchMode) -> Self {
        let target = mode.target(domain);
        let mut url = endpoint.clone();
        url.set_query(Some(&format!("url={target}&{QUERY_PARAMETERS}")));
        Self { target, url }
    }

    /// The `url` parameter of the query, e.g. `*.example.com/*`
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// The full query URL
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }
}

impl Display for CdxQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.url, f)
    }
}
