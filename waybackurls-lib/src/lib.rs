//! `waybackurls_lib` fetches the archived URLs of domains from the
//! Wayback Machine's CDX index.
//!
//! It takes care of being a good citizen towards the index: requests are
//! rate limited, the rate adapts to `Retry-After` and remaining-quota
//! headers, and transient failures are retried with a quadratic backoff.
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use waybackurls_lib::{ClientBuilder, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ClientBuilder::default().client()?;
//!     let mut stdout = std::io::stdout();
//!     let stats = client
//!         .process("example.com", &mut stdout, &CancellationToken::new())
//!         .await?;
//!     eprintln!("{stats:?}");
//!     Ok(())
//! }
//! ```
//!
//! Only interested in URLs that look like leaked backups or credentials?
//! Pass a [`SensitiveFilter`]:
//!
//! ```no_run
//! use waybackurls_lib::{ClientBuilder, Result, SensitiveFilter};
//!
//! fn client() -> Result<waybackurls_lib::Client> {
//!     ClientBuilder::builder()
//!         .sensitive_filter(SensitiveFilter::builtin()?)
//!         .build()
//!         .client()
//! }
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    rustdoc::invalid_html_tags,
    missing_copy_implementations,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    variant_size_differences,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![deny(missing_docs)]

#[cfg(feature = "native-tls")]
use openssl_sys as _; // required for vendored-openssl feature

mod client;
mod types;

pub mod cdx;
pub mod fetch;
pub mod filter;
pub mod ratelimit;
pub mod retry;
pub mod transport;

pub use crate::{
    cdx::{CdxQuery, DEFAULT_CDX_ENDPOINT, SearchMode, response::ResponseStats},
    client::{Client, ClientBuilder},
    fetch::Fetcher,
    filter::{Category, PatternRule, SensitiveFilter},
    ratelimit::{DEFAULT_REQUEST_INTERVAL, RateController},
    retry::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_WAIT_TIME_SECS, RetryPolicy},
    transport::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ReqwestTransport, Transport},
    types::*,
};
