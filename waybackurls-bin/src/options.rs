use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use const_format::concatcp;
use waybackurls_lib::{
    DEFAULT_CDX_ENDPOINT, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_WAIT_TIME_SECS,
    DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};

use crate::verbosity::Verbosity;

const DEFAULT_SEARCH_TYPE: &str = "wildcard";
const DEFAULT_REQUEST_INTERVAL: &str = "1s";

// this exists because clap requires `&str` type values for defaults
const MAX_ATTEMPTS_STR: &str = concatcp!(DEFAULT_MAX_ATTEMPTS);
const TIMEOUT_STR: &str = concatcp!(DEFAULT_TIMEOUT_SECS);
const RETRY_WAIT_TIME_STR: &str = concatcp!(DEFAULT_RETRY_WAIT_TIME_SECS);

/// waybackurls reads domains from stdin, one per line, and prints every URL
/// the Wayback Machine archived for them as a playback URL on stdout.
///
/// Requests are rate limited and slow down further when the archive asks
/// for it. Failed requests are retried with a growing backoff.
#[derive(Parser, Debug, Clone)]
#[command(version, about, next_display_order = None)]
pub(crate) struct Config {
    /// Search type: `wildcard` (domain and all subdomains) or `domain`
    /// (exact domain only)
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = DEFAULT_SEARCH_TYPE)]
    pub(crate) search_type: String,

    /// Only print URLs that look like sensitive files (credentials, backups,
    /// configuration, keys, ...)
    #[arg(short = 's', long)]
    pub(crate) only_sensitive: bool,

    /// Maximum number of attempts per domain
    #[arg(short = 'r', long, value_name = "N", default_value = MAX_ATTEMPTS_STR)]
    pub(crate) retries: u32,

    /// Base wait time in seconds between attempts. The n-th retry waits
    /// n² times as long.
    #[arg(long, value_name = "SECS", default_value = RETRY_WAIT_TIME_STR)]
    pub(crate) retry_wait_time: u64,

    /// Initial time between two requests, e.g. `1s` or `500ms`.
    /// The archive can ask us to slow down further.
    #[arg(
        long,
        value_name = "DURATION",
        value_parser = humantime::parse_duration,
        default_value = DEFAULT_REQUEST_INTERVAL
    )]
    pub(crate) request_interval: Duration,

    /// Timeout in seconds for a single request, from connect to the end of
    /// the response. `0` disables the timeout.
    #[arg(short = 'T', long, value_name = "SECS", default_value = TIMEOUT_STR)]
    pub(crate) timeout: u64,

    /// User agent sent with every request
    #[arg(short = 'u', long, default_value = DEFAULT_USER_AGENT)]
    pub(crate) user_agent: String,

    /// TOML file with custom sensitive-file patterns, replacing the built-in
    /// ones. Only used together with `--only-sensitive`.
    #[arg(
        long,
        value_name = "FILE",
        long_help = "TOML file with custom sensitive-file patterns, replacing the built-in
ones. Only used together with `--only-sensitive`.

Each rule names a category and a regular expression, which is matched
case-insensitively right after the start of the URL or a `/`:

    [[rule]]
    category = \"credentials\"
    pattern = 'id_rsa(?:\\.pub)?'"
    )]
    pub(crate) patterns: Option<PathBuf>,

    /// URL of the CDX search endpoint
    #[arg(long, hide = true, default_value = DEFAULT_CDX_ENDPOINT)]
    pub(crate) cdx_endpoint: String,

    /// Do not print the banner
    #[arg(long)]
    pub(crate) silent: bool,

    /// Verbose program output
    #[clap(flatten)]
    pub(crate) verbose: Verbosity,
}
