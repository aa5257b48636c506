//! `waybackurls` prints the URLs the Wayback Machine archived for a list of
//! domains.
//!
//! The binary is a wrapper around waybackurls-lib, which does the actual
//! querying, rate limiting and retrying.
//!
//! Domains are read from stdin, one per line; playback URLs are written to
//! stdout, one per line:
//! ```sh
//! echo example.com | waybackurls
//! ```
//!
//! Only the exact domain, without subdomains:
//! ```sh
//! cat domains.txt | waybackurls --type domain
//! ```
//!
//! Only URLs which look like leaked secrets, backups or configuration:
//! ```sh
//! cat domains.txt | waybackurls --only-sensitive --silent
//! ```
//!
//! Narrate what happens for every domain on stderr:
//! ```sh
//! echo example.com | waybackurls -v
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

use std::io::{self, BufWriter, ErrorKind};

use anyhow::{Context, Error, Result};
use clap::Parser;
use log::{error, info, warn};
#[cfg(feature = "native-tls")]
use openssl_sys as _; // required for vendored-openssl feature
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use waybackurls_lib::Client;

mod banner;
mod client;
mod formatters;
mod options;
mod verbosity;

use crate::{banner::print_banner, formatters::log::init_logging, options::Config};

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to `main()`
    // using the `?` operator, e.g. when stdin cannot be read.
    #[allow(unused)]
    UnexpectedFailure = 1,
    ConfigError = 3,
    Interrupted = 130,
}

fn main() -> Result<()> {
    // std::process::exit doesn't guarantee that all destructors will be run,
    // therefore we wrap the main code in another function to ensure that.
    // See: https://doc.rust-lang.org/stable/std/process/fn.exit.html
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Parse the config, set up the runtime and process stdin
fn run_main() -> Result<i32> {
    use std::process::exit;

    let config = Config::parse();
    init_logging(&config.verbose);

    if !config.silent {
        print_banner(&mut io::stderr().lock()).context("Cannot print banner")?;
    }

    let client = match client::create(&config) {
        Ok(client) => client,
        Err(e) => {
            error!("Invalid configuration: {e}");
            exit(ExitCode::ConfigError as i32);
        }
    };

    info!(
        "Starting with type={}, only-sensitive={}, retries={}",
        config.search_type, config.only_sensitive, config.retries
    );
    info!(
        "Rate limiting: 1 request every {} (adaptive)",
        humantime::format_duration(config.request_interval)
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run(&client));
    // A pending read of stdin runs on a blocking thread and cannot be
    // interrupted, so do not wait for it after Ctrl-C.
    runtime.shutdown_background();
    match result {
        Err(e) if Some(ErrorKind::BrokenPipe) == underlying_io_error_kind(&e) => {
            Ok(ExitCode::Success as i32)
        }
        res => res,
    }
}

/// Check if the given error can be traced back to an `io::ErrorKind`
/// This is helpful for troubleshooting the root cause of an error.
/// Code is taken from the anyhow documentation.
fn underlying_io_error_kind(error: &Error) -> Option<io::ErrorKind> {
    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return Some(io_error.kind());
        }
    }
    None
}

/// Cancel `cancel` on the first Ctrl-C, exit right away on the second
fn cancel_on_interrupt(cancel: &CancellationToken) {
    let cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupted, stopping");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(ExitCode::Interrupted as i32);
        }
    });
}

/// Look up every domain on stdin, one after another
async fn run(client: &Client) -> Result<i32> {
    let cancel = CancellationToken::new();
    cancel_on_interrupt(&cancel);
    info!("Reading domains from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut out = BufWriter::new(io::stdout().lock());
    let mut domains: usize = 0;

    loop {
        let line = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            line = lines.next_line() => line.context("Cannot read domains from stdin")?,
        };
        let Some(line) = line else {
            break;
        };

        match client.process(&line, &mut out, &cancel).await {
            Ok(None) => {}
            Ok(Some(_)) => domains += 1,
            Err(e) if e.is_cancelled() => break,
            Err(waybackurls_lib::ErrorKind::Output(e)) => {
                return Err(e).context("Cannot write to stdout");
            }
            Err(e) => {
                domains += 1;
                warn!("Skipping {}: {e}", line.trim());
            }
        }
    }

    info!("Processing complete. {domains} domain(s) processed.");
    if cancel.is_cancelled() {
        return Ok(ExitCode::Interrupted as i32);
    }
    Ok(ExitCode::Success as i32)
}
