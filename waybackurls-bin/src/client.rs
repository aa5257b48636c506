use std::time::Duration;

use log::{info, warn};
use waybackurls_lib::{Client, ClientBuilder, Result, SearchMode, SensitiveFilter};

use crate::options::Config;

/// Creates a client according to the command-line config
pub(crate) fn create(cfg: &Config) -> Result<Client> {
    let search_mode = SearchMode::parse(&cfg.search_type)?;
    let timeout = (cfg.timeout > 0).then(|| Duration::from_secs(cfg.timeout));
    let retry_wait_time = Duration::from_secs(cfg.retry_wait_time);

    ClientBuilder::builder()
        .user_agent(cfg.user_agent.clone())
        .timeout(timeout)
        .max_attempts(cfg.retries)
        .retry_wait_time(retry_wait_time)
        .request_interval(cfg.request_interval)
        .search_mode(search_mode)
        .cdx_endpoint(cfg.cdx_endpoint.clone())
        .sensitive_filter(sensitive_filter(cfg)?)
        .build()
        .client()
}

/// The pattern table to filter with, if `--only-sensitive` is set.
/// A `--patterns` file is always loaded, so that a broken file is reported
/// even when it is not used.
fn sensitive_filter(cfg: &Config) -> Result<Option<SensitiveFilter>> {
    let filter = match &cfg.patterns {
        Some(path) => {
            let filter = SensitiveFilter::from_file(path)?;
            if !cfg.only_sensitive {
                warn!("`--patterns` has no effect without `--only-sensitive`");
            }
            info!(
                "Loaded {} sensitive patterns from `{}`",
                filter.len(),
                path.display()
            );
            filter
        }
        None if cfg.only_sensitive => {
            let filter = SensitiveFilter::builtin()?;
            info!("Compiled {} built-in sensitive patterns", filter.len());
            filter
        }
        None => return Ok(None),
    };
    Ok(cfg.only_sensitive.then_some(filter))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use clap::Parser;
    use tempfile::NamedTempFile;
    use waybackurls_lib::ErrorKind;

    use super::{create, sensitive_filter};
    use crate::options::Config;

    fn config(args: &[&str]) -> Config {
        Config::parse_from(std::iter::once("waybackurls").chain(args.iter().copied()))
    }

    #[test]
    fn test_valid_config() {
        assert!(create(&config(&[])).is_ok());
        assert!(create(&config(&["-t", "DOMAIN", "-s", "-T", "0"])).is_ok());
    }

    #[test]
    fn test_configuration_errors() {
        let errors = [
            create(&config(&["--type", "subdomains"])).unwrap_err(),
            create(&config(&["--retries", "0"])).unwrap_err(),
            create(&config(&["--request-interval", "0s"])).unwrap_err(),
            create(&config(&["--cdx-endpoint", "not a url"])).unwrap_err(),
            create(&config(&["--patterns", "/does/not/exist.toml"])).unwrap_err(),
        ];
        for error in errors {
            assert!(error.is_config_error(), "{error}");
        }
    }

    #[test]
    fn test_sensitive_filter_selection() {
        assert!(sensitive_filter(&config(&[])).unwrap().is_none());
        assert!(sensitive_filter(&config(&["-s"])).unwrap().is_some());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[[rule]]\ncategory = \"logs\"\npattern = 'x\\.log'").unwrap();
        let path_buf = file.path().to_owned();
        let path = path_buf.to_str().unwrap();

        let unused = sensitive_filter(&config(&["--patterns", path])).unwrap();
        assert!(unused.is_none());
        let custom = sensitive_filter(&config(&["-s", "--patterns", path]))
            .unwrap()
            .unwrap();
        assert_eq!(custom.len(), 1);

        writeln!(file, "[[rule]]\ncategory = \"logs\"\npattern = '(broken'").unwrap();
        assert!(matches!(
            sensitive_filter(&config(&["--patterns", path])),
            Err(ErrorKind::InvalidPatternTable(_))
        ));
    }
}
