//! The retry loop around a single CDX query.
//!
//! Every attempt goes through the shared [`RateController`] first, then
//! through the [`Transport`]. Rate limit headers are applied as soon as a
//! response arrives, before the response is judged, so that even a failed
//! attempt slows down the following ones.

use std::sync::Arc;

use log::{debug, info};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::cdx::CdxQuery;
use crate::ratelimit::RateController;
use crate::retry::{AttemptOutcome, RetryPolicy};
use crate::transport::Transport;
use crate::{ErrorKind, Result};

/// Fetches the body of a CDX query, retrying transient failures.
#[derive(Debug, Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    rate: Arc<RateController>,
    policy: RetryPolicy,
}

impl Fetcher {
    /// Create a fetcher. `rate` is usually shared with every other fetcher
    /// talking to the same index.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, rate: Arc<RateController>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            rate,
            policy,
        }
    }

    /// The rate controller in use
    #[must_use]
    pub const fn rate(&self) -> &Arc<RateController> {
        &self.rate
    }

    /// Fetch the full body of `query`.
    ///
    /// Attempts are numbered from 1 to the policy's `max_attempts`, with a
    /// quadratic backoff sleep in between.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::Cancelled`] as soon as `cancel` fires, no matter if we
    ///   were waiting for the rate limiter, the server or the backoff timer.
    /// - [`ErrorKind::RejectedStatusCode`] for a non-retryable status such
    ///   as 404, right after the first such response.
    /// - [`ErrorKind::RetriesExhausted`] if the final attempt failed as well.
    pub async fn fetch(&self, query: &CdxQuery, cancel: &CancellationToken) -> Result<String> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            info!("Attempt {attempt}/{max_attempts}");
            let error = match self.attempt(query, cancel).await? {
                AttemptOutcome::Success(body) => return Ok(body),
                AttemptOutcome::Fatal(error) => return Err(error),
                AttemptOutcome::Retryable(error) => error,
            };

            if attempt >= max_attempts {
                return Err(ErrorKind::RetriesExhausted {
                    attempts: attempt,
                    last: Box::new(error),
                });
            }

            let wait = self.policy.backoff(attempt);
            debug!("Attempt {attempt} failed: {error}. Retrying in {wait:?}");
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ErrorKind::Cancelled),
                () = sleep(wait) => {}
            }
            attempt += 1;
        }
    }

    /// Run a single attempt. Only cancellation is returned as an `Err`,
    /// every other failure ends up in the [`AttemptOutcome`].
    async fn attempt(&self, query: &CdxQuery, cancel: &CancellationToken) -> Result<AttemptOutcome> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ErrorKind::Cancelled),
            () = self.rate.acquire() => {}
        }

        let reply = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ErrorKind::Cancelled),
            reply = self.transport.get(query.url()) => reply,
        };
        let reply = match reply {
            Ok(reply) => reply,
            Err(error) => return Ok(AttemptOutcome::from_error(error)),
        };

        self.rate.adjust_from_headers(reply.headers()).await;

        let status = reply.status();
        match reply.content_length() {
            Some(length) => info!("Response status: {status}, content length: {length}"),
            None => info!("Response status: {status}"),
        }
        if !status.is_success() {
            return Ok(AttemptOutcome::from_error(ErrorKind::RejectedStatusCode(
                status,
            )));
        }

        let body = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(ErrorKind::Cancelled),
            body = reply.text() => body,
        };
        Ok(match body {
            Ok(body) => {
                info!("Received {} bytes", body.len());
                AttemptOutcome::Success(body)
            }
            Err(error) => AttemptOutcome::from_error(error),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use http::{HeaderMap, HeaderValue, StatusCode};
    use pretty_assertions::assert_eq;
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::Fetcher;
    use crate::cdx::{CdxQuery, SearchMode, parse_endpoint};
    use crate::ratelimit::RateController;
    use crate::retry::RetryPolicy;
    use crate::transport::{ReqwestTransport, Reply, Transport};
    use crate::{Domain, ErrorKind, Result};

    /// What the in-memory transport does on one call
    #[derive(Debug, Clone, Copy)]
    enum Step {
        Unreachable,
        Status(u16),
        RetryAfter(u16, &'static str),
        Body(&'static str),
        BrokenBody,
        /// Never answers
        Hang,
    }

    /// Replays a script of steps, repeating the last one forever, and
    /// records the (virtual) time of every call.
    #[derive(Debug)]
    struct ScriptedTransport {
        steps: Mutex<VecDeque<Step>>,
        calls: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(steps: &[Step]) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.iter().copied().collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Instant> {
            self.calls.lock().unwrap().clone()
        }

        fn next_step(&self) -> Step {
            let mut steps = self.steps.lock().unwrap();
            if steps.len() > 1 {
                steps.pop_front().unwrap()
            } else {
                *steps.front().unwrap()
            }
        }
    }

    async fn reqwest_error() -> reqwest::Error {
        reqwest::Client::new()
            .get("http://[::1")
            .send()
            .await
            .unwrap_err()
    }

    fn reply(status: u16, headers: HeaderMap, body: &'static str) -> Reply {
        let body = async move { Ok(body.to_string()) };
        Reply::new(StatusCode::from_u16(status).unwrap(), headers, body)
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn get(&self, _url: &Url) -> Result<Reply> {
            self.calls.lock().unwrap().push(Instant::now());
            Ok(match self.next_step() {
                Step::Unreachable => return Err(ErrorKind::NetworkRequest(reqwest_error().await)),
                Step::Status(status) => reply(status, HeaderMap::new(), ""),
                Step::RetryAfter(status, seconds) => {
                    let mut headers = HeaderMap::new();
                    headers.insert("retry-after", HeaderValue::from_static(seconds));
                    reply(status, headers, "")
                }
                Step::Body(body) => reply(200, HeaderMap::new(), body),
                Step::Hang => return futures::future::pending().await,
                Step::BrokenBody => {
                    let error = reqwest_error().await;
                    Reply::new(StatusCode::OK, HeaderMap::new(), async move {
                        Err(ErrorKind::ReadResponseBody(error))
                    })
                }
            })
        }
    }

    fn query(endpoint: &str) -> CdxQuery {
        CdxQuery::new(
            &parse_endpoint(endpoint).unwrap(),
            &Domain::parse("example.com").unwrap(),
            SearchMode::Wildcard,
        )
    }

    /// The rate limiter runs on the wall clock while the tests run on paused
    /// tokio time, so it is configured to never be the bottleneck here.
    fn fetcher(transport: Arc<dyn Transport>, max_attempts: u32) -> Fetcher {
        let rate = RateController::new(Duration::from_nanos(1)).unwrap();
        Fetcher::new(
            transport,
            Arc::new(rate),
            RetryPolicy::new(max_attempts).unwrap(),
        )
    }

    fn gaps(calls: &[Instant]) -> Vec<Duration> {
        calls.windows(2).map(|w| w[1] - w[0]).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_failures_then_success() {
        let transport = ScriptedTransport::new(&[
            Step::Unreachable,
            Step::Status(503),
            Step::Body("20200101000000 http://example.com/\n"),
        ]);
        let fetcher = fetcher(transport.clone(), 3);

        let body = fetcher
            .fetch(&query("https://web.archive.org/cdx/search/cdx"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(body, "20200101000000 http://example.com/\n");
        assert_eq!(
            gaps(&transport.calls()),
            vec![Duration::from_secs(1), Duration::from_secs(4)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_found_is_not_retried() {
        let transport = ScriptedTransport::new(&[Step::Status(404)]);
        let fetcher = fetcher(transport.clone(), 5);

        let result = fetcher
            .fetch(&query("https://web.archive.org/cdx/search/cdx"), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ErrorKind::RejectedStatusCode(StatusCode::NOT_FOUND))
        ));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let transport = ScriptedTransport::new(&[Step::Status(429), Step::Status(500)]);
        let fetcher = fetcher(transport.clone(), 4);

        let result = fetcher
            .fetch(&query("https://web.archive.org/cdx/search/cdx"), &CancellationToken::new())
            .await;

        match result {
            Err(ErrorKind::RetriesExhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(
                    *last,
                    ErrorKind::RejectedStatusCode(StatusCode::INTERNAL_SERVER_ERROR)
                ));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(
            gaps(&transport.calls()),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(4),
                Duration::from_secs(9)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_broken_body_is_retried() {
        let transport = ScriptedTransport::new(&[Step::BrokenBody, Step::Body("ok")]);
        let fetcher = fetcher(transport.clone(), 2);

        let body = fetcher
            .fetch(&query("https://web.archive.org/cdx/search/cdx"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(body, "ok");
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_headers_are_applied_before_classification() {
        let transport = ScriptedTransport::new(&[Step::RetryAfter(429, "7")]);
        let fetcher = fetcher(transport.clone(), 1);

        let result = fetcher
            .fetch(&query("https://web.archive.org/cdx/search/cdx"), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ErrorKind::RetriesExhausted { attempts: 1, .. })
        ));
        assert_eq!(fetcher.rate().interval().await, Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_start() {
        let transport = ScriptedTransport::new(&[Step::Body("never")]);
        let fetcher = fetcher(transport.clone(), 3);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = fetcher
            .fetch(&query("https://web.archive.org/cdx/search/cdx"), &cancel)
            .await;
        assert!(matches!(result, Err(ErrorKind::Cancelled)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_during_backoff() {
        let transport = ScriptedTransport::new(&[Step::Status(502)]);
        let fetcher = fetcher(transport.clone(), 1000);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = fetcher
            .fetch(&query("https://web.archive.org/cdx/search/cdx"), &cancel)
            .await;

        assert!(matches!(result, Err(ErrorKind::Cancelled)));
        // Attempts at 0s and 1s, cancelled 2s into the 4s wait
        assert_eq!(transport.calls().len(), 2);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_waiting_for_the_server() {
        let transport = ScriptedTransport::new(&[Step::Hang]);
        let fetcher = fetcher(transport.clone(), 3);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            trigger.cancel();
        });

        let start = Instant::now();
        let result = fetcher
            .fetch(&query("https://web.archive.org/cdx/search/cdx"), &cancel)
            .await;

        assert!(matches!(result, Err(ErrorKind::Cancelled)));
        assert_eq!(transport.calls().len(), 1);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_while_waiting_for_the_rate_limiter() {
        let transport = ScriptedTransport::new(&[Step::Body("never")]);
        let rate = Arc::new(RateController::new(Duration::from_secs(3600)).unwrap());
        // Use up the only slot of the next hour
        rate.acquire().await;
        let fetcher = Fetcher::new(transport.clone(), rate, RetryPolicy::new(3).unwrap());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = fetcher
            .fetch(&query("https://web.archive.org/cdx/search/cdx"), &cancel)
            .await;

        assert!(matches!(result, Err(ErrorKind::Cancelled)));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_retries_against_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("20200101000000 http://a.com/x\n"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new("waybackurls-test", None).unwrap();
        let rate = RateController::new(Duration::from_millis(10)).unwrap();
        let policy = RetryPolicy::new(3)
            .unwrap()
            .with_base_delay(Duration::from_millis(100));
        let fetcher = Fetcher::new(Arc::new(transport), Arc::new(rate), policy);

        let start = std::time::Instant::now();
        let body = fetcher
            .fetch(&query(&mock_server.uri()), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(body, "20200101000000 http://a.com/x\n");
        // 100ms after the first failure, 400ms after the second
        assert!(start.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test]
    async fn test_client_error_against_server() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = ReqwestTransport::new("waybackurls-test", None).unwrap();
        let fetcher = fetcher(Arc::new(transport), 10);
        let result = fetcher
            .fetch(&query(&mock_server.uri()), &CancellationToken::new())
            .await;

        assert!(matches!(
            result,
            Err(ErrorKind::RejectedStatusCode(StatusCode::FORBIDDEN))
        ));
    }
}
