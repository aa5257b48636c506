//! `test-utils` is used for testing in both `waybackurls-lib` and `waybackurls-bin`.
//! This crate does not depend on either of them, else we would get dependency cycles.
//! Macros are used instead, so that the importer is responsible for providing the
//! dependencies (`wiremock` and `http`).

/// Path under which the mocked CDX index is served.
pub const CDX_PATH: &str = "/cdx/search/cdx";

/// Create a mock web server, which responds with a predefined status to every
/// `GET` request. Additional `ResponseTemplate` methods can be chained, e.g.
/// `mock_server!(503, insert_header("Retry-After", "2"))`.
#[macro_export]
macro_rules! mock_server {
    ($status:expr $(, $func:tt ($($arg:expr),*))*) => {{
        let mock_server = wiremock::MockServer::start().await;
        let response_template = wiremock::ResponseTemplate::new(http::StatusCode::from_u16($status).unwrap());
        let template = response_template$(.$func($($arg),*))*;
        wiremock::Mock::given(wiremock::matchers::method("GET")).respond_with(template).mount(&mock_server).await;
        mock_server
    }};
}

/// Create a mock CDX index which answers every query below [`CDX_PATH`]
/// with `200 OK` and the given plain-text body.
#[macro_export]
macro_rules! mock_cdx_server {
    ($body:expr) => {{
        let mock_server = wiremock::MockServer::start().await;
        let template = wiremock::ResponseTemplate::new(200).set_body_string($body);
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path($crate::CDX_PATH))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        mock_server
    }};
}

/// The CDX endpoint URL of a mock server started with one of the macros above.
#[macro_export]
macro_rules! cdx_endpoint {
    ($server:expr) => {
        format!("{}{}", $server.uri(), $crate::CDX_PATH)
    };
}
