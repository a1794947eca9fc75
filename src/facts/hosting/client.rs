use crate::Result;
use anyhow::{Context, bail};
use core::time::Duration;
use serde::de::DeserializeOwned;
use url::Url;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The one HTTP capability the provider needs: a GET with query parameters and a per-request timeout.
pub trait HttpClient {
    fn get(&self, url: &Url, query: &[(&str, &str)], timeout: Duration) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// A fully-buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Attach a header; names are matched case-insensitively.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether GitHub refused the request because the rate limit is exhausted.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429 || (self.status == 403 && self.header("x-ratelimit-remaining").is_some_and(|v| v.trim() == "0"))
    }

    /// Fail with a descriptive error unless the status is 2xx.
    pub fn error_for_status(self, what: &str) -> Result<Self> {
        if !self.is_success() {
            bail!("{what} returned HTTP status {}", self.status);
        }
        Ok(self)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).context("decoding JSON response body")
    }
}

/// [`HttpClient`] backed by a `reqwest` connection pool.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("building the HTTP client")?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &Url, query: &[(&str, &str)], timeout: Duration) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url.clone())
            .query(query)
            .timeout(timeout)
            .send()
            .await
            .with_context(|| format!("sending request to '{url}'"))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = response.text().await.with_context(|| format!("reading response body from '{url}'"))?;

        Ok(HttpResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_success_range() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(204, "").is_success());
        assert!(!HttpResponse::new(301, "").is_success());
        assert!(!HttpResponse::new(404, "").is_success());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let response = HttpResponse::new(200, "").with_header("X-RateLimit-Remaining", "12");
        assert_eq!(response.header("x-ratelimit-remaining"), Some("12"));
        assert_eq!(response.header("retry-after"), None);
    }

    #[test]
    fn test_rate_limit_detection() {
        assert!(HttpResponse::new(429, "").is_rate_limited());
        assert!(HttpResponse::new(403, "").with_header("x-ratelimit-remaining", "0").is_rate_limited());
        assert!(!HttpResponse::new(403, "").is_rate_limited());
        assert!(!HttpResponse::new(403, "").with_header("x-ratelimit-remaining", "5").is_rate_limited());
    }

    #[test]
    fn test_error_for_status() {
        let _ = HttpResponse::new(200, "ok").error_for_status("profile").unwrap();
        let err = HttpResponse::new(503, "").error_for_status("profile").unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("profile"));
    }

    #[test]
    fn test_json_decoding() {
        let value: serde_json::Value = HttpResponse::new(200, r#"{"followers": 3}"#).json().unwrap();
        assert_eq!(value["followers"], 3);
        assert!(HttpResponse::new(200, "<svg/>").json::<serde_json::Value>().is_err());
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot open sockets")]
    async fn test_reqwest_client_sends_query_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .and(query_param("page", "2"))
            .and(query_param("per_page", "100"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]").insert_header("x-ratelimit-remaining", "42"))
            .mount(&server)
            .await;

        let client = ReqwestClient::new().unwrap();
        let url = Url::parse(&format!("{}/users/octo/repos", server.uri())).unwrap();
        let response = client
            .get(&url, &[("page", "2"), ("per_page", "100")], Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(response.body(), "[]");
        assert_eq!(response.header("X-RateLimit-Remaining"), Some("42"));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot open sockets")]
    async fn test_reqwest_client_reports_error_status_without_failing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
            .mount(&server)
            .await;

        let client = ReqwestClient::new().unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let response = client.get(&url, &[], Duration::from_secs(5)).await.unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(response.body(), "missing");
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot open sockets")]
    async fn test_reqwest_client_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let client = ReqwestClient::new().unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let result = client.get(&url, &[], Duration::from_millis(100)).await;
        assert!(result.is_err());
    }
}
