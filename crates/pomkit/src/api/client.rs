//! Thin HTTP client over a fixed base URL.
//!
//! One request per call, no retries, no caching, and no timeout policy of
//! its own (whatever the underlying `reqwest::Client` enforces applies).
//! Non-success statuses are returned as responses, not errors; callers
//! decide what a status means.

use crate::result::{PomError, PomResult};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;

/// Query parameters and headers for one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Query parameters, appended in order
    pub params: Vec<(String, String)>,
    /// Headers; these override the client's defaults
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    /// Empty options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    method: Method,
    url: String,
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl ApiResponse {
    /// Status code
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether the status is 2xx
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Final request URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Response headers
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body
    #[must_use]
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Body parsed as JSON
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the body is not JSON.
    pub fn json(&self) -> PomResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Turn a non-success status into [`PomError::HttpStatus`].
    ///
    /// # Errors
    ///
    /// Returns the status error when the status is not 2xx.
    pub fn error_for_status(self) -> PomResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let mut body = self.body;
        if body.len() > 512 {
            let mut cut = 512;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(PomError::HttpStatus {
            method: self.method.to_string(),
            url: self.url,
            status: self.status.as_u16(),
            body,
        })
    }
}

/// HTTP client bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a client with a custom reqwest client (for custom timeouts, etc.).
    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full URL for an endpoint (plain concatenation).
    #[must_use]
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }

    /// GET `endpoint`
    ///
    /// # Errors
    ///
    /// Transport failures only.
    pub async fn get(&self, endpoint: &str, options: RequestOptions) -> PomResult<ApiResponse> {
        self.send(Method::GET, endpoint, None, options).await
    }

    /// POST a JSON body
    ///
    /// # Errors
    ///
    /// Transport failures and unserializable bodies.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> PomResult<ApiResponse> {
        let body = serde_json::to_vec(body)?;
        self.send(Method::POST, endpoint, Some(body), options).await
    }

    /// PUT a JSON body
    ///
    /// # Errors
    ///
    /// Transport failures and unserializable bodies.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> PomResult<ApiResponse> {
        let body = serde_json::to_vec(body)?;
        self.send(Method::PUT, endpoint, Some(body), options).await
    }

    /// PATCH a JSON body
    ///
    /// # Errors
    ///
    /// Transport failures and unserializable bodies.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
        options: RequestOptions,
    ) -> PomResult<ApiResponse> {
        let body = serde_json::to_vec(body)?;
        self.send(Method::PATCH, endpoint, Some(body), options)
            .await
    }

    /// DELETE `endpoint`
    ///
    /// # Errors
    ///
    /// Transport failures only.
    pub async fn delete(&self, endpoint: &str, options: RequestOptions) -> PomResult<ApiResponse> {
        self.send(Method::DELETE, endpoint, None, options).await
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> PomResult<ApiResponse> {
        let url = self.url_for(endpoint);
        let transport = |message: String| PomError::Http {
            method: method.to_string(),
            url: url.clone(),
            message,
        };

        let mut headers = HeaderMap::new();
        if body.is_some() {
            let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| transport(format!("header name '{name}': {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| transport(format!("header value for '{name}': {e}")))?;
            let _ = headers.insert(name, value);
        }

        let mut request = self
            .client
            .request(method.clone(), &url)
            .headers(headers);
        if !options.params.is_empty() {
            request = request.query(&options.params);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| transport(e.to_string()))?;
        let status = response.status();
        let final_url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.text().await?;

        tracing::debug!(method = %method, url = %final_url, status = status.as_u16(), "http");
        Ok(ApiResponse {
            method,
            url: final_url,
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("https://jsonplaceholder.typicode.com/");
        assert_eq!(client.base_url(), "https://jsonplaceholder.typicode.com");
        assert_eq!(
            client.url_for("/posts/1"),
            "https://jsonplaceholder.typicode.com/posts/1"
        );
    }

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::new()
            .param("userId", 1)
            .header("X-Trace", "abc");
        assert_eq!(options.params, vec![("userId".to_string(), "1".to_string())]);
        assert_eq!(
            options.headers,
            vec![("X-Trace".to_string(), "abc".to_string())]
        );
    }

    #[test]
    fn test_error_for_status_truncates_body() {
        let response = ApiResponse {
            method: Method::GET,
            url: "http://localhost/posts/9".to_string(),
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: "é".repeat(400),
        };
        let err = response.error_for_status().unwrap_err();
        match err {
            PomError::HttpStatus { status, body, .. } => {
                assert_eq!(status, 404);
                assert!(body.len() <= 512);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_json_body() {
        let response = ApiResponse {
            method: Method::GET,
            url: "http://localhost/posts".to_string(),
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: "[]".to_string(),
        };
        assert_eq!(response.json().unwrap(), serde_json::json!([]));
        assert!(response.error_for_status().is_ok());
    }
}
