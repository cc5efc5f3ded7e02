//! # API Client
//!
//! Authenticated JSON requests against the GPS API.
//!
//! Every request:
//! - carries `Authorization: <scheme> <token>` when the session holds a token
//! - is bounded by a timeout and never hangs
//! - on 401 while embedded, asks the parent for a new token and retries,
//!   at most [`MAX_REFRESH_RETRIES`] times per logical call
//!
//! ```text
//! request ──► send ──► 2xx ──► decode ──► Ok
//!               │
//!               ├──► 401 + embedded + attempts left ──► GPS_TOKEN_REFRESH
//!               │         ▲                                  │
//!               │         └──── new token within wait ◄──────┘
//!               │
//!               └──► other status / timeout ──► Err
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use shared::protocol::build_token_refresh;
use uuid::Uuid;

use super::transport::{HttpRequest, HttpResponse, Method};
use crate::core::error::{ApiError, ChannelError, RefreshError};
use crate::core::service::HttpTransport;
use crate::embed::channel::ParentChannel;
use crate::session::{AppMode, Session};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(12);
pub const DEFAULT_REFRESH_WAIT: Duration = Duration::from_secs(10);
pub const MAX_REFRESH_RETRIES: u32 = 2;
pub const DEFAULT_AUTH_SCHEME: &str = "Orion";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub auth_scheme: String,
    /// How long to wait for the parent to deliver a new token.
    pub refresh_wait: Duration,
    pub max_refresh_retries: u32,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            refresh_wait: DEFAULT_REFRESH_WAIT,
            max_refresh_retries: MAX_REFRESH_RETRIES,
        }
    }
}

/// One logical request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl RequestConfig {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            body: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Decoded 2xx response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: u16,
    pub status_text: String,
}

pub struct ApiClient {
    transport: Arc<dyn HttpTransport>,
    session: Arc<Session>,
    parent: Option<Arc<dyn ParentChannel>>,
    options: ClientOptions,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn HttpTransport>, session: Arc<Session>, options: ClientOptions) -> Self {
        Self {
            transport,
            session,
            parent: None,
            options,
        }
    }

    /// Attach the parent link used for token refreshes.
    pub fn with_parent(mut self, parent: Arc<dyn ParentChannel>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Embedded means production mode with a parent to ask for tokens.
    pub fn is_embedded(&self) -> bool {
        self.session.mode() == AppMode::Production
            && self.parent.as_ref().is_some_and(|parent| parent.is_attached())
    }

    pub async fn request<T: DeserializeOwned>(&self, config: &RequestConfig) -> Result<ApiResponse<T>, ApiError> {
        self.request_from_attempt(config, 0).await
    }

    /// Like [`request`](Self::request) but counting refreshes from `attempt`.
    /// With `attempt >= max_refresh_retries` a 401 is returned as is.
    #[tracing::instrument(
        skip(self, config),
        fields(request_id = %Uuid::new_v4(), method = config.method.as_str(), url = %config.url)
    )]
    pub async fn request_from_attempt<T: DeserializeOwned>(
        &self,
        config: &RequestConfig,
        mut attempt: u32,
    ) -> Result<ApiResponse<T>, ApiError> {
        loop {
            let token = self.session.token();
            let response = self.send_once(config, &token).await?;

            if response.status == 401 {
                let embedded = self.is_embedded();
                if embedded && attempt < self.options.max_refresh_retries {
                    tracing::warn!(attempt, "Unauthorized, requesting token refresh from parent");
                    self.refresh_token(&token).await.map_err(|e| {
                        tracing::error!(error = %e, "Token refresh failed");
                        ApiError::RefreshFailed(e)
                    })?;
                    attempt += 1;
                    continue;
                }
                tracing::warn!(attempt, embedded, "Unauthorized");
                return Err(ApiError::Unauthorized { body: response.body });
            }

            if !response.is_success() {
                tracing::warn!(status = response.status, "Request failed");
                return Err(ApiError::Http {
                    status: response.status,
                    status_text: response.status_text,
                    body: response.body,
                });
            }

            let data = serde_json::from_str::<T>(&response.body).map_err(|e| {
                tracing::error!(error = %e, "Response parse error");
                ApiError::Decode(e.to_string())
            })?;

            return Ok(ApiResponse {
                data,
                status: response.status,
                status_text: response.status_text,
            });
        }
    }

    /// Ask the parent for a new token and wait for one that differs from
    /// `previous`.
    pub async fn refresh_token(&self, previous: &str) -> Result<String, RefreshError> {
        let parent = self
            .parent
            .as_ref()
            .ok_or(RefreshError::Post(ChannelError::Detached))?;
        parent.post(&build_token_refresh()).map_err(RefreshError::Post)?;

        let token = self
            .session
            .wait_for_new_token(previous, self.options.refresh_wait)
            .await?;
        tracing::info!("Token refreshed by parent");
        Ok(token)
    }

    async fn send_once(&self, config: &RequestConfig, token: &str) -> Result<HttpResponse, ApiError> {
        let mut headers = vec![("Accept".to_string(), "*/*".to_string())];
        headers.extend(config.headers.iter().cloned());
        if !token.is_empty() {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case("authorization"));
            headers.push((
                "Authorization".to_string(),
                format!("{} {}", self.options.auth_scheme, token),
            ));
        }

        let request = HttpRequest {
            method: config.method,
            url: config.url.clone(),
            headers,
            body: config.body.clone(),
        };

        let start = Instant::now();
        let outcome = tokio::time::timeout(config.timeout, self.transport.send(request)).await;
        let duration_ms = start.elapsed().as_millis();

        match outcome {
            Err(_) => {
                tracing::warn!(timeout_ms = config.timeout.as_millis(), "Request timed out");
                Err(ApiError::Timeout(config.timeout))
            }
            Ok(Err(e)) => Err(e),
            Ok(Ok(response)) => {
                tracing::debug!(
                    status = response.status,
                    duration_ms,
                    has_token = !token.is_empty(),
                    "Response received"
                );
                Ok(response)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{respond, RecordingChannel, Scripted, ScriptedTransport};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const URL: &str = "https://api.test/v1/groups";

    struct Fixture {
        client: ApiClient,
        transport: Arc<ScriptedTransport>,
        parent: Arc<RecordingChannel>,
        session: Arc<Session>,
    }

    fn fixture(mode: AppMode, token: &str) -> Fixture {
        let transport = ScriptedTransport::new();
        let parent = RecordingChannel::new();
        let session = Arc::new(Session::new(mode));
        session.set_token(token);
        let client = ApiClient::new(transport.clone(), session.clone(), ClientOptions::default())
            .with_parent(parent.clone());
        Fixture {
            client,
            transport,
            parent,
            session,
        }
    }

    /// Parent answers every refresh request with a fresh token.
    fn answer_refreshes(f: &Fixture) -> Arc<AtomicUsize> {
        let counter = Arc::new(AtomicUsize::new(0));
        let session = f.session.clone();
        let seen = counter.clone();
        f.parent.on_post(move |message| {
            if message["type"] == "GPS_TOKEN_REFRESH" {
                let n = seen.fetch_add(1, Ordering::SeqCst) + 1;
                session.set_token(format!("fresh-{n}"));
            }
        });
        counter
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_sends_auth_header() {
        // Arrange
        let f = fixture(AppMode::Dev, "t1");
        f.transport.push("/groups", respond(200, r#"[{"code":"G1","name":"Fleet"}]"#));

        // Act
        let response = f.client.request::<Value>(&RequestConfig::get(URL)).await.expect("ok");

        // Assert
        assert_eq!(response.status, 200);
        assert_eq!(response.data, json!([{ "code": "G1", "name": "Fleet" }]));
        let sent = &f.transport.requests()[0];
        assert_eq!(sent.header("Authorization"), Some("Orion t1"));
        assert_eq!(sent.header("Accept"), Some("*/*"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_token_no_auth_header() {
        let f = fixture(AppMode::Dev, "");
        f.transport.push("/groups", respond(200, "[]"));

        f.client.request::<Value>(&RequestConfig::get(URL)).await.expect("ok");

        assert_eq!(f.transport.requests()[0].header("Authorization"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_outside_production_is_not_retried() {
        let f = fixture(AppMode::Dev, "t1");
        f.transport.push("/groups", respond(401, "expired"));

        let err = f.client.request::<Value>(&RequestConfig::get(URL)).await.unwrap_err();

        assert!(matches!(err, ApiError::Unauthorized { ref body } if body == "expired"));
        assert_eq!(f.transport.request_count(), 1);
        assert!(f.parent.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_then_retry_with_new_token() {
        // Arrange
        let f = fixture(AppMode::Production, "t1");
        answer_refreshes(&f);
        f.transport.push("/groups", respond(401, ""));
        f.transport.push("/groups", respond(200, "[]"));

        // Act
        let response = f.client.request::<Value>(&RequestConfig::get(URL)).await.expect("retried");

        // Assert
        assert_eq!(response.data, json!([]));
        let requests = f.transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].header("Authorization"), Some("Orion fresh-1"));
        assert_eq!(f.parent.count("GPS_TOKEN_REFRESH"), 1);
        assert_eq!(f.parent.messages()[0]["payload"]["reason"], "401_unauthorized");
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_unauthorized_is_final() {
        // Arrange
        let f = fixture(AppMode::Production, "t1");
        let refreshes = answer_refreshes(&f);
        for _ in 0..3 {
            f.transport.push("/groups", respond(401, "nope"));
        }
        f.transport.push("/groups", respond(200, "[]"));

        // Act
        let err = f.client.request::<Value>(&RequestConfig::get(URL)).await.unwrap_err();

        // Assert
        assert!(err.is_unauthorized());
        assert_eq!(f.transport.request_count(), 3);
        assert_eq!(refreshes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_times_out_without_parent_answer() {
        let f = fixture(AppMode::Production, "t1");
        f.transport.push("/groups", respond(401, ""));

        let err = f.client.request::<Value>(&RequestConfig::get(URL)).await.unwrap_err();

        assert!(matches!(
            err,
            ApiError::RefreshFailed(RefreshError::Timeout(wait)) if wait == DEFAULT_REFRESH_WAIT
        ));
        assert_eq!(f.transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_token_from_parent_is_not_a_refresh() {
        let f = fixture(AppMode::Production, "t1");
        let session = f.session.clone();
        f.parent.on_post(move |_| {
            session.set_token("t1");
        });
        f.transport.push("/groups", respond(401, ""));

        let err = f.client.request::<Value>(&RequestConfig::get(URL)).await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed(RefreshError::Timeout(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_post_failure_is_reported() {
        let f = fixture(AppMode::Production, "t1");
        f.parent.fail_posts(true);
        f.transport.push("/groups", respond(401, ""));

        let err = f.client.request::<Value>(&RequestConfig::get(URL)).await.unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed(RefreshError::Post(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_starting_at_retry_limit_skips_refresh() {
        let f = fixture(AppMode::Production, "t1");
        answer_refreshes(&f);
        f.transport.push("/groups", respond(401, ""));

        let err = f
            .client
            .request_from_attempt::<Value>(&RequestConfig::get(URL), MAX_REFRESH_RETRIES)
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
        assert_eq!(f.parent.count("GPS_TOKEN_REFRESH"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_request_times_out() {
        let f = fixture(AppMode::Dev, "t1");
        f.transport.push("/groups", Scripted::Hang);

        let err = f
            .client
            .request::<Value>(&RequestConfig::get(URL))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Timeout(limit) if limit == DEFAULT_REQUEST_TIMEOUT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_timeout_is_honoured() {
        let f = fixture(AppMode::Dev, "t1");
        f.transport.push("/groups", Scripted::Hang);
        let started = tokio::time::Instant::now();

        let err = f
            .client
            .request::<Value>(&RequestConfig::get(URL).timeout(Duration::from_secs(3)))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < DEFAULT_REQUEST_TIMEOUT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_http_error_carries_status_and_body() {
        let f = fixture(AppMode::Dev, "t1");
        f.transport.push("/groups", respond(500, "boom"));

        let err = f.client.request::<Value>(&RequestConfig::get(URL)).await.unwrap_err();

        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error - boom");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_json_is_decode_error() {
        let f = fixture(AppMode::Dev, "t1");
        f.transport.push("/groups", respond(200, "<html>"));

        let err = f.client.request::<Value>(&RequestConfig::get(URL)).await.unwrap_err();

        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_propagates() {
        let f = fixture(AppMode::Dev, "t1");
        f.transport.push("/groups", Scripted::Fail("connection refused".to_string()));

        let err = f.client.request::<Value>(&RequestConfig::get(URL)).await.unwrap_err();

        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[tokio::test(start_paused = true)]
    async fn test_production_without_parent_does_not_refresh() {
        let transport = ScriptedTransport::new();
        transport.push("/groups", respond(401, ""));
        let session = Arc::new(Session::new(AppMode::Production));
        session.set_token("t1");
        let client = ApiClient::new(transport.clone(), session, ClientOptions::default());

        let err = client.request::<Value>(&RequestConfig::get(URL)).await.unwrap_err();

        assert!(!client.is_embedded());
        assert!(err.is_unauthorized());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_caller_authorization_header_is_replaced() {
        let f = fixture(AppMode::Dev, "t1");
        f.transport.push("/groups", respond(200, "[]"));

        f.client
            .request::<Value>(&RequestConfig::get(URL).header("authorization", "Bearer other"))
            .await
            .expect("ok");

        let sent = &f.transport.requests()[0];
        let auth: Vec<_> = sent
            .headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("authorization"))
            .collect();
        assert_eq!(auth.len(), 1);
        assert_eq!(sent.header("authorization"), Some("Orion t1"));
    }
}
