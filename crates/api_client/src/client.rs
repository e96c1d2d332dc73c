use std::sync::Arc;
use std::time::Duration;

use app_core::{AccessToken, Config};
use log::{error, info, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};
use storage_manager::{
    FileStorage, KeyValueStorage, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, SESSION_KEYS,
};
use tokio::time::sleep;

use crate::endpoints::{LOGIN_ENDPOINT, REFRESH_ENDPOINT};
use crate::error::{ApiError, Result};

/// Caller-supplied options for a single logical request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: Method::POST,
            body: Some(body),
            headers: HeaderMap::new(),
        }
    }

    pub fn post_empty() -> Self {
        Self {
            method: Method::POST,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn put(body: Value) -> Self {
        Self {
            method: Method::PUT,
            body: Some(body),
            headers: HeaderMap::new(),
        }
    }

    pub fn delete() -> Self {
        Self {
            method: Method::DELETE,
            body: None,
            headers: HeaderMap::new(),
        }
    }

    /// Add a header, overriding any default the client would attach
    /// (including the authorization header).
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// Outcome of a single network attempt, before retry policy is applied.
enum Attempt {
    Success(Value),
    Unauthorized { message: String },
    Failed { status: u16, message: String },
}

/// HTTP client for the backend REST API.
///
/// One logical `request` may issue several network attempts: transient
/// failures are retried with exponential backoff, and a 401 triggers one
/// token-refresh cycle followed by one re-issue of the original call.
pub struct ApiClient {
    http: Client,
    storage: Arc<dyn KeyValueStorage>,
    api_base: String,
    request_timeout: Duration,
    max_attempts: u32,
    backoff_base: Duration,
}

impl ApiClient {
    pub fn new(config: &Config, storage: Arc<dyn KeyValueStorage>) -> Result<Self> {
        let http = Client::builder()
            .default_headers(Self::default_headers())
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(ApiClient {
            http,
            storage,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        })
    }

    /// Convenience constructor: a client backed by file storage under
    /// `config.data_dir`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = Arc::new(FileStorage::new(&config.data_dir));
        Self::new(config, storage)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    /// Perform one logical request against `endpoint` (e.g. `/profile/`).
    ///
    /// Transient network failures are retried up to the attempt cap with
    /// delays of `2^attempt * backoff_base` between attempts. A 401 on a
    /// non-auth endpoint triggers exactly one refresh cycle and one retry;
    /// a second 401, or a failed refresh, ends the session.
    pub async fn request(&self, endpoint: &str, options: RequestOptions) -> Result<Value> {
        let mut attempt: u32 = 0;
        let mut refreshed = false;

        loop {
            match self.execute(endpoint, &options).await {
                Ok(Attempt::Success(value)) => return Ok(value),
                Ok(Attempt::Unauthorized { message }) => {
                    if is_auth_endpoint(endpoint) {
                        return Err(ApiError::Server {
                            status: 401,
                            message,
                        });
                    }
                    if refreshed {
                        // The refreshed token was rejected too. Credentials
                        // are unusable from the app's perspective.
                        self.clear_session().await;
                        return Err(ApiError::SessionExpired);
                    }
                    info!("Got 401 on {endpoint}, attempting token refresh");
                    // Boxed: refresh issues its own request, so the futures
                    // would otherwise be mutually recursive.
                    if let Err(e) = Box::pin(self.refresh()).await {
                        error!("Token refresh failed: {e}");
                        return Err(ApiError::SessionExpired);
                    }
                    refreshed = true;
                }
                Ok(Attempt::Failed { status, message }) => {
                    return Err(ApiError::Server { status, message })
                }
                Err(e) => {
                    attempt += 1;
                    if !e.is_retryable() || attempt >= self.max_attempts {
                        return Err(e);
                    }
                    let delay = self.backoff_base * 2u32.saturating_pow(attempt);
                    warn!(
                        "Request to {endpoint} failed (attempt {attempt}): {e}, retrying in {delay:?}"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// One network attempt: build headers, send, classify the response.
    async fn execute(&self, endpoint: &str, options: &RequestOptions) -> Result<Attempt> {
        let url = format!("{}{}", self.api_base, endpoint);

        let mut headers = HeaderMap::new();
        if let Some(token) = self.storage.get(ACCESS_TOKEN_KEY).await? {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => {
                    warn!(
                        "Stored access token is not a valid header value, \
                         sending request unauthenticated"
                    );
                }
            }
        }
        // Caller headers win, authorization included.
        headers.extend(options.headers.clone());

        let mut builder = self
            .http
            .request(options.method.clone(), &url)
            .headers(headers)
            .timeout(self.request_timeout);
        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ApiError::Network(format!("request to {endpoint} timed out"))
            } else {
                ApiError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        if status.is_success() {
            // 204-style empty bodies are fine; garbage is not.
            if bytes.is_empty() {
                return Ok(Attempt::Success(Value::Null));
            }
            return match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Ok(Attempt::Success(value)),
                Err(e) => {
                    error!("Unparseable 2xx body from {endpoint}: {e}");
                    Err(ApiError::InvalidServerResponse)
                }
            };
        }

        let body = serde_json::from_slice::<Value>(&bytes).ok();
        let message = extract_error_message(status, body.as_ref());

        if status == StatusCode::UNAUTHORIZED {
            Ok(Attempt::Unauthorized { message })
        } else {
            Ok(Attempt::Failed {
                status: status.as_u16(),
                message,
            })
        }
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// On any failure the whole session is cleared locally before the error
    /// propagates, so a stale access token never outlives a failed refresh.
    pub async fn refresh(&self) -> Result<()> {
        let result = self.refresh_inner().await;
        if result.is_err() {
            self.clear_session().await;
        }
        result
    }

    async fn refresh_inner(&self) -> Result<()> {
        let refresh_token = self
            .storage
            .get(REFRESH_TOKEN_KEY)
            .await?
            .ok_or(ApiError::NoRefreshToken)?;

        let value = self
            .request(
                REFRESH_ENDPOINT,
                RequestOptions::post(json!({ "refresh": refresh_token })),
            )
            .await?;

        let token: AccessToken =
            serde_json::from_value(value).map_err(|_| ApiError::InvalidServerResponse)?;
        self.storage.set(ACCESS_TOKEN_KEY, &token.access).await?;
        info!("Access token refreshed");
        Ok(())
    }

    /// Remove every stored credential and the cached profile. Failures are
    /// logged, not surfaced: local logout must always make progress.
    pub async fn clear_session(&self) {
        if let Err(e) = self.storage.remove(&SESSION_KEYS).await {
            error!("Failed to clear session storage: {e}");
        }
    }
}

fn is_auth_endpoint(endpoint: &str) -> bool {
    endpoint == LOGIN_ENDPOINT || endpoint == REFRESH_ENDPOINT
}

/// Pull a human-readable failure reason out of an error body, in the order
/// the backend populates them, falling back to the HTTP status.
fn extract_error_message(status: StatusCode, body: Option<&Value>) -> String {
    body.and_then(|value| {
        ["message", "error", "detail"]
            .iter()
            .find_map(|key| value.get(key).and_then(Value::as_str))
            .map(str::to_string)
    })
    .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()))
}
