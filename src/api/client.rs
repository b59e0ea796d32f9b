use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::cookie::Jar;
use reqwest::multipart::Form;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::api::csrf::CookieCsrfSource;
use crate::api::error::{error_message, field_errors, ApiError};
use crate::api::traits::TokenSource;
use crate::config::ApiConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CSRF_HEADER: &str = "X-CSRFToken";

/// The single choke point for every call against the backend.
///
/// Owns the shared HTTP client (cookie jar, timeout), attaches the
/// anti-forgery token to mutating requests, classifies failures into
/// [`ApiError`] and decodes JSON bodies.
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
    tokens: Arc<dyn TokenSource>,
}

impl ApiClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("pristine-client/", env!("CARGO_PKG_VERSION")))
            .cookie_provider(jar.clone())
            .build()
            .context("Failed to create HTTP client")?;

        let tokens: Arc<dyn TokenSource> = Arc::new(CookieCsrfSource::new(
            jar,
            http.clone(),
            config.api_base_url.clone(),
        ));

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Replace the token source. Production code keeps the cookie-backed
    /// default; tests inject a fixed one.
    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Method::GET, path, &[], None, None).await
    }

    pub async fn get_query(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Value, ApiError> {
        self.execute(Method::GET, path, query, None, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.execute(Method::POST, path, &[], Some(body), None).await
    }

    /// POST with no body, for toggle-style endpoints.
    pub async fn post_empty(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Method::POST, path, &[], None, None).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Value, ApiError> {
        self.execute(Method::POST, path, &[], None, Some(form)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.execute(Method::PATCH, path, &[], Some(body), None).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.execute(Method::DELETE, path, &[], None, None).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        form: Option<Form>,
    ) -> Result<Value, ApiError> {
        let url = self.url_for(path);
        debug!("API request: {} {}", method, url);

        let mut request = self.http.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if is_mutating(&method) {
            let token = self.tokens.csrf_token().await;
            if !token.is_empty() {
                request = request.header(CSRF_HEADER, token);
            }
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(form) = form {
            request = request.multipart(form);
        }

        let response = request.send().await.map_err(|e| {
            warn!("API request failed for {}: {}", url, e);
            ApiError::Network(e.to_string())
        })?;

        self.classify(path, response).await
    }

    /// Map a raw response to a decoded body or a classified error.
    async fn classify(&self, path: &str, response: Response) -> Result<Value, ApiError> {
        let status = response.status();

        // Success with no body means success with no body.
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }

        if status.is_success() {
            let text = response
                .text()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;
            // Some 200s arrive with an empty or non-JSON body; a stand-in
            // keeps callers out of the error path for a successful call.
            return Ok(serde_json::from_str(&text)
                .unwrap_or_else(|_| json!({ "message": "Success" })));
        }

        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        let message = error_message(&body)
            .or_else(|| status.canonical_reason().map(str::to_owned))
            .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
        warn!("API request failed for {}: {} ({})", path, status, message);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                // Purge before surfacing so a stale token is never retried.
                self.tokens.invalidate();
                ApiError::Authentication(if error_message(&body).is_some() {
                    message
                } else {
                    "Authentication required. Please log in again.".to_string()
                })
            }
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST => ApiError::Validation {
                message,
                fields: field_errors(&body),
            },
            _ => ApiError::Server(message),
        })
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.config.api_base_url, path)
        } else {
            format!("{}/{}", self.config.api_base_url, path)
        }
    }
}

fn is_mutating(method: &Method) -> bool {
    !matches!(method.as_str(), "GET" | "HEAD")
}
