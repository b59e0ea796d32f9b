use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::traits::TokenSource;

const CSRF_COOKIE: &str = "csrftoken";

/// Cookie-backed token source.
///
/// Lookup order: the `csrftoken` session cookie, then the token cached from
/// a previous issue call, then one GET to the issuing endpoint. Every path
/// fails soft to an empty token so the caller's mutating request stays the
/// single loud failure point.
pub struct CookieCsrfSource {
    jar: Arc<Jar>,
    http: Client,
    api_base_url: String,
    cached: Mutex<Option<String>>,
}

impl CookieCsrfSource {
    pub fn new(jar: Arc<Jar>, http: Client, api_base_url: impl Into<String>) -> Self {
        Self {
            jar,
            http,
            api_base_url: api_base_url.into(),
            cached: Mutex::new(None),
        }
    }

    /// Token from the cookie jar, if the server has set one for the API
    /// origin. The jar only exposes cookies as a request header value, so
    /// parse the pair back out of it.
    fn cookie_token(&self) -> Option<String> {
        let url = self.api_base_url.parse().ok()?;
        let header = self.jar.cookies(&url)?;
        let header = header.to_str().ok()?;
        let prefix = format!("{CSRF_COOKIE}=");
        header
            .split("; ")
            .find_map(|pair| pair.strip_prefix(prefix.as_str()))
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
    }

    /// One dedicated GET to the issuing endpoint. The body spells the token
    /// either `csrfToken` or `csrf_token` depending on the backend build.
    async fn issue(&self) -> Option<String> {
        let url = format!("{}/auth/csrf/", self.api_base_url);
        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Failed to reach CSRF endpoint: {}", e);
                return None;
            }
        };
        if !response.status().is_success() {
            warn!("CSRF endpoint returned status: {}", response.status());
            return None;
        }
        let body: Value = response.json().await.ok()?;
        body.get("csrfToken")
            .or_else(|| body.get("csrf_token"))
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_owned)
    }
}

#[async_trait]
impl TokenSource for CookieCsrfSource {
    async fn csrf_token(&self) -> String {
        if let Some(token) = self.cookie_token() {
            return token;
        }
        if let Some(token) = self.cached.lock().ok().and_then(|guard| guard.clone()) {
            return token;
        }
        match self.issue().await {
            Some(token) => {
                debug!("Issued fresh CSRF token");
                if let Ok(mut guard) = self.cached.lock() {
                    *guard = Some(token.clone());
                }
                token
            }
            None => String::new(),
        }
    }

    fn invalidate(&self) {
        if let Ok(mut guard) = self.cached.lock() {
            *guard = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "http://localhost:8000/api";

    #[test]
    fn cookie_token_wins_without_a_network_call() {
        let jar = Arc::new(Jar::default());
        let url: reqwest::Url = BASE.parse().unwrap();
        jar.add_cookie_str("csrftoken=cookie-tok", &url);

        let source = CookieCsrfSource::new(jar, Client::new(), BASE);
        let token = tokio_test::block_on(source.csrf_token());
        assert_eq!(token, "cookie-tok");
    }

    #[test]
    fn other_cookies_do_not_shadow_the_token() {
        let jar = Arc::new(Jar::default());
        let url: reqwest::Url = BASE.parse().unwrap();
        jar.add_cookie_str("sessionid=abc123", &url);
        jar.add_cookie_str("csrftoken=the-one", &url);

        let source = CookieCsrfSource::new(jar, Client::new(), BASE);
        assert_eq!(source.cookie_token().as_deref(), Some("the-one"));
    }

    #[test]
    fn invalidate_drops_the_cached_token() {
        let source = CookieCsrfSource::new(Arc::new(Jar::default()), Client::new(), BASE);
        if let Ok(mut guard) = source.cached.lock() {
            *guard = Some("stale".into());
        }
        source.invalidate();
        assert!(source.cached.lock().unwrap().is_none());
    }
}
