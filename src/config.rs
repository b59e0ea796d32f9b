use std::env;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_MEDIA_URL: &str = "http://localhost:8000";

/// Base URLs for the API and the host that serves uploaded media.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Versioned API root, no trailing slash (e.g. `https://example.com/api`).
    pub api_base_url: String,
    /// Origin media paths resolve against, no trailing slash.
    pub media_base_url: String,
}

impl ApiConfig {
    pub fn new(api_base_url: impl Into<String>, media_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: trim_trailing_slash(api_base_url.into()),
            media_base_url: trim_trailing_slash(media_base_url.into()),
        }
    }

    /// Read `PRISTINE_API_URL` / `PRISTINE_MEDIA_URL`, falling back to the
    /// local development backend.
    pub fn from_env() -> Self {
        Self::new(
            env::var("PRISTINE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            env::var("PRISTINE_MEDIA_URL").unwrap_or_else(|_| DEFAULT_MEDIA_URL.to_string()),
        )
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, DEFAULT_MEDIA_URL)
    }
}

fn trim_trailing_slash(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
