use async_trait::async_trait;

/// Source of the anti-forgery token mutating requests must present.
/// This allows swapping the cookie-backed source for a fixed one in tests.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Token for the next mutating request. Empty when none could be
    /// obtained; the request is sent anyway and the server's rejection
    /// surfaces through the normal error path.
    async fn csrf_token(&self) -> String;

    /// Drop any locally held token. Called after a 401/403 so a stale
    /// token is never retried.
    fn invalidate(&self);
}
