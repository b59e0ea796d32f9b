use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::client::ApiClient;
use crate::api::error::ApiError;

/// POST `payload` against an ordered list of candidate routes, stopping at
/// the first that accepts it.
///
/// Candidates are tried strictly in sequence, exactly once each, and
/// nothing is remembered across calls. A `Validation` rejection proves the
/// route exists and parsed the payload, so it stops the scan immediately
/// instead of risking a duplicate submission through a later candidate.
/// Every other failure falls through to the next route.
pub async fn post_first(
    client: &ApiClient,
    candidates: &[&str],
    payload: &Value,
) -> Result<Value, ApiError> {
    let mut attempts = Vec::with_capacity(candidates.len());

    for path in candidates {
        debug!("Trying endpoint: {}", path);
        match client.post(path, payload).await {
            Ok(value) => {
                info!("Success with endpoint: {}", path);
                return Ok(value);
            }
            Err(err) if err.is_validation() => {
                warn!("Endpoint {} rejected the payload: {}", path, err);
                return Err(err);
            }
            Err(err) => {
                warn!("Endpoint {} failed: {}", path, err);
                attempts.push(format!("{path}: {err}"));
            }
        }
    }

    Err(ApiError::NotFound(format!(
        "all {} candidate endpoints failed ({})",
        candidates.len(),
        attempts.join("; ")
    )))
}
