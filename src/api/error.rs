use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Classified failure for any call that left this crate.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The call never reached the server, or the server is unreachable.
    #[error("network error: {0}")]
    Network(String),

    /// 401/403: the session is invalid and the local token was purged.
    #[error("{0}")]
    Authentication(String),

    /// 404: the endpoint is absent.
    #[error("{0}")]
    NotFound(String),

    /// 400: the server rejected the payload. Never retried; surfaced
    /// verbatim with the per-field messages when the body carried them.
    #[error("{message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    /// 5xx and anything else the taxonomy does not name.
    #[error("{0}")]
    Server(String),
}

impl ApiError {
    pub fn is_authentication(&self) -> bool {
        matches!(self, ApiError::Authentication(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation { .. })
    }
}

/// Pull a human-readable message out of a JSON error body.
///
/// Preference order matches what the backend actually emits: a `detail`
/// string, then `message`/`error`, then the field→messages map joined into
/// one line. `None` when the body offers nothing usable.
pub(crate) fn error_message(body: &Value) -> Option<String> {
    for key in ["detail", "message", "error"] {
        if let Some(text) = body.get(key).and_then(Value::as_str) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    let fields = field_errors(body);
    if fields.is_empty() {
        return None;
    }
    let joined = fields
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ");
    Some(joined)
}

/// Field→messages map from a DRF-style validation body. Non-object bodies
/// and reserved envelope keys yield an empty map.
pub(crate) fn field_errors(body: &Value) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    let Some(object) = body.as_object() else {
        return fields;
    };
    for (key, value) in object {
        if matches!(key.as_str(), "detail" | "message" | "error" | "success") {
            continue;
        }
        let messages = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
            _ => continue,
        };
        if !messages.is_empty() {
            fields.insert(key.clone(), messages);
        }
    }
    fields
}

/// Decode an already-classified success body into a typed value.
pub(crate) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Server(format!("unexpected response shape: {e}")))
}
