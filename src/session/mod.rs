//! Session ownership: the one place current-user state is mutated.
//!
//! The backend answers authentication calls with one of several envelope
//! shapes; [`normalize_user`] collapses them into the canonical [`User`]
//! and [`SessionManager`] replaces the session wholesale on every
//! successful call.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{User, UserRole};

/// Current authentication state.
#[derive(Debug, Clone, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(User),
}

/// Failure surfaced by the session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A second sign-in was attempted while one is outstanding.
    #[error("another sign-in attempt is already in progress")]
    LoginInFlight,

    /// The call succeeded but no recognized envelope carried a user.
    #[error("invalid response from server")]
    UnrecognizedResponse,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Username/password pair for sign-in.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Fields for account creation.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Defaults to `password` when not supplied separately.
    pub password_confirm: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub phone_number: String,
}

impl Registration {
    fn payload(&self) -> Value {
        json!({
            "username": self.username,
            "email": self.email,
            "password": self.password,
            "password_confirm": self.password_confirm.as_deref().unwrap_or(&self.password),
            "first_name": self.first_name,
            "last_name": self.last_name,
            "user_type": self.role,
            "phone_number": self.phone_number,
        })
    }
}

/// Collapse the known session envelopes into one canonical user.
///
/// Probe order is fixed: the wrapped `{"user": ...}` form is the most
/// specific and must win over the bare-object heuristic, otherwise any
/// payload that happens to carry an `id` would be mistaken for a user.
/// `None` means "no session", never an error.
pub fn normalize_user(raw: &Value) -> Option<User> {
    if let Some(user) = raw.get("user").filter(|u| u.is_object()) {
        return serde_json::from_value(user.clone()).ok();
    }
    if raw.is_object() && raw.get("id").is_some() {
        return serde_json::from_value(raw.clone()).ok();
    }
    if raw.get("success").and_then(Value::as_bool) == Some(true) {
        if let Some(user) = raw.get("user") {
            return serde_json::from_value(user.clone()).ok();
        }
    }
    None
}

/// Sole owner and mutator of the current session.
///
/// Everything else reads through [`current_user`](Self::current_user); no
/// other component writes this state.
pub struct SessionManager {
    client: Arc<ApiClient>,
    session: RwLock<Session>,
    login_in_flight: AtomicBool,
}

impl SessionManager {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            session: RwLock::new(Session::Anonymous),
            login_in_flight: AtomicBool::new(false),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        match self.session.read() {
            Ok(guard) => match &*guard {
                Session::Authenticated(user) => Some(user.clone()),
                Session::Anonymous => None,
            },
            Err(_) => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Sign in and replace the session wholesale.
    ///
    /// Guarded against concurrent invocation: a second call while one is
    /// outstanding gets [`SessionError::LoginInFlight`] without touching
    /// the network.
    pub async fn login(&self, credentials: &Credentials) -> Result<User, SessionError> {
        if self
            .login_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::LoginInFlight);
        }
        let result = self.login_inner(credentials).await;
        self.login_in_flight.store(false, Ordering::SeqCst);
        result
    }

    async fn login_inner(&self, credentials: &Credentials) -> Result<User, SessionError> {
        let payload = json!({
            "username": credentials.username,
            "password": credentials.password,
        });
        let raw = match self.client.post("/auth/login/", &payload).await {
            Ok(raw) => raw,
            Err(err) => {
                self.clear();
                return Err(err.into());
            }
        };
        self.adopt(&raw)
    }

    /// Create an account; a successful registration signs the user in.
    pub async fn register(&self, registration: &Registration) -> Result<User, SessionError> {
        let raw = match self.client.post("/auth/register/", &registration.payload()).await {
            Ok(raw) => raw,
            Err(err) => {
                self.clear();
                return Err(err.into());
            }
        };
        self.adopt(&raw)
    }

    /// Sign out. Local state is cleared first and stays cleared even when
    /// the remote invalidation fails; a phantom "still signed in" state is
    /// the worse failure mode.
    pub async fn logout(&self) -> Result<(), ApiError> {
        self.clear();
        match self.client.post_empty("/auth/logout/").await {
            Ok(_) => Ok(()),
            Err(err) => {
                warn!("Remote logout failed (local session already cleared): {}", err);
                Err(err)
            }
        }
    }

    /// Re-fetch the current user and replace the session. Transient
    /// failures are swallowed; the session just becomes anonymous.
    pub async fn refresh(&self) -> Option<User> {
        match self.client.get("/auth/me/").await {
            Ok(raw) => match normalize_user(&raw) {
                Some(user) => {
                    self.replace(user.clone());
                    Some(user)
                }
                None => {
                    self.clear();
                    None
                }
            },
            Err(err) => {
                debug!("Session refresh failed: {}", err);
                self.clear();
                None
            }
        }
    }

    /// Startup probe. Must never propagate an error into page load.
    pub async fn check_on_load(&self) {
        let _ = self.refresh().await;
    }

    fn adopt(&self, raw: &Value) -> Result<User, SessionError> {
        match normalize_user(raw) {
            Some(user) => {
                self.replace(user.clone());
                Ok(user)
            }
            None => {
                self.clear();
                Err(SessionError::UnrecognizedResponse)
            }
        }
    }

    fn replace(&self, user: User) {
        if let Ok(mut guard) = self.session.write() {
            *guard = Session::Authenticated(user);
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.session.write() {
            *guard = Session::Anonymous;
        }
    }
}
