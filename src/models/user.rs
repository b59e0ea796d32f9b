use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role assigned by the backend.
///
/// Unknown wire values decode to `Buyer`, the backend's own default, so a
/// newly introduced role never breaks session decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum UserRole {
    Buyer,
    Seller,
    Agent,
    Admin,
    ManagementClient,
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "seller" => UserRole::Seller,
            "agent" => UserRole::Agent,
            "admin" => UserRole::Admin,
            "management_client" => UserRole::ManagementClient,
            _ => UserRole::Buyer,
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        UserRole::Buyer
    }
}

/// Buyer preferences and contact details nested under the account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub email_notifications: bool,
    #[serde(default)]
    pub sms_notifications: bool,
    #[serde(default)]
    pub preferred_locations: Vec<String>,
    pub price_range_min: Option<f64>,
    pub price_range_max: Option<f64>,
    #[serde(default)]
    pub preferred_property_types: Vec<String>,
}

/// Canonical account record every recognized session envelope decodes into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(rename = "user_type", default)]
    pub role: UserRole,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub is_verified: bool,
    pub profile_image: Option<String>,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub license_number: String,
    #[serde(default)]
    pub bio: String,
    pub date_joined: Option<DateTime<Utc>>,
    pub profile: Option<UserProfile>,
}

impl User {
    /// Name suitable for a greeting: full name when set, username otherwise.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}
