//! Contact and inquiry submission.
//!
//! The backend's inquiry serializer only has columns for name, email,
//! phone, message, kind and an optional listing reference. Extra details a
//! form collects (address, square footage, service type) are folded into
//! the message body using fixed templates, a documented wire contract
//! rather than a hidden behavior.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::error::decode;
use crate::api::{post_first, ApiClient, ApiError};

/// Submission routes, canonical first.
const SUBMIT_CANDIDATES: &[&str] = &["/public-inquiry/", "/inquiries/"];

/// What kind of inquiry is being submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryKind {
    PropertyInquiry,
    ValuationRequest,
    ManagementRequest,
    GeneralInquiry,
}

impl InquiryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InquiryKind::PropertyInquiry => "property_inquiry",
            InquiryKind::ValuationRequest => "valuation_request",
            InquiryKind::ManagementRequest => "management_request",
            InquiryKind::GeneralInquiry => "general_inquiry",
        }
    }
}

/// One form submission. Constructed fresh per call and never stored.
#[derive(Debug, Clone, Default)]
pub struct InquiryForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    /// Listing the inquiry concerns, for property inquiries.
    pub property: Option<i64>,
    /// Folded into the message for valuation/management requests.
    pub address: Option<String>,
    pub sqft: Option<String>,
    pub service_type: Option<String>,
    pub preferred_date: Option<String>,
    pub budget_range: Option<String>,
}

/// Inquiry record as the server stores it.
#[derive(Debug, Clone, Deserialize)]
pub struct Inquiry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
    /// Raw wire tag; the server knows kinds this client does not submit.
    #[serde(default)]
    pub inquiry_type: String,
    pub property: Option<i64>,
    pub property_title: Option<String>,
    #[serde(default)]
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Message body actually sent for a given kind.
///
/// Templates are fixed:
/// - valuation: `Valuation Request:\nAddress: {address}\nSquare Feet: {sqft}\n\nMessage: {message}`
/// - management: `Management Request:\nAddress: {address}\nService Type: {service_type}\n\nMessage: {message}`
/// - property/general: the message verbatim (listing context travels in the
///   `property` field).
pub fn format_message(kind: InquiryKind, form: &InquiryForm) -> String {
    match kind {
        InquiryKind::ValuationRequest => format!(
            "Valuation Request:\nAddress: {}\nSquare Feet: {}\n\nMessage: {}",
            form.address.as_deref().unwrap_or(""),
            form.sqft.as_deref().unwrap_or(""),
            form.message
        ),
        InquiryKind::ManagementRequest => format!(
            "Management Request:\nAddress: {}\nService Type: {}\n\nMessage: {}",
            form.address.as_deref().unwrap_or(""),
            form.service_type.as_deref().unwrap_or(""),
            form.message
        ),
        InquiryKind::PropertyInquiry | InquiryKind::GeneralInquiry => form.message.clone(),
    }
}

fn build_payload(kind: InquiryKind, form: &InquiryForm) -> Value {
    let mut payload = json!({
        "name": form.name,
        "email": form.email,
        "phone": form.phone,
        "message": format_message(kind, form),
        "inquiry_type": kind,
    });
    if let Some(property) = form.property {
        payload["property"] = json!(property);
    }
    if let Some(date) = &form.preferred_date {
        payload["preferred_date"] = json!(date);
    }
    if let Some(budget) = &form.budget_range {
        payload["budget_range"] = json!(budget);
    }
    payload
}

/// Inquiry operations against the backend.
pub struct InquiryService {
    client: Arc<ApiClient>,
}

impl InquiryService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Submit a form, probing the submission routes in order.
    pub async fn submit(&self, kind: InquiryKind, form: &InquiryForm) -> Result<Inquiry, ApiError> {
        let payload = build_payload(kind, form);
        decode(post_first(&self.client, SUBMIT_CANDIDATES, &payload).await?)
    }

    pub async fn my_inquiries(&self) -> Result<Vec<Inquiry>, ApiError> {
        decode(self.client.get("/inquiries/").await?)
    }

    pub async fn update_status(&self, id: i64, status: &str) -> Result<Inquiry, ApiError> {
        decode(
            self.client
                .post(
                    &format!("/inquiries/{id}/update-status/"),
                    &json!({ "status": status }),
                )
                .await?,
        )
    }

    pub async fn assign_agent(&self, id: i64, agent_id: i64) -> Result<Inquiry, ApiError> {
        decode(
            self.client
                .post(
                    &format!("/inquiries/{id}/assign-agent/"),
                    &json!({ "agent_id": agent_id }),
                )
                .await?,
        )
    }
}
