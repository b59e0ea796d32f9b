//! Listing-creation wizard state and its step gate.
//!
//! The gate is a pure function of draft state and step, so the flow can be
//! validated without any network or UI harness.

use serde_json::{json, Value};
use thiserror::Error;

use crate::models::PropertyCategory;

/// Client-side media attachment awaiting upload.
#[derive(Debug, Clone)]
pub struct PendingAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub caption: String,
    pub is_primary: bool,
    /// Ordinal position in the upload batch; maintained by the draft.
    pub position: usize,
}

impl PendingAttachment {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
            caption: String::new(),
            is_primary: false,
            position: 0,
        }
    }
}

/// Listing record under construction.
///
/// Attachment mutations preserve the invariant that exactly one attachment
/// is flagged primary whenever the list is non-empty.
#[derive(Debug, Clone, Default)]
pub struct PropertyDraft {
    pub title: String,
    pub description: String,
    pub short_description: String,
    pub category: Option<PropertyCategory>,
    pub land_type: String,
    pub status: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price: Option<f64>,
    pub is_negotiable: bool,

    // Land attributes
    pub size_acres: Option<f64>,
    pub plot_dimensions: String,
    pub topography: String,
    pub soil_type: String,
    pub title_deed_status: String,

    // Infrastructure
    pub road_access_type: String,
    pub electricity_availability: String,
    pub water_supply_types: Vec<String>,
    pub has_borehole: bool,
    pub has_piped_water: bool,
    pub is_fenced: bool,
    pub has_beacons: bool,

    // Structure attributes
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f32>,
    pub square_feet: Option<u32>,
    pub year_built: Option<u32>,
    pub has_garage: bool,
    pub has_pool: bool,
    pub has_garden: bool,

    pub featured: bool,
    pub attachments: Vec<PendingAttachment>,
}

impl PropertyDraft {
    /// Append an attachment. The first one becomes primary; a later one
    /// flagged primary takes the flag over from whoever held it.
    pub fn add_attachment(&mut self, mut attachment: PendingAttachment) {
        attachment.position = self.attachments.len();
        if self.attachments.is_empty() {
            attachment.is_primary = true;
        } else if attachment.is_primary {
            for existing in &mut self.attachments {
                existing.is_primary = false;
            }
        }
        self.attachments.push(attachment);
    }

    /// Remove by index. Removing the primary promotes the first survivor.
    pub fn remove_attachment(&mut self, index: usize) {
        if index >= self.attachments.len() {
            return;
        }
        let removed = self.attachments.remove(index);
        if removed.is_primary {
            if let Some(first) = self.attachments.first_mut() {
                first.is_primary = true;
            }
        }
        for (position, attachment) in self.attachments.iter_mut().enumerate() {
            attachment.position = position;
        }
    }

    pub fn set_primary(&mut self, index: usize) {
        if index >= self.attachments.len() {
            return;
        }
        for (i, attachment) in self.attachments.iter_mut().enumerate() {
            attachment.is_primary = i == index;
        }
    }

    pub fn set_caption(&mut self, index: usize, caption: impl Into<String>) {
        if let Some(attachment) = self.attachments.get_mut(index) {
            attachment.caption = caption.into();
        }
    }

    pub fn is_land(&self) -> bool {
        self.category == Some(PropertyCategory::Land)
    }

    /// Non-media creation payload for phase one of the submission.
    pub fn record_payload(&self) -> Value {
        json!({
            "title": self.title,
            "description": self.description,
            "short_description": self.short_description,
            "property_type": self.category,
            "land_type": self.land_type,
            "status": self.status,

            "address": self.address,
            "city": self.city,
            "state": self.state,
            "zip_code": self.zip_code,
            "latitude": self.latitude,
            "longitude": self.longitude,

            "price": self.price,
            "is_negotiable": self.is_negotiable,

            "size_acres": self.size_acres,
            "plot_dimensions": self.plot_dimensions,
            "topography": self.topography,
            "soil_type": self.soil_type,
            "title_deed_status": self.title_deed_status,

            "road_access_type": self.road_access_type,
            "electricity_availability": self.electricity_availability,
            "water_supply_types": self.water_supply_types,
            "has_borehole": self.has_borehole,
            "has_piped_water": self.has_piped_water,
            "is_fenced": self.is_fenced,
            "has_beacons": self.has_beacons,

            "bedrooms": self.bedrooms,
            "bathrooms": self.bathrooms,
            "square_feet": self.square_feet,
            "year_built": self.year_built,
            "has_garage": self.has_garage,
            "has_pool": self.has_pool,
            "has_garden": self.has_garden,

            "featured": self.featured,
        })
    }
}

/// The five steps of the creation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    BasicInfo,
    Location,
    Details,
    Infrastructure,
    Media,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::BasicInfo,
        WizardStep::Location,
        WizardStep::Details,
        WizardStep::Infrastructure,
        WizardStep::Media,
    ];

    pub fn number(self) -> u8 {
        match self {
            WizardStep::BasicInfo => 1,
            WizardStep::Location => 2,
            WizardStep::Details => 3,
            WizardStep::Infrastructure => 4,
            WizardStep::Media => 5,
        }
    }

    pub fn next(self) -> Option<WizardStep> {
        Self::ALL.get(self.number() as usize).copied()
    }
}

/// Why a step refused to advance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StepBlocked(pub String);

/// Decide whether the flow may advance past `step` given the draft.
pub fn can_advance(step: WizardStep, draft: &PropertyDraft) -> Result<(), StepBlocked> {
    match step {
        WizardStep::BasicInfo => {
            if draft.title.is_empty() || draft.description.is_empty() || draft.category.is_none() {
                return Err(StepBlocked(
                    "Please fill in all required fields in Basic Information".to_string(),
                ));
            }
        }
        WizardStep::Location => {
            if draft.address.is_empty() || draft.city.is_empty() || draft.state.is_empty() {
                return Err(StepBlocked(
                    "Please fill in all required fields in Location Details".to_string(),
                ));
            }
        }
        WizardStep::Details => {
            let priced = draft.price.map(|p| p > 0.0).unwrap_or(false);
            let sized = draft.size_acres.map(|s| s > 0.0).unwrap_or(false);
            if !priced || (draft.is_land() && !sized) {
                return Err(StepBlocked(
                    "Please fill in all required fields in Property Details".to_string(),
                ));
            }
        }
        WizardStep::Infrastructure => {}
        WizardStep::Media => {
            if draft.attachments.is_empty() {
                return Err(StepBlocked(
                    "Please upload at least one image of the property".to_string(),
                ));
            }
        }
    }
    Ok(())
}
