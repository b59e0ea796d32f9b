//! Listing data access: queries, CRUD, media management, and the two-phase
//! create-then-attach-media submission.

use std::collections::BTreeMap;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::api::error::decode;
use crate::api::{post_first, ApiClient, ApiError};
use crate::models::{MediaAsset, PaginatedResponse, Property, PropertyFilters};
use crate::wizard::{PendingAttachment, PropertyDraft};

/// Creation route candidates, most canonical first. The backend has shipped
/// all three at one point or another.
const CREATE_CANDIDATES: &[&str] = &["/properties/", "/properties/create/", "/create/"];

/// Answer from the favorite toggle endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteStatus {
    pub status: String,
}

/// Wire-tag → display-label maps for the listing form dropdowns.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PropertyCategories {
    #[serde(default)]
    pub property_types: BTreeMap<String, String>,
    #[serde(default)]
    pub land_types: BTreeMap<String, String>,
    #[serde(default)]
    pub title_deed_types: BTreeMap<String, String>,
}

/// Result of the two-phase submission. The listing itself and its media
/// upload are independent units of durability: `media` failing does not
/// undo `property`.
#[derive(Debug)]
pub struct CreatedProperty {
    pub property: Property,
    pub media: MediaOutcome,
}

/// Outcome of the upload phase.
#[derive(Debug)]
pub enum MediaOutcome {
    Uploaded(Vec<MediaAsset>),
    /// The listing exists but its attachments did not go through; they can
    /// be retried later against the images endpoint.
    Failed(ApiError),
}

impl MediaOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, MediaOutcome::Uploaded(_))
    }
}

/// Listing operations against the backend.
pub struct PropertyService {
    client: Arc<ApiClient>,
}

impl PropertyService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn list(
        &self,
        filters: &PropertyFilters,
    ) -> Result<PaginatedResponse<Property>, ApiError> {
        decode(self.client.get_query("/properties/", &filters.to_query()).await?)
    }

    pub async fn featured(&self) -> Result<PaginatedResponse<Property>, ApiError> {
        decode(self.client.get("/properties/?featured=true&limit=6").await?)
    }

    pub async fn get(&self, id: i64) -> Result<Property, ApiError> {
        decode(self.client.get(&format!("/properties/{id}/")).await?)
    }

    /// Create the listing record (phase one only). The canonical creation
    /// route is not stable, so candidates are probed in order.
    pub async fn create(&self, draft: &PropertyDraft) -> Result<Property, ApiError> {
        decode(post_first(&self.client, CREATE_CANDIDATES, &draft.record_payload()).await?)
    }

    pub async fn update(&self, id: i64, patch: &Value) -> Result<Property, ApiError> {
        decode(self.client.patch(&format!("/properties/{id}/"), patch).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
        self.client.delete(&format!("/properties/{id}/")).await?;
        Ok(())
    }

    pub async fn my_properties(&self) -> Result<Vec<Property>, ApiError> {
        decode(self.client.get("/properties/my_properties/").await?)
    }

    pub async fn my_favorites(&self) -> Result<Vec<Property>, ApiError> {
        decode(self.client.get("/properties/my_favorites/").await?)
    }

    pub async fn toggle_favorite(&self, id: i64) -> Result<FavoriteStatus, ApiError> {
        decode(self.client.post_empty(&format!("/properties/{id}/favorite/")).await?)
    }

    pub async fn similar(&self, id: i64) -> Result<Vec<Property>, ApiError> {
        decode(self.client.get(&format!("/properties/{id}/similar/")).await?)
    }

    pub async fn categories(&self) -> Result<PropertyCategories, ApiError> {
        decode(self.client.get("/categories/").await?)
    }

    pub async fn property_images(&self, id: i64) -> Result<Vec<MediaAsset>, ApiError> {
        decode(self.client.get(&format!("/properties/{id}/images/")).await?)
    }

    /// Fetch a listing and, when its serializer omitted the image list,
    /// backfill it from the images endpoint. The backfill is best-effort:
    /// its failure leaves the listing usable with no images.
    pub async fn get_with_images(&self, id: i64) -> Result<Property, ApiError> {
        let mut property = self.get(id).await?;
        if property.images.is_empty() {
            match self.property_images(id).await {
                Ok(images) => property.images = images,
                Err(err) => {
                    warn!("Could not fetch additional images for property {}: {}", id, err);
                }
            }
        }
        Ok(property)
    }

    pub async fn set_primary_image(&self, property_id: i64, image_id: i64) -> Result<(), ApiError> {
        self.client
            .post_empty(&format!("/properties/{property_id}/images/{image_id}/set_primary/"))
            .await?;
        Ok(())
    }

    pub async fn delete_image(&self, property_id: i64, image_id: i64) -> Result<(), ApiError> {
        self.client
            .delete(&format!("/properties/{property_id}/images/{image_id}/"))
            .await?;
        Ok(())
    }

    pub async fn update_image_caption(
        &self,
        property_id: i64,
        image_id: i64,
        caption: &str,
    ) -> Result<MediaAsset, ApiError> {
        decode(
            self.client
                .patch(
                    &format!("/properties/{property_id}/images/{image_id}/"),
                    &serde_json::json!({ "caption": caption }),
                )
                .await?,
        )
    }

    /// One batched multipart upload: a file part per attachment plus the
    /// parallel indexed caption and primary-flag fields.
    pub async fn upload_images(
        &self,
        property_id: i64,
        attachments: &[PendingAttachment],
    ) -> Result<Vec<MediaAsset>, ApiError> {
        info!("Uploading {} images for property {}", attachments.len(), property_id);

        let mut form = Form::new();
        for (index, attachment) in attachments.iter().enumerate() {
            let part = Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(&attachment.content_type)
                .map_err(|e| {
                    ApiError::Network(format!(
                        "invalid media content type {}: {e}",
                        attachment.content_type
                    ))
                })?;
            form = form
                .part("images", part)
                .text(format!("image_captions[{index}]"), attachment.caption.clone())
                .text(
                    format!("image_is_primary[{index}]"),
                    attachment.is_primary.to_string(),
                );
        }

        let raw = self
            .client
            .post_multipart(&format!("/properties/{property_id}/upload_images/"), form)
            .await?;
        Ok(parse_uploaded_assets(raw))
    }

    /// Two-phase submission: create the record, then attach its media.
    ///
    /// Phase-one failure aborts with the error as-is; nothing was created.
    /// Phase-two failure is isolated: the created listing is still returned
    /// and the upload error travels alongside it as [`MediaOutcome::Failed`];
    /// no rollback is issued. Coarse progress milestones (30/60/100) are
    /// reported through `on_progress`.
    pub async fn create_with_media(
        &self,
        draft: &PropertyDraft,
        mut on_progress: impl FnMut(u8),
    ) -> Result<CreatedProperty, ApiError> {
        let property = self.create(draft).await?;
        info!("Property {} created, uploading media", property.id);
        on_progress(30);

        on_progress(60);
        let media = match self.upload_images(property.id, &draft.attachments).await {
            Ok(assets) => {
                on_progress(100);
                MediaOutcome::Uploaded(assets)
            }
            Err(err) => {
                warn!(
                    "Property {} created but image upload failed, images can be added later: {}",
                    property.id, err
                );
                MediaOutcome::Failed(err)
            }
        };

        Ok(CreatedProperty { property, media })
    }
}

/// The upload endpoint has answered with either a bare asset list or an
/// `{"images": [...]}` wrapper depending on backend version; take both.
fn parse_uploaded_assets(raw: Value) -> Vec<MediaAsset> {
    if let Ok(assets) = serde_json::from_value::<Vec<MediaAsset>>(raw.clone()) {
        return assets;
    }
    raw.get("images")
        .and_then(|value| serde_json::from_value(value.clone()).ok())
        .unwrap_or_default()
}
