use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Listing category. Unknown wire values decode to `Sale`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum PropertyCategory {
    Land,
    Commercial,
    Rental,
    Apartment,
    Sale,
}

impl From<String> for PropertyCategory {
    fn from(value: String) -> Self {
        match value.as_str() {
            "land" => PropertyCategory::Land,
            "commercial" => PropertyCategory::Commercial,
            "rental" => PropertyCategory::Rental,
            "apartment" => PropertyCategory::Apartment,
            _ => PropertyCategory::Sale,
        }
    }
}

impl Default for PropertyCategory {
    fn default() -> Self {
        PropertyCategory::Sale
    }
}

/// Server-side media record attached to a listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaAsset {
    pub id: i64,
    /// Path or absolute URL as the server stored it; resolve for display
    /// with [`crate::media::image_url`].
    pub image: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub is_primary: bool,
    /// Owning listing, absent on endpoints that already scope by listing.
    pub property: Option<i64>,
}

/// The `primary_image` field arrives either as a bare path string or as a
/// full media record depending on the serializer that produced the listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryImage {
    Asset(MediaAsset),
    Path(String),
}

impl PrimaryImage {
    pub fn path(&self) -> &str {
        match self {
            PrimaryImage::Asset(asset) => &asset.image,
            PrimaryImage::Path(path) => path,
        }
    }
}

/// Persisted listing record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub short_description: Option<String>,
    #[serde(rename = "property_type", default)]
    pub category: PropertyCategory,
    pub land_type: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub price: Option<f64>,
    #[serde(default)]
    pub is_negotiable: bool,

    // Land attributes
    pub size_acres: Option<f64>,
    pub plot_dimensions: Option<String>,
    pub topography: Option<String>,
    pub soil_type: Option<String>,
    pub title_deed_status: Option<String>,

    // Structure attributes
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f32>,
    pub square_feet: Option<u32>,
    pub year_built: Option<u32>,

    #[serde(default)]
    pub featured: bool,
    pub primary_image: Option<PrimaryImage>,
    #[serde(default)]
    pub images: Vec<MediaAsset>,
    #[serde(default)]
    pub views_count: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// DRF page envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Listing query filters. `None` and empty-string values are omitted from
/// the query string entirely, matching what the backend expects.
#[derive(Debug, Clone, Default)]
pub struct PropertyFilters {
    pub category: Option<PropertyCategory>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_size_acres: Option<f64>,
    pub featured: Option<bool>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PropertyFilters {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                if !value.is_empty() {
                    pairs.push((key.to_string(), value));
                }
            }
        };

        push(
            "property_type",
            self.category
                .and_then(|c| serde_json::to_value(c).ok())
                .and_then(|v| v.as_str().map(str::to_owned)),
        );
        push("city", self.city.clone());
        push("state", self.state.clone());
        push("min_price", self.min_price.map(|v| v.to_string()));
        push("max_price", self.max_price.map(|v| v.to_string()));
        push("min_size_acres", self.min_size_acres.map(|v| v.to_string()));
        push("featured", self.featured.map(|v| v.to_string()));
        push("search", self.search.clone());
        push("ordering", self.ordering.clone());
        push("page", self.page.map(|v| v.to_string()));
        push("limit", self.limit.map(|v| v.to_string()));
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primary_image_accepts_both_wire_forms() {
        let bare: PrimaryImage = serde_json::from_value(json!("media/plots/1.jpg")).unwrap();
        assert_eq!(bare.path(), "media/plots/1.jpg");

        let full: PrimaryImage = serde_json::from_value(json!({
            "id": 4,
            "image": "/media/plots/4.jpg",
            "is_primary": true
        }))
        .unwrap();
        assert_eq!(full.path(), "/media/plots/4.jpg");
    }

    #[test]
    fn unknown_category_decodes_to_sale() {
        let property: Property = serde_json::from_value(json!({
            "id": 3,
            "title": "Corner plot",
            "property_type": "castle"
        }))
        .unwrap();
        assert_eq!(property.category, PropertyCategory::Sale);
    }

    #[test]
    fn filters_skip_unset_and_empty_values() {
        let filters = PropertyFilters {
            category: Some(PropertyCategory::Land),
            city: Some(String::new()),
            min_price: Some(250_000.0),
            ..Default::default()
        };
        let query = filters.to_query();
        assert_eq!(
            query,
            vec![
                ("property_type".to_string(), "land".to_string()),
                ("min_price".to_string(), "250000".to_string()),
            ]
        );
    }
}
