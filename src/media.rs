//! Display-URL resolution for server-side media references.
//!
//! The backend hands back image references in several forms: absolute URLs,
//! root-relative paths, and paths that may or may not already carry the
//! `media/` prefix. Everything funnels through [`image_url`] so the prefix
//! is applied exactly once.

use crate::models::{PrimaryImage, Property};

/// Inline SVG shown when a listing has no usable image, so missing media
/// never costs a 404 round-trip.
pub const PLACEHOLDER_IMAGE: &str = "data:image/svg+xml;base64,PHN2ZyB3aWR0aD0iNDAwIiBoZWlnaHQ9IjMwMCIgeG1sbnM9Imh0dHA6Ly93d3cudzMub3JnLzIwMDAvc3ZnIj48cmVjdCB3aWR0aD0iNDAwIiBoZWlnaHQ9IjMwMCIgZmlsbD0iI2YzZjRmNiIvPjx0ZXh0IHg9IjUwJSIgeT0iNTAlIiBmb250LWZhbWlseT0iQXJpYWwsIHNhbnMtc2VyaWYiIGZvbnQtc2l6ZT0iMTgiIGZpbGw9IiM5YzljOWMiIHRleHQtYW5jaG9yPSJtaWRkbGUiIGR5PSIuM2VtIj5ObyBJbWFnZTwvdGV4dD48L3N2Zz4=";

/// Resolve a stored image reference to one absolute URL.
///
/// Absolute URLs pass through untouched. Relative paths lose any leading
/// slash and any existing `media/` prefix before the single prefix is
/// joined back on, which keeps double-prefixed references from the older
/// serializers from producing `/media/media/...`.
pub fn image_url(media_base_url: &str, image_path: &str) -> String {
    if image_path.is_empty() {
        return PLACEHOLDER_IMAGE.to_string();
    }
    if image_path.starts_with("http") {
        return image_path.to_string();
    }

    let clean = image_path.strip_prefix('/').unwrap_or(image_path);
    let clean = clean.strip_prefix("media/").unwrap_or(clean);

    format!("{media_base_url}/media/{clean}")
}

/// Best display image for a listing: the `primary_image` field in either of
/// its wire forms, then the asset flagged primary, then the first asset,
/// then the placeholder.
pub fn primary_image_url(media_base_url: &str, property: &Property) -> String {
    if let Some(primary) = &property.primary_image {
        match primary {
            PrimaryImage::Path(path) if path.is_empty() => {}
            other => return image_url(media_base_url, other.path()),
        }
    }

    if let Some(asset) = property
        .images
        .iter()
        .find(|asset| asset.is_primary)
        .or_else(|| property.images.first())
    {
        return image_url(media_base_url, &asset.image);
    }

    PLACEHOLDER_IMAGE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://api.example.com";

    #[test]
    fn absolute_urls_pass_through() {
        assert_eq!(
            image_url(BASE, "https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn media_prefix_is_never_doubled() {
        assert_eq!(image_url(BASE, "plots/1.jpg"), format!("{BASE}/media/plots/1.jpg"));
        assert_eq!(image_url(BASE, "/plots/1.jpg"), format!("{BASE}/media/plots/1.jpg"));
        assert_eq!(image_url(BASE, "media/plots/1.jpg"), format!("{BASE}/media/plots/1.jpg"));
        assert_eq!(image_url(BASE, "/media/plots/1.jpg"), format!("{BASE}/media/plots/1.jpg"));
    }

    #[test]
    fn empty_path_yields_placeholder() {
        assert_eq!(image_url(BASE, ""), PLACEHOLDER_IMAGE);
    }

    fn property_with(primary: serde_json::Value, images: serde_json::Value) -> Property {
        serde_json::from_value(json!({
            "id": 1,
            "title": "Plot",
            "primary_image": primary,
            "images": images
        }))
        .unwrap()
    }

    #[test]
    fn primary_field_wins_in_both_forms() {
        let as_string = property_with(json!("plots/main.jpg"), json!([]));
        assert_eq!(
            primary_image_url(BASE, &as_string),
            format!("{BASE}/media/plots/main.jpg")
        );

        let as_object = property_with(
            json!({"id": 2, "image": "/media/plots/obj.jpg", "is_primary": true}),
            json!([]),
        );
        assert_eq!(
            primary_image_url(BASE, &as_object),
            format!("{BASE}/media/plots/obj.jpg")
        );
    }

    #[test]
    fn falls_back_to_flagged_then_first_asset() {
        let flagged = property_with(
            json!(null),
            json!([
                {"id": 1, "image": "a.jpg", "is_primary": false},
                {"id": 2, "image": "b.jpg", "is_primary": true}
            ]),
        );
        assert_eq!(primary_image_url(BASE, &flagged), format!("{BASE}/media/b.jpg"));

        let unflagged: Property = property_with(
            json!(null),
            json!([{"id": 1, "image": "a.jpg", "is_primary": false}]),
        );
        assert_eq!(primary_image_url(BASE, &unflagged), format!("{BASE}/media/a.jpg"));

        let bare: Property = property_with(json!(null), json!([]));
        assert_eq!(primary_image_url(BASE, &bare), PLACEHOLDER_IMAGE);
    }
}
