//! Media items and the repository seam used to persist them
//!
//! A media item is a content record for an uploaded asset. Only items of the
//! [`Bundle::Image`] bundle carry an [`ImageField`] eligible for alt text.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Media item identifier
pub type MediaId = i64;

/// Content subtype of a media item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Bundle {
    Image,
    Document,
    Audio,
    Video,
    /// Any bundle registered by the host that this crate does not know about
    Other(String),
}

impl Bundle {
    /// Parse a bundle machine name like "image"
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "image" => Self::Image,
            "document" => Self::Document,
            "audio" => Self::Audio,
            "video" => Self::Video,
            other => Self::Other(other.to_string()),
        }
    }

    /// Machine name stored alongside the item
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Bundle {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Bundle> for String {
    fn from(bundle: Bundle) -> Self {
        bundle.as_str().to_string()
    }
}

impl std::fmt::Display for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image field of an image media item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageField {
    /// Identifier of the stored file this field points at
    pub target_id: String,
    /// Location of the file contents (local path, `file://` or `http(s)://` URI)
    pub uri: String,
    /// Accessibility text
    pub alt: Option<String>,
}

/// A media item owned by the content store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: MediaId,
    pub bundle: Bundle,
    /// Human-readable label
    pub name: String,
    /// Account that created the item
    pub owner_id: String,
    pub image: Option<ImageField>,
}

impl MediaItem {
    /// Whether the item belongs to the image bundle
    #[must_use]
    pub fn is_image(&self) -> bool {
        self.bundle == Bundle::Image
    }

    /// Label used in user-facing notices, falling back to the id
    #[must_use]
    pub fn label(&self) -> String {
        if self.name.trim().is_empty() {
            format!("media {}", self.id)
        } else {
            self.name.clone()
        }
    }

    /// The image field, if it references a file
    ///
    /// A field with an empty target id or URI counts as missing.
    #[must_use]
    pub fn image_reference(&self) -> Option<&ImageField> {
        self.image
            .as_ref()
            .filter(|img| !img.target_id.trim().is_empty() && !img.uri.trim().is_empty())
    }

    /// Current alt text, if any
    #[must_use]
    pub fn alt_text(&self) -> Option<&str> {
        self.image.as_ref().and_then(|img| img.alt.as_deref())
    }

    /// Copy of this item with the image alt text replaced
    ///
    /// The image target id and URI are carried over unchanged. Items without
    /// an image field are returned as-is.
    #[must_use]
    pub fn with_alt_text(&self, text: &str) -> Self {
        let mut updated = self.clone();
        if let Some(image) = updated.image.as_mut() {
            image.alt = Some(text.to_string());
        }
        updated
    }
}

/// Persistence seam for media items
///
/// The host content store implements this; [`crate::db::MediaRepo`] is the
/// bundled `SQLite` implementation.
pub trait MediaRepository: Send + Sync {
    /// Persist the item's current state
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Persistence`] on write conflict or validation failure
    fn save(&self, item: &MediaItem) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_item() -> MediaItem {
        MediaItem {
            id: 7,
            bundle: Bundle::Image,
            name: "Harbor at dusk".to_string(),
            owner_id: "editor".to_string(),
            image: Some(ImageField {
                target_id: "42".to_string(),
                uri: "/srv/files/harbor.jpg".to_string(),
                alt: None,
            }),
        }
    }

    #[test]
    fn test_bundle_parse() {
        assert_eq!(Bundle::parse("image"), Bundle::Image);
        assert_eq!(Bundle::parse(" Image "), Bundle::Image);
        assert_eq!(Bundle::parse("document"), Bundle::Document);
        assert_eq!(
            Bundle::parse("remote_video"),
            Bundle::Other("remote_video".to_string())
        );
        assert_eq!(Bundle::parse("remote_video").as_str(), "remote_video");
    }

    #[test]
    fn test_bundle_serializes_as_machine_name() {
        let other = serde_json::to_value(Bundle::parse("remote_video")).unwrap();
        assert_eq!(other, serde_json::json!("remote_video"));
        assert_eq!(
            serde_json::to_value(Bundle::Image).unwrap(),
            serde_json::json!("image")
        );

        let parsed: Bundle = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(parsed, Bundle::Image);

        let mut item = image_item();
        item.bundle = Bundle::parse("remote_video");
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["bundle"], "remote_video");
        let back: MediaItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn test_with_alt_text_keeps_target() {
        let item = image_item();
        let updated = item.with_alt_text("Boats moored at sunset");

        let image = updated.image.as_ref().unwrap();
        assert_eq!(image.target_id, "42");
        assert_eq!(image.uri, "/srv/files/harbor.jpg");
        assert_eq!(updated.alt_text(), Some("Boats moored at sunset"));
        assert_eq!(item.alt_text(), None);
    }

    #[test]
    fn test_empty_image_reference_is_missing() {
        let mut item = image_item();
        item.image.as_mut().unwrap().target_id = String::new();
        assert!(item.image_reference().is_none());

        item.image = None;
        assert!(item.image_reference().is_none());
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let mut item = image_item();
        item.name = "  ".to_string();
        assert_eq!(item.label(), "media 7");
    }
}
