//! Listing objects under a prefix and turning them into signed catalogue entries.

use crate::services::storage::StorageService;
use anyhow::Result;
use serde::Serialize;
use utoipa::ToSchema;

/// Prefix shared by all avatar objects
pub const AVATAR_PREFIX: &str = "avatar/";

/// Root of the product image folders
pub const PRODUCT_PREFIX: &str = "produkimg";

/// Kind of object the catalogue exposes, decided by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Text,
}

impl FileKind {
    /// Classifies a key by the text after its last `.`, ignoring case.
    /// A key without a `.` is classified by its whole name.
    pub fn from_key(key: &str) -> Option<Self> {
        let extension = key.rsplit('.').next().unwrap_or(key).to_lowercase();
        match extension.as_str() {
            "png" | "jpg" | "jpeg" => Some(Self::Image),
            "txt" => Some(Self::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub kind: FileKind,
    /// Full object key
    pub name: String,
    /// Signed read URL
    pub url: String,
}

/// Outcome of cataloguing a prefix
#[derive(Debug)]
pub enum Catalog {
    /// Nothing at all is stored under the prefix
    Empty,
    /// Objects exist but none has a supported extension
    Unsupported,
    Entries(Vec<CatalogEntry>),
}

/// Lists `prefix`, keeps supported objects and signs a read URL for each.
pub async fn catalog_prefix(
    storage: &dyn StorageService,
    prefix: &str,
    expires_in_secs: u64,
) -> Result<Catalog> {
    let keys = storage.list_objects(prefix).await?;
    if keys.is_empty() {
        return Ok(Catalog::Empty);
    }

    let mut entries = Vec::new();
    for key in keys {
        let Some(kind) = FileKind::from_key(&key) else {
            continue;
        };
        let url = storage.generate_presigned_url(&key, expires_in_secs).await?;
        entries.push(CatalogEntry {
            kind,
            name: key,
            url,
        });
    }

    if entries.is_empty() {
        Ok(Catalog::Unsupported)
    } else {
        Ok(Catalog::Entries(entries))
    }
}

/// Public URLs of every avatar image.
pub async fn avatar_urls(storage: &dyn StorageService) -> Result<Vec<String>> {
    let keys = storage.list_objects(AVATAR_PREFIX).await?;
    Ok(keys
        .iter()
        .filter(|key| is_avatar_image(key))
        .map(|key| storage.public_url(key))
        .collect())
}

/// Avatars only count as images with a lower-case `.png`, `.jpg` or `.jpeg`
/// suffix, unlike the product folders.
pub fn is_avatar_image(key: &str) -> bool {
    [".png", ".jpg", ".jpeg"]
        .iter()
        .any(|ext| key.ends_with(ext))
}

pub fn avatar_key(image_name: &str) -> String {
    format!("{}{}", AVATAR_PREFIX, image_name)
}

/// Product image routine: `pagi` (morning) or `malam` (night)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routine {
    Morning,
    Night,
}

impl Routine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "pagi",
            Self::Night => "malam",
        }
    }

    /// Prefix covering the whole routine, e.g. `produkimg/pagi/`.
    pub fn root_prefix(&self) -> String {
        format!("{}/{}/", PRODUCT_PREFIX, self.as_str())
    }

    /// Raw prefix for a subfolder and optional image name. No trailing `/` is
    /// appended, so `serum` also matches `serum-2/...`.
    pub fn folder_prefix(&self, subfolder: &str, image_name: Option<&str>) -> String {
        match image_name {
            Some(name) => format!("{}{}/{}", self.root_prefix(), subfolder, name),
            None => format!("{}{}", self.root_prefix(), subfolder),
        }
    }
}

impl std::str::FromStr for Routine {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pagi" => Ok(Self::Morning),
            "malam" => Ok(Self::Night),
            other => Err(anyhow::anyhow!("unknown routine '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_images() {
        assert_eq!(FileKind::from_key("avatar/a.png"), Some(FileKind::Image));
        assert_eq!(FileKind::from_key("avatar/a.JPG"), Some(FileKind::Image));
        assert_eq!(
            FileKind::from_key("produkimg/pagi/x/y.z.jpeg"),
            Some(FileKind::Image)
        );
    }

    #[test]
    fn test_classify_text_and_unsupported() {
        assert_eq!(FileKind::from_key("produkimg/malam/a/info.txt"), Some(FileKind::Text));
        assert_eq!(FileKind::from_key("produkimg/malam/a/clip.mp4"), None);
        assert_eq!(FileKind::from_key("produkimg/malam/a/"), None);
        assert_eq!(FileKind::from_key("png"), Some(FileKind::Image));
    }

    #[test]
    fn test_routine_prefixes() {
        let night: Routine = "malam".parse().unwrap();
        assert_eq!(night, Routine::Night);
        assert_eq!(night.root_prefix(), "produkimg/malam/");
        assert_eq!(night.folder_prefix("serum", None), "produkimg/malam/serum");
        assert_eq!(
            Routine::Morning.folder_prefix("serum", Some("front.png")),
            "produkimg/pagi/serum/front.png"
        );
        assert!("siang".parse::<Routine>().is_err());
    }

    #[test]
    fn test_avatar_image_suffix_is_case_sensitive() {
        assert!(is_avatar_image("avatar/a.png"));
        assert!(is_avatar_image("avatar/b.jpeg"));
        assert!(!is_avatar_image("avatar/SHOUT.PNG"));
        assert!(!is_avatar_image("avatar/c.Jpg"));
        assert!(!is_avatar_image("avatar/notes.txt"));
    }

    #[test]
    fn test_avatar_key() {
        assert_eq!(avatar_key("me.png"), "avatar/me.png");
    }

    #[test]
    fn test_entry_serializes_kind_as_type() {
        let entry = CatalogEntry {
            kind: FileKind::Text,
            name: "produkimg/pagi/a/readme.txt".to_string(),
            url: "http://signed".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["name"], "produkimg/pagi/a/readme.txt");
    }
}
