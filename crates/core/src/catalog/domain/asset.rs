use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    #[error("asset row is missing required field `{0}`")]
    MissingField(&'static str),
    #[error("asset {id} has an empty `{field}`")]
    EmptyField { id: String, field: &'static str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetType {
    Image,
    Video,
    Audio,
    #[serde(other)]
    Other,
}

/// An asset row as it arrives from upstream storage, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAssetRow {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub asset_type: Option<AssetType>,
    pub resize_path: Option<String>,
    #[serde(default)]
    pub is_face_detected: bool,
}

/// A validated asset descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDescriptor {
    pub id: String,
    pub asset_type: AssetType,
    pub resize_path: String,
    pub is_face_detected: bool,
}

impl TryFrom<RawAssetRow> for AssetDescriptor {
    type Error = AssetError;

    fn try_from(row: RawAssetRow) -> Result<Self, Self::Error> {
        let id = row.id.ok_or(AssetError::MissingField("id"))?;
        let asset_type = row.asset_type.ok_or(AssetError::MissingField("type"))?;
        let resize_path = row
            .resize_path
            .ok_or(AssetError::MissingField("resizePath"))?;
        if resize_path.trim().is_empty() {
            return Err(AssetError::EmptyField {
                id,
                field: "resizePath",
            });
        }
        Ok(Self {
            id,
            asset_type,
            resize_path,
            is_face_detected: row.is_face_detected,
        })
    }
}

impl AssetDescriptor {
    pub fn is_image(&self) -> bool {
        self.asset_type == AssetType::Image
    }

    /// Resolves the asset's image against `media_root`.
    pub fn image_ref(&self, media_root: &Path) -> ImageRef {
        ImageRef {
            asset_id: self.id.clone(),
            path: resolve_media_path(media_root, &self.resize_path),
        }
    }
}

/// Locator of a source image, carried through detection and clustering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub asset_id: String,
    pub path: PathBuf,
}

impl ImageRef {
    pub fn new(asset_id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            asset_id: asset_id.into(),
            path: path.into(),
        }
    }
}

/// Maps a stored path onto the local filesystem.
///
/// Absolute paths are kept. Relative paths, with or without a leading
/// `./`, are joined onto `media_root`.
pub fn resolve_media_path(media_root: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let relative = path.strip_prefix(".").unwrap_or(path);
    media_root.join(relative)
}
