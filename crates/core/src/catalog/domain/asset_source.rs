use crate::catalog::domain::asset::AssetDescriptor;

/// Upstream store of asset rows.
///
/// Implementations acquire their backing connection per call and release
/// it before returning; nothing is held between calls.
pub trait AssetSource: Send {
    fn list_assets(&self) -> Result<Vec<AssetDescriptor>, Box<dyn std::error::Error>>;
}

/// Image assets due for detection.
///
/// Without `include_processed`, assets already flagged as face-detected
/// are left out.
pub fn select_images(assets: Vec<AssetDescriptor>, include_processed: bool) -> Vec<AssetDescriptor> {
    assets
        .into_iter()
        .filter(|a| a.is_image() && (include_processed || !a.is_face_detected))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::asset::AssetType;

    fn asset(id: &str, asset_type: AssetType, detected: bool) -> AssetDescriptor {
        AssetDescriptor {
            id: id.into(),
            asset_type,
            resize_path: format!("{id}.jpg"),
            is_face_detected: detected,
        }
    }

    fn ids(assets: &[AssetDescriptor]) -> Vec<&str> {
        assets.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_skips_non_images_and_processed() {
        let assets = vec![
            asset("a", AssetType::Image, false),
            asset("b", AssetType::Video, false),
            asset("c", AssetType::Image, true),
            asset("d", AssetType::Image, false),
        ];
        assert_eq!(ids(&select_images(assets, false)), vec!["a", "d"]);
    }

    #[test]
    fn test_include_processed_keeps_detected_images() {
        let assets = vec![
            asset("a", AssetType::Image, true),
            asset("b", AssetType::Audio, false),
        ];
        assert_eq!(ids(&select_images(assets, true)), vec!["a"]);
    }
}
