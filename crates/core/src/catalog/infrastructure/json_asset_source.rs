use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::catalog::domain::asset::{AssetDescriptor, RawAssetRow};
use crate::catalog::domain::asset_source::AssetSource;

/// Reads asset rows from a JSON array on disk.
///
/// The manifest is opened fresh on every call, so edits between runs are
/// picked up and no handle outlives an operation. Rows failing validation
/// are logged and dropped.
pub struct JsonAssetSource {
    path: PathBuf,
}

impl JsonAssetSource {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl AssetSource for JsonAssetSource {
    fn list_assets(&self) -> Result<Vec<AssetDescriptor>, Box<dyn std::error::Error>> {
        let file = File::open(&self.path)
            .map_err(|e| format!("Cannot open asset manifest {}: {e}", self.path.display()))?;
        let rows: Vec<RawAssetRow> = serde_json::from_reader(BufReader::new(file))?;

        let total = rows.len();
        let assets: Vec<AssetDescriptor> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(i, row)| match AssetDescriptor::try_from(row) {
                Ok(asset) => Some(asset),
                Err(e) => {
                    log::warn!("Skipping asset row {i}: {e}");
                    None
                }
            })
            .collect();

        log::debug!(
            "Loaded {}/{} asset rows from {}",
            assets.len(),
            total,
            self.path.display()
        );
        Ok(assets)
    }
}
