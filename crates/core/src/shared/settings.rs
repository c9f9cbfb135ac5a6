use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::constants::{
    APP_DIR_NAME, CROP_SIZE, DEFAULT_CONFIDENCE, DEFAULT_EPS, DEFAULT_MIN_SAMPLES_PER_CLUSTER,
    MAX_SAMPLES_PER_IDENTITY,
};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Detection-stage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Face detector confidence threshold (0.0-1.0).
    pub confidence: f64,
    /// Optional directory that receives every detected face crop.
    pub face_crop_dir: Option<PathBuf>,
    pub detector_model: Option<PathBuf>,
    pub encoder_model: Option<PathBuf>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            confidence: DEFAULT_CONFIDENCE,
            face_crop_dir: None,
            detector_model: None,
            encoder_model: None,
        }
    }
}

/// Clustering-stage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSettings {
    pub eps: f64,
    pub min_samples_per_cluster: usize,
    pub max_samples_per_identity: usize,
    pub crop_size: u32,
    /// Fixed seed for representative sampling; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl Default for ClusterSettings {
    fn default() -> Self {
        Self {
            eps: DEFAULT_EPS,
            min_samples_per_cluster: DEFAULT_MIN_SAMPLES_PER_CLUSTER,
            max_samples_per_identity: MAX_SAMPLES_PER_IDENTITY,
            crop_size: CROP_SIZE,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root that relative asset paths resolve against.
    pub media_root: PathBuf,
    /// JSON manifest listing the asset rows to process.
    pub asset_manifest: PathBuf,
    /// Encoding artifact shared by detection and clustering.
    pub artifact_path: PathBuf,
    /// Output directory for representative identity crops.
    pub faces_dir: PathBuf,
    pub detection: DetectionSettings,
    pub clustering: ClusterSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("."),
            asset_manifest: PathBuf::from("assets.json"),
            artifact_path: PathBuf::from("encodings.json"),
            faces_dir: PathBuf::from("upload/faces"),
            detection: DetectionSettings::default(),
            clustering: ClusterSettings::default(),
        }
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("settings.json"))
    }

    /// Loads settings from `path`. Missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path).map_err(|e| SettingsError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Loads an explicit settings file, else the platform default file if
    /// present, else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let d = &self.detection;
        let c = &self.clustering;
        if !(0.0..=1.0).contains(&d.confidence) {
            return Err(SettingsError::Invalid(format!(
                "confidence must be between 0.0 and 1.0, got {}",
                d.confidence
            )));
        }
        if !(c.eps.is_finite() && c.eps > 0.0) {
            return Err(SettingsError::Invalid(format!(
                "eps must be a positive number, got {}",
                c.eps
            )));
        }
        if c.min_samples_per_cluster == 0 {
            return Err(SettingsError::Invalid(
                "min_samples_per_cluster must be at least 1".into(),
            ));
        }
        if c.max_samples_per_identity == 0 {
            return Err(SettingsError::Invalid(
                "max_samples_per_identity must be at least 1".into(),
            ));
        }
        if c.crop_size == 0 {
            return Err(SettingsError::Invalid("crop_size must be positive".into()));
        }
        Ok(())
    }
}
