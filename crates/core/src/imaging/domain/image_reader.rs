use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::frame::Frame;

/// Why an image could not be loaded.
///
/// Missing, unreadable and corrupt files are expected in a photo library
/// and are skipped by batch jobs. Hitting decoder resource limits is not:
/// it signals a configuration or memory problem and must propagate.
#[derive(Error, Debug)]
pub enum ImageReadError {
    #[error("image not found: {0}")]
    NotFound(PathBuf),
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("resource limit exceeded while decoding {path}: {reason}")]
    ResourceLimit { path: PathBuf, reason: String },
}

impl ImageReadError {
    pub fn is_skippable(&self) -> bool {
        !matches!(self, ImageReadError::ResourceLimit { .. })
    }
}

/// Loads an image from disk as an RGB [`Frame`].
pub trait ImageReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Frame, ImageReadError>;
}
