use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::detection_record::{DetectionRecord, EmbeddingDimensionError};

#[derive(Error, Debug)]
pub enum EncodingStoreError {
    #[error("no encoding artifact at {0}; run detection first")]
    Missing(PathBuf),
    #[error("failed to read encoding artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write encoding artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode artifact {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("corrupt encoding artifact {path}: {source}")]
    Deserialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unsupported artifact version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
    #[error(transparent)]
    Dimension(#[from] EmbeddingDimensionError),
}

/// Durable home of the detection output.
///
/// `save` replaces the whole collection; readers never observe a
/// partially written artifact.
pub trait EncodingStore: Send + Sync {
    fn save(&self, records: &[DetectionRecord]) -> Result<(), EncodingStoreError>;
    fn load(&self) -> Result<Vec<DetectionRecord>, EncodingStoreError>;
}
