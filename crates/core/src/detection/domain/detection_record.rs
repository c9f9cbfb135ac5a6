use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::domain::asset::ImageRef;
use crate::shared::face_location::FaceLocation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record {index} has a {found}-dimensional embedding, expected {expected}")]
pub struct EmbeddingDimensionError {
    pub index: usize,
    pub expected: usize,
    pub found: usize,
}

/// One detected face: where it was found and its identity embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub image_reference: ImageRef,
    pub face_location: FaceLocation,
    pub embedding: Vec<f32>,
}

/// Shared embedding length of a batch, `None` for an empty batch.
pub fn embedding_dimension(
    records: &[DetectionRecord],
) -> Result<Option<usize>, EmbeddingDimensionError> {
    let Some(first) = records.first() else {
        return Ok(None);
    };
    let expected = first.embedding.len();
    for (index, record) in records.iter().enumerate().skip(1) {
        if record.embedding.len() != expected {
            return Err(EmbeddingDimensionError {
                index,
                expected,
                found: record.embedding.len(),
            });
        }
    }
    Ok(Some(expected))
}
