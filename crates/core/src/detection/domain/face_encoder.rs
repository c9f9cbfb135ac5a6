use crate::shared::frame::Frame;

/// Domain interface for turning a face crop into an identity embedding.
///
/// Every call on one encoder must return vectors of the same length.
pub trait FaceEncoder: Send {
    fn encode(&self, face: &Frame) -> Result<Vec<f32>, Box<dyn std::error::Error>>;
}
