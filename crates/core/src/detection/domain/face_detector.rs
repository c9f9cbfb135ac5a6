use crate::shared::face_location::FaceLocation;
use crate::shared::frame::Frame;

/// Domain interface for locating faces in a single image.
///
/// Implementations may keep inference state between calls, hence `&mut self`.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceLocation>, Box<dyn std::error::Error>>;
}
