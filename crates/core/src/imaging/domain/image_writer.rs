use std::path::Path;

use crate::shared::frame::Frame;

/// Persists a frame as an image file.
pub trait ImageWriter: Send + Sync {
    /// Writes `frame` to `path`, resampled to `size` x `size` when given.
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<u32>,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
