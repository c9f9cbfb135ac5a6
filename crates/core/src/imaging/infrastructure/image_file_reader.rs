use std::path::Path;

use crate::imaging::domain::image_reader::{ImageReadError, ImageReader};
use crate::shared::frame::Frame;

/// Decodes image files with the `image` crate and converts them to RGB.
///
/// Format detection sniffs the file header, so mislabelled extensions
/// still decode.
pub struct ImageFileReader;

impl ImageFileReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageReader for ImageFileReader {
    fn read(&self, path: &Path) -> Result<Frame, ImageReadError> {
        if !path.is_file() {
            return Err(ImageReadError::NotFound(path.to_path_buf()));
        }

        let reader = image::ImageReader::open(path)
            .and_then(|r| r.with_guessed_format())
            .map_err(|e| io_error(path, e))?;

        let decoded = reader.decode().map_err(|e| decode_error(path, e))?;
        Ok(Frame::from_rgb_image(decoded.to_rgb8()))
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ImageReadError {
    if source.kind() == std::io::ErrorKind::OutOfMemory {
        return ImageReadError::ResourceLimit {
            path: path.to_path_buf(),
            reason: source.to_string(),
        };
    }
    ImageReadError::Unreadable {
        path: path.to_path_buf(),
        source,
    }
}

fn decode_error(path: &Path, source: image::ImageError) -> ImageReadError {
    match source {
        image::ImageError::Limits(e) => ImageReadError::ResourceLimit {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
        image::ImageError::IoError(e) => io_error(path, e),
        other => ImageReadError::Decode {
            path: path.to_path_buf(),
            source: other,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let mut img = image::RgbImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([50, 100, 200]);
        }
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_reads_dimensions_and_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "face.png", 100, 80);

        let frame = ImageFileReader::new().read(&path).unwrap();
        assert_eq!(frame.width(), 100);
        assert_eq!(frame.height(), 80);
        assert_eq!(&frame.data()[..3], &[50, 100, 200]);
    }

    #[test]
    fn test_grayscale_converted_to_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gray.png");
        image::GrayImage::from_pixel(4, 4, image::Luma([77])).save(&path).unwrap();

        let frame = ImageFileReader::new().read(&path).unwrap();
        assert_eq!(frame.data().len(), 4 * 4 * 3);
        assert_eq!(&frame.data()[..3], &[77, 77, 77]);
    }

    #[test]
    fn test_wrong_extension_still_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_test_image(dir.path(), "real.png", 8, 8);
        let renamed = dir.path().join("mislabelled.jpg");
        std::fs::rename(&png, &renamed).unwrap();

        assert!(ImageFileReader::new().read(&renamed).is_ok());
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = ImageFileReader::new()
            .read(Path::new("/nonexistent/test.png"))
            .unwrap_err();
        assert!(matches!(err, ImageReadError::NotFound(_)));
        assert!(err.is_skippable());
    }

    #[test]
    fn test_corrupt_file_is_skippable_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"\xFF\xD8\xFF\xE0 definitely not a jpeg").unwrap();

        let err = ImageFileReader::new().read(&path).unwrap_err();
        assert!(err.is_skippable());
        assert!(!matches!(err, ImageReadError::NotFound(_)));
    }
}
