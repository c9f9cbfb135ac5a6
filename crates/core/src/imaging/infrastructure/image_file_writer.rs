use std::path::Path;

use crate::imaging::domain::image_writer::ImageWriter;
use crate::shared::frame::Frame;

/// Writes frames with the `image` crate; format follows the extension.
pub struct ImageFileWriter;

impl ImageFileWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ImageFileWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageWriter for ImageFileWriter {
    fn write(
        &self,
        path: &Path,
        frame: &Frame,
        size: Option<u32>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let img = frame
            .to_rgb_image()
            .ok_or("Failed to create image from frame data")?;

        let img = match size {
            Some(side) => {
                image::imageops::resize(&img, side, side, image::imageops::FilterType::Triangle)
            }
            None => img,
        };

        img.save(path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_frame(width: u32, height: u32, rgb: [u8; 3]) -> Frame {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take((width * height * 3) as usize)
            .collect();
        Frame::new(data, width, height)
    }

    #[test]
    fn test_write_creates_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("3").join("out.png");
        ImageFileWriter::new()
            .write(&path, &make_frame(10, 8, [50, 100, 200]), None)
            .unwrap();
        assert!(path.exists());

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (10, 8));
        assert_eq!(img.get_pixel(0, 0).0, [50, 100, 200]);
    }

    #[test]
    fn test_write_resizes_to_square() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crop.jpg");
        ImageFileWriter::new()
            .write(&path, &make_frame(40, 70, [128, 128, 128]), Some(96))
            .unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!(img.width(), 96);
        assert_eq!(img.height(), 96);
    }

    #[test]
    fn test_unknown_extension_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.notaformat");
        assert!(ImageFileWriter::new()
            .write(&path, &make_frame(4, 4, [0, 0, 0]), None)
            .is_err());
    }
}
