use ndarray::ArrayView3;

use crate::shared::face_location::FaceLocation;

/// A decoded image: contiguous RGB bytes in row-major order.
///
/// Color conversion happens in the image reader; everything downstream
/// assumes three interleaved channels.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_rgb_image(image: image::RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Copies the pixels inside `location`, clamped to the frame.
    ///
    /// Returns `None` when the location lies entirely outside the frame.
    pub fn crop(&self, location: &FaceLocation) -> Option<Frame> {
        let loc = location.clamp_to(self.width, self.height)?;
        let row_bytes = self.width as usize * CHANNELS;
        let start_col = loc.left as usize * CHANNELS;
        let end_col = loc.right as usize * CHANNELS;

        let mut data = Vec::with_capacity(loc.area() as usize * CHANNELS);
        for row in loc.top as usize..loc.bottom as usize {
            let offset = row * row_bytes;
            data.extend_from_slice(&self.data[offset + start_col..offset + end_col]);
        }
        Some(Frame::new(data, loc.width(), loc.height()))
    }

    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
    }
}
