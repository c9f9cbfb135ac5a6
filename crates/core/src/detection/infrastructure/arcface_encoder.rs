/// ArcFace face encoder using ONNX Runtime.
///
/// Produces L2-normalized 512-dimensional embeddings, so Euclidean
/// distance between two faces lies in `[0, 2]`.
use std::path::Path;
use std::sync::Mutex;

use crate::detection::domain::face_encoder::FaceEncoder;
use crate::detection::infrastructure::math::l2_normalize;
use crate::detection::infrastructure::onnx_session::build_session;
use crate::shared::frame::{Frame, CHANNELS};

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEncoder {
    session: Mutex<ort::session::Session>,
}

impl ArcFaceEncoder {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            session: Mutex::new(build_session(model_path)?),
        })
    }
}

impl FaceEncoder for ArcFaceEncoder {
    fn encode(&self, face: &Frame) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let tensor = preprocess(face);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| format!("Lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let mut embedding = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?
            .to_vec();

        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Resize the face crop to 112x112, normalize to `[-1, 1]`, NCHW layout.
fn preprocess(face: &Frame) -> ndarray::Array4<f32> {
    let src_w = face.width() as usize;
    let src_h = face.height() as usize;
    let data = face.data();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));
    if src_w == 0 || src_h == 0 {
        return tensor;
    }

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * CHANNELS;
            for c in 0..CHANNELS {
                tensor[[0, c, y, x]] = (data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn uniform(w: u32, h: u32, value: u8) -> Frame {
        Frame::new(vec![value; (w * h * 3) as usize], w, h)
    }

    #[test]
    fn test_preprocess_shape() {
        let tensor = preprocess(&uniform(50, 70, 128));
        assert_eq!(tensor.shape(), &[1, 3, 112, 112]);
    }

    #[test]
    fn test_preprocess_normalization_bounds() {
        assert_relative_eq!(preprocess(&uniform(10, 10, 255))[[0, 0, 0, 0]], 1.0);
        assert_relative_eq!(preprocess(&uniform(10, 10, 0))[[0, 2, 111, 111]], -1.0);
    }

    #[test]
    fn test_preprocess_channel_order_is_rgb() {
        let face = Frame::new([10u8, 20, 30].repeat(4), 2, 2);
        let tensor = preprocess(&face);
        assert_relative_eq!(tensor[[0, 0, 5, 5]], (10.0 - NORM_MEAN) / NORM_STD);
        assert_relative_eq!(tensor[[0, 2, 5, 5]], (30.0 - NORM_MEAN) / NORM_STD);
    }
}
