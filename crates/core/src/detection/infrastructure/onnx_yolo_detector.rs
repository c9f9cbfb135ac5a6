/// YOLO face detector using ONNX Runtime via `ort`.
///
/// Letterboxes the image to the model resolution, runs inference, filters
/// by confidence, applies NMS and maps boxes back to image coordinates.
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::math::bbox_iou;
use crate::detection::infrastructure::onnx_session::{build_session, square_input_size};
use crate::shared::face_location::FaceLocation;
use crate::shared::frame::Frame;

/// Fallback input resolution when the model shape is dynamic.
const DEFAULT_INPUT_SIZE: u32 = 640;

const NMS_IOU_THRESH: f64 = 0.45;

/// Letterbox padding value (YOLO convention).
const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct OnnxYoloDetector {
    session: ort::session::Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxYoloDetector {
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let input_size = square_input_size(&session).unwrap_or(DEFAULT_INPUT_SIZE);
        log::debug!("YOLO input size: {input_size}");
        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

impl FaceDetector for OnnxYoloDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceLocation>, Box<dyn std::error::Error>> {
        let mut letterboxed = letterbox(frame, self.input_size);

        let input_value = ort::value::Tensor::from_array(std::mem::take(&mut letterboxed.tensor))?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() == 0 {
            return Err("YOLO model produced no outputs".into());
        }
        let tensor = outputs[0].try_extract_array::<f32>()?;
        let shape = tensor.shape().to_vec();
        let data = tensor.as_slice().ok_or("Cannot get tensor slice")?;

        let mut candidates = parse_output(data, &shape, self.confidence)?;
        for c in &mut candidates {
            c.bbox = letterboxed.unmap(c.bbox);
        }

        Ok(nms(&mut candidates, NMS_IOU_THRESH)
            .into_iter()
            .filter_map(|c| {
                let [x1, y1, x2, y2] = c.bbox;
                FaceLocation::from_bbox((x1, y1, x2, y2), frame.width(), frame.height())
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

struct Letterboxed {
    tensor: ndarray::Array4<f32>,
    scale: f64,
    pad_x: u32,
    pad_y: u32,
}

impl Letterboxed {
    /// Maps a box from model input space back to source image space.
    fn unmap(&self, bbox: [f64; 4]) -> [f64; 4] {
        let (px, py) = (self.pad_x as f64, self.pad_y as f64);
        [
            (bbox[0] - px) / self.scale,
            (bbox[1] - py) / self.scale,
            (bbox[2] - px) / self.scale,
            (bbox[3] - py) / self.scale,
        ]
    }
}

/// Aspect-preserving nearest-neighbor resize into a padded
/// `target_size` x `target_size` NCHW tensor with values in `[0, 1]`.
fn letterbox(frame: &Frame, target_size: u32) -> Letterboxed {
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let target = target_size as f64;

    let scale = (target / fw).min(target / fh);
    let new_w = ((fw * scale).round() as u32).min(target_size);
    let new_h = ((fh * scale).round() as u32).min(target_size);
    let pad_x = (target_size - new_w) / 2;
    let pad_y = (target_size - new_h) / 2;

    let mut tensor = ndarray::Array4::<f32>::from_elem(
        (1, 3, target_size as usize, target_size as usize),
        PAD_VALUE,
    );

    let src = frame.as_ndarray();
    let src_h = frame.height() as usize;
    let src_w = frame.width() as usize;

    for y in 0..new_h as usize {
        let src_y = ((y as f64 / scale) as usize).min(src_h - 1);
        for x in 0..new_w as usize {
            let src_x = ((x as f64 / scale) as usize).min(src_w - 1);
            let ty = pad_y as usize + y;
            let tx = pad_x as usize + x;
            for c in 0..3 {
                tensor[[0, c, ty, tx]] = src[[src_y, src_x, c]] as f32 / 255.0;
            }
        }
    }

    Letterboxed {
        tensor,
        scale,
        pad_x,
        pad_y,
    }
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct Candidate {
    bbox: [f64; 4],
    confidence: f64,
}

/// Decodes `[1, features, detections]` or `[1, detections, features]`
/// output whose rows start with `cx, cy, w, h, conf`.
fn parse_output(
    data: &[f32],
    shape: &[usize],
    min_confidence: f64,
) -> Result<Vec<Candidate>, Box<dyn std::error::Error>> {
    if shape.len() != 3 {
        return Err(format!("Unexpected YOLO output shape: {shape:?}").into());
    }
    let transposed = shape[1] < shape[2];
    let (num_dets, num_feats) = if transposed {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if num_feats < 5 {
        return Ok(Vec::new());
    }

    let feature = |det: usize, f: usize| -> f64 {
        if transposed {
            data[f * num_dets + det] as f64
        } else {
            data[det * num_feats + f] as f64
        }
    };

    Ok((0..num_dets)
        .filter_map(|i| {
            let confidence = feature(i, 4);
            if confidence < min_confidence {
                return None;
            }
            let (cx, cy, w, h) = (feature(i, 0), feature(i, 1), feature(i, 2), feature(i, 3));
            Some(Candidate {
                bbox: [cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0],
                confidence,
            })
        })
        .collect())
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(candidates: &mut [Candidate], iou_thresh: f64) -> Vec<Candidate> {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<Candidate> = Vec::new();
    for c in candidates.iter() {
        if keep.iter().all(|k| bbox_iou(&k.bbox, &c.bbox) <= iou_thresh) {
            keep.push(c.clone());
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(bbox: [f64; 4], confidence: f64) -> Candidate {
        Candidate { bbox, confidence }
    }

    #[test]
    fn test_letterbox_preserves_aspect_ratio() {
        let frame = Frame::new(vec![128u8; 200 * 100 * 3], 200, 100);
        let lb = letterbox(&frame, 640);

        assert_eq!(lb.tensor.shape(), &[1, 3, 640, 640]);
        assert!((lb.scale - 3.2).abs() < 0.01);
        assert_eq!(lb.pad_x, 0);
        assert_eq!(lb.pad_y, 160);
    }

    #[test]
    fn test_letterbox_pixels_and_padding() {
        let frame = Frame::new(vec![255u8; 100 * 50 * 3], 100, 50);
        let lb = letterbox(&frame, 640);

        let y = lb.pad_y as usize + 1;
        assert!((lb.tensor[[0, 0, y, 1]] - 1.0).abs() < 0.01);
        assert!((lb.tensor[[0, 0, 0, 0]] - PAD_VALUE).abs() < 0.01);
    }

    #[test]
    fn test_unmap_inverts_letterbox() {
        let frame = Frame::new(vec![0u8; 200 * 100 * 3], 200, 100);
        let lb = letterbox(&frame, 640);
        // (10, 20)-(50, 60) in source space → scaled by 3.2, shifted by pad_y.
        let model_box = [32.0, 64.0 + 160.0, 160.0, 192.0 + 160.0];
        let [x1, y1, x2, y2] = lb.unmap(model_box);
        assert!((x1 - 10.0).abs() < 1e-9);
        assert!((y1 - 20.0).abs() < 1e-9);
        assert!((x2 - 50.0).abs() < 1e-9);
        assert!((y2 - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_output_row_major() {
        // Six detections, five features each; only the first is confident.
        let mut data = vec![
            50.0, 50.0, 20.0, 40.0, 0.9, //
        ];
        for _ in 0..5 {
            data.extend_from_slice(&[10.0, 10.0, 4.0, 4.0, 0.1]);
        }
        let parsed = parse_output(&data, &[1, 6, 5], 0.25).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].bbox, [40.0, 30.0, 60.0, 70.0]);
    }

    #[test]
    fn test_parse_output_transposed() {
        // Features-major layout: 5 features x 8 detections, only det 3 confident.
        let num_dets = 8;
        let mut data = vec![0.0f32; 5 * num_dets];
        for (f, v) in [100.0, 80.0, 10.0, 10.0, 0.8].iter().enumerate() {
            data[f * num_dets + 3] = *v;
        }
        let parsed = parse_output(&data, &[1, 5, num_dets], 0.5).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].bbox, [95.0, 75.0, 105.0, 85.0]);
    }

    #[test]
    fn test_parse_output_rejects_bad_rank() {
        assert!(parse_output(&[0.0; 4], &[4], 0.5).is_err());
    }

    #[test]
    fn test_nms_suppresses_overlapping() {
        let mut dets = vec![
            candidate([0.0, 0.0, 100.0, 100.0], 0.8),
            candidate([5.0, 5.0, 105.0, 105.0], 0.9),
        ];
        let kept = nms(&mut dets, 0.3);
        assert_eq!(kept.len(), 1);
        assert!((kept[0].confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_nms_keeps_non_overlapping() {
        let mut dets = vec![
            candidate([0.0, 0.0, 50.0, 50.0], 0.9),
            candidate([200.0, 200.0, 250.0, 250.0], 0.8),
        ];
        assert_eq!(nms(&mut dets, 0.3).len(), 2);
    }

    #[test]
    fn test_nms_empty_input() {
        assert!(nms(&mut [], 0.3).is_empty());
    }
}
