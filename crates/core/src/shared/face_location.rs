use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaceLocationError {
    #[error("degenerate face box: top={top} bottom={bottom} left={left} right={right}")]
    Degenerate {
        top: u32,
        right: u32,
        bottom: u32,
        left: u32,
    },
}

/// Axis-aligned face bounding box in pixel coordinates.
///
/// Edges are half-open: rows `top..bottom` and columns `left..right`
/// belong to the face, so `bottom <= height` and `right <= width` for a
/// box inside its image.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceLocation {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl FaceLocation {
    pub fn new(top: u32, right: u32, bottom: u32, left: u32) -> Result<Self, FaceLocationError> {
        if top >= bottom || left >= right {
            return Err(FaceLocationError::Degenerate {
                top,
                right,
                bottom,
                left,
            });
        }
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// Builds a location from detector coordinates `(x1, y1, x2, y2)`,
    /// clamped to a `frame_width` x `frame_height` image.
    ///
    /// Returns `None` when nothing of the box remains inside the image.
    pub fn from_bbox(
        bbox: (f64, f64, f64, f64),
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let (x1, y1, x2, y2) = bbox;
        let clamp = |v: f64, max: u32| v.round().clamp(0.0, max as f64) as u32;

        let left = clamp(x1, frame_width);
        let top = clamp(y1, frame_height);
        let right = clamp(x2, frame_width);
        let bottom = clamp(y2, frame_height);

        Self::new(top, right, bottom, left).ok()
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }

    pub fn area(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }

    /// Shrinks the box to the image bounds; `None` if it lies fully outside.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        Self::new(
            self.top.min(height),
            self.right.min(width),
            self.bottom.min(height),
            self.left.min(width),
        )
        .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_new_accepts_valid_box() {
        let loc = FaceLocation::new(10, 50, 40, 20).unwrap();
        assert_eq!(loc.width(), 30);
        assert_eq!(loc.height(), 30);
        assert_eq!(loc.area(), 900);
    }

    #[rstest]
    #[case(10, 50, 10, 20)]
    #[case(40, 50, 10, 20)]
    #[case(10, 20, 40, 20)]
    #[case(10, 10, 40, 20)]
    fn test_new_rejects_degenerate(
        #[case] top: u32,
        #[case] right: u32,
        #[case] bottom: u32,
        #[case] left: u32,
    ) {
        assert!(FaceLocation::new(top, right, bottom, left).is_err());
    }

    #[test]
    fn test_from_bbox_rounds_and_clamps() {
        let loc = FaceLocation::from_bbox((-5.0, 10.4, 120.0, 60.6), 100, 80).unwrap();
        assert_eq!(loc.left, 0);
        assert_eq!(loc.top, 10);
        assert_eq!(loc.right, 100);
        assert_eq!(loc.bottom, 61);
    }

    #[test]
    fn test_from_bbox_outside_frame_is_none() {
        assert!(FaceLocation::from_bbox((150.0, 10.0, 200.0, 50.0), 100, 100).is_none());
    }

    #[test]
    fn test_clamp_to_shrinks_overhanging_box() {
        let loc = FaceLocation::new(10, 120, 90, 50).unwrap();
        let clamped = loc.clamp_to(100, 80).unwrap();
        assert_eq!(clamped, FaceLocation::new(10, 100, 80, 50).unwrap());
    }

    #[test]
    fn test_clamp_to_outside_is_none() {
        let loc = FaceLocation::new(200, 300, 250, 210).unwrap();
        assert!(loc.clamp_to(100, 100).is_none());
    }

    #[test]
    fn test_serde_field_names() {
        let loc = FaceLocation::new(1, 4, 3, 2).unwrap();
        let json = serde_json::to_value(loc).unwrap();
        assert_eq!(json["top"], 1);
        assert_eq!(json["right"], 4);
        assert_eq!(json["bottom"], 3);
        assert_eq!(json["left"], 2);
    }
}
