pub mod detection_record;
pub mod face_detector;
pub mod face_encoder;
