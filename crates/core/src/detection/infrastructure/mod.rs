pub mod arcface_encoder;
pub mod math;
mod onnx_session;
pub mod onnx_yolo_detector;
