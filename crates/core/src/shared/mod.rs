pub mod constants;
pub mod face_location;
pub mod frame;
pub mod model_resolver;
pub mod settings;
