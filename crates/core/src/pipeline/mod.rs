pub mod cluster_faces_use_case;
pub mod cluster_manifest;
pub mod detect_faces_use_case;
pub mod pipeline_logger;
