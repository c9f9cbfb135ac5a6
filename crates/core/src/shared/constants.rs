pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

/// Directory name used under the platform cache/config roots.
pub const APP_DIR_NAME: &str = "FaceCluster";

/// Side length of the square representative crops written per identity.
pub const CROP_SIZE: u32 = 96;

/// Upper bound on representative crops sampled per identity.
pub const MAX_SAMPLES_PER_IDENTITY: usize = 25;

/// DBSCAN neighborhood size, the point itself included.
pub const DEFAULT_MIN_SAMPLES_PER_CLUSTER: usize = 5;

/// DBSCAN neighborhood radius in embedding space.
///
/// Embeddings are L2-normalized, so 1.0 corresponds to a cosine
/// similarity of 0.5.
pub const DEFAULT_EPS: f64 = 1.0;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

pub const CLUSTER_MANIFEST_NAME: &str = "clusters.json";
