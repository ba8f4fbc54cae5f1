pub const YOLO_MODEL_NAME: &str = "yolo11n-pose_widerface.onnx";
pub const YOLO_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/yolo11n-pose_widerface.onnx";

pub const EMBEDDING_MODEL_NAME: &str = "w600k_r50.onnx";
pub const EMBEDDING_MODEL_URL: &str =
    "https://github.com/neutrinographics/faceguard/releases/download/v0.1.0/w600k_r50.onnx";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Bucket for images with no detected or no matched faces.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// A category qualifies when its share of matched faces is strictly above this.
pub const DEFAULT_VOTE_THRESHOLD: f64 = 0.3;

pub const DEFAULT_GALLERY_FILENAME: &str = "all_face_encodings.json";

/// Archive tooling on macOS leaves these behind next to real photos.
pub const METADATA_DIR_NAME: &str = "__MACOSX";
pub const APPLE_DOUBLE_PREFIX: &str = "._";
