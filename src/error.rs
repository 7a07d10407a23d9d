use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No face detected: landmark input is empty")]
    NoFaceDetected,

    #[error("Insufficient landmarks: found {found}, analysis requires {required}")]
    InsufficientLandmarks { found: usize, required: usize },

    #[error("Landmark count mismatch: found {found}, {model} has {expected} points")]
    LandmarkCountMismatch {
        model: &'static str,
        found: usize,
        expected: usize,
    },

    #[error("Unknown landmark model: {0}")]
    UnknownModel(String),

    #[error("Invalid region map for {model}: region {region} uses index {index} but the model has {point_count} points")]
    InvalidRegionMap {
        model: &'static str,
        region: &'static str,
        index: usize,
        point_count: usize,
    },

    #[error("Image is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
