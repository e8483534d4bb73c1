use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpecimenError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Invalid image: {width}x{height} has no pixels")]
    InvalidImage { width: u32, height: u32 },

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpecimenError>;
