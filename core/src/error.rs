use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type for fibresem operations
pub type Result<T> = std::result::Result<T, FibresemError>;

/// Error types for fibresem operations
///
/// Only [`FibresemError::FileRead`] is fatal for an image; every other variant
/// degrades to a sentinel value or skips a single step for that image.
#[derive(Error, Debug)]
pub enum FibresemError {
    /// File could not be opened or is not a readable TIFF
    #[error("Could not read {}: {message}", path.display())]
    FileRead { path: PathBuf, message: String },

    /// Embedded metadata block is present but not decodable as text
    #[error("Metadata parse error: {0}")]
    MetadataParse(String),

    /// "Image Pixel Size" value is not of the form "<number> <unit>"
    #[error("Calibration format error: {0}")]
    CalibrationFormat(String),

    /// Unit missing from the conversion table
    #[error("Unsupported unit: {0}")]
    UnsupportedUnit(String),

    /// Crop window would be empty or exceed the image
    #[error("Crop bounds error: height={height}, width={width}, bar height={bar_height}")]
    CropBounds {
        height: u32,
        width: u32,
        bar_height: f64,
    },

    /// External diameter engine failure
    #[error("Engine error: {0}")]
    Engine(String),

    /// External diameter engine process is gone
    #[error("Engine exited: {0}")]
    EngineExited(String),

    /// External diameter engine did not answer in time
    #[error("Engine timed out after {0:?}")]
    EngineTimeout(Duration),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl FibresemError {
    /// Builds a [`FibresemError::FileRead`] for `path`
    pub fn file_read(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        FibresemError::FileRead {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether processing of the current image can continue after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, FibresemError::FileRead { .. } | FibresemError::IoError(_))
    }
}

// Helper conversions
impl From<String> for FibresemError {
    fn from(s: String) -> Self {
        FibresemError::Engine(s)
    }
}

impl From<&str> for FibresemError {
    fn from(s: &str) -> Self {
        FibresemError::Engine(s.to_string())
    }
}
