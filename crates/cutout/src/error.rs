use thiserror::Error;

/// Failures surfaced by the cutout pipeline.
///
/// Each variant is a distinct condition so callers (an HTTP layer, the CLI)
/// can map them to their own status codes without string matching.
#[derive(Error, Debug)]
pub enum CutoutError {
    /// Input bytes are empty or not a decodable raster image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// A custom background colour is not six hex digits.
    #[error("Invalid colour '{0}': expected six hex digits, optionally prefixed with '#'")]
    InvalidColor(String),

    /// A background mode other than `transparent`, `white` or `custom` was requested.
    #[error("Unknown background mode '{0}'")]
    InvalidBackground(String),

    /// No persisted crop exists for the identifier. Raised by object stores only.
    #[error("No extracted object with id '{0}'")]
    NotFound(String),

    /// An identifier token that does not have the `object-<n>` shape.
    #[error("Malformed object id '{0}'")]
    InvalidId(String),

    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CutoutError>;
