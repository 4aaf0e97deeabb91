use thiserror::Error;

/// Reasons a mask cannot yield a tear arc.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("mask contains no foreground pixels")]
    NoForeground,

    #[error("degenerate contour: {points} points enclosing area {area:.1}")]
    DegenerateContour { points: usize, area: f64 },

    #[error("found {found} corner candidates, need at least 2")]
    TooFewCorners { found: usize },

    #[error("longest irregular arc is {length:.1}px, shorter than the {minimum:.1}px minimum")]
    ArcTooShort { length: f64, minimum: f64 },
}

/// Degenerate geometry met while resampling an arc.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignatureError {
    #[error("arc has {0} points, need at least 2")]
    TooFewPoints(usize),

    #[error("arc has zero length")]
    ZeroArcLength,

    #[error("arc endpoints coincide, chord length is zero")]
    CoincidentEndpoints,

    #[error("resolution {0} is below the minimum of 2 samples")]
    InvalidResolution(usize),
}

#[derive(Error, Debug)]
pub enum TearMatchingError {
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Signature error: {0}")]
    Signature(#[from] SignatureError),

    #[error("Identifier already present in store: {0}")]
    DuplicateIdentifier(String),

    #[error("Cannot match against an empty store")]
    EmptyStore,

    #[error("Incompatible signatures: {0}")]
    IncompatibleSignatures(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported store format version {found} (expected {expected})")]
    UnsupportedFormatVersion { found: u32, expected: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, TearMatchingError>;
