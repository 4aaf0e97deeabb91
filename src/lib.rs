//! Tear Matching Library
//!
//! Finds which torn paper fragments belong together by comparing the shape of
//! their torn edges.
//!
//! ## Pipeline
//!
//! 1. **Mask preparation** (`image::loader::FragmentMask`)
//!    - Grayscale, optional resize, Gaussian blur, threshold
//!
//! 2. **Tear extraction** (`image::extractor::BoundaryExtractor`)
//!    - Traces the outer contour and classifies every point as straight or irregular
//!    - The longest strongly irregular run between two corners is the tear
//!
//! 3. **Signature building** (`signature::SignatureBuilder`)
//!    - Resamples the tear to N points at uniform arc length
//!    - Records each point's signed distance from the corner-to-corner chord,
//!      scaled by the chord length so fragment size drops out
//!
//! 4. **Matching** (`matching::MatchEngine`)
//!    - Minimum distance over reversed and inverted orientations, plus every
//!      circular shift for closed tears (found via FFT cross-correlation)
//!    - One-vs-many, all-pairs (parallel, rayon) and best-partner searches
//!
//! Signatures live in a `store::SignatureStore`, which persists through the
//! `store::Persistence` trait (`store::JsonFile` is provided).
//! `pipeline::TearPipeline` wires every stage together from one
//! `config::TearMatchingConfig`.

pub mod config;
pub mod error;
pub mod geometry;
pub mod image;
pub mod matching;
pub mod pipeline;
pub mod signature;
pub mod store;

pub use config::{ExtractorConfig, MaskOptions, MatchConfig, SignatureConfig, TearMatchingConfig};
pub use error::{ExtractionError, Result, SignatureError, TearMatchingError};
pub use geometry::{BoundaryArc, BoundaryPoint};
pub use crate::image::{
    annotate_tear, mask_to_rgb_image, BoundaryExtractor, FragmentMask, FragmentSide, TearCandidate, TearExtraction,
    TestTear,
};
pub use matching::{Alignment, DistanceMetric, MatchEngine, MatchResult};
pub use pipeline::TearPipeline;
pub use signature::{AmplitudeNormalization, SignatureBuilder, TearSignature};
pub use store::{
    BulkBuildReport, CorpusEntry, DirectoryCorpus, FragmentRecord, JsonFile, MatchExporter, Persistence,
    SignatureStore,
};
