//! Configuration for every stage of the pipeline.
//!
//! All structs implement `Default` and deserialise with `#[serde(default)]`,
//! so a JSON file only needs to name the values it changes.

use crate::error::{Result, TearMatchingError};
use crate::matching::DistanceMetric;
use crate::signature::AmplitudeNormalization;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Controls how the tear arc is located on the fragment contour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Half-width, in contour points, of the window used to measure irregularity
    pub window: usize,
    /// Maximum chord deviation (pixels) for a point to count as straight
    pub straightness_tolerance: f64,
    /// Straight runs shorter than this many points are treated as part of the tear
    pub min_straight_run: usize,
    /// Minimum arc length (pixels) for an irregular run to be a tear
    pub min_tear_length: f64,
    /// Contours with fewer points are rejected as degenerate
    pub min_contour_points: usize,
    /// Whether a fully irregular outline is returned as a closed tear
    pub allow_closed: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            window: 5,
            straightness_tolerance: 1.5,
            min_straight_run: 40,
            min_tear_length: 24.0,
            min_contour_points: 16,
            allow_closed: true,
        }
    }
}

impl ExtractorConfig {
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }

    pub fn with_straightness_tolerance(mut self, tolerance: f64) -> Self {
        self.straightness_tolerance = tolerance;
        self
    }

    pub fn with_min_straight_run(mut self, points: usize) -> Self {
        self.min_straight_run = points;
        self
    }

    pub fn with_min_tear_length(mut self, length: f64) -> Self {
        self.min_tear_length = length;
        self
    }

    pub fn with_allow_closed(mut self, allow: bool) -> Self {
        self.allow_closed = allow;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignatureConfig {
    /// Number of samples N in every signature
    pub resolution: usize,
    pub normalization: AmplitudeNormalization,
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            resolution: 128,
            normalization: AmplitudeNormalization::ChordLength,
        }
    }
}

impl SignatureConfig {
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_normalization(mut self, normalization: AmplitudeNormalization) -> Self {
        self.normalization = normalization;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub metric: DistanceMetric,
    /// Results with a distance above this value are dropped
    pub match_threshold: Option<f64>,
    /// Skip all-pairs comparisons whose lower bound already exceeds the threshold
    pub prune: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            metric: DistanceMetric::Rms,
            match_threshold: None,
            prune: true,
        }
    }
}

impl MatchConfig {
    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = Some(threshold);
        self
    }

    pub fn with_pruning(mut self, prune: bool) -> Self {
        self.prune = prune;
        self
    }
}

/// Preparation applied to a decoded image before contour tracing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskOptions {
    /// Resample the image to this size first (cubic filter)
    pub resize: Option<(u32, u32)>,
    /// Gaussian blur sigma; 0 disables blurring
    pub blur_sigma: f32,
    /// Grey level above which a pixel is foreground
    pub threshold: u8,
    /// Treat dark pixels as foreground instead
    pub invert: bool,
}

impl Default for MaskOptions {
    fn default() -> Self {
        Self {
            resize: None,
            blur_sigma: 1.0,
            threshold: 150,
            invert: false,
        }
    }
}

/// Top-level configuration grouping every stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TearMatchingConfig {
    pub mask: MaskOptions,
    pub extractor: ExtractorConfig,
    pub signature: SignatureConfig,
    pub matching: MatchConfig,
}

impl TearMatchingConfig {
    /// Load a (possibly partial) configuration from a JSON file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(TearMatchingError::InvalidConfig(msg));

        if self.signature.resolution < 2 {
            return invalid(format!(
                "signature.resolution must be at least 2, got {}",
                self.signature.resolution
            ));
        }
        if self.extractor.window == 0 {
            return invalid("extractor.window must be at least 1".to_string());
        }
        if !(self.extractor.straightness_tolerance > 0.0) {
            return invalid(format!(
                "extractor.straightness_tolerance must be positive, got {}",
                self.extractor.straightness_tolerance
            ));
        }
        if !(self.extractor.min_tear_length >= 0.0) {
            return invalid(format!(
                "extractor.min_tear_length must be non-negative, got {}",
                self.extractor.min_tear_length
            ));
        }
        if let Some(threshold) = self.matching.match_threshold {
            if !threshold.is_finite() || threshold < 0.0 {
                return invalid(format!(
                    "matching.match_threshold must be a finite non-negative number, got {threshold}"
                ));
            }
        }
        if let Some((w, h)) = self.mask.resize {
            if w == 0 || h == 0 {
                return invalid(format!("mask.resize must be non-zero, got {w}x{h}"));
            }
        }
        if self.mask.blur_sigma < 0.0 {
            return invalid(format!(
                "mask.blur_sigma must be non-negative, got {}",
                self.mask.blur_sigma
            ));
        }

        Ok(())
    }
}
