//! Conversion of an ordered tear arc into a fixed-length signature.
//!
//! Open arcs are measured against the chord joining their endpoints: every
//! uniformly resampled point contributes its signed perpendicular distance to
//! that chord. Closed arcs have no chord and are measured as radial deviation
//! from the mean distance to their centroid.

use crate::config::SignatureConfig;
use crate::error::SignatureError;
use crate::geometry::{BoundaryArc, BoundaryPoint};
use crate::signature::{AmplitudeNormalization, TearSignature};
use log::debug;

/// Relative tolerance below which the chord is considered collapsed.
const COINCIDENT_ENDPOINT_RATIO: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
pub struct SignatureBuilder {
    config: SignatureConfig,
}

impl SignatureBuilder {
    pub fn new(config: SignatureConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SignatureConfig {
        &self.config
    }

    pub fn build(&self, arc: &BoundaryArc) -> Result<TearSignature, SignatureError> {
        let resolution = self.config.resolution;
        let samples = arc.resample(resolution)?;

        let (raw, scale) = if arc.closed {
            Self::radial_deviation(&samples)
        } else {
            Self::chord_deviation(arc, &samples)?
        };

        let values = match self.config.normalization {
            AmplitudeNormalization::ChordLength => raw.iter().map(|v| v / scale).collect(),
            AmplitudeNormalization::MaxAbsolute => {
                let peak = raw.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
                if peak > 0.0 {
                    raw.iter().map(|v| v / peak).collect()
                } else {
                    raw
                }
            }
            AmplitudeNormalization::None => raw,
        };

        debug!(
            "Built {} signature: {} arc points -> {} samples, scale {:.3}",
            if arc.closed { "closed" } else { "open" },
            arc.len(),
            resolution,
            scale
        );

        Ok(TearSignature::from_values(values, arc.closed, self.config.normalization))
    }

    /// Signed distance of each sample to the E0 -> E1 chord, plus the chord length.
    fn chord_deviation(
        arc: &BoundaryArc,
        samples: &[BoundaryPoint],
    ) -> Result<(Vec<f64>, f64), SignatureError> {
        let (start, end) = arc
            .endpoints()
            .ok_or(SignatureError::TooFewPoints(arc.len()))?;
        let chord = start.distance(&end);
        if chord <= arc.length() * COINCIDENT_ENDPOINT_RATIO {
            return Err(SignatureError::CoincidentEndpoints);
        }

        let raw = samples
            .iter()
            .map(|p| p.signed_distance_to_line(&start, &end))
            .collect();
        Ok((raw, chord))
    }

    /// Distance of each sample to the centroid minus the mean distance, plus the mean radius.
    fn radial_deviation(samples: &[BoundaryPoint]) -> (Vec<f64>, f64) {
        let count = samples.len() as f64;
        let centroid = samples
            .iter()
            .fold(BoundaryPoint::default(), |acc, p| acc + *p)
            * (1.0 / count);

        let radii: Vec<f64> = samples.iter().map(|p| p.distance(&centroid)).collect();
        let mean_radius = radii.iter().sum::<f64>() / count;

        (radii.iter().map(|r| r - mean_radius).collect(), mean_radius)
    }
}
