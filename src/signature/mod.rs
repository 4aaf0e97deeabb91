pub mod builder;

pub use builder::SignatureBuilder;

use crate::error::{Result, TearMatchingError};
use serde::{Deserialize, Serialize};

/// How raw chord deviations are scaled to remove the fragment's absolute size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmplitudeNormalization {
    /// Divide by the chord length (mean radius for closed tears). Keeps relative amplitude.
    ChordLength,
    /// Divide by the largest absolute deviation so values span [-1, 1].
    MaxAbsolute,
    /// Keep raw pixel deviations.
    None,
}

/// Fixed-length peak/valley encoding of a tear edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TearSignature {
    values: Vec<f64>,
    closed: bool,
    normalization: AmplitudeNormalization,
}

impl TearSignature {
    pub fn from_values(values: Vec<f64>, closed: bool, normalization: AmplitudeNormalization) -> Self {
        Self {
            values,
            closed,
            normalization,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn resolution(&self) -> usize {
        self.values.len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn normalization(&self) -> AmplitudeNormalization {
        self.normalization
    }

    /// Euclidean norm of the vector. Invariant under every alignment candidate.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Signature of the same edge walked from the other end.
    pub fn reversed(&self) -> Self {
        let mut values = self.values.clone();
        values.reverse();
        Self { values, ..self.clone() }
    }

    /// Signature with peaks and valleys swapped.
    pub fn inverted(&self) -> Self {
        Self {
            values: self.values.iter().map(|v| -v).collect(),
            ..self.clone()
        }
    }

    /// Checks that two signatures were built with the same resolution and normalization.
    pub fn ensure_comparable(&self, other: &Self) -> Result<()> {
        if self.resolution() != other.resolution() {
            return Err(TearMatchingError::IncompatibleSignatures(format!(
                "resolution {} vs {}",
                self.resolution(),
                other.resolution()
            )));
        }
        if self.closed != other.closed {
            return Err(TearMatchingError::IncompatibleSignatures(
                "closed tear compared with open tear".to_string(),
            ));
        }
        if self.normalization != other.normalization {
            return Err(TearMatchingError::IncompatibleSignatures(format!(
                "normalization {:?} vs {:?}",
                self.normalization, other.normalization
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_and_inverted() {
        let sig = TearSignature::from_values(vec![1.0, -2.0, 3.0], false, AmplitudeNormalization::None);
        assert_eq!(sig.reversed().values(), &[3.0, -2.0, 1.0]);
        assert_eq!(sig.inverted().values(), &[-1.0, 2.0, -3.0]);
        assert_eq!(sig.reversed().norm(), sig.norm());
    }

    #[test]
    fn comparability_checks() {
        let a = TearSignature::from_values(vec![0.0; 4], false, AmplitudeNormalization::ChordLength);
        let b = TearSignature::from_values(vec![0.0; 8], false, AmplitudeNormalization::ChordLength);
        let c = TearSignature::from_values(vec![0.0; 4], true, AmplitudeNormalization::ChordLength);
        let d = TearSignature::from_values(vec![0.0; 4], false, AmplitudeNormalization::MaxAbsolute);

        assert!(a.ensure_comparable(&a.clone()).is_ok());
        assert!(a.ensure_comparable(&b).is_err());
        assert!(a.ensure_comparable(&c).is_err());
        assert!(a.ensure_comparable(&d).is_err());
    }
}
