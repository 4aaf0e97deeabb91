pub mod engine;
pub mod fft;

pub use engine::MatchEngine;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Root mean square of the element-wise differences.
    Rms,
    /// Plain Euclidean distance between the vectors.
    Euclidean,
}

impl DistanceMetric {
    /// Convert a sum of squared differences over `len` elements into a distance.
    pub fn from_squared_sum(&self, squared_sum: f64, len: usize) -> f64 {
        let squared_sum = squared_sum.max(0.0);
        match self {
            DistanceMetric::Rms => (squared_sum / len.max(1) as f64).sqrt(),
            DistanceMetric::Euclidean => squared_sum.sqrt(),
        }
    }

    /// Lower bound on the distance between two vectors with the given norms.
    pub fn norm_lower_bound(&self, norm_a: f64, norm_b: f64, len: usize) -> f64 {
        let gap = (norm_a - norm_b).abs();
        match self {
            DistanceMetric::Rms => gap / (len.max(1) as f64).sqrt(),
            DistanceMetric::Euclidean => gap,
        }
    }
}

/// Orientation hypothesis under which two signatures were compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Alignment {
    /// Candidate was walked end-to-start
    pub reversed: bool,
    /// Candidate's peaks and valleys were swapped
    pub inverted: bool,
    /// Circular offset into the candidate (closed tears only)
    pub shift: usize,
}

impl Alignment {
    pub const IDENTITY: Alignment = Alignment {
        reversed: false,
        inverted: false,
        shift: 0,
    };

    /// Apply this alignment to a candidate vector so it lines up with the query.
    pub fn apply(&self, values: &[f64]) -> Vec<f64> {
        let len = values.len();
        (0..len)
            .map(|i| {
                let position = (i + self.shift) % len;
                let index = if self.reversed { len - 1 - position } else { position };
                if self.inverted {
                    -values[index]
                } else {
                    values[index]
                }
            })
            .collect()
    }
}

/// Distance between two fragments' tears under their best alignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub query: String,
    pub candidate: String,
    pub distance: f64,
    pub alignment: Alignment,
}

impl MatchResult {
    /// Total best-first order: ascending distance, then identifiers.
    pub fn ranking(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.query.cmp(&other.query))
            .then_with(|| self.candidate.cmp(&other.candidate))
    }
}

pub fn sort_best_first(results: &mut [MatchResult]) {
    results.sort_by(MatchResult::ranking);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_apply() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(Alignment::IDENTITY.apply(&values), vec![1.0, 2.0, 3.0, 4.0]);

        let reversed = Alignment { reversed: true, ..Alignment::default() };
        assert_eq!(reversed.apply(&values), vec![4.0, 3.0, 2.0, 1.0]);

        let shifted = Alignment { shift: 1, inverted: true, ..Alignment::default() };
        assert_eq!(shifted.apply(&values), vec![-2.0, -3.0, -4.0, -1.0]);
    }

    #[test]
    fn ranking_breaks_ties_by_identifier() {
        let result = |query: &str, candidate: &str, distance: f64| MatchResult {
            query: query.to_string(),
            candidate: candidate.to_string(),
            distance,
            alignment: Alignment::IDENTITY,
        };
        let mut results = vec![
            result("b", "c", 0.5),
            result("a", "z", 0.5),
            result("a", "c", 0.5),
            result("x", "y", 0.1),
        ];
        sort_best_first(&mut results);

        let order: Vec<_> = results.iter().map(|r| (r.query.as_str(), r.candidate.as_str())).collect();
        assert_eq!(order, vec![("x", "y"), ("a", "c"), ("a", "z"), ("b", "c")]);
    }

    #[test]
    fn metric_conversion() {
        assert_eq!(DistanceMetric::Euclidean.from_squared_sum(16.0, 4), 4.0);
        assert_eq!(DistanceMetric::Rms.from_squared_sum(16.0, 4), 2.0);
        assert_eq!(DistanceMetric::Rms.norm_lower_bound(5.0, 3.0, 4), 1.0);
    }
}
