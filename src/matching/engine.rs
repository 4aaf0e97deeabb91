// src/matching/engine.rs

use crate::config::MatchConfig;
use crate::error::{Result, TearMatchingError};
use crate::matching::{fft, sort_best_first, Alignment, MatchResult};
use crate::signature::TearSignature;
use crate::store::{FragmentRecord, SignatureStore};
use log::{debug, info};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// The four orientation hypotheses: (reversed, inverted).
///
/// A signature recorded from the other end of the same tear is reversed and
/// inverted; a mating half may additionally be mirrored, so every combination
/// is tried.
const ORIENTATIONS: [(bool, bool); 4] = [(false, false), (false, true), (true, false), (true, true)];

/// Compares tear signatures under unknown relative orientation.
#[derive(Debug, Clone, Default)]
pub struct MatchEngine {
    config: MatchConfig,
}

impl MatchEngine {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Minimum distance between `a` and `b` over every alignment candidate.
    ///
    /// Open signatures try the four orientation candidates. Closed signatures
    /// additionally try every circular shift of each candidate.
    pub fn compare(&self, a: &TearSignature, b: &TearSignature) -> Result<(f64, Alignment)> {
        a.ensure_comparable(b)?;
        let (squared, alignment) = if a.is_closed() {
            Self::best_closed_alignment(a.values(), b.values())
        } else {
            Self::best_open_alignment(a.values(), b.values())
        };
        Ok((self.config.metric.from_squared_sum(squared, a.resolution()), alignment))
    }

    /// Compare two named signatures and package the outcome.
    pub fn match_pair(
        &self,
        query_id: &str,
        query: &TearSignature,
        candidate_id: &str,
        candidate: &TearSignature,
    ) -> Result<MatchResult> {
        let (distance, alignment) = self.compare(query, candidate)?;
        Ok(MatchResult {
            query: query_id.to_string(),
            candidate: candidate_id.to_string(),
            distance,
            alignment,
        })
    }

    /// Rank every record in `store` against `query`, best match first.
    ///
    /// A record sharing the query's identifier is not compared with itself.
    /// Records whose signatures are not comparable with the query are skipped.
    /// The result can therefore be empty even though the store is not, for
    /// example when the store holds only the query's own record.
    pub fn match_one(
        &self,
        query_id: &str,
        query: &TearSignature,
        store: &SignatureStore,
    ) -> Result<Vec<MatchResult>> {
        if store.is_empty() {
            return Err(TearMatchingError::EmptyStore);
        }

        let mut results: Vec<MatchResult> = store
            .iter()
            .filter(|record| record.identifier != query_id)
            .filter_map(|record| self.try_match(query_id, query, record))
            .filter(|result| self.within_threshold(result.distance))
            .collect();
        sort_best_first(&mut results);

        debug!(
            "Matched '{}' against {} records: {} results",
            query_id,
            store.len(),
            results.len()
        );
        Ok(results)
    }

    /// Distances for every unordered pair of distinct records, best first.
    ///
    /// Pairs are evaluated in parallel; the final sort makes the output
    /// independent of worker scheduling.
    pub fn match_all_pairs(&self, store: &SignatureStore) -> Vec<MatchResult> {
        let records: Vec<&FragmentRecord> = store.iter().collect();
        let count = records.len();
        let pair_count = count * count.saturating_sub(1) / 2;
        info!("Matching all pairs: {} records, {} pairs", count, pair_count);

        let records = &records;
        let mut results: Vec<MatchResult> = (0..count)
            .into_par_iter()
            .flat_map_iter(|i| {
                (i + 1..count).filter_map(move |j| {
                    let (left, right) = (records[i], records[j]);
                    if self.prunable(&left.signature, &right.signature) {
                        return None;
                    }
                    self.try_match(&left.identifier, &left.signature, right)
                })
            })
            .filter(|result| self.within_threshold(result.distance))
            .collect();
        sort_best_first(&mut results);

        debug!("All-pairs matching kept {} of {} pairs", results.len(), pair_count);
        results
    }

    /// Each record's single nearest other record.
    ///
    /// Records with no comparable partner (or none within the threshold) are absent.
    pub fn best_partners(&self, store: &SignatureStore) -> BTreeMap<String, MatchResult> {
        let records: Vec<&FragmentRecord> = store.iter().collect();
        let records = &records;

        records
            .par_iter()
            .filter_map(|query| {
                records
                    .iter()
                    .filter(|candidate| candidate.identifier != query.identifier)
                    .filter_map(|candidate| self.try_match(&query.identifier, &query.signature, candidate))
                    .filter(|result| self.within_threshold(result.distance))
                    .min_by(MatchResult::ranking)
                    .map(|best| (query.identifier.clone(), best))
            })
            .collect()
    }

    fn try_match(
        &self,
        query_id: &str,
        query: &TearSignature,
        record: &FragmentRecord,
    ) -> Option<MatchResult> {
        match self.match_pair(query_id, query, &record.identifier, &record.signature) {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("Skipping '{}' vs '{}': {}", query_id, record.identifier, e);
                None
            }
        }
    }

    fn within_threshold(&self, distance: f64) -> bool {
        self.config
            .match_threshold
            .map_or(true, |threshold| distance <= threshold)
    }

    /// True when the norm gap alone proves the pair exceeds the threshold.
    fn prunable(&self, a: &TearSignature, b: &TearSignature) -> bool {
        match self.config.match_threshold {
            Some(threshold) if self.config.prune && a.resolution() == b.resolution() => {
                self.config.metric.norm_lower_bound(a.norm(), b.norm(), a.resolution()) > threshold
            }
            _ => false,
        }
    }

    fn best_open_alignment(a: &[f64], b: &[f64]) -> (f64, Alignment) {
        let len = a.len();
        let mut best = (f64::INFINITY, Alignment::IDENTITY);

        for (reversed, inverted) in ORIENTATIONS {
            let sign = if inverted { -1.0 } else { 1.0 };
            let squared: f64 = (0..len)
                .map(|i| {
                    let index = if reversed { len - 1 - i } else { i };
                    let diff = a[i] - sign * b[index];
                    diff * diff
                })
                .sum();

            if squared < best.0 {
                best = (
                    squared,
                    Alignment {
                        reversed,
                        inverted,
                        shift: 0,
                    },
                );
            }
        }

        best
    }

    fn best_closed_alignment(a: &[f64], b: &[f64]) -> (f64, Alignment) {
        let mut best = (f64::INFINITY, Alignment::IDENTITY);

        for (reversed, inverted) in ORIENTATIONS {
            let oriented = Alignment {
                reversed,
                inverted,
                shift: 0,
            }
            .apply(b);

            // The FFT only ranks shifts; distances are recomputed exactly.
            for shift in fft::peak_shifts(a, &oriented) {
                let alignment = Alignment {
                    reversed,
                    inverted,
                    shift,
                };
                let squared = squared_distance(a, &alignment.apply(b));
                if squared < best.0 {
                    best = (squared, alignment);
                }
            }
        }

        best
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchConfig;
    use crate::matching::DistanceMetric;
    use crate::signature::AmplitudeNormalization;

    fn open(values: Vec<f64>) -> TearSignature {
        TearSignature::from_values(values, false, AmplitudeNormalization::ChordLength)
    }

    fn closed(values: Vec<f64>) -> TearSignature {
        TearSignature::from_values(values, true, AmplitudeNormalization::ChordLength)
    }

    fn wave(len: usize, phase: f64) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let t = i as f64 / len as f64 * std::f64::consts::TAU;
                0.1 * (t * 3.0 + phase).sin() + 0.04 * (t * 7.0 + 2.0 * phase).cos()
            })
            .collect()
    }

    #[test]
    fn self_distance_is_zero_with_identity() {
        let sig = open(wave(64, 0.3));
        let (distance, alignment) = MatchEngine::default().compare(&sig, &sig).unwrap();
        assert_eq!(distance, 0.0);
        assert_eq!(alignment, Alignment::IDENTITY);
    }

    #[test]
    fn reversed_copy_matches_exactly() {
        let sig = open(wave(64, 1.1));
        let flipped = sig.reversed().inverted();
        let (distance, alignment) = MatchEngine::default().compare(&sig, &flipped).unwrap();

        assert_eq!(distance, 0.0);
        assert!(alignment.reversed && alignment.inverted);
    }

    #[test]
    fn distance_is_symmetric() {
        let engine = MatchEngine::new(MatchConfig::default().with_metric(DistanceMetric::Euclidean));
        let a = open(wave(64, 0.0));
        let b = open(wave(64, 0.9));

        let (ab, _) = engine.compare(&a, &b).unwrap();
        let (ba, _) = engine.compare(&b, &a).unwrap();
        assert!(ab > 0.0);
        assert!((ab - ba).abs() < 1e-12);
    }

    #[test]
    fn closed_signatures_align_under_shift() {
        let a = wave(48, 0.0);
        let mut rolled = a.clone();
        rolled.rotate_left(13);

        let (distance, alignment) = MatchEngine::default()
            .compare(&closed(a), &closed(rolled))
            .unwrap();
        assert!(distance < 1e-12, "distance {distance}");
        assert!(!alignment.reversed && !alignment.inverted);
    }

    #[test]
    fn incompatible_signatures_are_rejected() {
        let result = MatchEngine::default().compare(&open(vec![0.0; 8]), &open(vec![0.0; 16]));
        assert!(matches!(result, Err(TearMatchingError::IncompatibleSignatures(_))));
    }

    #[test]
    fn empty_store_is_an_error() {
        let store = SignatureStore::new();
        let result = MatchEngine::default().match_one("q", &open(vec![0.0; 8]), &store);
        assert!(matches!(result, Err(TearMatchingError::EmptyStore)));
    }

    #[test]
    fn store_holding_only_the_query_gives_no_matches() {
        let query = open(wave(32, 0.0));
        let mut store = SignatureStore::new();
        store.insert("a", query.clone(), None).unwrap();

        let results = MatchEngine::default().match_one("a", &query, &store).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn exact_duplicate_ranks_first() {
        let query = open(wave(64, 0.4));
        let mut store = SignatureStore::new();
        store.insert("far", open(wave(64, 2.5)), None).unwrap();
        store.insert("duplicate", query.clone(), None).unwrap();
        store.insert("near", open(wave(64, 0.6)), None).unwrap();

        let results = MatchEngine::default().match_one("query", &query, &store).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].candidate, "duplicate");
        assert_eq!(results[0].distance, 0.0);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn all_pairs_covers_every_unordered_pair() {
        let mut store = SignatureStore::new();
        for (i, phase) in [0.0, 0.5, 1.0, 1.5, 2.0].into_iter().enumerate() {
            store.insert(format!("frag-{i}"), open(wave(32, phase)), None).unwrap();
        }

        let results = MatchEngine::default().match_all_pairs(&store);
        assert_eq!(results.len(), 10);
        assert!(results.iter().all(|r| r.query < r.candidate));
        assert!(results.windows(2).all(|w| w[0].ranking(&w[1]).is_le()));
    }

    #[test]
    fn threshold_filters_and_prunes() {
        let mut store = SignatureStore::new();
        store.insert("a", open(wave(32, 0.0)), None).unwrap();
        store.insert("a-copy", open(wave(32, 0.0)), None).unwrap();
        store.insert("flat", open(vec![0.0; 32]), None).unwrap();

        let engine = MatchEngine::new(MatchConfig::default().with_threshold(1e-6));
        let results = engine.match_all_pairs(&store);
        assert_eq!(results.len(), 1);
        assert_eq!((results[0].query.as_str(), results[0].candidate.as_str()), ("a", "a-copy"));

        let unpruned = MatchEngine::new(MatchConfig::default().with_threshold(1e-6).with_pruning(false));
        assert_eq!(unpruned.match_all_pairs(&store), results);
    }

    #[test]
    fn best_partners_pairs_nearest_records() {
        let mut store = SignatureStore::new();
        store.insert("a", open(wave(32, 0.0)), None).unwrap();
        store.insert("a-twin", open(wave(32, 0.05)), None).unwrap();
        store.insert("b", open(wave(32, 2.0)), None).unwrap();

        let partners = MatchEngine::default().best_partners(&store);
        assert_eq!(partners.len(), 3);
        assert_eq!(partners["a"].candidate, "a-twin");
        assert_eq!(partners["a-twin"].candidate, "a");
    }
}
