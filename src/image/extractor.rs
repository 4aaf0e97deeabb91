//! Location of the torn edge on a fragment's outline.
//!
//! The outer contour is classified point by point as straight or irregular by
//! measuring how far the neighbouring points stray from the chord across a
//! small window. Manufactured edges (paper edges, binding cuts, image crops)
//! stay within a pixel or so of that chord; torn edges do not. Runs of
//! irregular points bounded by straight ones are tear candidates, and their
//! bounding transitions are the tear's corners.

use crate::config::ExtractorConfig;
use crate::error::ExtractionError;
use crate::geometry::arc::polygon_area;
use crate::geometry::{BoundaryArc, BoundaryPoint};
use crate::image::loader::FragmentMask;
use imageproc::contours::{find_contours, BorderType};
use log::debug;

/// Distance from a straight cut's line, as a fraction of the straightness
/// tolerance, within which a tear point still counts as lying on the cut.
const CORNER_LINE_RATIO: f64 = 0.5;

/// One plausible tear on a fragment outline.
#[derive(Debug, Clone, PartialEq)]
pub struct TearCandidate {
    /// Contour index of the first tear point (E0)
    pub start: usize,
    /// Contour index of the last tear point (E1)
    pub end: usize,
    pub arc: BoundaryArc,
    pub length: f64,
    pub mean_irregularity: f64,
}

impl TearCandidate {
    /// Ranking score: long, strongly irregular arcs first.
    pub fn score(&self) -> f64 {
        self.length * self.mean_irregularity
    }
}

/// Full output of an extraction, kept for diagnostics and annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct TearExtraction {
    /// The closed outer contour, in tracing order
    pub contour: Vec<BoundaryPoint>,
    /// Irregularity measured at every contour point
    pub irregularity: Vec<f64>,
    /// Contour indices where straight and irregular runs meet
    pub corners: Vec<usize>,
    /// Every tear candidate passing the length check, best first
    pub candidates: Vec<TearCandidate>,
}

impl TearExtraction {
    /// The best tear candidate.
    pub fn tear(&self) -> Option<&TearCandidate> {
        self.candidates.first()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BoundaryExtractor {
    config: ExtractorConfig,
}

impl BoundaryExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The single best tear arc of the fragment.
    pub fn extract(&self, mask: &FragmentMask) -> Result<BoundaryArc, ExtractionError> {
        let extraction = self.extract_detailed(mask)?;
        extraction
            .candidates
            .into_iter()
            .next()
            .map(|candidate| candidate.arc)
            .ok_or(ExtractionError::TooFewCorners { found: 0 })
    }

    /// Every plausible tear arc, best first.
    pub fn extract_all(&self, mask: &FragmentMask) -> Result<Vec<TearCandidate>, ExtractionError> {
        Ok(self.extract_detailed(mask)?.candidates)
    }

    pub fn extract_detailed(&self, mask: &FragmentMask) -> Result<TearExtraction, ExtractionError> {
        let contour = Self::outer_contour(mask)?;
        self.extract_from_contour(contour)
    }

    /// Locate the tear on an already traced closed contour.
    pub fn extract_from_contour(
        &self,
        contour: Vec<BoundaryPoint>,
    ) -> Result<TearExtraction, ExtractionError> {
        let area = polygon_area(&contour).abs();
        if contour.len() < self.config.min_contour_points.max(3) || area <= 0.0 {
            return Err(ExtractionError::DegenerateContour {
                points: contour.len(),
                area,
            });
        }

        let irregularity = self.irregularity(&contour);
        let mut irregular: Vec<bool> = irregularity
            .iter()
            .map(|&value| value > self.config.straightness_tolerance)
            .collect();

        if irregular.iter().all(|&flag| !flag) {
            return Err(ExtractionError::TooFewCorners { found: 0 });
        }
        self.absorb_short_straight_runs(&mut irregular);

        if irregular.iter().all(|&flag| flag) {
            return self.closed_tear(contour, irregularity);
        }

        // A maximal irregular run is always the more irregular of the two
        // sub-arcs between its corners: the other side holds straight runs.
        let runs = circular_runs(&irregular, true);
        let spans: Vec<(usize, usize)> = runs
            .iter()
            .map(|&(start, len)| self.locate_corners(&contour, &irregular, start, len))
            .collect();
        let corners: Vec<usize> = spans.iter().flat_map(|&(start, end)| [start, end]).collect();
        debug!(
            "Contour of {} points: {} irregular runs, {} corners",
            contour.len(),
            runs.len(),
            corners.len()
        );

        let mut candidates: Vec<TearCandidate> = spans
            .iter()
            .map(|&(start, end)| sub_arc(&contour, &irregularity, start, end))
            .collect();

        let longest = candidates.iter().map(|c| c.length).fold(0.0, f64::max);
        candidates.retain(|c| c.length >= self.config.min_tear_length);
        if candidates.is_empty() {
            return Err(ExtractionError::ArcTooShort {
                length: longest,
                minimum: self.config.min_tear_length,
            });
        }
        candidates.sort_by(|a, b| b.score().total_cmp(&a.score()).then(a.start.cmp(&b.start)));

        if let Some(best) = candidates.first() {
            debug!(
                "Tear arc {}..{}: {} points, length {:.1}, mean irregularity {:.2} ({} candidates)",
                best.start,
                best.end,
                best.arc.len(),
                best.length,
                best.mean_irregularity,
                candidates.len()
            );
        }

        Ok(TearExtraction {
            contour,
            irregularity,
            corners,
            candidates,
        })
    }

    /// Largest outer contour of the mask, with repeated points removed.
    fn outer_contour(mask: &FragmentMask) -> Result<Vec<BoundaryPoint>, ExtractionError> {
        if mask.foreground_count() == 0 {
            return Err(ExtractionError::NoForeground);
        }

        let contour = find_contours::<i32>(&mask.pixels)
            .into_iter()
            .filter(|c| c.border_type == BorderType::Outer)
            .map(|c| {
                let mut points: Vec<BoundaryPoint> = c
                    .points
                    .iter()
                    .map(|p| BoundaryPoint::new(p.x as f64, p.y as f64))
                    .collect();
                points.dedup();
                if points.len() > 1 && points.first() == points.last() {
                    points.pop();
                }
                points
            })
            .max_by(|a, b| polygon_area(a).abs().total_cmp(&polygon_area(b).abs()))
            .ok_or(ExtractionError::NoForeground)?;

        debug!("Traced outer contour: {} points", contour.len());
        Ok(contour)
    }

    /// Largest deviation of the points within ±window of each point from the window chord.
    fn irregularity(&self, contour: &[BoundaryPoint]) -> Vec<f64> {
        let len = contour.len();
        let window = self.config.window.min((len - 1) / 2).max(1);

        (0..len)
            .map(|i| {
                let start = contour[(i + len - window) % len];
                let end = contour[(i + window) % len];
                (0..=2 * window)
                    .map(|k| contour[(i + len - window + k) % len])
                    .map(|p| p.signed_distance_to_line(&start, &end).abs())
                    .fold(0.0, f64::max)
            })
            .collect()
    }

    /// Locally straight stretches inside a tear (inflections) become part of it.
    fn absorb_short_straight_runs(&self, irregular: &mut [bool]) {
        let len = irregular.len();
        for (start, run) in circular_runs(irregular, false) {
            if run < self.config.min_straight_run && run < len {
                for k in 0..run {
                    irregular[(start + k) % len] = true;
                }
            }
        }
    }

    /// Contour indices of the two corners bounding an irregular run.
    ///
    /// The irregularity window straddles each corner, so the run spills up to
    /// `window` points onto the neighbouring straight cuts. Each end is pulled
    /// back to the last point still on the line of its straight neighbour.
    fn locate_corners(
        &self,
        contour: &[BoundaryPoint],
        irregular: &[bool],
        start: usize,
        len: usize,
    ) -> (usize, usize) {
        let n = contour.len();
        let at = |offset: usize| contour[(start + offset) % n];
        let tolerance = self.config.straightness_tolerance * CORNER_LINE_RATIO;
        let reach = 4 * self.config.window.max(1);

        // Straight run before the tear: walk the tear forward from its start
        let before = (1..=n - len)
            .take_while(|&j| !irregular[(start + n - j) % n])
            .count()
            .min(reach);
        let lead = if before >= 2 {
            let near = contour[(start + n - 1) % n];
            let far = contour[(start + n - before) % n];
            (0..len - 1)
                .take_while(|&k| at(k).signed_distance_to_line(&far, &near).abs() < tolerance)
                .count()
        } else {
            0
        };
        let first = lead.saturating_sub(1);

        // Straight run after the tear: walk the tear backward from its end
        let after = (0..n - len)
            .take_while(|&j| !irregular[(start + len + j) % n])
            .count()
            .min(reach);
        let trail = if after >= 2 {
            let near = at(len);
            let far = at(len + after - 1);
            (0..len - 1 - first)
                .take_while(|&k| at(len - 1 - k).signed_distance_to_line(&near, &far).abs() < tolerance)
                .count()
        } else {
            0
        };
        let last = len - 1 - trail.saturating_sub(1);

        ((start + first) % n, (start + last) % n)
    }

    fn closed_tear(
        &self,
        contour: Vec<BoundaryPoint>,
        irregularity: Vec<f64>,
    ) -> Result<TearExtraction, ExtractionError> {
        if !self.config.allow_closed {
            return Err(ExtractionError::TooFewCorners { found: 0 });
        }

        let arc = BoundaryArc::closed(contour.clone());
        let length = arc.length();
        if length < self.config.min_tear_length {
            return Err(ExtractionError::ArcTooShort {
                length,
                minimum: self.config.min_tear_length,
            });
        }

        debug!("Whole outline is irregular: closed tear of {} points", contour.len());
        let candidate = TearCandidate {
            start: 0,
            end: contour.len() - 1,
            arc,
            length,
            mean_irregularity: mean(&irregularity),
        };
        Ok(TearExtraction {
            contour,
            irregularity,
            corners: Vec::new(),
            candidates: vec![candidate],
        })
    }
}

/// Open sub-arc walking forward from `start` to `end` inclusive, wrapping around.
fn sub_arc(contour: &[BoundaryPoint], irregularity: &[f64], start: usize, end: usize) -> TearCandidate {
    let len = contour.len();
    let count = (end + len - start) % len + 1;
    let indices = (0..count).map(|k| (start + k) % len);

    let points: Vec<BoundaryPoint> = indices.clone().map(|i| contour[i]).collect();
    let values: Vec<f64> = indices.map(|i| irregularity[i]).collect();
    let arc = BoundaryArc::open(points);

    TearCandidate {
        start,
        end,
        length: arc.length(),
        mean_irregularity: mean(&values),
        arc,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Maximal circular runs of `value` as (start, length). Empty if every flag equals `value`
/// or none does.
fn circular_runs(flags: &[bool], value: bool) -> Vec<(usize, usize)> {
    let len = flags.len();
    // Start scanning just after a flag that differs so no run is split by the wrap
    let Some(anchor) = flags.iter().position(|&flag| flag != value) else {
        return Vec::new();
    };

    let mut runs = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    for k in 1..=len {
        let index = (anchor + k) % len;
        if flags[index] == value {
            current = match current {
                Some((start, run)) => Some((start, run + 1)),
                None => Some((index, 1)),
            };
        } else if let Some(run) = current.take() {
            runs.push(run);
        }
    }
    if let Some(run) = current {
        runs.push(run);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::loader::{FragmentSide, TestTear};

    const WIDTH: u32 = 200;
    const HEIGHT: u32 = 160;
    const TEST_MARGIN: u32 = 10;

    fn fragment(tear: TestTear, side: FragmentSide) -> FragmentMask {
        FragmentMask::create_test_fragment(WIDTH, HEIGHT, tear, side)
    }

    #[test]
    fn runs_wrap_around() {
        let flags = [true, true, false, false, true, false, true];
        assert_eq!(circular_runs(&flags, true), vec![(4, 1), (6, 3)]);
        assert_eq!(circular_runs(&flags, false), vec![(2, 2), (5, 1)]);
        assert!(circular_runs(&[true; 4], true).is_empty());
    }

    #[test]
    fn finds_torn_top_edge() {
        let tear = BoundaryExtractor::default()
            .extract(&fragment(TestTear::Wave, FragmentSide::Below))
            .unwrap();

        assert!(!tear.closed);
        let min_x = tear.points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let max_x = tear.points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = tear.points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        // Spans the torn edge from side to side, never reaching the bottom cut
        assert!(min_x <= 12.0, "min_x {min_x}");
        assert!(max_x >= (WIDTH - 13) as f64, "max_x {max_x}");
        assert!(max_y < (HEIGHT / 2 + 30) as f64, "max_y {max_y}");
    }

    #[test]
    fn finds_torn_bottom_edge_of_upper_half() {
        let tear = BoundaryExtractor::default()
            .extract(&fragment(TestTear::Jagged, FragmentSide::Above))
            .unwrap();

        let min_y = tear.points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        assert!(min_y > (HEIGHT / 2 - 30) as f64, "min_y {min_y}");
    }

    #[test]
    fn tear_ends_at_the_side_cuts() {
        let left = TEST_MARGIN as f64;
        let right = (WIDTH - TEST_MARGIN - 1) as f64;

        for tear in [TestTear::Wave, TestTear::Jagged] {
            for side in [FragmentSide::Below, FragmentSide::Above] {
                let arc = BoundaryExtractor::default().extract(&fragment(tear, side)).unwrap();
                let (first, last) = arc.endpoints().unwrap();
                let mut ends = [first.x, last.x];
                ends.sort_by(f64::total_cmp);
                assert_eq!(ends, [left, right], "{tear:?} {side:?}");

                // The corner is the only point of the arc on each side cut
                let n = arc.len();
                let inner = [arc.points[1], arc.points[n - 2]];
                assert!(
                    inner.iter().all(|p| p.x != first.x && p.x != last.x),
                    "{tear:?} {side:?}: {inner:?}"
                );
            }
        }
    }

    #[test]
    fn mating_halves_share_their_corners() {
        let extractor = BoundaryExtractor::default();
        let below = extractor.extract(&fragment(TestTear::Jagged, FragmentSide::Below)).unwrap();
        let above = extractor.extract(&fragment(TestTear::Jagged, FragmentSide::Above)).unwrap();

        let left_corner = |arc: &BoundaryArc| {
            let (first, last) = arc.endpoints().unwrap();
            if first.x < last.x { first } else { last }
        };
        // Complementary masks meet one pixel apart along the cut
        let gap = left_corner(&below).y - left_corner(&above).y;
        assert_eq!(gap, 1.0);
        assert!((below.chord_length() - above.chord_length()).abs() < 2.0);
    }

    #[test]
    fn tear_is_the_more_irregular_side() {
        let extraction = BoundaryExtractor::default()
            .extract_detailed(&fragment(TestTear::Wave, FragmentSide::Below))
            .unwrap();
        let tear = extraction.tear().unwrap();
        let n = extraction.contour.len();

        let rest: Vec<f64> = (1..n)
            .map(|k| (tear.end + k) % n)
            .take_while(|&i| i != tear.start)
            .map(|i| extraction.irregularity[i])
            .collect();
        assert_eq!(rest.len() + tear.arc.len(), n);
        assert!(tear.mean_irregularity > 2.0 * mean(&rest), "{} vs {}", tear.mean_irregularity, mean(&rest));
    }

    #[test]
    fn blank_mask_has_no_foreground() {
        let blank = FragmentMask::from_predicate(50, 50, |_, _| false);
        assert_eq!(
            BoundaryExtractor::default().extract(&blank),
            Err(ExtractionError::NoForeground)
        );
    }

    #[test]
    fn clean_rectangle_has_no_tear() {
        let result = BoundaryExtractor::default().extract(&fragment(TestTear::Straight, FragmentSide::Below));
        assert!(
            matches!(result, Err(ExtractionError::ArcTooShort { .. })),
            "{result:?}"
        );
    }

    #[test]
    fn thin_line_is_degenerate() {
        let line = FragmentMask::from_predicate(60, 20, |x, y| y == 10 && (5..55).contains(&x));
        assert!(matches!(
            BoundaryExtractor::default().extract(&line),
            Err(ExtractionError::DegenerateContour { .. })
        ));
    }

    #[test]
    fn irregular_blob_is_a_closed_tear() {
        let blob = FragmentMask::from_predicate(140, 140, |x, y| {
            let dx = x as f64 - 70.0;
            let dy = y as f64 - 70.0;
            let angle = dy.atan2(dx);
            let radius = 40.0 + 8.0 * (7.0 * angle).sin() + 4.0 * (13.0 * angle).cos();
            dx.hypot(dy) <= radius
        });

        let extraction = BoundaryExtractor::default().extract_detailed(&blob).unwrap();
        let tear = &extraction.tear().unwrap().arc;
        assert!(tear.closed);
        assert_eq!(tear.len(), extraction.contour.len());
        assert!(extraction.corners.is_empty());

        let strict = BoundaryExtractor::new(ExtractorConfig::default().with_allow_closed(false));
        assert_eq!(strict.extract(&blob), Err(ExtractionError::TooFewCorners { found: 0 }));
    }

    #[test]
    fn exposes_every_tear_on_a_strip() {
        // Torn along the top and the bottom, cut straight on the sides
        let strip = FragmentMask::from_predicate(200, 200, |x, y| {
            let (x, y) = (x as f64, y as f64);
            let top = 50.0 + TestTear::Wave.offset_at(x);
            let bottom = 150.0 + TestTear::Jagged.offset_at(x);
            (10.0..190.0).contains(&x) && y >= top && y < bottom
        });

        let candidates = BoundaryExtractor::default().extract_all(&strip).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates[0].score() >= candidates[1].score());

        let mean_y = |c: &TearCandidate| c.arc.points.iter().map(|p| p.y).sum::<f64>() / c.arc.len() as f64;
        let mut centres: Vec<f64> = candidates.iter().map(mean_y).collect();
        centres.sort_by(f64::total_cmp);
        assert!(centres[0] < 70.0 && centres[1] > 130.0, "{centres:?}");
    }

    #[test]
    fn short_contour_is_degenerate() {
        let square = vec![
            BoundaryPoint::new(0.0, 0.0),
            BoundaryPoint::new(1.0, 0.0),
            BoundaryPoint::new(1.0, 1.0),
            BoundaryPoint::new(0.0, 1.0),
        ];
        assert!(matches!(
            BoundaryExtractor::default().extract_from_contour(square),
            Err(ExtractionError::DegenerateContour { points: 4, .. })
        ));
    }
}
