use crate::error::SignatureError;
use crate::geometry::point::BoundaryPoint;

/// An ordered run of boundary points.
///
/// An open arc runs from its first point (E0) to its last point (E1). A closed
/// arc is a loop: the last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundaryArc {
    pub points: Vec<BoundaryPoint>,
    pub closed: bool,
}

impl BoundaryArc {
    pub fn open(points: Vec<BoundaryPoint>) -> Self {
        Self { points, closed: false }
    }

    pub fn closed(points: Vec<BoundaryPoint>) -> Self {
        Self { points, closed: true }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn endpoints(&self) -> Option<(BoundaryPoint, BoundaryPoint)> {
        Some((*self.points.first()?, *self.points.last()?))
    }

    /// Distance between E0 and E1 (zero for closed arcs and empty arcs).
    pub fn chord_length(&self) -> f64 {
        if self.closed {
            return 0.0;
        }
        self.endpoints()
            .map(|(start, end)| start.distance(&end))
            .unwrap_or(0.0)
    }

    /// Vertices walked along the arc; closed arcs repeat the first point at the end.
    fn path(&self) -> Vec<BoundaryPoint> {
        let mut path = self.points.clone();
        if self.closed {
            if let Some(&first) = self.points.first() {
                path.push(first);
            }
        }
        path
    }

    /// Arc length from the first vertex to each vertex of the walked path.
    pub fn cumulative_lengths(&self) -> Vec<f64> {
        let path = self.path();
        let mut cumulative = Vec::with_capacity(path.len());
        let mut total = 0.0;
        for (i, point) in path.iter().enumerate() {
            if i > 0 {
                total += path[i - 1].distance(point);
            }
            cumulative.push(total);
        }
        cumulative
    }

    pub fn length(&self) -> f64 {
        self.cumulative_lengths().last().copied().unwrap_or(0.0)
    }

    /// Resample the arc at `samples` positions spaced uniformly by arc length.
    ///
    /// Open arcs include both endpoints; closed arcs sample `L * j / samples`
    /// so the closing segment is covered without repeating the start.
    pub fn resample(&self, samples: usize) -> Result<Vec<BoundaryPoint>, SignatureError> {
        if samples < 2 {
            return Err(SignatureError::InvalidResolution(samples));
        }
        if self.points.len() < 2 {
            return Err(SignatureError::TooFewPoints(self.points.len()));
        }

        let path = self.path();
        let cumulative = self.cumulative_lengths();
        let total = cumulative.last().copied().unwrap_or(0.0);
        if total <= f64::EPSILON {
            return Err(SignatureError::ZeroArcLength);
        }

        let divisor = (if self.closed { samples } else { samples - 1 }) as f64;
        let mut resampled = Vec::with_capacity(samples);
        let mut segment = 0;

        for j in 0..samples {
            let target = total * j as f64 / divisor;
            while segment + 2 < cumulative.len() && cumulative[segment + 1] < target {
                segment += 1;
            }

            let start = cumulative[segment];
            let span = cumulative[segment + 1] - start;
            let t = if span > 0.0 {
                ((target - start) / span).clamp(0.0, 1.0)
            } else {
                0.0
            };
            resampled.push(path[segment].lerp(&path[segment + 1], t));
        }

        Ok(resampled)
    }

    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        points.reverse();
        Self {
            points,
            closed: self.closed,
        }
    }

    pub fn scaled(&self, factor: f64) -> Self {
        self.map_points(|p| p * factor)
    }

    pub fn translated(&self, offset: BoundaryPoint) -> Self {
        self.map_points(|p| p + offset)
    }

    pub fn rotated(&self, angle: f64) -> Self {
        self.map_points(|p| p.rotated(angle))
    }

    fn map_points(&self, f: impl Fn(BoundaryPoint) -> BoundaryPoint) -> Self {
        Self {
            points: self.points.iter().copied().map(f).collect(),
            closed: self.closed,
        }
    }
}

/// Signed area of a closed polygon (shoelace formula).
pub fn polygon_area(points: &[BoundaryPoint]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let twice_area: f64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.cross(b))
        .sum();
    twice_area / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<BoundaryPoint> {
        vec![
            BoundaryPoint::new(0.0, 0.0),
            BoundaryPoint::new(4.0, 0.0),
            BoundaryPoint::new(4.0, 4.0),
            BoundaryPoint::new(0.0, 4.0),
        ]
    }

    #[test]
    fn open_and_closed_lengths() {
        assert_eq!(BoundaryArc::open(square()).length(), 12.0);
        assert_eq!(BoundaryArc::closed(square()).length(), 16.0);
    }

    #[test]
    fn resample_open_includes_endpoints() {
        let arc = BoundaryArc::open(vec![
            BoundaryPoint::new(0.0, 0.0),
            BoundaryPoint::new(2.0, 0.0),
            BoundaryPoint::new(10.0, 0.0),
        ]);
        let samples = arc.resample(5).unwrap();

        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0], BoundaryPoint::new(0.0, 0.0));
        assert_eq!(samples[2], BoundaryPoint::new(5.0, 0.0));
        assert_eq!(samples[4], BoundaryPoint::new(10.0, 0.0));
    }

    #[test]
    fn resample_closed_covers_closing_segment() {
        let samples = BoundaryArc::closed(square()).resample(8).unwrap();
        assert_eq!(samples.len(), 8);
        // Last sample lies on the closing edge (0,4) -> (0,0)
        assert_eq!(samples[7], BoundaryPoint::new(0.0, 2.0));
    }

    #[test]
    fn resample_rejects_degenerate_arcs() {
        let single = BoundaryArc::open(vec![BoundaryPoint::new(1.0, 1.0)]);
        assert_eq!(single.resample(8), Err(SignatureError::TooFewPoints(1)));

        let stacked = BoundaryArc::open(vec![BoundaryPoint::new(1.0, 1.0); 4]);
        assert_eq!(stacked.resample(8), Err(SignatureError::ZeroArcLength));
    }

    #[test]
    fn shoelace_area() {
        assert_eq!(polygon_area(&square()).abs(), 16.0);
        assert_eq!(polygon_area(&square()[..2]), 0.0);
    }
}
