pub mod extractor;
pub mod loader;

use crate::geometry::BoundaryPoint;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_line_segment_mut};
use std::path::Path;

/// Define a consistent colour palette for debugging annotations
pub struct DebugColors;
impl DebugColors {
    // Full outer contour - blue
    pub const CONTOUR: Rgb<u8> = Rgb([60, 110, 255]);
    // Best tear arc - bright green
    pub const TEAR: Rgb<u8> = Rgb([0, 255, 0]);
    // Other tear candidates - orange
    pub const ALTERNATE: Rgb<u8> = Rgb([255, 165, 0]);
    // Corners - red
    pub const CORNER: Rgb<u8> = Rgb([255, 0, 0]);
}

/// Draw the traced contour, its corners and every tear candidate.
pub fn annotate_tear(image: &mut RgbImage, extraction: &TearExtraction) {
    draw_polyline(image, &extraction.contour, true, DebugColors::CONTOUR);

    // Draw the weaker candidates first so the best tear stays on top
    for candidate in extraction.candidates.iter().skip(1) {
        draw_polyline(image, &candidate.arc.points, candidate.arc.closed, DebugColors::ALTERNATE);
    }
    if let Some(best) = extraction.tear() {
        draw_polyline(image, &best.arc.points, best.arc.closed, DebugColors::TEAR);
        log::debug!(
            "Tear annotation: {} points, length {:.1}, score {:.1}",
            best.arc.len(),
            best.length,
            best.score()
        );
    }

    for &corner in &extraction.corners {
        if let Some(p) = extraction.contour.get(corner) {
            draw_cross_mut(image, DebugColors::CORNER, p.x.round() as i32, p.y.round() as i32);
        }
    }
}

fn draw_polyline(image: &mut RgbImage, points: &[BoundaryPoint], closed: bool, colour: Rgb<u8>) {
    let segments = points.windows(2).map(|w| (w[0], w[1]));
    let closing = match (closed, points.first(), points.last()) {
        (true, Some(&first), Some(&last)) if points.len() > 2 => Some((last, first)),
        _ => None,
    };

    for (a, b) in segments.chain(closing) {
        draw_line_segment_mut(image, (a.x as f32, a.y as f32), (b.x as f32, b.y as f32), colour);
    }
}

/// Convert a mask to RgbImage for visualisation
pub fn mask_to_rgb_image(mask: &loader::FragmentMask) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        // Dim the foreground so annotations stand out
        let value = if mask.pixels.get_pixel(x, y)[0] > 0 { 90 } else { 0 };
        Rgb([value, value, value])
    })
}

/// Configuration for debug output
#[derive(Debug, Clone)]
pub struct DebugOutputConfig {
    /// Whether debug output should be saved
    pub enabled: bool,
    /// Base directory for saving debug output
    pub output_dir: Option<String>,
}

impl Default for DebugOutputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: None,
        }
    }
}

/// Helper function to save debug output with configuration.
pub fn save_debug_output<P: AsRef<Path>>(
    image: &RgbImage,
    filename: P,
    tear_count: usize,
    processing_time: std::time::Duration,
    config: Option<&DebugOutputConfig>,
) -> crate::error::Result<()> {
    let default_config = DebugOutputConfig::default();
    let config = config.unwrap_or(&default_config);

    if config.enabled {
        let path = if let Some(ref dir) = config.output_dir {
            std::path::Path::new(dir).join(filename.as_ref())
        } else {
            filename.as_ref().to_path_buf()
        };

        image.save(&path)?;
        log::info!(
            "Debug output saved: {} with {} tear candidates. Processing time: {:.3}ms",
            path.display(),
            tear_count,
            processing_time.as_secs_f64() * 1e3
        );
    }

    Ok(())
}

pub use extractor::{BoundaryExtractor, TearCandidate, TearExtraction};
pub use loader::{FragmentMask, FragmentSide, TestTear};
