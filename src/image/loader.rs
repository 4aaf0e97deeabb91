use crate::config::MaskOptions;
use crate::error::Result;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use std::f64::consts::TAU;
use std::path::Path;

const FOREGROUND: Luma<u8> = Luma([255]);
const BACKGROUND: Luma<u8> = Luma([0]);

/// Margin, in pixels, left around synthetic fragments.
const TEST_FRAGMENT_MARGIN: u32 = 10;

/// Synthetic tear profiles, useful for tests and benchmarks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestTear {
    /// Two superimposed sine waves
    Wave,
    /// Sawtooth teeth with a small ripple
    Jagged,
    /// A clean straight cut; yields no tear
    Straight,
}

impl TestTear {
    /// Offset of the tear line from its baseline at column `x`.
    pub fn offset_at(&self, x: f64) -> f64 {
        match self {
            TestTear::Wave => 9.0 * (TAU * x / 45.0).sin() + 4.0 * (TAU * x / 17.0 + 1.0).sin(),
            TestTear::Jagged => {
                let phase = (x / 24.0).fract();
                let triangle = if phase < 0.5 { phase * 4.0 - 1.0 } else { 3.0 - phase * 4.0 };
                8.0 * triangle + 3.0 * (x / 5.0).sin()
            }
            TestTear::Straight => 0.0,
        }
    }
}

/// Which side of the tear line the paper lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentSide {
    /// Paper below the tear (the tear is the top edge)
    Below,
    /// Paper above the tear (the tear is the bottom edge)
    Above,
}

/// Binary foreground/background mask of a single fragment.
///
/// Foreground pixels are 255, background pixels 0.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentMask {
    pub pixels: GrayImage,
}

impl FragmentMask {
    /// Load an image file and prepare its mask
    pub fn from_file<P: AsRef<Path>>(path: P, options: &MaskOptions) -> Result<Self> {
        let img = image::open(path)?;
        Ok(Self::from_dynamic_image(&img, options))
    }

    /// Grayscale, optionally resize and blur, then threshold.
    pub fn from_dynamic_image(img: &DynamicImage, options: &MaskOptions) -> Self {
        let mut gray = img.to_luma8();

        if let Some((width, height)) = options.resize {
            // Cubic resampling keeps the larger peaks and drops pixel-level grain
            gray = imageops::resize(&gray, width, height, FilterType::CatmullRom);
        }

        if options.blur_sigma > 0.0 {
            gray = imageproc::filter::gaussian_blur_f32(&gray, options.blur_sigma);
        }

        for pixel in gray.pixels_mut() {
            let bright = pixel[0] > options.threshold;
            *pixel = if bright != options.invert { FOREGROUND } else { BACKGROUND };
        }

        Self { pixels: gray }
    }

    /// Wrap an already segmented image; any non-zero pixel is foreground.
    pub fn from_binary(mut pixels: GrayImage) -> Self {
        for pixel in pixels.pixels_mut() {
            *pixel = if pixel[0] > 0 { FOREGROUND } else { BACKGROUND };
        }
        Self { pixels }
    }

    /// Build a mask from a per-pixel foreground predicate.
    pub fn from_predicate(width: u32, height: u32, foreground: impl Fn(u32, u32) -> bool) -> Self {
        let pixels = GrayImage::from_fn(width, height, |x, y| {
            if foreground(x, y) {
                FOREGROUND
            } else {
                BACKGROUND
            }
        });
        Self { pixels }
    }

    /// A rectangular fragment torn along a horizontal line through its middle.
    ///
    /// The three other edges are straight cuts set in from the image border.
    pub fn create_test_fragment(width: u32, height: u32, tear: TestTear, side: FragmentSide) -> Self {
        Self::from_tear_profile(width, height, side, |x| tear.offset_at(x))
    }

    /// Like [`FragmentMask::create_test_fragment`] with an arbitrary tear profile.
    pub fn from_tear_profile(
        width: u32,
        height: u32,
        side: FragmentSide,
        profile: impl Fn(f64) -> f64,
    ) -> Self {
        let margin = TEST_FRAGMENT_MARGIN;
        let baseline = height as f64 / 2.0;

        Self::from_predicate(width, height, |x, y| {
            if x < margin || x + margin >= width || y < margin || y + margin >= height {
                return false;
            }
            let tear_y = baseline + profile(x as f64);
            match side {
                FragmentSide::Below => y as f64 >= tear_y,
                FragmentSide::Above => (y as f64) < tear_y,
            }
        })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn foreground_count(&self) -> usize {
        self.pixels.pixels().filter(|p| p[0] > 0).count()
    }

    /// Save the mask to file (for debugging)
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.pixels.save(path)?;
        Ok(())
    }
}
