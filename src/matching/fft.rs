//! FFT-based circular cross-correlation used to align closed tear signatures.
//!
//! The squared distance between `a` and `b` rolled by `k` is
//! `|a|² + |b|² - 2·corr[k]`, so the best shift is the correlation peak.

use rustfft::{num_complex::Complex, FftPlanner};

/// Correlation peaks within this fraction of the maximum are treated as ties.
const PEAK_TIE_RATIO: f64 = 1e-9;

/// `corr[k] = Σ_i a[i] · b[(i + k) mod n]` for every shift `k`.
pub fn circular_cross_correlation(a: &[f64], b: &[f64]) -> Vec<f64> {
    let len = a.len().min(b.len());
    if len == 0 {
        return Vec::new();
    }

    let mut planner = FftPlanner::<f64>::new();
    let forward = planner.plan_fft_forward(len);
    let inverse = planner.plan_fft_inverse(len);

    let mut a_spectrum: Vec<Complex<f64>> = a[..len].iter().map(|&x| Complex::new(x, 0.0)).collect();
    let mut b_spectrum: Vec<Complex<f64>> = b[..len].iter().map(|&x| Complex::new(x, 0.0)).collect();
    forward.process(&mut a_spectrum);
    forward.process(&mut b_spectrum);

    // Correlation theorem: conj(A) · B, then inverse transform
    let mut product: Vec<Complex<f64>> = a_spectrum
        .iter()
        .zip(b_spectrum.iter())
        .map(|(fa, fb)| fa.conj() * fb)
        .collect();
    inverse.process(&mut product);

    // rustfft leaves the inverse unnormalised
    let scale = 1.0 / len as f64;
    product.iter().map(|c| c.re * scale).collect()
}

/// Shifts whose correlation is within floating-point noise of the peak, ascending.
pub fn peak_shifts(a: &[f64], b: &[f64]) -> Vec<usize> {
    let correlation = circular_cross_correlation(a, b);
    let peak = correlation.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !peak.is_finite() {
        return Vec::new();
    }

    let energy = a.iter().chain(b.iter()).map(|v| v * v).sum::<f64>();
    let tolerance = energy.max(1.0) * PEAK_TIE_RATIO;

    correlation
        .iter()
        .enumerate()
        .filter(|(_, &value)| peak - value <= tolerance)
        .map(|(shift, _)| shift)
        .collect()
}
