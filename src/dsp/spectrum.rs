use super::filter::{in_passband, FilterConfig, FilterKind};
use crate::fft::FftPlan;
use num_complex::Complex32;
use num_traits::Zero;
use std::f32::consts::PI;
use std::sync::Arc;

/// Gain applied to spectrum bins outside the active filter's passband.
/// A soft 0.1× rolloff rather than a brick-wall cut.
pub const SOFT_ATTENUATION: f32 = 0.1;

/// Hann window coefficients `0.5·(1 − cos(2π·i/(n−1)))`.
pub fn hann_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let denom = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / denom).cos()))
        .collect()
}

/// Scales bins in the first half of `bins` that fall outside the passband.
pub fn attenuate_outside_passband(
    bins: &mut [Complex32],
    filter: &FilterConfig,
    sample_rate: u32,
    factor: f32,
) {
    if filter.kind == FilterKind::None {
        return;
    }

    let n = bins.len();
    let cutoff_index = filter.cutoff_index(sample_rate, n);
    for (i, bin) in bins.iter_mut().take(n / 2).enumerate() {
        if !in_passband(filter.kind, i, cutoff_index) {
            *bin *= factor;
        }
    }
}

/// Windowed FFT analysis over a fixed-size block.
///
/// Owns its complex work buffer, so a call to [`SpectrumAnalyzer::analyze`]
/// does not allocate.
pub struct SpectrumAnalyzer {
    plan: Arc<dyn FftPlan>,
    window: Option<Vec<f32>>,
    bins: Vec<Complex32>,
    sample_rate: u32,
    attenuation: f32,
}

impl SpectrumAnalyzer {
    pub fn new(plan: Arc<dyn FftPlan>, sample_rate: u32, hann: bool, attenuation: f32) -> Self {
        let n = plan.size();
        Self {
            window: hann.then(|| hann_window(n)),
            bins: vec![Complex32::zero(); n],
            plan,
            sample_rate,
            attenuation,
        }
    }

    /// Runs window → FFT → passband attenuation on `samples` and returns the bins.
    pub fn analyze(&mut self, samples: &[f32], filter: &FilterConfig) -> &[Complex32] {
        assert_eq!(
            samples.len(),
            self.bins.len(),
            "analysis window does not match transform size"
        );

        match &self.window {
            Some(coeffs) => {
                for ((bin, &x), &w) in self.bins.iter_mut().zip(samples).zip(coeffs) {
                    *bin = Complex32::new(x * w, 0.0);
                }
            }
            None => {
                for (bin, &x) in self.bins.iter_mut().zip(samples) {
                    *bin = Complex32::new(x, 0.0);
                }
            }
        }

        self.plan.xform_inplace(&mut self.bins);
        attenuate_outside_passband(&mut self.bins, filter, self.sample_rate, self.attenuation);

        &self.bins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fft::find_fft;

    #[test]
    fn hann_endpoints_and_centre() {
        let w = hann_window(9);
        assert!(w[0].abs() < 1e-7);
        assert!(w[8].abs() < 1e-7);
        assert!((w[4] - 1.0).abs() < 1e-6);
        assert_eq!(hann_window(1), vec![1.0]);
    }

    #[test]
    fn low_pass_scales_bins_above_cutoff_by_exactly_the_factor() {
        let n = 64;
        let sample_rate = 64;
        let raw: Vec<Complex32> = (0..n)
            .map(|i| Complex32::new(1.0 + i as f32, -(i as f32) * 0.5))
            .collect();
        let filter = FilterConfig::new(FilterKind::LowPass, 10.0);
        let k = filter.cutoff_index(sample_rate, n);
        assert_eq!(k, 10);

        let mut bins = raw.clone();
        attenuate_outside_passband(&mut bins, &filter, sample_rate, SOFT_ATTENUATION);

        for i in 0..n / 2 {
            if i > k {
                assert_eq!(bins[i], raw[i] * SOFT_ATTENUATION, "bin {i}");
            } else {
                assert_eq!(bins[i], raw[i], "bin {i}");
            }
        }
        assert_eq!(&bins[n / 2..], &raw[n / 2..]);
    }

    #[test]
    fn high_pass_scales_bins_below_cutoff() {
        let n = 32;
        let raw = vec![Complex32::new(2.0, 0.0); n];
        let filter = FilterConfig::new(FilterKind::HighPass, 12.0);
        let k = filter.cutoff_index(32, n);

        let mut bins = raw.clone();
        attenuate_outside_passband(&mut bins, &filter, 32, SOFT_ATTENUATION);

        for i in 0..n / 2 {
            let expected = if i < k { 0.2 } else { 2.0 };
            assert!((bins[i].re - expected).abs() < 1e-6, "bin {i}");
        }
    }

    #[test]
    fn none_filter_leaves_bins_untouched() {
        let raw = vec![Complex32::new(1.0, 1.0); 16];
        let mut bins = raw.clone();
        attenuate_outside_passband(&mut bins, &FilterConfig::default(), 16, SOFT_ATTENUATION);
        assert_eq!(bins, raw);
    }

    #[test]
    fn silence_produces_zero_spectrum() {
        let mut analyzer = SpectrumAnalyzer::new(find_fft(128).unwrap(), 8000, true, 0.1);
        let bins = analyzer.analyze(&[0.0; 128], &FilterConfig::default());
        assert!(bins.iter().all(|b| b.norm() == 0.0));
    }

    #[test]
    fn unwindowed_tone_peaks_in_expected_bin() {
        let mut analyzer = SpectrumAnalyzer::new(find_fft(8).unwrap(), 8, false, 0.1);
        let bins = analyzer.analyze(
            &[1.0, 0.0, -1.0, 0.0, 1.0, 0.0, -1.0, 0.0],
            &FilterConfig::default(),
        );
        assert!((bins[2].norm() - 4.0).abs() < 1e-5);
        assert!(bins[1].norm() < 1e-5);
        assert!(bins[3].norm() < 1e-5);
    }

    #[test]
    fn hann_window_reduces_leakage() {
        let n = 256;
        let sample_rate = 256;
        // 20.5 cycles: worst-case leakage between bins.
        let tone: Vec<f32> = (0..n)
            .map(|i| (2.0 * PI * 20.5 * i as f32 / n as f32).sin())
            .collect();

        let mut plain = SpectrumAnalyzer::new(find_fft(n).unwrap(), sample_rate, false, 0.1);
        let far_plain = plain.analyze(&tone, &FilterConfig::default())[60].norm();

        let mut windowed = SpectrumAnalyzer::new(find_fft(n).unwrap(), sample_rate, true, 0.1);
        let far_windowed = windowed.analyze(&tone, &FilterConfig::default())[60].norm();

        assert!(far_windowed < far_plain * 0.1);
    }
}
