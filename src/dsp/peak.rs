use super::filter::{in_passband, FilterConfig};
use num_complex::Complex32;

/// Magnitudes at or below this are treated as silence.
pub const SILENCE_MAGNITUDE: f32 = 1e-4;

/// Which bins the peak search considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakMode {
    /// Bins `[0, n/2)` only.
    #[default]
    HalfSpectrum,
    /// All bins; a bin above `n/2` reports its mirror frequency `sampleRate − f`.
    Folded,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Peak {
    pub bin: usize,
    pub frequency_hz: f32,
    pub magnitude: f32,
}

impl Peak {
    /// False for silence: a peak at DC with near-zero magnitude is not a tone.
    pub fn is_tone(&self) -> bool {
        self.magnitude > SILENCE_MAGNITUDE
    }
}

pub fn bin_frequency(i: usize, sample_rate: u32, n: usize) -> f32 {
    i as f32 * sample_rate as f32 / n as f32
}

/// Dominant bin in the passband; ties go to the lowest index.
/// Below the silence floor the peak is reported at DC.
pub fn extract_peak(
    bins: &[Complex32],
    sample_rate: u32,
    filter: &FilterConfig,
    mode: PeakMode,
) -> Peak {
    let peak = match mode {
        PeakMode::HalfSpectrum => half_spectrum_peak(bins, sample_rate, filter),
        PeakMode::Folded => folded_peak(bins, sample_rate, filter),
    };
    if peak.is_tone() {
        peak
    } else {
        Peak {
            bin: 0,
            frequency_hz: 0.0,
            magnitude: peak.magnitude,
        }
    }
}

fn half_spectrum_peak(bins: &[Complex32], sample_rate: u32, filter: &FilterConfig) -> Peak {
    let n = bins.len();
    let cutoff_index = filter.cutoff_index(sample_rate, n);

    let mut best = Peak::default();
    for (i, bin) in bins.iter().enumerate().take(n / 2) {
        if !in_passband(filter.kind, i, cutoff_index) {
            continue;
        }
        let magnitude = bin.norm();
        if magnitude > best.magnitude {
            best = Peak {
                bin: i,
                frequency_hz: bin_frequency(i, sample_rate, n),
                magnitude,
            };
        }
    }
    best
}

fn folded_peak(bins: &[Complex32], sample_rate: u32, filter: &FilterConfig) -> Peak {
    let n = bins.len();
    let cutoff_index = filter.cutoff_index(sample_rate, n);

    let mut best = Peak::default();
    for (i, bin) in bins.iter().enumerate() {
        //
        // Bin i and bin n−i are the same physical frequency; report the lower.
        //
        let folded = if i > n / 2 { n - i } else { i };
        if !in_passband(filter.kind, folded, cutoff_index) {
            continue;
        }
        let magnitude = bin.norm();
        if magnitude > best.magnitude {
            let direct = bin_frequency(i, sample_rate, n);
            let mirrored = sample_rate as f32 - direct;
            best = Peak {
                bin: folded,
                frequency_hz: direct.min(mirrored),
                magnitude,
            };
        }
    }
    best
}
