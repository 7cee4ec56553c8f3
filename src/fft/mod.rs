#[cfg(feature = "use_fftw")]
pub mod fftw;
pub mod radix2;

use crate::config::validate_fft_size;
use crate::error::ConfigError;
use lazy_static::lazy_static;
use num_complex::Complex32;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Base interface for all FFT implementations.
///
/// Plans are immutable once built and may be shared between the audio
/// callback and any other thread.
pub trait FftPlan: Send + Sync {
    /// Forward transform in place. `buffer.len()` must equal `size()`.
    fn xform_inplace(&self, buffer: &mut [Complex32]);

    /// Inverse transform in place, scaled by `1/n`.
    fn inverse_inplace(&self, buffer: &mut [Complex32]);

    /// Out-of-place forward transform.
    fn xform(&self, input: &[Complex32], output: &mut [Complex32]) {
        output.copy_from_slice(input);
        self.xform_inplace(output);
    }

    fn name(&self) -> String;
    fn size(&self) -> usize;
}

lazy_static! {
    static ref PLAN_CACHE: Mutex<HashMap<usize, Arc<dyn FftPlan>>> = Mutex::new(HashMap::new());
}

/// Returns an FFT plan for size `n`, building and caching it on first use.
///
/// Only sizes accepted by [`validate_fft_size`] are planned; anything else
/// is a configuration error.
pub fn find_fft(n: usize) -> Result<Arc<dyn FftPlan>, ConfigError> {
    validate_fft_size(n)?;

    // Cached plan lookup.
    {
        let cache = PLAN_CACHE.lock();
        if let Some(plan) = cache.get(&n) {
            return Ok(plan.clone());
        }
    }

    #[cfg(feature = "use_fftw")]
    let plan: Arc<dyn FftPlan> = Arc::new(fftw::FftwPlan::new(n)?);
    #[cfg(not(feature = "use_fftw"))]
    let plan: Arc<dyn FftPlan> = Arc::new(radix2::Radix2::new(n)?);

    let mut cache = PLAN_CACHE.lock();
    Ok(cache.entry(n).or_insert(plan).clone())
}
