use super::FftPlan;
use crate::error::ConfigError;
use fftw::array::AlignedVec;
use fftw::plan::*;
use fftw::types::*;
use num_complex::Complex32;
use parking_lot::Mutex;

/// FFTW3 backend for power-of-two sizes.
/// Plans and their aligned scratch buffers are guarded by a mutex because
/// FFTW plan execution needs exclusive access to the buffers.
pub struct FftwPlan {
    n: usize,
    state: Mutex<InternalState>,
}

struct InternalState {
    forward: C2CPlan32,
    backward: C2CPlan32,
    input: AlignedVec<c32>,
    output: AlignedVec<c32>,
}

// SAFETY: the raw FFTW plans are only ever touched behind the mutex.
unsafe impl Send for FftwPlan {}
unsafe impl Sync for FftwPlan {}

impl FftwPlan {
    pub fn new(n: usize) -> Result<Self, ConfigError> {
        if n == 0 || !n.is_power_of_two() {
            return Err(ConfigError::NotPowerOfTwo(n));
        }

        //
        // MEASURE planning failures only happen on misconfiguration.
        //
        let forward = C2CPlan32::aligned(&[n], Sign::Forward, Flag::MEASURE)
            .map_err(|_| ConfigError::NotPowerOfTwo(n))?;
        let backward = C2CPlan32::aligned(&[n], Sign::Backward, Flag::MEASURE)
            .map_err(|_| ConfigError::NotPowerOfTwo(n))?;

        Ok(Self {
            n,
            state: Mutex::new(InternalState {
                forward,
                backward,
                input: AlignedVec::new(n),
                output: AlignedVec::new(n),
            }),
        })
    }

    fn run(&self, buffer: &mut [Complex32], inverse: bool) {
        assert_eq!(buffer.len(), self.n, "FFT buffer length does not match plan size");

        let mut guard = self.state.lock();
        let state = &mut *guard;

        state.input.copy_from_slice(buffer);
        let plan = if inverse {
            &mut state.backward
        } else {
            &mut state.forward
        };
        if let Err(e) = plan.c2c(&mut state.input, &mut state.output) {
            log::error!("FFTW execution failed: {:?}", e);
            return;
        }

        //
        // FFTW's backward transform is unnormalized.
        //
        let scale = if inverse { 1.0 / self.n as f32 } else { 1.0 };
        for (dst, src) in buffer.iter_mut().zip(state.output.iter()) {
            *dst = *src * scale;
        }
    }
}

impl FftPlan for FftwPlan {
    fn xform_inplace(&self, buffer: &mut [Complex32]) {
        self.run(buffer, false);
    }

    fn inverse_inplace(&self, buffer: &mut [Complex32]) {
        self.run(buffer, true);
    }

    fn name(&self) -> String {
        format!("FFTW({})", self.n)
    }

    fn size(&self) -> usize {
        self.n
    }
}
