//! Producer side of the analysis pipeline and the state it shares with the
//! consumer.
//!
//! The audio callback owns a [`Pipeline`] and runs ingestion, filtering, the
//! FFT and peak extraction on its own scratch buffers. Only the final copy
//! into the published [`AnalysisFrame`] happens under a lock, so the lock is
//! never held across the transform.

use crate::audio::encoder::EncoderSink;
use crate::audio::ring::SampleRing;
use crate::config::AnalyzerConfig;
use crate::dsp::{extract_peak, FilterConfig, Peak, PeakMode, SpectrumAnalyzer};
use crate::fft::FftPlan;
use crate::recorder::RecorderState;
use num_complex::Complex32;
use num_traits::Zero;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

/// Latest analysis result as seen by the consumer.
#[derive(Debug, Clone)]
pub struct AnalysisFrame {
    pub samples: Vec<f32>,
    pub spectrum: Vec<Complex32>,
    pub peak: Peak,
    pub filter: FilterConfig,
    pub generation: u64,
}

impl AnalysisFrame {
    pub fn new(n: usize, filter: FilterConfig) -> Self {
        Self {
            samples: vec![0.0; n],
            spectrum: vec![Complex32::zero(); n],
            peak: Peak::default(),
            filter,
            generation: 0,
        }
    }
}

/// State shared between the audio callback, the recorder and the display.
pub struct SharedState {
    recorder_state: AtomicU8,
    filter: Mutex<FilterConfig>,
    sink: Mutex<Option<Box<dyn EncoderSink>>>,
    encoder_failed: AtomicBool,
    frame: Mutex<AnalysisFrame>,
    generation: AtomicU64,
}

impl SharedState {
    pub fn new(fft_size: usize, filter: FilterConfig) -> Self {
        Self {
            recorder_state: AtomicU8::new(RecorderState::Stopped as u8),
            filter: Mutex::new(filter),
            sink: Mutex::new(None),
            encoder_failed: AtomicBool::new(false),
            frame: Mutex::new(AnalysisFrame::new(fft_size, filter)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn recorder_state(&self) -> RecorderState {
        RecorderState::from_u8(self.recorder_state.load(Ordering::Acquire))
    }

    /// Only the recorder state machine calls this.
    pub(crate) fn set_recorder_state(&self, state: RecorderState) {
        self.recorder_state.store(state as u8, Ordering::Release);
    }

    pub fn filter(&self) -> FilterConfig {
        *self.filter.lock()
    }

    pub(crate) fn update_filter(&self, f: impl FnOnce(&mut FilterConfig)) -> FilterConfig {
        let mut filter = self.filter.lock();
        f(&mut filter);
        *filter
    }

    pub(crate) fn install_sink(&self, sink: Box<dyn EncoderSink>) {
        *self.sink.lock() = Some(sink);
        self.encoder_failed.store(false, Ordering::Release);
    }

    pub(crate) fn take_sink(&self) -> Option<Box<dyn EncoderSink>> {
        self.sink.lock().take()
    }

    pub fn has_sink(&self) -> bool {
        self.sink.lock().is_some()
    }

    /// True once the current session's encoder has stopped accepting samples.
    pub fn encoder_failed(&self) -> bool {
        self.encoder_failed.load(Ordering::Acquire)
    }

    /// Number of frames published so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Copies the most recently published frame into `out` without allocating
    /// (once `out` has the right size). Returns its generation.
    pub fn snapshot_into(&self, out: &mut AnalysisFrame) -> u64 {
        let frame = self.frame.lock();
        out.samples.clone_from(&frame.samples);
        out.spectrum.clone_from(&frame.spectrum);
        out.peak = frame.peak;
        out.filter = frame.filter;
        out.generation = frame.generation;
        frame.generation
    }

    pub fn latest_frame(&self) -> AnalysisFrame {
        self.frame.lock().clone()
    }

    pub fn peak_frequency(&self) -> f32 {
        self.frame.lock().peak.frequency_hz
    }

    fn publish(&self, samples: &[f32], spectrum: &[Complex32], peak: Peak, filter: FilterConfig) {
        let mut frame = self.frame.lock();
        frame.samples.copy_from_slice(samples);
        frame.spectrum.copy_from_slice(spectrum);
        frame.peak = peak;
        frame.filter = filter;
        frame.generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
    }
}

/// Per-block processing, owned by the audio callback.
pub struct Pipeline {
    shared: Arc<SharedState>,
    ring: SampleRing,
    window: Vec<f32>,
    mono: Vec<f32>,
    analyzer: SpectrumAnalyzer,
    sample_rate: u32,
    peak_mode: PeakMode,
    filter_writeback: bool,
}

impl Pipeline {
    pub fn new(config: &AnalyzerConfig, plan: Arc<dyn FftPlan>, shared: Arc<SharedState>) -> Self {
        let n = config.fft_size;
        Self {
            shared,
            ring: SampleRing::new(n),
            window: vec![0.0; n],
            mono: Vec::with_capacity(n),
            analyzer: SpectrumAnalyzer::new(
                plan,
                config.sample_rate,
                config.hann_window,
                config.attenuation,
            ),
            sample_rate: config.sample_rate,
            peak_mode: config.peak_mode,
            filter_writeback: config.filter_writeback,
        }
    }

    /// Handles one block of interleaved, normalized device frames.
    ///
    /// Dropped entirely unless the recorder is `Recording`: while paused the
    /// published frame stays frozen at its last state.
    pub fn process_block(&mut self, interleaved: &[f32], channels: usize) {
        if self.shared.recorder_state() != RecorderState::Recording {
            return;
        }

        //
        // One block in, one encoder write out, in arrival order.
        //
        if let Some(sink) = self.shared.sink.lock().as_mut() {
            if !sink.failed() {
                let written = sink.write_block(interleaved);
                if written < interleaved.len()
                    && !self.shared.encoder_failed.swap(true, Ordering::AcqRel)
                {
                    log::warn!(
                        "Encoder accepted {} of {} samples; recording output is incomplete",
                        written,
                        interleaved.len()
                    );
                }
            }
        }

        crate::audio::downmix_into(interleaved, channels, &mut self.mono);
        self.ring.ingest(&self.mono);

        let filter = self.shared.filter();
        self.ring.snapshot_into(&mut self.window);
        filter.apply(&mut self.window, self.sample_rate);
        if self.filter_writeback {
            self.ring.overwrite_from(&self.window);
        }

        let spectrum = self.analyzer.analyze(&self.window, &filter);
        let peak = extract_peak(spectrum, self.sample_rate, &filter, self.peak_mode);

        self.shared.publish(&self.window, spectrum, peak, filter);
    }

    #[cfg(test)]
    pub fn ring(&self) -> &SampleRing {
        &self.ring
    }
}
