use crate::dsp::filter::{FilterConfig, FilterKind, MIN_CUTOFF_HZ};
use crate::dsp::peak::PeakMode;
use crate::dsp::spectrum::SOFT_ATTENUATION;
use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Smallest transform size the analyzer accepts.
pub const MIN_FFT_SIZE: usize = 2;

/// Sample encoding of the recorded WAV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Encoding {
    /// 32-bit IEEE float
    F32,
    /// 16-bit signed PCM
    I16,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "specscope")]
#[command(about = "Real-time audio recorder with spectrum analysis and filtering")]
#[command(version = "0.1.0")]
pub struct Args {
    /// Transform size (power of two); also the length of the sample window
    #[arg(long, default_value = "1024")]
    pub fft_size: usize,

    /// WAV file written while recording
    #[arg(long, default_value = "recording.wav")]
    pub output: PathBuf,

    /// Initial filter cutoff in Hz
    #[arg(long, default_value = "1000")]
    pub cutoff: f32,

    /// Cutoff change per frame while Up/Down is held, in Hz
    #[arg(long, default_value = "10")]
    pub cutoff_step: f32,

    /// Skip the Hann window before the transform
    #[arg(long)]
    pub no_window: bool,

    /// Spectrum gain applied outside the filter passband
    #[arg(long, default_value_t = SOFT_ATTENUATION)]
    pub attenuation: f32,

    /// Write filtered samples back into the sample ring
    #[arg(long)]
    pub filter_writeback: bool,

    /// Fold mirrored bins above Nyquist when searching for the peak
    #[arg(long)]
    pub fold_peaks: bool,

    /// Sample encoding of the recording
    #[arg(long, value_enum, default_value = "f32")]
    pub encoding: Encoding,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            output: PathBuf::from("recording.wav"),
            cutoff: 1000.0,
            cutoff_step: 10.0,
            no_window: false,
            attenuation: SOFT_ATTENUATION,
            filter_writeback: false,
            fold_peaks: false,
            encoding: Encoding::F32,
        }
    }
}

/// Validated analyzer configuration, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub fft_size: usize,
    pub output: PathBuf,
    pub initial_filter: FilterConfig,
    pub cutoff_step: f32,
    pub hann_window: bool,
    pub attenuation: f32,
    pub filter_writeback: bool,
    pub peak_mode: PeakMode,
    pub encoding: Encoding,
}

impl AnalyzerConfig {
    /// Combines CLI arguments with the capture device's stream parameters.
    pub fn new(args: &Args, sample_rate: u32, channels: u16) -> Result<Self, ConfigError> {
        validate_fft_size(args.fft_size)?;

        if sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        if channels == 0 {
            return Err(ConfigError::InvalidChannels(channels));
        }
        if !(0.0..=1.0).contains(&args.attenuation) {
            return Err(ConfigError::InvalidAttenuation(args.attenuation));
        }

        let mut initial_filter = FilterConfig::new(FilterKind::None, MIN_CUTOFF_HZ);
        initial_filter.set_cutoff(args.cutoff, sample_rate);

        Ok(Self {
            sample_rate,
            channels,
            fft_size: args.fft_size,
            output: args.output.clone(),
            initial_filter,
            cutoff_step: args.cutoff_step.abs(),
            hann_window: !args.no_window,
            attenuation: args.attenuation,
            filter_writeback: args.filter_writeback,
            peak_mode: if args.fold_peaks {
                PeakMode::Folded
            } else {
                PeakMode::HalfSpectrum
            },
            encoding: args.encoding,
        })
    }
}

/// Rejects transform sizes the radix-2 FFT cannot handle.
pub fn validate_fft_size(n: usize) -> Result<(), ConfigError> {
    if n < MIN_FFT_SIZE {
        return Err(ConfigError::TooSmall {
            size: n,
            min: MIN_FFT_SIZE,
        });
    }
    if !n.is_power_of_two() {
        return Err(ConfigError::NotPowerOfTwo(n));
    }
    Ok(())
}
