use std::path::PathBuf;
use thiserror::Error;

/// Misconfiguration detected before the pipeline starts. Always fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("FFT size {0} is not a power of two")]
    NotPowerOfTwo(usize),

    #[error("FFT size {size} is below the minimum of {min}")]
    TooSmall { size: usize, min: usize },

    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    #[error("Invalid channel count: {0}")]
    InvalidChannels(u16),

    #[error("Attenuation factor {0} must lie in [0, 1]")]
    InvalidAttenuation(f32),
}

/// Failures of the capture device collaborator.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No capture device available
    #[error("No audio input device found. Please check system settings.")]
    NoInputDevice,

    #[error("Failed to get default input config: {0}")]
    DefaultConfig(String),

    #[error("Unsupported audio sample format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to build audio stream: {0}")]
    BuildStream(String),

    #[error("Failed to start audio stream: {0}")]
    Start(String),

    #[error("Failed to stop audio stream: {0}")]
    Stop(String),
}

/// Failures reported back to the issuer of a recorder command.
#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("Failed to open '{path}' for writing: {source}")]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to initialize encoder for '{path}': {reason}")]
    EncoderInit { path: PathBuf, reason: String },

    #[error("Failed to finalize encoder: {0}")]
    EncoderFinalize(String),

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Errors surfaced to `main`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audio device error: {0}")]
    Device(#[from] DeviceError),

    #[error("GUI error: {0}")]
    Gui(#[from] eframe::Error),
}
