pub mod encoder;
pub mod ring;

use crate::error::DeviceError;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};

/// Start/stop control over an opened capture stream.
///
/// `stop` may return while a callback is still in flight on some backends.
/// Encoder writes go through the shared sink lock, so a sink taken out after
/// `stop` is never written to again.
pub trait CaptureDevice {
    fn start(&mut self) -> Result<(), DeviceError>;
    fn stop(&mut self) -> Result<(), DeviceError>;
}

/// Stream parameters reported by the device.
#[derive(Debug, Clone, Copy)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Converts raw device samples into the normalized `[-1.0, 1.0]` domain.
pub fn normalize_into<T>(input: &[T], out: &mut Vec<f32>)
where
    T: Sample,
    f32: FromSample<T>,
{
    out.clear();
    out.extend(input.iter().map(|&s| s.to_sample::<f32>().clamp(-1.0, 1.0)));
}

/// Downmixes interleaved frames to mono.
/// Stereo is averaged; wider layouts keep the first channel.
pub fn downmix_into(interleaved: &[f32], channels: usize, out: &mut Vec<f32>) {
    out.clear();
    match channels {
        0 | 1 => out.extend_from_slice(interleaved),
        2 => out.extend(
            interleaved
                .chunks_exact(2)
                .map(|chunk| (chunk[0] + chunk[1]) * 0.5),
        ),
        _ => out.extend(interleaved.chunks_exact(channels).map(|chunk| chunk[0])),
    }
}

/// Queries the default input device without opening a stream.
pub fn probe_default_input() -> Result<(cpal::Device, cpal::SupportedStreamConfig), DeviceError> {
    let host = cpal::default_host();

    //
    // Log all available input devices for debugging.
    //
    log::info!("--- AVAILABLE INPUT DEVICES ---");
    if let Ok(devices) = host.input_devices() {
        for (i, dev) in devices.enumerate() {
            let name = dev.name().unwrap_or("Unknown".into());
            log::info!("  [{}]: {}", i, name);
        }
    }
    log::info!("-------------------------------");

    let device = host
        .default_input_device()
        .ok_or(DeviceError::NoInputDevice)?;

    log::info!(
        "Selected audio device: {}",
        device.name().unwrap_or("Unknown".into())
    );

    let supported_config = device
        .default_input_config()
        .map_err(|e| DeviceError::DefaultConfig(e.to_string()))?;

    Ok((device, supported_config))
}

/// cpal-backed capture stream. Built paused; the recorder starts it.
pub struct CpalCapture {
    stream: cpal::Stream,
    info: StreamInfo,
}

impl CpalCapture {
    /// Opens an input stream delivering normalized interleaved blocks to
    /// `on_block(samples, channels)` from the driver's callback thread.
    pub fn open<F>(
        device: &cpal::Device,
        supported_config: cpal::SupportedStreamConfig,
        on_block: F,
    ) -> Result<Self, DeviceError>
    where
        F: FnMut(&[f32], usize) + Send + 'static,
    {
        let sample_format = supported_config.sample_format();
        let config: cpal::StreamConfig = supported_config.into();
        let info = StreamInfo {
            sample_rate: config.sample_rate.0,
            channels: config.channels,
        };

        log::info!(
            "Audio config: {:?} @ {}Hz, Channels: {}",
            sample_format,
            info.sample_rate,
            info.channels
        );

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32, F>(device, &config, on_block),
            SampleFormat::I16 => build_stream::<i16, F>(device, &config, on_block),
            SampleFormat::U16 => build_stream::<u16, F>(device, &config, on_block),
            SampleFormat::I32 => build_stream::<i32, F>(device, &config, on_block),
            SampleFormat::U8 => build_stream::<u8, F>(device, &config, on_block),
            other => return Err(DeviceError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        //
        // Some backends start streams on creation.
        //
        stream
            .pause()
            .map_err(|e| DeviceError::Stop(e.to_string()))?;

        Ok(Self { stream, info })
    }

    pub fn info(&self) -> StreamInfo {
        self.info
    }
}

fn build_stream<T, F>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut on_block: F,
) -> Result<cpal::Stream, DeviceError>
where
    T: SizedSample,
    f32: FromSample<T>,
    F: FnMut(&[f32], usize) + Send + 'static,
{
    let channels = config.channels as usize;
    let mut normalized: Vec<f32> = Vec::new();
    let err_fn = |err| log::warn!("Audio input error: {}", err);

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                normalize_into(data, &mut normalized);
                on_block(&normalized, channels);
            },
            err_fn,
            None,
        )
        .map_err(|e| DeviceError::BuildStream(e.to_string()))
}

impl CaptureDevice for CpalCapture {
    fn start(&mut self) -> Result<(), DeviceError> {
        self.stream
            .play()
            .map_err(|e| DeviceError::Start(e.to_string()))
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.stream
            .pause()
            .map_err(|e| DeviceError::Stop(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_formats_normalize_to_unit_range() {
        let mut out = Vec::new();

        normalize_into(&[i16::MIN, 0, 16384], &mut out);
        assert_eq!(out, vec![-1.0, 0.0, 0.5]);

        normalize_into(&[0u16, 32768], &mut out);
        assert_eq!(out, vec![-1.0, 0.0]);
    }

    #[test]
    fn clipped_float_input_is_clamped() {
        let mut out = Vec::new();
        normalize_into(&[1.7f32, -3.0, 0.25], &mut out);
        assert_eq!(out, vec![1.0, -1.0, 0.25]);
    }

    #[test]
    fn stereo_is_averaged() {
        let mut out = Vec::new();
        downmix_into(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2, &mut out);
        assert_eq!(out, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn wide_layouts_keep_first_channel() {
        let mut out = Vec::new();
        downmix_into(&[0.1, 0.9, 0.9, 0.2, 0.9, 0.9], 3, &mut out);
        assert_eq!(out, vec![0.1, 0.2]);
    }

    #[test]
    fn mono_passes_through() {
        let mut out = vec![9.0; 3];
        downmix_into(&[0.3, 0.4], 1, &mut out);
        assert_eq!(out, vec![0.3, 0.4]);
    }
}
