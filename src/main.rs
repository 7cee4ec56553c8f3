mod audio;
mod config;
mod dsp;
mod error;
mod fft;
mod gui;
mod pipeline;
mod recorder;

use audio::encoder::{EncoderSpec, WavPersistence};
use audio::CpalCapture;
use clap::Parser;
use config::{AnalyzerConfig, Args};
use error::AppError;
use fft::find_fft;
use gui::AnalyzerApp;
use pipeline::{Pipeline, SharedState};
use recorder::{command_queue, Controller, Recorder};
use std::sync::Arc;

/// Commands buffered between input polling and the recorder.
const COMMAND_QUEUE_CAPACITY: usize = 64;

fn main() -> Result<(), AppError> {
    //
    // Initialize logging with default filter set to "info".
    //
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting real-time audio recorder and spectrum analyzer...");

    //
    // Probe the capture device first: its rate and channel count complete the config.
    //
    let (device, supported_config) = audio::probe_default_input()?;
    let config = AnalyzerConfig::new(
        &args,
        supported_config.sample_rate().0,
        supported_config.channels(),
    )?;

    log::info!("Initializing FFT plan for N={}", config.fft_size);
    let fft_plan = find_fft(config.fft_size)?;
    let plan_name = fft_plan.name();

    //
    // Build the producer pipeline and hand it to the audio callback.
    //
    let shared = Arc::new(SharedState::new(config.fft_size, config.initial_filter));
    let mut pipeline = Pipeline::new(&config, fft_plan, shared.clone());

    log::info!("Initializing audio capture...");
    let capture = CpalCapture::open(&device, supported_config, move |block, channels| {
        pipeline.process_block(block, channels);
    })?;

    let recorder = Recorder::new(
        shared.clone(),
        config.output.clone(),
        EncoderSpec {
            sample_rate: config.sample_rate,
            channels: config.channels,
            encoding: config.encoding,
        },
    );
    let (commands, receiver) = command_queue(COMMAND_QUEUE_CAPACITY);
    let controller = Controller::new(recorder, capture, WavPersistence, receiver);

    log::info!("Initializing GUI...");
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 480.0])
            .with_title("specscope"),
        ..Default::default()
    };

    let cutoff_step = config.cutoff_step;
    eframe::run_native(
        "specscope",
        options,
        Box::new(move |cc| {
            gui::theme::setup_global_style(&cc.egui_ctx);

            Ok(Box::new(AnalyzerApp::new(
                cc,
                controller,
                commands,
                shared,
                cutoff_step,
                plan_name,
            )))
        }),
    )?;

    Ok(())
}
