//! Recorder state machine: Stopped / Recording / Paused.
//!
//! The transition function takes each command together with the capture
//! device and persistence collaborators, so the session lifecycle lives in
//! one place and can be driven by mocks in tests.

use crate::audio::encoder::{EncoderSpec, Persistence};
use crate::audio::CaptureDevice;
use crate::dsp::FilterKind;
use crate::error::RecorderError;
use crate::pipeline::SharedState;
use ringbuf::{Consumer, HeapRb, Producer};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RecorderState {
    Stopped = 0,
    Recording = 1,
    Paused = 2,
}

impl RecorderState {
    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => RecorderState::Recording,
            2 => RecorderState::Paused,
            _ => RecorderState::Stopped,
        }
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RecorderState::Stopped => "Stopped",
            RecorderState::Recording => "Recording",
            RecorderState::Paused => "Paused",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    StartOrResume,
    Pause,
    Stop,
    SelectFilter(FilterKind),
    AdjustCutoff(f32),
}

pub struct Recorder {
    shared: Arc<SharedState>,
    output: PathBuf,
    spec: EncoderSpec,
}

impl Recorder {
    pub fn new(shared: Arc<SharedState>, output: PathBuf, spec: EncoderSpec) -> Self {
        Self {
            shared,
            output,
            spec,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.shared.recorder_state()
    }

    /// Applies one command. On error the state is left as it was before the
    /// command and no session resources remain open.
    pub fn handle<D, P>(
        &mut self,
        command: Command,
        device: &mut D,
        persistence: &mut P,
    ) -> Result<RecorderState, RecorderError>
    where
        D: CaptureDevice + ?Sized,
        P: Persistence,
    {
        match command {
            Command::StartOrResume => self.start_or_resume(device, persistence)?,
            Command::Pause => {
                if self.state() == RecorderState::Recording {
                    self.transition(RecorderState::Paused);
                }
            }
            Command::Stop => self.stop(device)?,
            Command::SelectFilter(kind) => {
                let filter = self.shared.update_filter(|f| f.kind = kind);
                log::info!("Filter: {}, Cutoff: {:.2} Hz", filter.kind, filter.cutoff_hz);
            }
            Command::AdjustCutoff(delta) => {
                let sample_rate = self.spec.sample_rate;
                self.shared
                    .update_filter(|f| f.adjust_cutoff(delta, sample_rate));
            }
        }
        Ok(self.state())
    }

    fn start_or_resume<D, P>(&mut self, device: &mut D, persistence: &mut P) -> Result<(), RecorderError>
    where
        D: CaptureDevice + ?Sized,
        P: Persistence,
    {
        match self.state() {
            RecorderState::Recording => Ok(()),
            RecorderState::Paused => {
                self.transition(RecorderState::Recording);
                Ok(())
            }
            RecorderState::Stopped => {
                let output = persistence.open_output(&self.output)?;
                //
                // open_encoder consumes the output handle, so a failure here
                // closes it before the error propagates.
                //
                let sink = persistence.open_encoder(output, &self.output, self.spec)?;
                self.shared.install_sink(sink);

                if let Err(e) = device.start() {
                    if let Some(sink) = self.shared.take_sink() {
                        if let Err(close_err) = sink.close() {
                            log::warn!("Releasing encoder after failed start: {}", close_err);
                        }
                    }
                    return Err(e.into());
                }

                self.transition(RecorderState::Recording);
                Ok(())
            }
        }
    }

    /// Device stop, then encoder finalize, then handle close.
    fn stop<D>(&mut self, device: &mut D) -> Result<(), RecorderError>
    where
        D: CaptureDevice + ?Sized,
    {
        if self.state() == RecorderState::Stopped {
            return Ok(());
        }

        let device_result = device.stop();
        self.transition(RecorderState::Stopped);

        let close_result = match self.shared.take_sink() {
            Some(sink) => sink.close(),
            None => Ok(()),
        };

        device_result?;
        close_result
    }

    fn transition(&self, next: RecorderState) {
        let prev = self.state();
        self.shared.set_recorder_state(next);
        log::info!("Recorder: {} -> {}", prev, next);
    }
}

/// Ordered command stream feeding the recorder.
pub fn command_queue(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (producer, consumer) = HeapRb::<Command>::new(capacity).split();
    (CommandSender { producer }, CommandReceiver { consumer })
}

pub struct CommandSender {
    producer: Producer<Command, Arc<HeapRb<Command>>>,
}

impl CommandSender {
    /// Queues a command. Returns false if the queue is full and the command was dropped.
    pub fn send(&mut self, command: Command) -> bool {
        if self.producer.push(command).is_err() {
            log::warn!("Command queue full, dropping {:?}", command);
            return false;
        }
        true
    }
}

pub struct CommandReceiver {
    consumer: Consumer<Command, Arc<HeapRb<Command>>>,
}

/// Owns the recorder and its collaborators and applies queued commands.
pub struct Controller<D: CaptureDevice, P: Persistence> {
    recorder: Recorder,
    device: D,
    persistence: P,
    commands: CommandReceiver,
    last_error: Option<String>,
}

impl<D: CaptureDevice, P: Persistence> Controller<D, P> {
    pub fn new(recorder: Recorder, device: D, persistence: P, commands: CommandReceiver) -> Self {
        Self {
            recorder,
            device,
            persistence,
            commands,
            last_error: None,
        }
    }

    /// Applies every queued command in delivery order.
    pub fn drain(&mut self) {
        while let Some(command) = self.commands.consumer.pop() {
            match self
                .recorder
                .handle(command, &mut self.device, &mut self.persistence)
            {
                Ok(_) => {
                    if matches!(command, Command::StartOrResume) {
                        self.last_error = None;
                    }
                }
                Err(e) => {
                    log::error!("{:?} failed: {}", command, e);
                    self.last_error = Some(e.to_string());
                }
            }
        }
    }

    pub fn state(&self) -> RecorderState {
        self.recorder.state()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn device(&self) -> &D {
        &self.device
    }
}

impl<D: CaptureDevice, P: Persistence> Drop for Controller<D, P> {
    fn drop(&mut self) {
        //
        // Close an active session on shutdown.
        //
        if let Err(e) = self
            .recorder
            .handle(Command::Stop, &mut self.device, &mut self.persistence)
        {
            log::error!("Failed to stop recording on exit: {}", e);
        }
    }
}
