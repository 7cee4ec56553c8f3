pub mod theme;

use crate::audio::encoder::WavPersistence;
use crate::audio::CpalCapture;
use crate::dsp::filter::{cutoff_passband, FilterConfig, FilterKind};
use crate::pipeline::{AnalysisFrame, SharedState};
use crate::recorder::{Command, CommandSender, Controller, RecorderState};
use eframe::egui;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Keys that issue a single command per press.
const KEY_COMMANDS: [(egui::Key, Command); 6] = [
    (egui::Key::R, Command::StartOrResume),
    (egui::Key::P, Command::Pause),
    (egui::Key::S, Command::Stop),
    (egui::Key::L, Command::SelectFilter(FilterKind::LowPass)),
    (egui::Key::H, Command::SelectFilter(FilterKind::HighPass)),
    (egui::Key::N, Command::SelectFilter(FilterKind::None)),
];

/// Commands produced by one frame of keyboard input.
/// Up/Down repeat every frame while held.
pub fn commands_from_keys(
    pressed: impl Fn(egui::Key) -> bool,
    down: impl Fn(egui::Key) -> bool,
    cutoff_step: f32,
) -> Vec<Command> {
    let mut commands: Vec<Command> = KEY_COMMANDS
        .iter()
        .filter(|(key, _)| pressed(*key))
        .map(|(_, command)| *command)
        .collect();

    if down(egui::Key::ArrowUp) {
        commands.push(Command::AdjustCutoff(cutoff_step));
    } else if down(egui::Key::ArrowDown) {
        commands.push(Command::AdjustCutoff(-cutoff_step));
    }
    commands
}

/// Status line for the active filter.
pub fn filter_status(filter: &FilterConfig) -> String {
    format!("Filter: {}, Cutoff: {:.2} Hz", filter.kind, filter.cutoff_hz)
}

pub struct AnalyzerApp {
    //
    // Recorder and its command stream.
    //
    controller: Controller<CpalCapture, WavPersistence>,
    commands: CommandSender,
    cutoff_step: f32,

    //
    // Consumer view of the pipeline.
    //
    shared: Arc<SharedState>,
    frame: AnalysisFrame,
    sample_rate: u32,
    channels: u16,
    plan_name: String,

    //
    // Statistics and diagnostic information.
    //
    last_stats_time: Instant,
    last_stats_generation: u64,
}

impl AnalyzerApp {
    pub fn new(
        _cc: &eframe::CreationContext,
        controller: Controller<CpalCapture, WavPersistence>,
        commands: CommandSender,
        shared: Arc<SharedState>,
        cutoff_step: f32,
        plan_name: String,
    ) -> Self {
        let frame = shared.latest_frame();
        let info = controller.device().info();
        let (sample_rate, channels) = (info.sample_rate, info.channels);

        Self {
            controller,
            commands,
            cutoff_step,
            shared,
            frame,
            sample_rate,
            channels,
            plan_name,
            last_stats_time: Instant::now(),
            last_stats_generation: 0,
        }
    }

    fn poll_input(&mut self, ctx: &egui::Context) {
        let commands = ctx.input(|i| {
            commands_from_keys(|k| i.key_pressed(k), |k| i.key_down(k), self.cutoff_step)
        });
        for command in commands {
            self.commands.send(command);
        }
        self.controller.drain();
    }

    fn refresh(&mut self) {
        self.shared.snapshot_into(&mut self.frame);
        let generation = self.shared.generation();

        //
        // Periodic statistics logging.
        //
        if self.last_stats_time.elapsed() > Duration::from_secs(1) {
            log::info!(
                "DSP | Frames: {} | Peak: {:.2} Hz | Silence: {} | State: {}",
                generation - self.last_stats_generation,
                self.frame.peak.frequency_hz,
                !self.frame.peak.is_tone(),
                self.controller.state()
            );
            self.last_stats_generation = generation;
            self.last_stats_time = Instant::now();
        }
    }

    fn draw_waveform(&self, ui: &mut egui::Ui) {
        egui::Frame::canvas(ui.style()).show(ui, |ui| {
            let (rect, _) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), 150.0),
                egui::Sense::hover(),
            );
            let painter = ui.painter();
            painter.rect_stroke(
                rect,
                egui::Rounding::ZERO,
                egui::Stroke::new(1.0, egui::Color32::GRAY),
            );

            let n = self.frame.samples.len().max(1);
            let mid = rect.center().y;
            let half = rect.height() / 2.0;
            let cell = rect.width() / n as f32;

            for (i, &s) in self.frame.samples.iter().enumerate() {
                let x = rect.min.x + i as f32 * cell;
                let y = mid - s.clamp(-1.0, 1.0) * half;
                let bar = egui::Rect::from_two_pos(egui::pos2(x, mid), egui::pos2(x + cell, y));
                painter.rect_filled(bar, 0.0, theme::WAVEFORM);
            }
        });
    }

    fn draw_spectrum(&self, ui: &mut egui::Ui) {
        egui::Frame::canvas(ui.style()).show(ui, |ui| {
            let (rect, response) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), 150.0),
                egui::Sense::hover(),
            );
            let painter = ui.painter();
            painter.rect_stroke(
                rect,
                egui::Rounding::ZERO,
                egui::Stroke::new(1.0, egui::Color32::GRAY),
            );

            let n = self.frame.spectrum.len();
            let width = n / 2;
            if width == 0 {
                return;
            }

            //
            // Only passband bins are drawn, scaled to the passband maximum.
            //
            let passband = cutoff_passband(&self.frame.filter, self.sample_rate, n);
            let max_mag = self.frame.spectrum[..width]
                .iter()
                .enumerate()
                .filter(|(i, _)| passband(*i))
                .map(|(_, c)| c.norm())
                .fold(0.0f32, f32::max);

            let cell = rect.width() / width as f32;
            if max_mag > 0.0 {
                for (i, bin) in self.frame.spectrum[..width].iter().enumerate() {
                    if !passband(i) {
                        continue;
                    }
                    let h = bin.norm() / max_mag * rect.height();
                    let x = rect.min.x + i as f32 * cell;
                    let bar = egui::Rect::from_min_max(
                        egui::pos2(x, rect.max.y - h),
                        egui::pos2(x + cell, rect.max.y),
                    );
                    painter.rect_filled(bar, 0.0, theme::SPECTRUM);
                }
            }

            if self.controller.state() != RecorderState::Stopped && !self.frame.peak.is_tone() {
                painter.text(
                    response.rect.center(),
                    egui::Align2::CENTER_CENTER,
                    "NO SIGNAL",
                    egui::FontId::proportional(20.0),
                    egui::Color32::RED,
                );
            }
        });
    }
}

impl eframe::App for AnalyzerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_input(ctx);
        self.refresh();
        ctx.request_repaint();

        let state = self.controller.state();

        egui::CentralPanel::default().show(ctx, |ui| {
            theme::draw_menu_bar(ui, state, &self.plan_name);
            ui.add_space(4.0);

            theme::draw_platinum_window(ui, "Time Domain", |ui| {
                self.draw_waveform(ui);
            });
            ui.add_space(4.0);

            theme::draw_platinum_window(ui, "Frequency Domain", |ui| {
                self.draw_spectrum(ui);

                ui.label(
                    egui::RichText::new(format!(
                        "Peak Frequency: {:.2} Hz",
                        self.shared.peak_frequency()
                    ))
                    .size(16.0),
                );
                ui.label(filter_status(&self.shared.filter()));
            });

            ui.separator();
            ui.horizontal(|ui| {
                ui.label(format!("{} Hz, {} ch", self.sample_rate, self.channels));
                if self.shared.has_sink() {
                    ui.colored_label(theme::state_color(state), "writing WAV");
                }
            });
            ui.label("R record/resume   P pause   S stop   L/H/N filter   Up/Down cutoff");
            if let Some(err) = self.controller.last_error() {
                ui.colored_label(egui::Color32::DARK_RED, err);
            }
            if self.shared.encoder_failed() {
                ui.colored_label(
                    egui::Color32::DARK_RED,
                    "Encoder write failed; recording output is incomplete",
                );
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_status_follows_commands_while_stopped() {
        use crate::audio::encoder::{EncoderSpec, WavPersistence};
        use crate::audio::CaptureDevice;
        use crate::config::Encoding;
        use crate::error::DeviceError;
        use crate::recorder::Recorder;

        struct IdleDevice;

        impl CaptureDevice for IdleDevice {
            fn start(&mut self) -> Result<(), DeviceError> {
                Ok(())
            }

            fn stop(&mut self) -> Result<(), DeviceError> {
                Ok(())
            }
        }

        let shared = Arc::new(SharedState::new(8, FilterConfig::default()));
        let spec = EncoderSpec {
            sample_rate: 48000,
            channels: 1,
            encoding: Encoding::F32,
        };
        let mut recorder = Recorder::new(shared.clone(), "unused.wav".into(), spec);
        for command in [
            Command::SelectFilter(FilterKind::LowPass),
            Command::AdjustCutoff(500.0),
        ] {
            recorder
                .handle(command, &mut IdleDevice, &mut WavPersistence)
                .unwrap();
        }

        // Nothing is published while stopped; the status reads the live filter.
        assert_eq!(shared.generation(), 0);
        assert_eq!(
            filter_status(&shared.filter()),
            "Filter: Low-Pass, Cutoff: 1500.00 Hz"
        );
    }

    #[test]
    fn single_press_maps_to_command() {
        let commands = commands_from_keys(|k| k == egui::Key::R, |_| false, 10.0);
        assert_eq!(commands, vec![Command::StartOrResume]);
    }

    #[test]
    fn held_arrows_adjust_cutoff_each_frame() {
        let up = commands_from_keys(|_| false, |k| k == egui::Key::ArrowUp, 10.0);
        assert_eq!(up, vec![Command::AdjustCutoff(10.0)]);

        let down = commands_from_keys(|_| false, |k| k == egui::Key::ArrowDown, 10.0);
        assert_eq!(down, vec![Command::AdjustCutoff(-10.0)]);
    }

    #[test]
    fn simultaneous_presses_keep_key_order() {
        let commands = commands_from_keys(
            |k| matches!(k, egui::Key::S | egui::Key::L),
            |_| false,
            10.0,
        );
        assert_eq!(
            commands,
            vec![
                Command::Stop,
                Command::SelectFilter(FilterKind::LowPass)
            ]
        );
    }
}
