use crate::recorder::RecorderState;
use eframe::egui;

pub const PLATINUM_BG: egui::Color32 = egui::Color32::from_rgb(212, 208, 200);
pub const PLATINUM_DARK: egui::Color32 = egui::Color32::from_rgb(128, 128, 128);

pub const WAVEFORM: egui::Color32 = egui::Color32::from_rgb(190, 33, 55);
pub const SPECTRUM: egui::Color32 = egui::Color32::from_rgb(0, 82, 172);

pub fn setup_global_style(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.panel_fill = PLATINUM_BG;
    style.visuals.window_fill = PLATINUM_BG;

    //
    // Square widgets throughout.
    //
    style.visuals.widgets.noninteractive.rounding = egui::Rounding::ZERO;
    style.visuals.widgets.active.rounding = egui::Rounding::ZERO;
    style.visuals.widgets.inactive.rounding = egui::Rounding::ZERO;
    style.visuals.widgets.hovered.rounding = egui::Rounding::ZERO;

    ctx.set_style(style);
}

/// Indicator color for each recorder state.
pub fn state_color(state: RecorderState) -> egui::Color32 {
    match state {
        RecorderState::Stopped => PLATINUM_DARK,
        RecorderState::Recording => egui::Color32::from_rgb(200, 0, 0),
        RecorderState::Paused => egui::Color32::from_rgb(200, 140, 0),
    }
}

/// Menu bar with the recorder state on the left and the FFT plan on the right.
pub fn draw_menu_bar(ui: &mut egui::Ui, state: RecorderState, plan_name: &str) {
    egui::TopBottomPanel::top("menubar").show_inside(ui, |ui| {
        ui.visuals_mut().widgets.noninteractive.bg_fill = PLATINUM_BG;
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("specscope").strong());
            ui.separator();

            let (dot, _) = ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
            ui.painter()
                .circle_filled(dot.center(), 4.0, state_color(state));
            ui.label(state.to_string());

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(egui::RichText::new(plan_name).italics().size(10.0));
            });
        });
    });
}

/// Draws a titled window in the "Platinum" retro frame.
pub fn draw_platinum_window<F: FnOnce(&mut egui::Ui)>(ui: &mut egui::Ui, title: &str, content: F) {
    let frame = egui::Frame::none()
        .fill(PLATINUM_BG)
        .stroke(egui::Stroke::new(1.0, egui::Color32::BLACK))
        .inner_margin(2.0);

    frame.show(ui, |ui| {
        let (rect, _response) = ui.allocate_exact_size(
            egui::vec2(ui.available_width(), 18.0),
            egui::Sense::hover(),
        );

        //
        // Pinstriped title bar.
        //
        let painter = ui.painter();
        painter.rect_filled(rect, 0.0, egui::Color32::from_rgb(200, 200, 200));
        let stripe = egui::Stroke::new(1.0, egui::Color32::from_rgba_premultiplied(255, 255, 255, 50));
        let mut x = rect.min.x;
        while x < rect.max.x {
            painter.line_segment([egui::pos2(x, rect.min.y), egui::pos2(x, rect.max.y)], stripe);
            x += 2.0;
        }
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            title,
            egui::FontId::proportional(14.0),
            egui::Color32::BLACK,
        );

        ui.add_space(4.0);
        egui::Frame::group(ui.style())
            .stroke(egui::Stroke::new(1.0, PLATINUM_DARK))
            .inner_margin(6.0)
            .show(ui, content);
    });
}
