//! UI helper components

use eframe::egui;

use crate::state::Banner;

pub const ACCENT_COLOR: egui::Color32 = egui::Color32::from_rgb(235, 0, 41);
pub const SUCCESS_COLOR: egui::Color32 = egui::Color32::from_rgb(80, 200, 120);
pub const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 80, 80);

pub fn styled_heading(ui: &mut egui::Ui, text: &str) {
    ui.heading(egui::RichText::new(text).color(ACCENT_COLOR));
}

/// Section header with separator
pub fn section_header(ui: &mut egui::Ui, text: &str) {
    ui.add_space(10.0);
    ui.label(egui::RichText::new(text).strong().size(15.0));
    ui.separator();
}

pub fn card(ui: &mut egui::Ui, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(6.0)
        .inner_margin(12.0)
        .show(ui, add_contents);
}

pub fn primary_button(ui: &mut egui::Ui, text: &str, enabled: bool) -> egui::Response {
    let btn = egui::Button::new(egui::RichText::new(text).size(14.0).color(egui::Color32::WHITE))
        .min_size(egui::vec2(120.0, 30.0))
        .fill(ACCENT_COLOR);
    ui.add_enabled(enabled, btn)
}

pub fn copy_to_clipboard(text: &str) {
    if let Ok(mut clipboard) = arboard::Clipboard::new() {
        let _ = clipboard.set_text(text);
    }
}

/// Monospace value with a copy button
pub fn copyable_value(ui: &mut egui::Ui, value: &str) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(value).monospace());
        if ui
            .small_button("📋")
            .on_hover_text("Copy to clipboard")
            .clicked()
        {
            copy_to_clipboard(value);
        }
    });
}

pub fn banner(ui: &mut egui::Ui, banner: &Banner) {
    match banner {
        Banner::Success(notification) => {
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new("✅").size(16.0));
                ui.label(egui::RichText::new(&notification.message).color(SUCCESS_COLOR));
                if let Some(ref link) = notification.link {
                    ui.hyperlink_to("View on Tronscan", link);
                }
            });
        }
        Banner::Failure(message) => {
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new("❌").size(16.0));
                ui.label(egui::RichText::new(message).color(ERROR_COLOR));
            });
        }
    }
}

pub fn busy_indicator(ui: &mut egui::Ui, text: &str) {
    ui.horizontal(|ui| {
        ui.spinner();
        ui.label(text);
    });
}
