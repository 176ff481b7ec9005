use eframe::egui;

use tron_signing_core::{Notification, Severity};

use crate::ui;

const TOAST_SECONDS: f64 = 6.0;
const MAX_TOASTS: usize = 5;

#[derive(Debug, Clone)]
struct Toast {
    notification: Notification,
    expires_at: f64,
}

/// Stack of expiring notifications in the top-right corner.
#[derive(Debug, Default)]
pub struct Toasts {
    items: Vec<Toast>,
}

impl Toasts {
    pub fn push(&mut self, notification: Notification, now: f64) {
        self.items.push(Toast {
            notification,
            expires_at: now + TOAST_SECONDS,
        });
        if self.items.len() > MAX_TOASTS {
            let overflow = self.items.len() - MAX_TOASTS;
            self.items.drain(..overflow);
        }
    }

    fn expire(&mut self, now: f64) {
        self.items.retain(|t| t.expires_at > now);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn show(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        self.expire(now);
        if self.items.is_empty() {
            return;
        }

        egui::Area::new(egui::Id::new("toasts"))
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                for toast in &self.items {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.set_max_width(320.0);
                        let color = match toast.notification.severity {
                            Severity::Info => ui.visuals().text_color(),
                            Severity::Success => ui::SUCCESS_COLOR,
                            Severity::Error => ui::ERROR_COLOR,
                        };
                        ui.label(egui::RichText::new(&toast.notification.message).color(color));
                        if let Some(ref link) = toast.notification.link {
                            ui.hyperlink_to("View on Tronscan", link);
                        }
                    });
                    ui.add_space(6.0);
                }
            });

        if let Some(next) = self.items.iter().map(|t| t.expires_at).reduce(f64::min) {
            ctx.request_repaint_after(std::time::Duration::from_secs_f64((next - now).max(0.0)));
        }
    }
}
