//! User interface components for the billboard editor.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main BillboardApp
//! - `canvas` - Billboard layout, hit testing, dragging and resizing
//! - `rendering` - Painting the background, elements, face mask and overlay
//! - `sidebar` - Image pickers, uploads, text editor and action buttons
//! - `textures` - Asynchronous preview texture loading
//! - `export` - Running exports and reporting their outcome

mod canvas;
mod export;
mod rendering;
mod sidebar;
mod state;
mod textures;

pub use state::BillboardApp;

use crate::session::SessionAction;
use eframe::egui;

const DISCLAIMER: [&str; 2] = [
    "This app is meant for entertainment purposes only. Nothing here is serious and no \
     ownership is claimed of any images, logos, or content used.",
    "All content created is for parody, satire, and educational purposes.",
];

impl eframe::App for BillboardApp {
    /// Persist UI preferences between restarts. Elements are never persisted.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.prefs);
    }

    /// Main update function called by egui for each frame.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `_frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.prefs.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        if !self.libraries_requested {
            self.libraries_requested = true;
            self.refresh_library();
        }
        self.handle_task_results(ctx);
        self.handle_delete_key(ctx);

        // Restore native window size once per session
        if !self.applied_viewport_restore {
            if let Some((w, h)) = self.prefs.window_inner_size {
                ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(w, h)));
            }
            self.applied_viewport_restore = true;
        }
        let size = ctx.input(|i| i.screen_rect().size());
        self.prefs.window_inner_size = Some((size.x, size.y));

        self.draw_frame(ctx);
    }
}

impl BillboardApp {
    /// Lays out the panels and windows for one frame.
    pub fn draw_frame(&mut self, ctx: &egui::Context) {
        let viewport_width = ctx.input(|i| i.screen_rect().width());
        let max_width = (viewport_width * 0.5).max(220.0);
        egui::SidePanel::left("sidebar")
            .resizable(true)
            .default_width(self.prefs.sidebar_width.clamp(220.0, max_width))
            .show(ctx, |ui| {
                self.prefs.sidebar_width = ui.available_width().clamp(220.0, max_width);
                self.draw_sidebar(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        self.draw_windows(ctx);
    }

    fn draw_windows(&mut self, ctx: &egui::Context) {
        if self.show_info {
            egui::Window::new("Disclaimer")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    for paragraph in DISCLAIMER {
                        ui.label(paragraph);
                        ui.add_space(6.0);
                    }
                    if ui.button("Got it").clicked() {
                        self.show_info = false;
                    }
                });
        }

        if let Some(url) = self.pending_delete.clone() {
            egui::Window::new("Delete image")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label("Delete this image?");
                    ui.weak(url.as_str());
                    ui.horizontal(|ui| {
                        if ui.button("Delete").clicked() {
                            self.confirm_pending_delete(true);
                        }
                        if ui.button("Cancel").clicked() {
                            self.confirm_pending_delete(false);
                        }
                    });
                });
        }

        if let Some(alert) = self.alert.clone() {
            egui::Window::new(alert.title.as_str())
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label(alert.message.as_str());
                    if ui.button("OK").clicked() {
                        self.alert = None;
                    }
                });
        }
    }

    /// Deletes the selected element on Delete/Backspace unless a text field has focus.
    pub fn handle_delete_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() || self.session.selected().is_none() {
            return;
        }
        let pressed = ctx.input(|i| i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace));
        if pressed {
            self.session.apply(SessionAction::DeleteSelected);
            self.drag = None;
        }
    }
}

#[cfg(test)]
mod tests;
