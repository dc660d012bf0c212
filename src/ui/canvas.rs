//! Billboard canvas layout and pointer interaction.
//!
//! The background is contain-fitted into the central panel. The sign face inside it is
//! the billboard bounds every element is clamped to; bounds are re-measured every frame
//! and pushed into the session whenever the window layout moves them.

use super::rendering::handle_rect;
use super::state::{BillboardApp, DragMode, DragState};
use super::textures::TextureEntry;
use crate::constants;
use crate::geometry::{contain_fit, editable_area};
use crate::session::SessionAction;
use crate::types::*;
use eframe::egui;

/// Where the background is displayed inside `available`, keeping its aspect ratio.
pub fn background_rect(available: egui::Rect, natural: Size) -> egui::Rect {
    let padded = available.shrink(constants::CANVAS_PADDING);
    if padded.width() <= 0.0 || padded.height() <= 0.0 || natural.width <= 0.0 || natural.height <= 0.0 {
        return padded;
    }
    let fitted = contain_fit(
        natural,
        Rect::new(padded.min.x, padded.min.y, padded.width(), padded.height()),
    );
    super::rendering::to_egui_rect(fitted)
}

/// The sign face of a background displayed at `image_rect`.
pub fn face_bounds(image_rect: egui::Rect) -> BillboardBounds {
    let area = editable_area(Size::new(image_rect.width(), image_rect.height()));
    BillboardBounds::from_rect(Rect::new(
        image_rect.min.x + area.x,
        image_rect.min.y + area.y,
        area.width,
        area.height,
    ))
}

impl BillboardApp {
    /// Draws the billboard canvas and handles selection, dragging and resizing.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context of the central panel
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let background = self.config.background.clone();
        self.textures.request(&background, self.runtime.as_ref(), ui.ctx());
        let (texture, natural) = match self.textures.get(&background) {
            Some(TextureEntry::Ready { texture, natural }) => (texture.id(), *natural),
            Some(TextureEntry::Failed(e)) => {
                ui.centered_and_justified(|ui| {
                    ui.colored_label(egui::Color32::LIGHT_RED, format!("Failed to load background: {e}"));
                });
                return;
            }
            _ => {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }
        };

        let (response, painter) = ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());
        let image_rect = background_rect(response.rect, natural);
        let bounds = face_bounds(image_rect);
        if bounds != self.session.bounds() {
            self.session.apply(SessionAction::SetBounds(bounds));
        }

        self.handle_canvas_pointer(ui, &response);

        let editable = super::rendering::to_egui_rect(bounds.to_rect());
        self.paint_billboard(&painter, texture, image_rect, editable);
    }

    /// Finds what a press at `pos` would grab: a handle of the selected element first,
    /// then the topmost element under the pointer.
    pub fn hit_test(&self, pos: Point) -> Option<(ElementId, DragMode)> {
        if let Some(selected) = self.session.selected_element() {
            for corner in ResizeCorner::ALL {
                if handle_rect(selected.rect(), corner).contains(egui::pos2(pos.x, pos.y)) {
                    return Some((selected.id, DragMode::Resize(corner)));
                }
            }
        }
        self.session
            .elements()
            .iter()
            .rev()
            .find(|e| e.rect().contains(pos))
            .map(|e| (e.id, DragMode::Move))
    }

    fn handle_canvas_pointer(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let (pressed, down, pointer) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.interact_pos(),
            )
        });
        let Some(pointer) = pointer else {
            return;
        };
        let pointer = Point::new(pointer.x, pointer.y);

        if pressed && response.rect.contains(egui::pos2(pointer.x, pointer.y)) {
            match self.hit_test(pointer) {
                Some((id, mode)) => {
                    self.session.apply(SessionAction::Select(Some(id)));
                    if let Some(element) = self.session.element(id) {
                        self.drag = Some(DragState {
                            id,
                            mode,
                            pointer_start: pointer,
                            start: element.rect(),
                        });
                    }
                }
                None => {
                    self.session.apply(SessionAction::Select(None));
                    self.drag = None;
                }
            }
            return;
        }

        if !down {
            self.drag = None;
            return;
        }
        let Some(drag) = self.drag else {
            return;
        };
        let delta = pointer - drag.pointer_start;
        match drag.mode {
            DragMode::Move => {
                self.session.apply(SessionAction::Move {
                    id: drag.id,
                    position: drag.start.origin() + delta,
                });
            }
            DragMode::Resize(corner) => {
                self.session.apply(SessionAction::Resize {
                    id: drag.id,
                    corner,
                    start: drag.start,
                    delta,
                });
            }
        }
        ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
    }
}
