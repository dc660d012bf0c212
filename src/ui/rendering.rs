//! Canvas painting: background, elements, sign-face mask, shading overlay and handles.
//!
//! The preview uses the same clip outline, gradient stops and text layout as the export
//! so what is on screen matches the file. egui can only clip to rectangles, so the part
//! of the editable area outside the silhouette is repainted with the background texture
//! on top of the elements.

use super::state::BillboardApp;
use crate::clip::ClipPath;
use crate::constants;
use crate::geometry::contain_fit;
use crate::render::{layout_text, sample_overlay};
use crate::style::TextStyle;
use crate::types::*;
use eframe::egui;
use eframe::epaint::StrokeKind;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

const SELECTION_COLOR: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);

/// Converts an engine point to an egui position.
pub fn to_pos(p: Point) -> egui::Pos2 {
    egui::pos2(p.x, p.y)
}

/// Converts an engine rectangle to an egui rectangle.
pub fn to_egui_rect(r: Rect) -> egui::Rect {
    egui::Rect::from_min_size(egui::pos2(r.x, r.y), egui::vec2(r.width, r.height))
}

/// Converts an egui rectangle to an engine rectangle.
pub fn from_egui_rect(r: egui::Rect) -> Rect {
    Rect::new(r.min.x, r.min.y, r.width(), r.height())
}

/// Square handle drawn on `corner` of `rect`.
pub fn handle_rect(rect: Rect, corner: ResizeCorner) -> egui::Rect {
    egui::Rect::from_center_size(
        to_pos(corner.point_on(&rect)),
        egui::Vec2::splat(constants::HANDLE_SIZE),
    )
}

fn fan_mesh(points: &[egui::Pos2], texture: egui::TextureId, uv: impl Fn(egui::Pos2) -> egui::Pos2) -> egui::Mesh {
    let mut mesh = egui::Mesh::with_texture(texture);
    for &pos in points {
        mesh.vertices.push(egui::epaint::Vertex {
            pos,
            uv: uv(pos),
            color: egui::Color32::WHITE,
        });
    }
    for i in 1..points.len().saturating_sub(1) {
        mesh.add_triangle(0, i as u32, i as u32 + 1);
    }
    mesh
}

/// Registers bundled Oswald and Playfair Display files found in `fonts_dir` with egui.
///
/// Returns the family names that were installed; other families fall back to the
/// default proportional font in the preview.
pub fn install_fonts(ctx: &egui::Context, fonts_dir: &Path) -> HashSet<String> {
    let mut installed = HashSet::new();
    let Ok(entries) = std::fs::read_dir(fonts_dir) else {
        log::warn!("No fonts directory at {}", fonts_dir.display());
        return installed;
    };

    let mut fonts = egui::FontDefinitions::default();
    let mut paths: Vec<_> = entries.flatten().map(|e| e.path()).collect();
    paths.sort();
    for path in paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_lowercase();
        if !(name.ends_with(".ttf") || name.ends_with(".otf")) {
            continue;
        }
        let family = if name.contains("oswald") {
            "Oswald"
        } else if name.contains("playfair") {
            "Playfair Display"
        } else {
            continue;
        };
        if installed.contains(family) {
            continue;
        }
        match std::fs::read(&path) {
            Ok(bytes) => {
                fonts
                    .font_data
                    .insert(family.to_string(), Arc::new(egui::FontData::from_owned(bytes)));
                let mut chain = vec![family.to_string()];
                chain.extend(
                    fonts
                        .families
                        .get(&egui::FontFamily::Proportional)
                        .cloned()
                        .unwrap_or_default(),
                );
                fonts.families.insert(egui::FontFamily::Name(family.into()), chain);
                installed.insert(family.to_string());
                log::debug!("Installed preview font {} from {}", family, path.display());
            }
            Err(e) => log::warn!("Failed to read font {}: {}", path.display(), e),
        }
    }
    if !installed.is_empty() {
        ctx.set_fonts(fonts);
    }
    installed
}

impl BillboardApp {
    /// Paints the whole billboard.
    ///
    /// # Arguments
    ///
    /// * `painter` - Painter clipped to the canvas
    /// * `background` - Background texture
    /// * `image_rect` - Where the background is displayed
    /// * `editable` - The sign face inside `image_rect`
    pub fn paint_billboard(
        &self,
        painter: &egui::Painter,
        background: egui::TextureId,
        image_rect: egui::Rect,
        editable: egui::Rect,
    ) {
        let full_uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        painter.image(background, image_rect, full_uv, egui::Color32::WHITE);

        for element in self.session.elements() {
            self.paint_element(painter, element);
        }

        self.paint_face_mask(painter, background, image_rect, editable);
        self.paint_overlay(painter, editable);

        if let Some(element) = self.session.selected_element() {
            self.paint_selection(painter, element);
        }
    }

    fn paint_element(&self, painter: &egui::Painter, element: &Element) {
        if element.kind == ElementKind::Text {
            self.paint_text(painter, element);
            return;
        }
        let rect = element.rect();
        match self.textures.ready(&element.content) {
            Some((texture, natural)) => {
                let placed = contain_fit(natural, rect);
                painter.image(
                    texture.id(),
                    to_egui_rect(placed),
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }
            None => {
                painter.rect_filled(to_egui_rect(rect), 0.0, egui::Color32::from_black_alpha(60));
            }
        }
    }

    fn paint_text(&self, painter: &egui::Painter, element: &Element) {
        let style = TextStyle::from_element(element);
        let layout = layout_text(&style, element.rect(), 1.0);
        let family = if self.installed_fonts.contains(style.font_family.name()) {
            egui::FontFamily::Name(style.font_family.name().into())
        } else {
            egui::FontFamily::Proportional
        };
        let [r, g, b] = constants::TEXT_COLOR;
        let color = egui::Color32::from_rgb(r, g, b);

        for line in &layout.lines {
            let mut job = egui::text::LayoutJob::default();
            job.append(
                &line.text,
                0.0,
                egui::TextFormat {
                    font_id: egui::FontId::new(layout.font.size_px, family.clone()),
                    color,
                    italics: layout.font.italic,
                    ..Default::default()
                },
            );
            let galley = painter.layout_job(job);
            let size = galley.size();
            let x = match layout.anchor {
                TextAlign::Left => line.x,
                TextAlign::Center => line.x - size.x / 2.0,
                TextAlign::Right => line.x - size.x,
            };
            painter.galley(egui::pos2(x, line.y - size.y / 2.0), galley, color);
        }
    }

    /// Covers everything in `editable` outside the sign face with background pixels.
    fn paint_face_mask(
        &self,
        painter: &egui::Painter,
        background: egui::TextureId,
        image_rect: egui::Rect,
        editable: egui::Rect,
    ) {
        let uv = |p: egui::Pos2| {
            egui::pos2(
                (p.x - image_rect.min.x) / image_rect.width(),
                (p.y - image_rect.min.y) / image_rect.height(),
            )
        };
        for band in ClipPath::outside_bands(&from_egui_rect(editable), constants::CURVE_SEGMENTS) {
            let points: Vec<egui::Pos2> = band.into_iter().map(to_pos).collect();
            painter.add(egui::Shape::mesh(fan_mesh(&points, background, uv)));
        }
    }

    /// Shades the sign face with the vertical gradient.
    fn paint_overlay(&self, painter: &egui::Painter, editable: egui::Rect) {
        let outline = ClipPath::billboard_face().flatten(&from_egui_rect(editable), constants::CURVE_SEGMENTS);
        if outline.len() < 3 {
            return;
        }
        let shade = |y: f32| {
            let [r, g, b, a] = sample_overlay((y - editable.min.y) / editable.height());
            egui::Color32::from_rgba_unmultiplied(r, g, b, a)
        };
        let n = outline.len() as f32;
        let center = Point::new(
            outline.iter().map(|p| p.x).sum::<f32>() / n,
            outline.iter().map(|p| p.y).sum::<f32>() / n,
        );

        let mut mesh = egui::Mesh::default();
        mesh.colored_vertex(to_pos(center), shade(center.y));
        for p in &outline {
            mesh.colored_vertex(to_pos(*p), shade(p.y));
        }
        let count = outline.len() as u32;
        for i in 0..count {
            mesh.add_triangle(0, 1 + i, 1 + (i + 1) % count);
        }
        painter.add(egui::Shape::mesh(mesh));
    }

    fn paint_selection(&self, painter: &egui::Painter, element: &Element) {
        let rect = element.rect();
        painter.rect_stroke(
            to_egui_rect(rect),
            0.0,
            egui::Stroke::new(2.0, SELECTION_COLOR),
            StrokeKind::Outside,
        );
        for corner in ResizeCorner::ALL {
            let handle = handle_rect(rect, corner);
            painter.rect_filled(handle, 0.0, SELECTION_COLOR);
            painter.rect_stroke(handle, 0.0, egui::Stroke::new(1.0, egui::Color32::WHITE), StrokeKind::Inside);
        }
    }
}
