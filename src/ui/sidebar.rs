//! The left sidebar: image pickers, uploads, the text editor and the action buttons.

use super::state::{Alert, BillboardApp, PendingPlacement, TaskResult, EDITOR_FONT_SIZES};
use super::textures::TextureEntry;
use crate::library::{mime_for_path, Bucket};
use crate::session::SessionAction;
use crate::style::FontFamily;
use crate::types::*;
use eframe::egui;

const THUMBNAIL_SIZE: f32 = 80.0;

impl BillboardApp {
    /// Draws the whole sidebar.
    pub fn draw_sidebar(&mut self, ui: &mut egui::Ui) {
        ui.heading("Billboard Editor");
        ui.add_space(8.0);

        egui::ScrollArea::vertical().show(ui, |ui| {
            self.draw_bucket(ui, Bucket::People, "Add Person");
            ui.separator();

            ui.strong("Add Text");
            if ui.button("Add Text").clicked() {
                self.session.apply(SessionAction::AddText);
            }
            if self.selected_text().is_some() {
                ui.add_space(6.0);
                self.draw_text_editor(ui);
            }
            ui.separator();

            self.draw_bucket(ui, Bucket::Logos, "Add Logo");
            ui.separator();

            self.draw_actions(ui);
        });
    }

    fn draw_bucket(&mut self, ui: &mut egui::Ui, bucket: Bucket, title: &str) {
        ui.strong(title);
        let urls = match bucket {
            Bucket::People => self.people.clone(),
            Bucket::Logos => self.logos.clone(),
        };
        let kind = match bucket {
            Bucket::People => ElementKind::Person,
            Bucket::Logos => ElementKind::Logo,
        };

        ui.horizontal_wrapped(|ui| {
            for url in &urls {
                self.textures.request(url, self.runtime.as_ref(), ui.ctx());
                let size = egui::Vec2::splat(THUMBNAIL_SIZE);
                let response = match self.textures.get(url) {
                    Some(TextureEntry::Ready { texture, .. }) => ui.add(
                        egui::Image::new((texture.id(), size))
                            .maintain_aspect_ratio(true)
                            .sense(egui::Sense::click()),
                    ),
                    Some(TextureEntry::Failed(_)) => ui.add_sized(size, egui::Button::new("⚠")),
                    _ => ui.add_sized(size, egui::Spinner::new()),
                };
                let response = response.on_hover_text(url.as_str());
                if response.clicked() {
                    self.place_image(kind, url);
                }
                response.context_menu(|ui| {
                    if ui.button("Delete image").clicked() {
                        self.pending_delete = Some(url.clone());
                        ui.close();
                    }
                });
            }
            if ui
                .add_sized(egui::Vec2::splat(THUMBNAIL_SIZE), egui::Button::new("+"))
                .on_hover_text("Upload an image")
                .clicked()
            {
                self.upload_image(bucket);
            }
        });
    }

    fn draw_text_editor(&mut self, ui: &mut egui::Ui) {
        let Some(element) = self.selected_text().cloned() else {
            return;
        };
        if self.editor.editing != Some(element.id) {
            self.editor.load(&element);
        }
        let before = self.editor.clone();

        ui.label("Edit Text");
        ui.horizontal(|ui| {
            for family in [FontFamily::Oswald, FontFamily::PlayfairDisplay] {
                let selected = self.editor.family == family;
                if ui.selectable_label(selected, family.name()).clicked() {
                    self.editor.family = family;
                }
            }
        });
        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("font_size")
                .selected_text(format!("{}px", self.editor.size_px))
                .show_ui(ui, |ui| {
                    for size in EDITOR_FONT_SIZES {
                        ui.selectable_value(&mut self.editor.size_px, size, format!("{size}px"));
                    }
                });
            ui.toggle_value(&mut self.editor.bold, egui::RichText::new("B").strong());
            ui.toggle_value(&mut self.editor.italic, egui::RichText::new("I").italics());
        });
        ui.horizontal(|ui| {
            ui.selectable_value(&mut self.editor.align, TextAlign::Left, "Left");
            ui.selectable_value(&mut self.editor.align, TextAlign::Center, "Center");
            ui.selectable_value(&mut self.editor.align, TextAlign::Right, "Right");
        });
        ui.add(
            egui::TextEdit::multiline(&mut self.editor.text)
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );

        if self.editor != before {
            self.session.apply(SessionAction::EditText {
                id: element.id,
                markup: self.editor.to_markup(),
            });
        }
    }

    fn draw_actions(&mut self, ui: &mut egui::Ui) {
        let has_selection = self.session.selected().is_some();
        if ui
            .add_enabled(has_selection, egui::Button::new("Delete Selected"))
            .clicked()
        {
            self.session.apply(SessionAction::DeleteSelected);
        }

        let busy = self.coordinator.is_busy();
        ui.horizontal(|ui| {
            if ui.add_enabled(!busy, egui::Button::new("Save Image")).clicked() {
                self.start_export(ui.ctx(), false);
            }
            let quick = ui
                .add_enabled(!busy, egui::Button::new("Quick Save"))
                .on_hover_text(format!("Write into {}", self.config.output_dir.display()));
            if quick.clicked() {
                self.start_export(ui.ctx(), true);
            }
        });
        if busy {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(format!("{:?}", *self.export_state.borrow()));
            });
        }

        ui.add_space(12.0);
        if ui.button("ℹ Information").clicked() {
            self.show_info = true;
        }
    }

    /// Adds a person or logo once the image's natural size is known.
    pub fn place_image(&mut self, kind: ElementKind, source: &str) {
        match self.textures.ready(source) {
            Some((_, natural)) => {
                let source = source.to_string();
                let action = match kind {
                    ElementKind::Logo => SessionAction::AddLogo { source, natural },
                    _ => SessionAction::AddPerson { source, natural },
                };
                self.session.apply(action);
            }
            None => {
                self.pending_placement = Some(PendingPlacement {
                    kind,
                    source: source.to_string(),
                });
            }
        }
    }

    /// Requests fresh listings of both buckets.
    pub fn refresh_library(&mut self) {
        let Some(runtime) = self.runtime.clone() else {
            return;
        };
        for bucket in Bucket::ALL {
            let library = self.library.clone();
            let sender = self.task_sender.clone();
            runtime.spawn(async move {
                let result = match library.list(bucket).await {
                    Ok(urls) => TaskResult::Listed(bucket, urls),
                    Err(e) => TaskResult::LibraryFailed(e.to_string()),
                };
                let _ = sender.send(result);
            });
        }
    }

    fn upload_image(&mut self, bucket: Bucket) {
        let Some(runtime) = self.runtime.clone() else {
            return;
        };
        let library = self.library.clone();
        let sender = self.task_sender.clone();
        runtime.spawn(async move {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("Images", &["jpg", "jpeg", "png", "gif", "webp", "svg"])
                .pick_file()
                .await
            else {
                return;
            };
            let name = handle.file_name();
            let mime = mime_for_path(handle.path()).unwrap_or("application/octet-stream");
            let bytes = handle.read().await;
            let result = match library.upload(bucket, &name, mime, &bytes).await {
                Ok(url) => TaskResult::Uploaded(bucket, url),
                Err(e) => TaskResult::LibraryFailed(e.to_string()),
            };
            let _ = sender.send(result);
        });
    }

    /// Settles the delete confirmation; the file is only removed when `confirmed`.
    pub fn confirm_pending_delete(&mut self, confirmed: bool) {
        let Some(url) = self.pending_delete.take() else {
            return;
        };
        if confirmed {
            self.delete_library_image(&url);
        }
    }

    fn delete_library_image(&mut self, url: &str) {
        let Some(runtime) = self.runtime.clone() else {
            return;
        };
        let library = self.library.clone();
        let sender = self.task_sender.clone();
        let url = url.to_string();
        runtime.spawn(async move {
            let result = match library.delete(&url).await {
                Ok(()) => TaskResult::Deleted(url),
                Err(e) => TaskResult::LibraryFailed(e.to_string()),
            };
            let _ = sender.send(result);
        });
    }

    /// Applies results reported by background tasks.
    pub fn handle_task_results(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.task_receiver.try_recv() {
            match result {
                TaskResult::Listed(Bucket::People, urls) => self.people = urls,
                TaskResult::Listed(Bucket::Logos, urls) => self.logos = urls,
                TaskResult::Uploaded(bucket, url) => {
                    log::info!("Uploaded {}", url);
                    match bucket {
                        Bucket::People => self.people.push(url),
                        Bucket::Logos => self.logos.push(url),
                    }
                    self.refresh_library();
                }
                TaskResult::Deleted(url) => {
                    self.people.retain(|u| *u != url);
                    self.logos.retain(|u| *u != url);
                    self.textures.evict(&url);
                }
                TaskResult::LibraryFailed(message) => {
                    self.alert = Some(Alert::error(message));
                }
                TaskResult::ExportFinished(result) => self.handle_export_result(result),
            }
            ctx.request_repaint();
        }

        let ready = self.textures.poll(ctx);
        if let Some(pending) = self.pending_placement.clone() {
            if ready.contains(&pending.source) || self.textures.ready(&pending.source).is_some() {
                self.pending_placement = None;
                self.place_image(pending.kind, &pending.source);
            } else if matches!(self.textures.get(&pending.source), Some(TextureEntry::Failed(_))) {
                self.pending_placement = None;
                self.alert = Some(Alert::error(format!("Failed to load image {}", pending.source)));
            }
        }
    }
}
