//! Preview textures.
//!
//! Sources are fetched and decoded on the runtime, then uploaded to egui on the UI
//! thread. Entries are keyed by source string; a failed load is remembered so the
//! frame loop does not retry it every frame.

use crate::assets::{load_image, AssetLoader};
use crate::types::Size;
use eframe::egui;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Longest side of a preview texture, in pixels.
pub const PREVIEW_MAX_SIDE: u32 = 2048;

/// Load state of one source.
pub enum TextureEntry {
    /// Fetch or decode in progress
    Loading,
    /// Uploaded and ready to paint
    Ready {
        /// GPU texture
        texture: egui::TextureHandle,
        /// Natural pixel size of the source (not of the texture)
        natural: Size,
    },
    /// The source could not be loaded
    Failed(String),
}

struct DecodedPreview {
    source: String,
    result: Result<(Size, egui::ColorImage), String>,
}

/// Textures for the background, the library thumbnails and placed images.
pub struct TextureCache {
    loader: Arc<dyn AssetLoader>,
    entries: HashMap<String, TextureEntry>,
    sender: Sender<DecodedPreview>,
    receiver: Receiver<DecodedPreview>,
}

impl TextureCache {
    /// Creates an empty cache fetching through `loader`.
    pub fn new(loader: Arc<dyn AssetLoader>) -> Self {
        let (sender, receiver) = channel();
        Self {
            loader,
            entries: HashMap::new(),
            sender,
            receiver,
        }
    }

    /// The entry for `source`, if it was ever requested.
    pub fn get(&self, source: &str) -> Option<&TextureEntry> {
        self.entries.get(source)
    }

    /// Texture and natural size of a loaded source.
    pub fn ready(&self, source: &str) -> Option<(&egui::TextureHandle, Size)> {
        match self.entries.get(source)? {
            TextureEntry::Ready { texture, natural } => Some((texture, *natural)),
            _ => None,
        }
    }

    /// Starts loading `source` unless it is already known.
    pub fn request(&mut self, source: &str, runtime: Option<&tokio::runtime::Handle>, ctx: &egui::Context) {
        if self.entries.contains_key(source) {
            return;
        }
        let Some(runtime) = runtime else {
            return;
        };
        self.entries.insert(source.to_string(), TextureEntry::Loading);

        let loader = Arc::clone(&self.loader);
        let sender = self.sender.clone();
        let source = source.to_string();
        let ctx = ctx.clone();
        runtime.spawn(async move {
            let result = match load_image(loader.as_ref(), &source).await {
                Ok(image) => {
                    let natural = image.natural_size();
                    tokio::task::spawn_blocking(move || image.to_rgba8(PREVIEW_MAX_SIDE))
                        .await
                        .map_err(|e| e.to_string())
                        .and_then(|pixels| pixels.map_err(|e| e.to_string()))
                        .map(|(w, h, rgba)| {
                            let image = egui::ColorImage::from_rgba_unmultiplied([w as usize, h as usize], &rgba);
                            (natural, image)
                        })
                }
                Err(e) => Err(e.to_string()),
            };
            if let Err(e) = &result {
                log::warn!("Preview of {} failed: {}", source, e);
            }
            let _ = sender.send(DecodedPreview { source, result });
            ctx.request_repaint();
        });
    }

    /// Uploads an already decoded image.
    pub fn insert(&mut self, ctx: &egui::Context, source: &str, natural: Size, image: egui::ColorImage) {
        let texture = ctx.load_texture(source, image, egui::TextureOptions::LINEAR);
        self.entries
            .insert(source.to_string(), TextureEntry::Ready { texture, natural });
    }

    /// Forgets `source` so the next request fetches it again.
    pub fn evict(&mut self, source: &str) {
        self.entries.remove(source);
    }

    /// Uploads finished loads. Returns the sources that became ready this call.
    pub fn poll(&mut self, ctx: &egui::Context) -> Vec<String> {
        let mut ready = Vec::new();
        while let Ok(decoded) = self.receiver.try_recv() {
            match decoded.result {
                Ok((natural, image)) => {
                    self.insert(ctx, &decoded.source, natural, image);
                    ready.push(decoded.source);
                }
                Err(e) => {
                    self.entries.insert(decoded.source, TextureEntry::Failed(e));
                }
            }
        }
        ready
    }
}
