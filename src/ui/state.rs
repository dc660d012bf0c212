//! Application state structures.
//!
//! The editing model itself lives in [`Session`]; this module holds what only the
//! window needs: persisted preferences, pointer interaction, the text editor's working
//! copy, library listings and the channel that background tasks report through.

use super::textures::TextureCache;
use crate::config::AppConfig;
use crate::export::{ExportCoordinator, ExportPipeline, ExportReport, ExportState};
use crate::error::ExportError;
use crate::library::{Bucket, ImageLibrary};
use crate::session::Session;
use crate::style::{FontFamily, TextStyle};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use tokio::sync::watch;

/// Font sizes offered by the text editor.
pub const EDITOR_FONT_SIZES: [f32; 9] = [16.0, 20.0, 24.0, 28.0, 32.0, 40.0, 48.0, 64.0, 80.0];

/// UI settings remembered across restarts. The billboard itself is never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Width of the left sidebar
    pub sidebar_width: f32,
    /// Last window inner size in logical points
    pub window_inner_size: Option<(f32, f32)>,
    /// Dark or light visuals
    pub dark_mode: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sidebar_width: 300.0,
            window_inner_size: None,
            dark_mode: true,
        }
    }
}

/// What a pointer drag on the canvas is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Moving the whole element
    Move,
    /// Dragging one corner handle
    Resize(ResizeCorner),
}

/// An in-progress pointer drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragState {
    /// Dragged element
    pub id: ElementId,
    /// Move or resize
    pub mode: DragMode,
    /// Pointer position when the drag began
    pub pointer_start: Point,
    /// Element box when the drag began
    pub start: Rect,
}

/// Working copy of the selected text element, edited by the sidebar widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct TextEditorState {
    /// Element being edited
    pub editing: Option<ElementId>,
    /// One paragraph per line
    pub text: String,
    /// Chosen family
    pub family: FontFamily,
    /// Chosen size in pixels
    pub size_px: f32,
    /// Bold toggle
    pub bold: bool,
    /// Italic toggle
    pub italic: bool,
    /// Alignment
    pub align: TextAlign,
}

impl Default for TextEditorState {
    fn default() -> Self {
        Self {
            editing: None,
            text: String::new(),
            family: FontFamily::Oswald,
            size_px: crate::constants::DEFAULT_FONT_SIZE,
            bold: false,
            italic: false,
            align: TextAlign::Center,
        }
    }
}

impl TextEditorState {
    /// Loads the editor from a text element's current markup.
    pub fn load(&mut self, element: &Element) {
        let style = TextStyle::from_element(element);
        *self = Self {
            editing: Some(element.id),
            text: style.lines.join("\n"),
            family: style.font_family,
            size_px: style.font_size_px,
            bold: style.bold,
            italic: style.italic,
            align: style.text_align,
        };
    }

    /// The editor contents as widget markup.
    pub fn to_markup(&self) -> String {
        TextStyle {
            font_family: self.family.clone(),
            font_size_px: self.size_px,
            text_align: self.align,
            bold: self.bold,
            italic: self.italic,
            lines: self.text.lines().map(str::to_string).collect(),
        }
        .to_markup()
    }
}

/// A modal message shown over the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Window title
    pub title: String,
    /// Body text
    pub message: String,
}

impl Alert {
    /// An error alert.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            message: message.into(),
        }
    }

    /// An informational alert.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            title: "Billboard Editor".to_string(),
            message: message.into(),
        }
    }
}

/// Messages sent from background tasks back to the UI thread.
#[derive(Debug)]
pub enum TaskResult {
    /// A bucket listing completed
    Listed(Bucket, Vec<String>),
    /// An upload completed with the new image's URL
    Uploaded(Bucket, String),
    /// An image was removed from the library
    Deleted(String),
    /// A library operation failed with a user-facing message
    LibraryFailed(String),
    /// An export settled
    ExportFinished(Result<ExportReport, ExportError>),
}

/// An image pick waiting for its natural size to become known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPlacement {
    /// Person or logo
    pub kind: ElementKind,
    /// Image source
    pub source: String,
}

/// The main application structure.
///
/// This struct implements the `eframe::App` trait; the drawing and interaction logic
/// is split across the sibling modules as further `impl` blocks.
pub struct BillboardApp {
    /// Persisted UI settings
    pub prefs: Preferences,
    /// Runtime configuration
    pub config: AppConfig,
    /// Elements, selection and bounds
    pub session: Session,
    /// Canvas pointer drag, if any
    pub drag: Option<DragState>,
    /// Text editor working copy
    pub editor: TextEditorState,
    /// Uploaded image store
    pub library: ImageLibrary,
    /// Person image URLs
    pub people: Vec<String>,
    /// Logo image URLs
    pub logos: Vec<String>,
    /// Preview textures keyed by source
    pub textures: TextureCache,
    /// Single-flight export runner
    pub coordinator: ExportCoordinator,
    /// Export progress
    pub export_state: watch::Receiver<ExportState>,
    /// Runtime background work is spawned on; `None` disables background work
    pub runtime: Option<tokio::runtime::Handle>,
    /// Sender handed to background tasks
    pub task_sender: Sender<TaskResult>,
    /// Receiver polled every frame
    pub task_receiver: Receiver<TaskResult>,
    /// Image pick waiting for its texture
    pub pending_placement: Option<PendingPlacement>,
    /// Modal message
    pub alert: Option<Alert>,
    /// Library image waiting for the user to confirm its deletion
    pub pending_delete: Option<String>,
    /// Whether the disclaimer window is open
    pub show_info: bool,
    /// Families registered with egui from the fonts directory
    pub installed_fonts: HashSet<String>,
    /// Whether the stored window size was applied this session
    pub applied_viewport_restore: bool,
    /// Whether bucket listings were requested yet
    pub libraries_requested: bool,
}

impl BillboardApp {
    /// Creates the application without touching any window.
    ///
    /// # Arguments
    ///
    /// * `config` - Runtime configuration
    /// * `runtime` - Handle used for image loads, library calls and exports
    pub fn new(config: AppConfig, runtime: Option<tokio::runtime::Handle>) -> Self {
        let pipeline = Arc::new(ExportPipeline::from_config(&config));
        let export_state = pipeline.subscribe();
        let textures = TextureCache::new(pipeline.loader());
        let (task_sender, task_receiver) = channel();
        Self {
            prefs: Preferences::default(),
            library: ImageLibrary::new(&config.public_dir),
            config,
            session: Session::new(),
            drag: None,
            editor: TextEditorState::default(),
            people: Vec::new(),
            logos: Vec::new(),
            textures,
            coordinator: ExportCoordinator::new(pipeline),
            export_state,
            runtime,
            task_sender,
            task_receiver,
            pending_placement: None,
            alert: None,
            pending_delete: None,
            show_info: false,
            installed_fonts: HashSet::new(),
            applied_viewport_restore: false,
            libraries_requested: false,
        }
    }

    /// Creates the application inside eframe: restores preferences and installs fonts.
    pub fn from_creation_context(
        cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        runtime: Option<tokio::runtime::Handle>,
    ) -> Self {
        let mut app = Self::new(config, runtime);
        if let Some(storage) = cc.storage {
            if let Some(prefs) = eframe::get_value::<Preferences>(storage, eframe::APP_KEY) {
                app.prefs = prefs;
            }
        }
        app.installed_fonts = super::rendering::install_fonts(&cc.egui_ctx, &app.config.fonts_dir);
        app
    }

    /// The selected element, when it is a text box.
    pub fn selected_text(&self) -> Option<&Element> {
        self.session
            .selected_element()
            .filter(|e| e.kind == ElementKind::Text)
    }
}
