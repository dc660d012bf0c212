//! # Billboard Editor
//!
//! A desktop editor for parody billboard images. Photos, logos and styled text boxes are
//! placed over a fixed billboard background, arranged interactively, and exported as a
//! flattened high-resolution PNG.
//!
//! ## Export engine
//! - [`geometry`] maps on-screen element boxes onto the export canvas with one scale ratio
//! - [`clip`] builds the non-rectangular sign-face silhouette
//! - [`style`] parses rich-text markup into a typed text style
//! - [`render`] composes background, elements and the shading overlay into a display list
//! - [`raster`] rasterizes display lists and encodes PNG
//! - [`export`] runs the whole pipeline as an observable state machine
//!
//! ## Editor
//! - [`session`] holds elements, selection and bounds behind reducer-style actions
//! - [`library`] stores uploaded person and logo images
//! - the egui front end is started with [`run_app`]

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod assets;
pub mod clip;
pub mod config;
pub mod constants;
pub mod display_list;
pub mod error;
pub mod export;
pub mod fonts;
pub mod geometry;
pub mod library;
pub mod raster;
pub mod render;
pub mod session;
pub mod style;
mod types;
mod ui;

// Re-export public types and functions
pub use config::AppConfig;
pub use error::*;
pub use export::{ExportCoordinator, ExportPipeline, ExportReport, ExportSink, ExportState, SceneSnapshot};
pub use session::{Session, SessionAction};
pub use types::*;
use ui::BillboardApp;

/// Runs the editor window.
///
/// Must be called from inside a tokio runtime context: image loads, uploads and exports
/// are spawned onto the current runtime.
///
/// # Returns
///
/// Returns `Ok(())` when the window is closed, or an `eframe::Error` if initialization fails.
///
/// # Example
///
/// ```no_run
/// use billboard_editor::{run_app, AppConfig};
///
/// fn main() -> Result<(), eframe::Error> {
///     let runtime = tokio::runtime::Runtime::new().unwrap();
///     let _guard = runtime.enter();
///     run_app(AppConfig::default())
/// }
/// ```
pub fn run_app(config: AppConfig) -> Result<(), eframe::Error> {
    let runtime = tokio::runtime::Handle::try_current().ok();
    if runtime.is_none() {
        log::warn!("No tokio runtime; images and exports are disabled");
    }
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Billboard Editor")
            .with_inner_size([1280.0, 860.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Billboard Editor",
        options,
        Box::new(move |cc| Ok(Box::new(BillboardApp::from_creation_context(cc, config, runtime)))),
    )
}
