//! Export from the editor: snapshot the session, run the pipeline on the runtime, and
//! save the PNG through a native save dialog or into the output directory.

use super::state::{Alert, BillboardApp, TaskResult};
use crate::error::ExportError;
use crate::export::{DirectorySink, ExportArtifact, ExportReport, ExportSink};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::PathBuf;

/// Asks the user where to save.
struct DialogSink;

impl ExportSink for DialogSink {
    fn deliver<'a>(&'a self, artifact: &'a ExportArtifact) -> BoxFuture<'a, Result<Option<PathBuf>, ExportError>> {
        async move {
            let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("PNG", &["png"])
                .set_file_name(artifact.file_name.as_str())
                .save_file()
                .await
            else {
                return Ok(None);
            };
            handle
                .write(&artifact.bytes)
                .await
                .map_err(|e| ExportError::Deliver(e.to_string()))?;
            Ok(Some(handle.path().to_path_buf()))
        }
        .boxed()
    }
}

impl BillboardApp {
    /// Starts an export of the current session.
    ///
    /// The element collection and bounds are copied here, before anything is awaited,
    /// so edits made while the export runs do not reach the file.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Context repainted when the export settles
    /// * `quick` - Write straight into the configured output directory instead of asking
    pub fn start_export(&mut self, ctx: &eframe::egui::Context, quick: bool) {
        if self.coordinator.is_busy() {
            self.alert = Some(Alert::info(ExportError::Busy.to_string()));
            return;
        }
        let Some(runtime) = self.runtime.clone() else {
            self.alert = Some(Alert::error("Exports need a background runtime"));
            return;
        };

        let snapshot = self.session.snapshot();
        log::info!("Exporting {} element(s)", snapshot.elements.len());
        let coordinator = self.coordinator.clone();
        let sender = self.task_sender.clone();
        let sink: Box<dyn ExportSink> = if quick {
            Box::new(DirectorySink::new(&self.config.output_dir))
        } else {
            Box::new(DialogSink)
        };
        let ctx = ctx.clone();
        runtime.spawn(async move {
            let result = coordinator.export(snapshot, sink.as_ref()).await;
            let _ = sender.send(TaskResult::ExportFinished(result));
            ctx.request_repaint();
        });
    }

    /// Turns a settled export into an alert.
    pub fn handle_export_result(&mut self, result: Result<ExportReport, ExportError>) {
        match result {
            Ok(report) => {
                let mut message = match &report.saved_to {
                    Some(path) => format!("Saved {}x{} image to {}", report.width, report.height, path.display()),
                    None => "Save cancelled".to_string(),
                };
                if !report.skipped.is_empty() {
                    message.push_str(&format!(
                        "\n{} image(s) could not be loaded and were left out",
                        report.skipped.len()
                    ));
                }
                self.alert = Some(Alert::info(message));
            }
            Err(e) => {
                self.alert = Some(Alert::error(format!("Failed to save image: {e}")));
            }
        }
    }
}
