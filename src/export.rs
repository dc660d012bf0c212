//! The composite export pipeline.
//!
//! An export walks `Idle → FontsPending → BackgroundLoading → Rendering → Encoding →
//! Done`, or ends in `Failed` from any step after `Idle`. The scene is an owned
//! [`SceneSnapshot`] taken before the first suspension point, so edits made while an
//! export is waiting on a load never reach the output. Encoding only starts once the
//! whole display list has been drawn; a failed export never hands bytes to the sink.

use crate::assets::{load_image, AssetLoader, DecodedImage, PublicAssetLoader};
use crate::config::AppConfig;
use crate::constants;
use crate::error::{AssetError, CanvasError, ExportError};
use crate::fonts::FontLibrary;
use crate::raster;
use crate::render::Compositor;
use crate::types::{BillboardBounds, Element, ElementId, ElementKind};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Where an export currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExportState {
    /// No export has been requested since the last one settled
    #[default]
    Idle,
    /// Waiting for the font database
    FontsPending,
    /// Loading the background asset
    BackgroundLoading,
    /// Drawing background, elements and overlay
    Rendering,
    /// Serializing the surface to PNG
    Encoding,
    /// The file was handed to the sink
    Done,
    /// The export was aborted with the given message
    Failed(String),
}

impl ExportState {
    /// Whether an export is between request and settlement.
    pub fn is_active(&self) -> bool {
        !matches!(self, ExportState::Idle | ExportState::Done | ExportState::Failed(_))
    }
}

/// An immutable copy of everything an export reads from the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSnapshot {
    /// Elements in drawing order
    pub elements: Vec<Element>,
    /// On-screen bounds of the billboard face, measured when the snapshot was taken
    pub bounds: BillboardBounds,
}

/// The encoded result of a successful render.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    /// Suggested file name
    pub file_name: String,
    /// PNG bytes
    pub bytes: Vec<u8>,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// Image elements left out because their source failed to load
    pub skipped: Vec<ElementId>,
}

/// Summary of a finished export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    /// Pixel width of the file
    pub width: u32,
    /// Pixel height of the file
    pub height: u32,
    /// Image elements left out
    pub skipped: Vec<ElementId>,
    /// Where the sink stored the file, if it reports a location
    pub saved_to: Option<PathBuf>,
}

/// Receives the encoded file at the end of an export.
pub trait ExportSink: Send + Sync {
    /// Hands the artifact to the user. `Ok(None)` means the sink has no location to
    /// report (for example, the user dismissed a save dialog).
    fn deliver<'a>(&'a self, artifact: &'a ExportArtifact) -> BoxFuture<'a, Result<Option<PathBuf>, ExportError>>;
}

/// Writes artifacts into a fixed directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// Creates a sink writing into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for DirectorySink {
    fn deliver<'a>(&'a self, artifact: &'a ExportArtifact) -> BoxFuture<'a, Result<Option<PathBuf>, ExportError>> {
        async move {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| ExportError::Deliver(e.to_string()))?;
            let path = self.dir.join(&artifact.file_name);
            tokio::fs::write(&path, &artifact.bytes)
                .await
                .map_err(|e| ExportError::Deliver(e.to_string()))?;
            log::info!("Wrote {} ({} bytes)", path.display(), artifact.bytes.len());
            Ok(Some(path))
        }
        .boxed()
    }
}

fn render_error(e: CanvasError) -> ExportError {
    ExportError::Render(e.to_string())
}

/// Runs exports and publishes their progress.
pub struct ExportPipeline {
    loader: Arc<dyn AssetLoader>,
    fonts: Arc<FontLibrary>,
    background: String,
    load_timeout: Option<Duration>,
    state: watch::Sender<ExportState>,
}

impl ExportPipeline {
    /// Creates a pipeline.
    ///
    /// # Arguments
    ///
    /// * `loader` - Source of background and element image bytes
    /// * `fonts` - Font database shared with other exports
    /// * `background` - Source string of the background asset
    /// * `load_timeout` - Bound applied to every individual load; `None` waits forever
    pub fn new(
        loader: Arc<dyn AssetLoader>,
        fonts: Arc<FontLibrary>,
        background: impl Into<String>,
        load_timeout: Option<Duration>,
    ) -> Self {
        let (state, _) = watch::channel(ExportState::Idle);
        Self {
            loader,
            fonts,
            background: background.into(),
            load_timeout,
            state,
        }
    }

    /// Creates a pipeline serving assets from the configured public directory.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            Arc::new(PublicAssetLoader::new(&config.public_dir)),
            Arc::new(FontLibrary::from_config(config)),
            config.background.clone(),
            config.load_timeout(),
        )
    }

    /// The asset loader, shared with the preview.
    pub fn loader(&self) -> Arc<dyn AssetLoader> {
        Arc::clone(&self.loader)
    }

    /// The font library, shared with the preview.
    pub fn fonts(&self) -> Arc<FontLibrary> {
        Arc::clone(&self.fonts)
    }

    /// Source string of the background asset.
    pub fn background(&self) -> &str {
        &self.background
    }

    /// The current state.
    pub fn state(&self) -> ExportState {
        self.state.borrow().clone()
    }

    /// A receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.state.subscribe()
    }

    fn transition(&self, next: ExportState) {
        log::debug!("Export state: {:?}", next);
        self.state.send_replace(next);
    }

    async fn bounded<T, F>(&self, what: &str, fut: F) -> Result<Result<T, AssetError>, ExportError>
    where
        F: Future<Output = Result<T, AssetError>>,
    {
        match self.load_timeout {
            None => Ok(fut.await),
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| ExportError::Timeout {
                what: what.to_string(),
                millis: limit.as_millis() as u64,
            }),
        }
    }

    async fn load_background(&self) -> Result<Arc<DecodedImage>, ExportError> {
        let loaded = self.bounded("background", load_image(self.loader.as_ref(), &self.background)).await?;
        let image = loaded.map_err(|e| ExportError::Background(e.to_string()))?;
        log::debug!("Background {} is {}x{}", self.background, image.width(), image.height());
        Ok(Arc::new(image))
    }

    async fn load_element_image(&self, element: &Element) -> Option<Arc<DecodedImage>> {
        let what = format!("image {}", element.content);
        match self.bounded(&what, load_image(self.loader.as_ref(), &element.content)).await {
            Ok(Ok(image)) => Some(Arc::new(image)),
            Ok(Err(e)) => {
                log::warn!("Skipping element {}: {}", element.id, e);
                None
            }
            Err(e) => {
                log::warn!("Skipping element {}: {}", element.id, e);
                None
            }
        }
    }

    /// Renders and encodes `snapshot` without delivering it.
    ///
    /// Element images load one at a time in drawing order; a failed or timed-out
    /// element image is skipped and recorded in [`ExportArtifact::skipped`].
    pub async fn render(&self, snapshot: &SceneSnapshot) -> Result<ExportArtifact, ExportError> {
        self.transition(ExportState::FontsPending);
        let fonts = self.fonts.ready().await?;

        self.transition(ExportState::BackgroundLoading);
        let background = self.load_background().await?;

        self.transition(ExportState::Rendering);
        let mut compositor = Compositor::begin(background, snapshot.bounds).map_err(render_error)?;
        let mut skipped = Vec::new();
        for element in &snapshot.elements {
            match element.kind {
                ElementKind::Text => compositor.draw_text(element).map_err(render_error)?,
                ElementKind::Person | ElementKind::Logo => match self.load_element_image(element).await {
                    Some(image) => compositor.draw_image(element, image).map_err(render_error)?,
                    None => skipped.push(element.id),
                },
            }
        }
        let list = compositor.finish().map_err(render_error)?;

        let (width, height) = (list.width(), list.height());
        let pixmap = tokio::task::spawn_blocking(move || raster::rasterize(&list, fonts))
            .await
            .map_err(|e| ExportError::Render(e.to_string()))?
            .map_err(render_error)?;

        self.transition(ExportState::Encoding);
        let bytes = raster::encode_png(&pixmap).map_err(|e| ExportError::Encode(e.to_string()))?;
        log::info!("Encoded {}x{} export ({} bytes)", width, height, bytes.len());

        Ok(ExportArtifact {
            file_name: constants::EXPORT_FILE_NAME.to_string(),
            bytes,
            width,
            height,
            skipped,
        })
    }

    /// Runs a full export and hands the result to `sink`.
    pub async fn run(&self, snapshot: SceneSnapshot, sink: &dyn ExportSink) -> Result<ExportReport, ExportError> {
        let result: Result<ExportReport, ExportError> = async {
            let artifact = self.render(&snapshot).await?;
            let saved_to = sink.deliver(&artifact).await?;
            Ok(ExportReport {
                width: artifact.width,
                height: artifact.height,
                skipped: artifact.skipped,
                saved_to,
            })
        }
        .await;

        match &result {
            Ok(_) => self.transition(ExportState::Done),
            Err(e) => {
                log::error!("Export failed: {}", e);
                self.transition(ExportState::Failed(e.to_string()));
            }
        }
        result
    }
}

/// Releases the single-flight slot when dropped.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Allows at most one export in flight; further requests are rejected with
/// [`ExportError::Busy`] until it settles.
#[derive(Clone)]
pub struct ExportCoordinator {
    pipeline: Arc<ExportPipeline>,
    in_flight: Arc<AtomicBool>,
}

impl ExportCoordinator {
    /// Wraps a pipeline.
    pub fn new(pipeline: Arc<ExportPipeline>) -> Self {
        Self {
            pipeline,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// The wrapped pipeline.
    pub fn pipeline(&self) -> &Arc<ExportPipeline> {
        &self.pipeline
    }

    /// Whether an export is currently running.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<InFlight, ExportError> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ExportError::Busy)?;
        Ok(InFlight(Arc::clone(&self.in_flight)))
    }

    /// Runs an export of `snapshot` unless another one is in flight.
    pub async fn export(&self, snapshot: SceneSnapshot, sink: &dyn ExportSink) -> Result<ExportReport, ExportError> {
        let _slot = self.acquire().inspect_err(|_| log::warn!("Export rejected: already in progress"))?;
        self.pipeline.run(snapshot, sink).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapLoader(HashMap<String, Vec<u8>>);

    impl AssetLoader for MapLoader {
        fn load<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
            let found = self.0.get(source).cloned();
            async move { found.ok_or_else(|| AssetError::UnsupportedSource(source.to_string())) }.boxed()
        }
    }

    struct PendingLoader;

    impl AssetLoader for PendingLoader {
        fn load<'a>(&'a self, _source: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
            futures::future::pending().boxed()
        }
    }

    #[derive(Default)]
    struct Capture(Mutex<Vec<ExportArtifact>>);

    impl ExportSink for Capture {
        fn deliver<'a>(&'a self, artifact: &'a ExportArtifact) -> BoxFuture<'a, Result<Option<PathBuf>, ExportError>> {
            self.0.lock().unwrap().push(artifact.clone());
            async { Ok(None) }.boxed()
        }
    }

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([90, 90, 90, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn pipeline(loader: impl AssetLoader + 'static, timeout: Option<Duration>) -> ExportPipeline {
        ExportPipeline::new(Arc::new(loader), Arc::new(FontLibrary::empty()), "/bg.png", timeout)
    }

    fn empty_scene() -> SceneSnapshot {
        SceneSnapshot {
            elements: Vec::new(),
            bounds: BillboardBounds::new(0.0, 0.0, 400.0, 200.0),
        }
    }

    #[tokio::test]
    async fn success_walks_every_state() {
        let loader = MapLoader(HashMap::from([("/bg.png".to_string(), png(30, 20))]));
        let pipeline = pipeline(loader, None);
        let mut states = pipeline.subscribe();
        assert_eq!(*states.borrow_and_update(), ExportState::Idle);

        let sink = Capture::default();
        let report = pipeline.run(empty_scene(), &sink).await.unwrap();
        assert_eq!((report.width, report.height), (60, 40));
        assert_eq!(pipeline.state(), ExportState::Done);
        assert!(states.has_changed().unwrap());
        let delivered = sink.0.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].file_name, "billboard-hq.png");
    }

    #[tokio::test]
    async fn background_failure_is_fatal_and_delivers_nothing() {
        let pipeline = pipeline(MapLoader(HashMap::new()), None);
        let sink = Capture::default();
        let err = pipeline.run(empty_scene(), &sink).await.unwrap_err();
        assert!(matches!(err, ExportError::Background(_)));
        assert!(err.to_string().contains("background"));
        assert!(matches!(pipeline.state(), ExportState::Failed(msg) if msg.contains("background")));
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn background_timeout_aborts() {
        let pipeline = pipeline(PendingLoader, Some(Duration::from_millis(50)));
        let err = pipeline.run(empty_scene(), &Capture::default()).await.unwrap_err();
        assert_eq!(
            err,
            ExportError::Timeout {
                what: "background".into(),
                millis: 50
            }
        );
    }

    #[tokio::test]
    async fn coordinator_releases_the_slot_after_failure() {
        let coordinator = ExportCoordinator::new(Arc::new(pipeline(MapLoader(HashMap::new()), None)));
        assert!(coordinator.export(empty_scene(), &Capture::default()).await.is_err());
        assert!(!coordinator.is_busy());
        assert!(!coordinator.pipeline().state().is_active());
    }
}
