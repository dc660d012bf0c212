//! Uploaded image library.
//!
//! Person and logo images live under `<public>/images/people` and
//! `<public>/images/logos` and are addressed by public URLs such as
//! `/images/logos/1700000000000-acme.png`.

use crate::error::LibraryError;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// MIME types accepted by [`ImageLibrary::upload`].
pub const ALLOWED_MIME_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/svg+xml",
];

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "svg"];

/// A named group of images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Photos of people
    People,
    /// Company logos
    Logos,
}

impl Bucket {
    /// Both buckets.
    pub const ALL: [Bucket; 2] = [Bucket::People, Bucket::Logos];

    /// Directory and URL segment name.
    pub fn name(&self) -> &'static str {
        match self {
            Bucket::People => "people",
            Bucket::Logos => "logos",
        }
    }

    /// Parses a bucket name.
    pub fn from_name(name: &str) -> Result<Self, LibraryError> {
        match name {
            "people" => Ok(Bucket::People),
            "logos" => Ok(Bucket::Logos),
            other => Err(LibraryError::UnknownBucket(other.to_string())),
        }
    }
}

/// MIME type implied by a file extension, for the image types the library accepts.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

fn has_image_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn io_error(operation: &'static str) -> impl FnOnce(std::io::Error) -> LibraryError {
    move |source| {
        log::error!("{} failed: {}", operation, source);
        LibraryError::Io { operation, source }
    }
}

/// Filesystem-backed image store rooted at a public directory.
#[derive(Debug, Clone)]
pub struct ImageLibrary {
    public_dir: PathBuf,
}

impl ImageLibrary {
    /// Creates a library storing images under `public_dir/images`.
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
        }
    }

    fn bucket_dir(&self, bucket: Bucket) -> PathBuf {
        self.public_dir.join("images").join(bucket.name())
    }

    /// Public URLs of the images in `bucket`, sorted by file name.
    ///
    /// A bucket whose directory does not exist yet is empty.
    pub async fn list(&self, bucket: Bucket) -> Result<Vec<String>, LibraryError> {
        let dir = self.bucket_dir(bucket);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error("Listing")(e)),
        };
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error("Listing"))? {
            if let Some(name) = entry.file_name().to_str() {
                if has_image_extension(name) {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| format!("/images/{}/{}", bucket.name(), name))
            .collect())
    }

    /// Stores an image and returns its public URL.
    ///
    /// # Arguments
    ///
    /// * `bucket` - Destination bucket
    /// * `file_name` - Original file name; only its final component is kept
    /// * `mime` - Declared MIME type, checked against [`ALLOWED_MIME_TYPES`]
    /// * `bytes` - File contents
    pub async fn upload(
        &self,
        bucket: Bucket,
        file_name: &str,
        mime: &str,
        bytes: &[u8],
    ) -> Result<String, LibraryError> {
        if bytes.is_empty() {
            return Err(LibraryError::MissingFile);
        }
        if !ALLOWED_MIME_TYPES.contains(&mime) {
            log::warn!("Rejected upload of {} with type {}", file_name, mime);
            return Err(LibraryError::InvalidType(mime.to_string()));
        }
        let base = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(LibraryError::MissingFile)?;
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let stored = format!("{millis}-{base}");

        let dir = self.bucket_dir(bucket);
        tokio::fs::create_dir_all(&dir).await.map_err(io_error("Upload"))?;
        tokio::fs::write(dir.join(&stored), bytes)
            .await
            .map_err(io_error("Upload"))?;
        log::info!("Stored {} in {}", stored, bucket.name());
        Ok(format!("/images/{}/{}", bucket.name(), stored))
    }

    /// Removes the image behind a public URL under `/images/`.
    pub async fn delete(&self, path: &str) -> Result<(), LibraryError> {
        if path.is_empty() {
            return Err(LibraryError::MissingPath);
        }
        let relative = path
            .strip_prefix("/images/")
            .ok_or_else(|| LibraryError::InvalidPath(path.to_string()))?;
        let relative = Path::new(relative);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(LibraryError::InvalidPath(path.to_string()));
        }
        let full = self.public_dir.join("images").join(relative);
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                log::info!("Deleted {}", path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LibraryError::NotFound(path.to_string())),
            Err(e) => Err(io_error("Delete")(e)),
        }
    }
}
