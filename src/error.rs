//! Error types for the billboard editor

use thiserror::Error;

/// Errors that abort an export.
///
/// The `Display` text is what the user sees in the failure alert.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExportError {
    /// Another export is still in flight
    #[error("An export is already in progress")]
    Busy,

    /// Fonts could not be made ready
    #[error("Failed to load fonts: {0}")]
    Fonts(String),

    /// The background asset could not be loaded or decoded
    #[error("Failed to load background: {0}")]
    Background(String),

    /// A load exceeded the configured bound
    #[error("Timed out loading {what} after {millis}ms")]
    Timeout {
        /// What was being loaded
        what: String,
        /// The bound that was exceeded
        millis: u64,
    },

    /// Drawing the composite failed
    #[error("Rendering failed: {0}")]
    Render(String),

    /// The surface could not be serialized to PNG
    #[error("Failed to create image: {0}")]
    Encode(String),

    /// The encoded file could not be handed to the user
    #[error("Failed to save file: {0}")]
    Deliver(String),
}

/// Errors raised while fetching or decoding an image asset.
#[derive(Error, Debug)]
pub enum AssetError {
    /// Local file access failed
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// The path that was read
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Remote fetch failed
    #[error("Failed to fetch '{0}': {1}")]
    Http(String, String),

    /// The bytes are not a decodable image
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The source string is not something the loader can resolve
    #[error("Unsupported image source: {0}")]
    UnsupportedSource(String),
}

/// Errors from the drawing surface.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CanvasError {
    /// `pop_clip` without a matching `push_clip`
    #[error("Clip stack underflow")]
    ClipUnderflow,

    /// The display list was closed with clips still active
    #[error("{0} clip region(s) left active")]
    UnbalancedClip(usize),

    /// The surface could not be allocated
    #[error("Cannot allocate a {0}x{1} surface")]
    Allocation(u32, u32),

    /// The SVG document was rejected by the rasterizer
    #[error("Invalid surface document: {0}")]
    Document(String),

    /// PNG encoding failed
    #[error("PNG encoding failed: {0}")]
    Encode(String),
}

/// Errors from the uploaded image library.
#[derive(Error, Debug)]
pub enum LibraryError {
    /// Upload without a file payload
    #[error("No file provided")]
    MissingFile,

    /// Upload with a MIME type outside the allowed set
    #[error("Invalid file type")]
    InvalidType(String),

    /// Delete without a path
    #[error("No image path provided")]
    MissingPath,

    /// Delete with a path outside the images directory
    #[error("Invalid path")]
    InvalidPath(String),

    /// Unknown bucket name
    #[error("Unknown image bucket '{0}'")]
    UnknownBucket(String),

    /// Delete of a file that does not exist
    #[error("File not found")]
    NotFound(String),

    /// Filesystem failure
    #[error("{operation} failed")]
    Io {
        /// The operation that failed ("Upload", "Delete", "Listing")
        operation: &'static str,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl LibraryError {
    /// HTTP-style status classification of the error.
    pub fn status_code(&self) -> u16 {
        match self {
            LibraryError::MissingFile
            | LibraryError::InvalidType(_)
            | LibraryError::MissingPath
            | LibraryError::InvalidPath(_)
            | LibraryError::UnknownBucket(_) => 400,
            LibraryError::NotFound(_) => 404,
            LibraryError::Io { .. } => 500,
        }
    }
}

/// Errors loading the application configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file exists but could not be read
    #[error("Failed to read config '{path}': {source}")]
    Read {
        /// Path of the config file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::AppConfig`]
    #[error("Invalid config '{path}': {source}")]
    Parse {
        /// Path of the config file
        path: String,
        /// Underlying parse error
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_failure_mentions_background() {
        let err = ExportError::Background("no such file".into());
        assert!(err.to_string().contains("background"));
    }

    #[test]
    fn library_errors_map_to_status_codes() {
        assert_eq!(LibraryError::InvalidType("text/plain".into()).status_code(), 400);
        assert_eq!(LibraryError::NotFound("/images/x.png".into()).status_code(), 404);
        let io = LibraryError::Io {
            operation: "Upload",
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(io.status_code(), 500);
        assert_eq!(io.to_string(), "Upload failed");
    }
}
