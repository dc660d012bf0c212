//! Image asset loading and decoding.
//!
//! Sources may be public paths (`/images/people/a.png`, resolved against the public
//! directory), `file://` URLs, `data:` URIs or remote `http(s)` URLs. Raster images are
//! decoded with `image`; SVG documents are parsed with `usvg` and kept as vectors.

use crate::error::AssetError;
use crate::types::Size;
use base64::Engine as _;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::path::{Component, Path, PathBuf};

/// Fetches the raw bytes behind an image source string.
pub trait AssetLoader: Send + Sync {
    /// Loads `source`. Every call fetches fresh bytes; implementations must not hand out
    /// a cached copy that may have changed since.
    fn load<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>>;
}

/// How the decoded bytes are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// PNG bytes (raster sources are normalized to PNG)
    Png,
    /// An SVG document
    Svg,
}

/// A successfully decoded image with its natural pixel size.
#[derive(Clone)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    encoding: ImageEncoding,
    bytes: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("encoding", &self.encoding)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(1024)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let lower = text.get(..9).unwrap_or(text).to_ascii_lowercase();
    (text.starts_with("<svg") || text.starts_with("<?xml") || text.starts_with("<!--") || lower == "<!doctype")
        && text.contains("<svg")
}

impl DecodedImage {
    /// Decodes raster or SVG bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        if looks_like_svg(bytes) {
            let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
                .map_err(|e| AssetError::Decode(e.to_string()))?;
            let size = tree.size();
            return Ok(Self {
                width: size.width().ceil().max(1.0) as u32,
                height: size.height().ceil().max(1.0) as u32,
                encoding: ImageEncoding::Svg,
                bytes: bytes.to_vec(),
            });
        }

        let img = image::load_from_memory(bytes).map_err(|e| AssetError::Decode(e.to_string()))?;
        if img.width() == 0 || img.height() == 0 {
            return Err(AssetError::Decode("image has no pixels".to_string()));
        }
        let png = if matches!(image::guess_format(bytes), Ok(image::ImageFormat::Png)) {
            bytes.to_vec()
        } else {
            let mut buf = Vec::new();
            img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
                .map_err(|e| AssetError::Decode(e.to_string()))?;
            buf
        };
        Ok(Self {
            width: img.width(),
            height: img.height(),
            encoding: ImageEncoding::Png,
            bytes: png,
        })
    }

    /// Natural width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Natural height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Natural size.
    pub fn natural_size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }

    /// Storage encoding.
    pub fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    /// MIME type of the stored bytes.
    pub fn mime(&self) -> &'static str {
        match self.encoding {
            ImageEncoding::Png => "image/png",
            ImageEncoding::Svg => "image/svg+xml",
        }
    }

    /// The image as a base64 `data:` URI, suitable for embedding in an SVG document.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime(),
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }

    /// Unpremultiplied RGBA pixels no larger than `max_side` on either axis.
    ///
    /// SVG images are rasterized to fill `max_side` along their longer axis.
    pub fn to_rgba8(&self, max_side: u32) -> Result<(u32, u32, Vec<u8>), AssetError> {
        match self.encoding {
            ImageEncoding::Png => {
                let mut img = image::load_from_memory(&self.bytes)
                    .map_err(|e| AssetError::Decode(e.to_string()))?;
                if img.width() > max_side || img.height() > max_side {
                    img = img.thumbnail(max_side, max_side);
                }
                let rgba = img.to_rgba8();
                Ok((rgba.width(), rgba.height(), rgba.into_raw()))
            }
            ImageEncoding::Svg => {
                let tree = usvg::Tree::from_data(&self.bytes, &usvg::Options::default())
                    .map_err(|e| AssetError::Decode(e.to_string()))?;
                let scale = max_side as f32 / self.width.max(self.height) as f32;
                let w = ((self.width as f32) * scale).round().max(1.0) as u32;
                let h = ((self.height as f32) * scale).round().max(1.0) as u32;
                let mut pixmap = tiny_skia::Pixmap::new(w, h)
                    .ok_or_else(|| AssetError::Decode(format!("cannot allocate {w}x{h}")))?;
                resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());
                let mut rgba = Vec::with_capacity((w * h * 4) as usize);
                for px in pixmap.pixels() {
                    let c = px.demultiply();
                    rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
                }
                Ok((w, h, rgba))
            }
        }
    }
}

/// Loads an image source and decodes it in one step.
pub async fn load_image(loader: &dyn AssetLoader, source: &str) -> Result<DecodedImage, AssetError> {
    let bytes = loader.load(source).await?;
    // Re-encoding large photos is CPU bound
    tokio::task::spawn_blocking(move || DecodedImage::decode(&bytes))
        .await
        .map_err(|e| AssetError::Decode(e.to_string()))?
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    out
}

/// Decodes the payload of a `data:` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, AssetError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::UnsupportedSource(uri.chars().take(32).collect()))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::Decode("data URI without payload".to_string()))?;
    if meta.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .map_err(|e| AssetError::Decode(e.to_string()))
    } else {
        Ok(percent_decode(payload))
    }
}

/// Resolves sources against a public directory, the local filesystem and the network.
pub struct PublicAssetLoader {
    public_dir: PathBuf,
    client: reqwest::Client,
}

impl PublicAssetLoader {
    /// Creates a loader serving public paths from `public_dir`.
    pub fn new(public_dir: impl Into<PathBuf>) -> Self {
        Self {
            public_dir: public_dir.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Maps a public path such as `/images/logos/a.png` onto the public directory.
    ///
    /// Paths that climb out of the directory are rejected.
    pub fn resolve_public(&self, source: &str) -> Result<PathBuf, AssetError> {
        let relative = Path::new(source.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(AssetError::UnsupportedSource(source.to_string()));
        }
        Ok(self.public_dir.join(relative))
    }

    async fn read_file(path: PathBuf) -> Result<Vec<u8>, AssetError> {
        tokio::fs::read(&path).await.map_err(|source| AssetError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let http = |e: reqwest::Error| AssetError::Http(url.to_string(), e.to_string());
        let response = self.client.get(url).send().await.map_err(http)?;
        let response = response.error_for_status().map_err(http)?;
        let body = response.bytes().await.map_err(http)?;
        Ok(body.to_vec())
    }
}

impl AssetLoader for PublicAssetLoader {
    fn load<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
        async move {
            if source.starts_with("data:") {
                decode_data_uri(source)
            } else if source.starts_with("http://") || source.starts_with("https://") {
                self.fetch(source).await
            } else if let Some(path) = source.strip_prefix("file://") {
                Self::read_file(PathBuf::from(path)).await
            } else if source.is_empty() {
                Err(AssetError::UnsupportedSource(String::new()))
            } else {
                Self::read_file(self.resolve_public(source)?).await
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([200, 10, 10, 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn decodes_png_with_natural_size() {
        let decoded = DecodedImage::decode(&png_bytes(40, 20)).unwrap();
        assert_eq!(decoded.natural_size(), Size::new(40.0, 20.0));
        assert_eq!(decoded.mime(), "image/png");
        assert!(decoded.data_uri().starts_with("data:image/png;base64,"));
    }

    #[test]
    fn decodes_svg_with_doctype() {
        let svg = br#"<!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN" "http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd">
<svg xmlns="http://www.w3.org/2000/svg" width="30" height="12"><rect width="30" height="12" fill="red"/></svg>"#;
        let decoded = DecodedImage::decode(svg).unwrap();
        assert_eq!(decoded.encoding(), ImageEncoding::Svg);
        assert_eq!(decoded.natural_size(), Size::new(30.0, 12.0));
    }

    #[tokio::test]
    async fn load_image_decodes_jpeg_on_blocking_pool() {
        struct Bytes(Vec<u8>);
        impl AssetLoader for Bytes {
            fn load<'a>(&'a self, _source: &'a str) -> BoxFuture<'a, Result<Vec<u8>, AssetError>> {
                let bytes = self.0.clone();
                async move { Ok(bytes) }.boxed()
            }
        }

        let img = image::RgbImage::from_pixel(64, 32, image::Rgb([10, 200, 10]));
        let mut jpeg = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();

        let decoded = load_image(&Bytes(jpeg), "/images/people/photo.jpg").await.unwrap();
        assert_eq!(decoded.natural_size(), Size::new(64.0, 32.0));
        assert_eq!(decoded.mime(), "image/png");
    }

    #[test]
    fn decodes_svg_as_vector() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="30" height="60"><rect width="30" height="60" fill="red"/></svg>"#;
        let decoded = DecodedImage::decode(svg).unwrap();
        assert_eq!(decoded.encoding(), ImageEncoding::Svg);
        assert_eq!((decoded.width(), decoded.height()), (30, 60));
        let (w, h, rgba) = decoded.to_rgba8(120).unwrap();
        assert_eq!((w, h), (60, 120));
        assert_eq!(&rgba[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(DecodedImage::decode(b"not an image"), Err(AssetError::Decode(_))));
    }

    #[test]
    fn thumbnails_respect_max_side() {
        let decoded = DecodedImage::decode(&png_bytes(400, 100)).unwrap();
        let (w, h, rgba) = decoded.to_rgba8(200).unwrap();
        assert_eq!((w, h), (200, 50));
        assert_eq!(rgba.len(), 200 * 50 * 4);
    }

    #[test]
    fn data_uris_decode() {
        let b64 = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(b"abc")
        );
        assert_eq!(decode_data_uri(&b64).unwrap(), b"abc");
        assert_eq!(decode_data_uri("data:image/svg+xml,%3Csvg%3E").unwrap(), b"<svg>");
    }

    #[test]
    fn public_paths_cannot_escape() {
        let loader = PublicAssetLoader::new("/srv/public");
        assert_eq!(
            loader.resolve_public("/images/logos/a.png").unwrap(),
            PathBuf::from("/srv/public/images/logos/a.png")
        );
        assert!(loader.resolve_public("/images/../../etc/passwd").is_err());
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let loader = PublicAssetLoader::new(std::env::temp_dir().join(uuid::Uuid::new_v4().to_string()));
        let err = loader.load("/billboard.png").await.unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
