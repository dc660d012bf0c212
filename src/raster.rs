//! Rasterization of display lists.
//!
//! A [`DisplayList`] is serialized to a standalone SVG document (images embedded as
//! `data:` URIs, clips as `<clipPath>` groups) and rendered with `resvg` onto a
//! `tiny-skia` pixmap. Text is shaped by `usvg` against the shared font database.

use crate::display_list::{DisplayList, DrawOp, GradientStop};
use crate::error::CanvasError;
use crate::types::{Rect, TextAlign};
use std::fmt::Write as _;
use std::sync::Arc;

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn text_anchor(align: TextAlign) -> &'static str {
    match align {
        TextAlign::Left => "start",
        TextAlign::Center => "middle",
        TextAlign::Right => "end",
    }
}

fn write_rect_attrs(out: &mut String, rect: &Rect) {
    let _ = write!(
        out,
        r#"x="{}" y="{}" width="{}" height="{}""#,
        rect.x, rect.y, rect.width, rect.height
    );
}

fn write_gradient(defs: &mut String, id: &str, rect: &Rect, stops: &[GradientStop]) {
    let _ = write!(
        defs,
        r#"<linearGradient id="{id}" gradientUnits="userSpaceOnUse" x1="{x}" y1="{y1}" x2="{x}" y2="{y2}">"#,
        x = rect.x,
        y1 = rect.y,
        y2 = rect.bottom()
    );
    for stop in stops {
        let [r, g, b] = stop.rgb;
        let _ = write!(
            defs,
            r#"<stop offset="{}" stop-color="rgb({r},{g},{b})" stop-opacity="{}"/>"#,
            stop.offset, stop.alpha
        );
    }
    defs.push_str("</linearGradient>");
}

/// Serializes the list into an SVG document of the list's pixel size.
pub fn to_svg(list: &DisplayList) -> String {
    let mut defs = String::new();
    let mut body = String::new();
    let mut next_id = 0usize;

    for op in list.ops() {
        match op {
            DrawOp::Image { rect, image } => {
                body.push_str("<image ");
                write_rect_attrs(&mut body, rect);
                let _ = write!(
                    body,
                    r#" preserveAspectRatio="none" xlink:href="{}"/>"#,
                    image.data_uri()
                );
            }
            DrawOp::PushClip { path } => {
                let id = format!("clip{next_id}");
                next_id += 1;
                let _ = write!(
                    defs,
                    r#"<clipPath id="{id}" clipPathUnits="userSpaceOnUse"><path d="{path}"/></clipPath>"#
                );
                let _ = write!(body, r#"<g clip-path="url(#{id})">"#);
            }
            DrawOp::PopClip => body.push_str("</g>"),
            DrawOp::Text {
                text,
                x,
                y,
                anchor,
                font,
                color,
            } => {
                let [r, g, b] = *color;
                let _ = write!(
                    body,
                    r#"<text x="{x}" y="{y}" text-anchor="{}" dominant-baseline="central" font-family="{}" font-size="{}" font-weight="{}" font-style="{}" fill="rgb({r},{g},{b})" xml:space="preserve">{}</text>"#,
                    text_anchor(*anchor),
                    escape_xml(&font.family_list()),
                    font.size_px,
                    font.weight.as_css(),
                    if font.italic { "italic" } else { "normal" },
                    escape_xml(text)
                );
            }
            DrawOp::VerticalGradient { rect, stops } => {
                let id = format!("grad{next_id}");
                next_id += 1;
                write_gradient(&mut defs, &id, rect, stops);
                body.push_str("<rect ");
                write_rect_attrs(&mut body, rect);
                let _ = write!(body, r#" fill="url(#{id})"/>"#);
            }
        }
    }

    let (w, h) = (list.width(), list.height());
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><defs>{defs}</defs>{body}</svg>"#
    )
}

/// Renders the list onto a fresh transparent pixmap.
///
/// # Arguments
///
/// * `list` - A closed display list
/// * `fonts` - Font database used to shape text runs
pub fn rasterize(list: &DisplayList, fonts: Arc<fontdb::Database>) -> Result<tiny_skia::Pixmap, CanvasError> {
    let (w, h) = (list.width(), list.height());
    let mut pixmap = tiny_skia::Pixmap::new(w, h).ok_or(CanvasError::Allocation(w, h))?;

    let svg = to_svg(list);
    log::debug!("Surface document is {} bytes", svg.len());
    let options = usvg::Options {
        fontdb: fonts,
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(&svg, &options).map_err(|e| CanvasError::Document(e.to_string()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    Ok(pixmap)
}

/// Serializes the pixmap as PNG bytes.
pub fn encode_png(pixmap: &tiny_skia::Pixmap) -> Result<Vec<u8>, CanvasError> {
    pixmap.encode_png().map_err(|e| CanvasError::Encode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::DecodedImage;
    use crate::style::{FontFamily, FontSpec, FontWeight};

    fn solid_png(w: u32, h: u32, rgb: [u8; 3]) -> Arc<DecodedImage> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([rgb[0], rgb[1], rgb[2], 255]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        Arc::new(DecodedImage::decode(&buf).unwrap())
    }

    fn no_fonts() -> Arc<fontdb::Database> {
        Arc::new(fontdb::Database::new())
    }

    #[test]
    fn text_is_escaped_and_anchored() {
        let mut list = DisplayList::new(100, 50);
        list.draw(DrawOp::Text {
            text: "A & <B>".into(),
            x: 50.0,
            y: 25.0,
            anchor: TextAlign::Right,
            font: FontSpec {
                family: FontFamily::PlayfairDisplay,
                weight: FontWeight::Bold,
                italic: true,
                size_px: 30.0,
            },
            color: [0xD8, 0xD8, 0xC7],
        })
        .unwrap();
        let svg = to_svg(&list);
        assert!(svg.contains("A &amp; &lt;B&gt;"));
        assert!(svg.contains(r#"text-anchor="end""#));
        assert!(svg.contains("&quot;Playfair Display&quot;, Arial, sans-serif"));
        assert!(svg.contains(r#"font-style="italic""#));
        assert!(svg.contains("rgb(216,216,199)"));
    }

    #[test]
    fn clips_become_groups() {
        let mut list = DisplayList::new(10, 10);
        list.push_clip("M0,0 L10,0 L10,10 Z".into());
        list.pop_clip().unwrap();
        let svg = to_svg(&list);
        assert!(svg.contains(r#"<clipPath id="clip0""#));
        assert!(svg.contains(r#"<g clip-path="url(#clip0)"></g>"#));
    }

    #[test]
    fn clip_hides_drawing_outside_the_path() {
        let mut list = DisplayList::new(20, 20);
        // Left half only
        list.push_clip("M0,0 L10,0 L10,20 L0,20 Z".into());
        list.draw(DrawOp::Image {
            rect: Rect::new(0.0, 0.0, 20.0, 20.0),
            image: solid_png(4, 4, [255, 0, 0]),
        })
        .unwrap();
        list.pop_clip().unwrap();
        let pixmap = rasterize(&list.close().unwrap(), no_fonts()).unwrap();
        assert_eq!(pixmap.pixel(3, 10).unwrap().alpha(), 255);
        assert_eq!(pixmap.pixel(3, 10).unwrap().red(), 255);
        assert_eq!(pixmap.pixel(16, 10).unwrap().alpha(), 0);
    }

    #[test]
    fn gradient_covers_its_rect() {
        let mut list = DisplayList::new(10, 100);
        list.draw(DrawOp::VerticalGradient {
            rect: Rect::new(0.0, 0.0, 10.0, 100.0),
            stops: crate::render::overlay_gradient(),
        })
        .unwrap();
        let pixmap = rasterize(&list, no_fonts()).unwrap();
        let top = pixmap.pixel(5, 0).unwrap();
        let middle = pixmap.pixel(5, 50).unwrap();
        assert!((45..=57).contains(&top.alpha()), "top alpha {}", top.alpha());
        assert!((70..=84).contains(&middle.alpha()), "middle alpha {}", middle.alpha());
    }

    #[test]
    fn png_has_the_canvas_size() {
        let mut list = DisplayList::new(8, 6);
        list.draw(DrawOp::Image {
            rect: Rect::new(0.0, 0.0, 8.0, 6.0),
            image: solid_png(2, 2, [0, 0, 255]),
        })
        .unwrap();
        let bytes = encode_png(&rasterize(&list, no_fonts()).unwrap()).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }
}
